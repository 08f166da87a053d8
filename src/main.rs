//! jeopardy-client binary: runs a host or player session from the terminal.

use std::sync::Arc;

use anyhow::Context;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jeopardy_client::{
    config::AppConfig,
    dao::game_api::http::{HttpApiConfig, HttpGameApi},
    dto::command::{Command, USAGE},
    services::session_runner::{Session, SessionEnd},
};

const COMMAND_BUFFER: usize = 16;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let api = HttpGameApi::new(
        HttpApiConfig::new(config.api_base_url.clone()).with_timeout(config.request_timeout),
    )
    .context("building HTTP client")?;

    let session = Session::start(&config, Arc::new(api));
    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let stdin_task = tokio::spawn(read_commands(command_tx));

    let end = session.run(command_rx, shutdown_signal()).await;
    stdin_task.abort();

    match end {
        SessionEnd::Shutdown => Ok(()),
        SessionEnd::ConnectionLost => {
            anyhow::bail!("lost connection to the backend at {}", config.ws_url)
        }
    }
}

/// Read line commands from stdin and forward them to the session.
async fn read_commands(commands: mpsc::Sender<Command>) {
    println!("{USAGE}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                warn!(error = %err, "failed to read stdin");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(command) => {
                if commands.send(command).await.is_err() {
                    break;
                }
            }
            Err(err) => eprintln!("{err}"),
        }
    }
    info!("stdin closed");
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,jeopardy_client=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; listening for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
