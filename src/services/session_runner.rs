//! The session event loop: one task owning every state mutation, in arrival order.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::{
    sync::mpsc,
    task::{JoinHandle, JoinSet},
    time::{Instant, sleep_until, timeout},
};
use tracing::{debug, error, info, warn};

use crate::{
    config::AppConfig,
    dao::game_api::GameApi,
    dto::{
        command::{Command, USAGE},
        ws::ServerMessage,
    },
    error::ClientError,
    services::{
        connection::{self, ConnectionConfig, ConnectionHandle, ConnectionNotice},
        dispatcher::ActionDispatcher,
        roster_poller,
    },
    state::{
        Applied, ClientState, CountdownOutcome, Effect, SharedState, roster::RosterSnapshot,
    },
};

const NOTICE_BUFFER: usize = 64;
const ROSTER_BUFFER: usize = 4;
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);
/// Stand-in deadline while no countdown is running; the branch is disabled anyway.
const IDLE_DEADLINE: Duration = Duration::from_secs(60 * 60 * 24);

/// Why [`Session::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Shutdown was requested.
    Shutdown,
    /// The push channel gave up reconnecting.
    ConnectionLost,
}

/// A running client session and the background tasks feeding it.
pub struct Session {
    state: SharedState,
    dispatcher: ActionDispatcher,
    connection: ConnectionHandle,
    connection_task: JoinHandle<()>,
    poller_task: JoinHandle<()>,
    notices: mpsc::Receiver<ConnectionNotice>,
    rosters: mpsc::Receiver<RosterSnapshot>,
}

impl Session {
    /// Spawn the connection supervisor and the roster poller for `config`.
    pub fn start(config: &AppConfig, api: Arc<dyn GameApi>) -> Self {
        let state = ClientState::new(config.role);

        let (notice_tx, notices) = mpsc::channel(NOTICE_BUFFER);
        let (connection, connection_task) =
            connection::spawn(ConnectionConfig::from(config), notice_tx);

        let (roster_tx, rosters) = mpsc::channel(ROSTER_BUFFER);
        let poller_task = tokio::spawn(roster_poller::run(
            api.clone(),
            state.phase_watcher(),
            config.roster_poll_interval,
            roster_tx,
        ));

        info!(
            role = %config.role,
            ws = %config.ws_url,
            api = %config.api_base_url,
            "session started"
        );

        Self {
            dispatcher: ActionDispatcher::new(state.clone(), api),
            state,
            connection,
            connection_task,
            poller_task,
            notices,
            rosters,
        }
    }

    /// Shared session state.
    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Dispatcher bound to this session.
    pub fn dispatcher(&self) -> ActionDispatcher {
        self.dispatcher.clone()
    }

    /// Sender side of the push channel.
    pub fn connection(&self) -> ConnectionHandle {
        self.connection.clone()
    }

    /// Drive the session until `shutdown` resolves, `quit` is received or the
    /// push channel gives up. Every background task is stopped before returning.
    pub async fn run<F>(mut self, mut commands: mpsc::Receiver<Command>, shutdown: F) -> SessionEnd
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut actions = JoinSet::new();
        let mut commands_open = true;

        let end = loop {
            let deadline = self.state.next_countdown_deadline().await;
            let wake_at = deadline.unwrap_or_else(|| Instant::now() + IDLE_DEADLINE);

            tokio::select! {
                _ = &mut shutdown => break SessionEnd::Shutdown,
                notice = self.notices.recv() => match notice {
                    Some(notice) => {
                        if let Some(end) = self.handle_notice(notice, &mut actions).await {
                            break end;
                        }
                    }
                    None => break SessionEnd::ConnectionLost,
                },
                Some(snapshot) = self.rosters.recv() => {
                    let count = snapshot.participants.len();
                    if self.state.apply_roster(snapshot).await {
                        debug!(participants = count, "roster updated");
                    } else {
                        debug!("stale roster snapshot discarded");
                    }
                }
                _ = sleep_until(wake_at), if deadline.is_some() => {
                    let outcomes = self.state.advance_countdowns().await;
                    self.handle_countdowns(outcomes, &mut actions);
                }
                command = commands.recv(), if commands_open => match command {
                    Some(Command::Quit) => break SessionEnd::Shutdown,
                    Some(command) => self.handle_command(command, &mut actions).await,
                    None => {
                        debug!("command input closed");
                        commands_open = false;
                    }
                },
                Some(joined) = actions.join_next(), if !actions.is_empty() => {
                    if let Err(err) = joined {
                        if err.is_panic() {
                            error!(error = %err, "action task panicked");
                        }
                    }
                }
            }
        };

        self.shutdown(actions).await;
        info!(?end, "session ended");
        end
    }

    async fn shutdown(self, mut actions: JoinSet<()>) {
        let Session {
            state,
            connection,
            mut connection_task,
            poller_task,
            notices,
            rosters,
            ..
        } = self;

        connection.close();
        drop(notices);
        drop(rosters);
        actions.shutdown().await;
        poller_task.abort();

        if timeout(CLOSE_TIMEOUT, &mut connection_task).await.is_err() {
            warn!("push channel did not close in time; aborting");
            connection_task.abort();
        }
        state.set_connected(false).await;
    }

    async fn handle_notice(
        &self,
        notice: ConnectionNotice,
        actions: &mut JoinSet<()>,
    ) -> Option<SessionEnd> {
        match notice {
            ConnectionNotice::Connected { connection_id } => {
                info!(%connection_id, "connected to backend");
                self.state.set_connected(true).await;
            }
            ConnectionNotice::Message(message) => self.handle_message(message, actions).await,
            ConnectionNotice::Disconnected { reason } => {
                warn!(%reason, "disconnected from backend");
                self.state.set_connected(false).await;
            }
            ConnectionNotice::GaveUp { attempts } => {
                error!(attempts, "backend unreachable; stopping session");
                self.state.set_connected(false).await;
                return Some(SessionEnd::ConnectionLost);
            }
        }
        None
    }

    async fn handle_message(&self, message: ServerMessage, actions: &mut JoinSet<()>) {
        let Some(event) = message.into_event() else {
            debug!("ignoring unrecognized push event");
            return;
        };

        debug!(?event, "push event");
        match self.state.apply_event(event).await {
            Ok(applied) => self.handle_applied(&applied, actions),
            Err(err) => debug!(error = %err, "push event rejected"),
        }
    }

    fn handle_countdowns(&self, outcomes: Vec<CountdownOutcome>, actions: &mut JoinSet<()>) {
        for outcome in outcomes {
            info!(
                countdown = ?outcome.tick.purpose,
                remaining = outcome.tick.remaining,
                "countdown tick"
            );
            match outcome.expiry {
                Some(Ok(applied)) => self.handle_applied(&applied, actions),
                Some(Err(err)) => debug!(error = %err, "ignoring stale countdown expiry"),
                None => {}
            }
        }
    }

    fn handle_applied(&self, applied: &Applied, actions: &mut JoinSet<()>) {
        if applied.phase_changed() {
            info!(from = ?applied.from, to = ?applied.to, "phase changed");
        }

        for effect in &applied.effects {
            match effect {
                Effect::StartFirstQuestion => {
                    info!("pre-game countdown finished; requesting first question");
                    let dispatcher = self.dispatcher.clone();
                    actions.spawn(async move {
                        if let Err(err) = dispatcher.start_first_question().await {
                            warn!(error = %err, "automatic start of the first question failed");
                        }
                    });
                }
            }
        }
    }

    async fn handle_command(&self, command: Command, actions: &mut JoinSet<()>) {
        match command {
            Command::Select(choice) => {
                let result = self.dispatcher.select_answer(choice).await;
                report("select", result.map(|()| format!("selected {choice}")));
            }
            Command::Status => match serde_json::to_string_pretty(&self.state.view().await) {
                Ok(view) => info!("status\n{view}"),
                Err(err) => warn!(error = %err, "failed to render status"),
            },
            Command::Help => info!("\n{USAGE}"),
            Command::Quit => {}
            command => {
                let dispatcher = self.dispatcher.clone();
                actions.spawn(execute(dispatcher, command));
            }
        }
    }
}

/// Run a networked command to completion and report the outcome.
async fn execute(dispatcher: ActionDispatcher, command: Command) {
    let (name, result) = match command {
        Command::Register(name) => (
            "register",
            dispatcher.register(&name).await.map(|participant| {
                format!("registered as {} (id {})", participant.name, participant.id)
            }),
        ),
        Command::Submit => (
            "submit",
            dispatcher.submit_answer().await.map(|response| {
                let verdict = if response.correct { "correct" } else { "incorrect" };
                format!("{verdict}; score {}", response.score)
            }),
        ),
        Command::StartRegistration => (
            "start-registration",
            acknowledged(dispatcher.start_registration().await),
        ),
        Command::StartGame => ("start-game", acknowledged(dispatcher.start_game().await)),
        Command::StartFirstQuestion => (
            "start-first-question",
            acknowledged(dispatcher.start_first_question().await),
        ),
        Command::NextQuestion => ("next", acknowledged(dispatcher.next_question().await)),
        Command::Select(_) | Command::Status | Command::Help | Command::Quit => return,
    };
    report(name, result);
}

fn acknowledged(result: Result<Option<String>, ClientError>) -> Result<String, ClientError> {
    result.map(|message| message.unwrap_or_else(|| "ok".to_string()))
}

fn report(command: &'static str, result: Result<String, ClientError>) {
    match result {
        Ok(message) => info!(command, %message, "command succeeded"),
        Err(err) => warn!(command, error = %err, retryable = err.is_retryable(), "command failed"),
    }
}
