//! Push channel supervisor: connect, announce, forward events, reconnect with backoff.

use std::{collections::VecDeque, time::Duration};

use futures::{SinkExt, StreamExt};
use rand::Rng;
use thiserror::Error;
use tokio::{
    net::TcpStream,
    sync::{mpsc, watch},
    task::JoinHandle,
    time::sleep,
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{self, Message},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dto::ws::{ClientMessage, ServerMessage},
    state::Role,
};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(10);
const MAX_JITTER_MS: u64 = 250;

/// Errors raised by the push channel.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The WebSocket handshake failed.
    #[error("failed to connect to `{url}`")]
    Connect {
        url: String,
        #[source]
        source: Box<tungstenite::Error>,
    },
    /// The supervisor is gone; nothing can be sent any more.
    #[error("push channel closed")]
    Closed,
}

/// Lifecycle changes and messages forwarded to the session.
#[derive(Debug, Clone)]
pub enum ConnectionNotice {
    /// A connection was established and the announcements were queued.
    Connected { connection_id: Uuid },
    /// A parsed server message.
    Message(ServerMessage),
    /// The current connection ended; a reconnect may follow.
    Disconnected { reason: String },
    /// Reconnect attempts are exhausted; the supervisor stopped.
    GaveUp { attempts: u32 },
}

/// How the supervisor connects and when it gives up.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub url: String,
    pub role: Role,
    pub request_snapshot_on_open: bool,
    pub max_reconnect_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl ConnectionConfig {
    /// Connection settings with the default backoff.
    pub fn new(url: impl Into<String>, role: Role) -> Self {
        Self {
            url: url.into(),
            role,
            request_snapshot_on_open: true,
            max_reconnect_attempts: 5,
            initial_backoff: INITIAL_BACKOFF,
            max_backoff: MAX_BACKOFF,
        }
    }

    /// Messages sent first on every (re)connect.
    fn announcements(&self) -> Vec<ClientMessage> {
        let mut messages = Vec::with_capacity(2);
        if self.role.is_host() {
            messages.push(ClientMessage::HostConnect);
        }
        if self.request_snapshot_on_open {
            messages.push(ClientMessage::GetGameState);
        }
        messages
    }
}

impl From<&AppConfig> for ConnectionConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            request_snapshot_on_open: config.request_snapshot_on_open,
            max_reconnect_attempts: config.max_reconnect_attempts,
            ..Self::new(config.ws_url.clone(), config.role)
        }
    }
}

/// Cloneable sender side of the push channel.
///
/// Messages sent while no connection is open are queued and flushed, after
/// the announcements, once a connection opens.
#[derive(Clone)]
pub struct ConnectionHandle {
    outbound: mpsc::UnboundedSender<ClientMessage>,
    shutdown: watch::Sender<bool>,
}

impl ConnectionHandle {
    /// Queue a message for the backend.
    pub fn send(&self, message: ClientMessage) -> Result<(), ConnectionError> {
        self.outbound
            .send(message)
            .map_err(|_| ConnectionError::Closed)
    }

    /// Close the current connection and stop reconnecting.
    pub fn close(&self) {
        self.shutdown.send_replace(true);
    }
}

/// Spawn the connection supervisor. Notices are delivered on `notices` in arrival order.
pub fn spawn(
    config: ConnectionConfig,
    notices: mpsc::Sender<ConnectionNotice>,
) -> (ConnectionHandle, JoinHandle<()>) {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(supervise(config, outbound_rx, notices, shutdown_rx));
    (
        ConnectionHandle {
            outbound: outbound_tx,
            shutdown: shutdown_tx,
        },
        task,
    )
}

enum ConnectionEnd {
    Shutdown,
    Dropped(String),
}

async fn supervise(
    config: ConnectionConfig,
    mut outbound: mpsc::UnboundedReceiver<ClientMessage>,
    notices: mpsc::Sender<ConnectionNotice>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut pending = VecDeque::new();
    let mut delay = config.initial_backoff;
    let mut retries = 0u32;

    loop {
        if *shutdown.borrow() {
            break;
        }

        let connected = tokio::select! {
            _ = shutdown.changed() => break,
            result = connect(&config.url) => result,
        };

        match connected {
            Ok(socket) => {
                let connection_id = Uuid::new_v4();
                info!(%connection_id, url = %config.url, "push channel connected");
                retries = 0;
                delay = config.initial_backoff;

                let announcements = config.announcements();
                pending.retain(|message| !announcements.contains(message));
                for message in announcements.into_iter().rev() {
                    pending.push_front(message);
                }

                if notices
                    .send(ConnectionNotice::Connected { connection_id })
                    .await
                    .is_err()
                {
                    break;
                }

                let end = run_connection(
                    socket,
                    &mut outbound,
                    &mut pending,
                    &notices,
                    &mut shutdown,
                )
                .await;

                match end {
                    ConnectionEnd::Shutdown => break,
                    ConnectionEnd::Dropped(reason) => {
                        warn!(%connection_id, %reason, "push channel dropped");
                        if notices
                            .send(ConnectionNotice::Disconnected { reason })
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, attempt = retries, "push channel connection attempt failed");
            }
        }

        if retries >= config.max_reconnect_attempts {
            warn!(attempts = retries, "giving up on the push channel");
            let _ = notices
                .send(ConnectionNotice::GaveUp { attempts: retries })
                .await;
            break;
        }
        retries += 1;

        let wait = delay + jitter();
        debug!(attempt = retries, delay_ms = wait.as_millis() as u64, "reconnecting");
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = sleep(wait) => {}
        }
        delay = (delay * 2).min(config.max_backoff);
    }

    debug!(queued = pending.len() + outbound.len(), "push channel supervisor stopped");
}

async fn connect(url: &str) -> Result<Socket, ConnectionError> {
    connect_async(url)
        .await
        .map(|(socket, _response)| socket)
        .map_err(|source| ConnectionError::Connect {
            url: url.to_string(),
            source: Box::new(source),
        })
}

fn jitter() -> Duration {
    Duration::from_millis(rand::rng().random_range(0..=MAX_JITTER_MS))
}

async fn run_connection(
    socket: Socket,
    outbound: &mut mpsc::UnboundedReceiver<ClientMessage>,
    pending: &mut VecDeque<ClientMessage>,
    notices: &mpsc::Sender<ConnectionNotice>,
    shutdown: &mut watch::Receiver<bool>,
) -> ConnectionEnd {
    let (mut sink, mut stream) = socket.split();

    while let Some(message) = pending.pop_front() {
        if let Err(err) = sink.send(encode(message)).await {
            pending.push_front(message);
            return ConnectionEnd::Dropped(err.to_string());
        }
        debug!(?message, "sent queued message");
    }

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                let _ = sink.send(Message::Close(None)).await;
                return ConnectionEnd::Shutdown;
            }
            message = outbound.recv() => {
                let Some(message) = message else {
                    let _ = sink.send(Message::Close(None)).await;
                    return ConnectionEnd::Shutdown;
                };
                if let Err(err) = sink.send(encode(message)).await {
                    pending.push_front(message);
                    return ConnectionEnd::Dropped(err.to_string());
                }
                debug!(?message, "sent message");
            }
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => match ServerMessage::from_json_str(&text) {
                    Ok(message) => {
                        if notices.send(ConnectionNotice::Message(message)).await.is_err() {
                            let _ = sink.send(Message::Close(None)).await;
                            return ConnectionEnd::Shutdown;
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, payload = %text.as_str(), "dropping malformed push event");
                    }
                },
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|frame| frame.reason.as_str().to_string())
                        .filter(|reason| !reason.is_empty())
                        .unwrap_or_else(|| "closed by server".to_string());
                    return ConnectionEnd::Dropped(reason);
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => return ConnectionEnd::Dropped(err.to_string()),
                None => return ConnectionEnd::Dropped("stream ended".to_string()),
            },
        }
    }
}

fn encode(message: ClientMessage) -> Message {
    // ClientMessage is a fieldless tagged enum; serialization cannot fail.
    let payload = serde_json::to_string(&message).unwrap_or_default();
    Message::Text(payload.into())
}
