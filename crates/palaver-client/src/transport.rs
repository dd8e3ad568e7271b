//! WebSocket transport for the client.
//!
//! Thin async shell around the Sans-IO [`ConnectionManager`]: it opens
//! sockets when asked, pumps inbound frames, arms the reconnect timer, and
//! forwards notifications and delivered messages to the presentation layer
//! over channels. Protocol logic stays in the manager.

use std::{future::Future, pin::Pin};

use futures::{SinkExt, StreamExt};
use palaver_proto::{ChatMessage, UserId};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite};
use tracing::{debug, info, warn};

use crate::{
    env::Environment,
    event::{ConnectionId, LogLevel, ManagerAction, ManagerEvent},
    manager::ConnectionManager,
};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;
type ReconnectTimer = Option<(ConnectionId, Pin<Box<dyn Future<Output = ()> + Send>>)>;

/// Transport errors surfaced to the caller.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The session task is gone and can no longer accept submissions.
    #[error("chat session ended")]
    SessionEnded,
}

/// WebSocket endpoint for a chat server host (fixed well-known path).
pub fn endpoint_url(host: &str) -> String {
    format!("ws://{host}/ws")
}

/// Events delivered to the presentation layer.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Human-readable system notification.
    Notice(String),

    /// Chat message that passed the routing filter.
    Message(ChatMessage),
}

/// Handle to a running chat session.
///
/// Dropping the submit side shuts the session down.
pub struct ChatSession {
    submit: mpsc::Sender<String>,
    /// Notifications and chat messages for rendering.
    pub events: mpsc::Receiver<SessionEvent>,
    abort_handle: tokio::task::AbortHandle,
}

impl ChatSession {
    /// Submit user-authored text for broadcast.
    pub async fn submit(&self, text: String) -> Result<(), TransportError> {
        self.submit.send(text).await.map_err(|_| TransportError::SessionEnded)
    }

    /// Stop the session task immediately.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

/// Spawn a chat session task connecting to `host`.
pub fn spawn<E: Environment>(
    env: E,
    identity: UserId,
    nickname: String,
    host: String,
) -> ChatSession {
    let (submit_tx, submit_rx) = mpsc::channel(32);
    let (event_tx, event_rx) = mpsc::channel(64);
    let handle = tokio::spawn(run_session(env, identity, nickname, host, submit_rx, event_tx));
    ChatSession { submit: submit_tx, events: event_rx, abort_handle: handle.abort_handle() }
}

/// Drive the manager until the presentation layer goes away.
async fn run_session<E: Environment>(
    env: E,
    identity: UserId,
    nickname: String,
    host: String,
    mut submit_rx: mpsc::Receiver<String>,
    event_tx: mpsc::Sender<SessionEvent>,
) {
    let url = endpoint_url(&host);
    let mut manager = ConnectionManager::new(env.clone(), identity, nickname);
    let mut socket: Option<WsStream> = None;
    let mut timer: ReconnectTimer = None;

    let mut pending = manager.start();
    loop {
        while !pending.is_empty() {
            for action in std::mem::take(&mut pending) {
                match action {
                    ManagerAction::Connect { conn } => {
                        info!(%url, %conn, "opening websocket");
                        match connect_async(&url).await {
                            Ok((ws, _response)) => {
                                socket = Some(ws);
                                pending.extend(manager.handle(ManagerEvent::Opened { conn }));
                            },
                            Err(e) => {
                                socket = None;
                                pending.extend(manager.handle(ManagerEvent::Closed {
                                    conn,
                                    reason: e.to_string(),
                                }));
                            },
                        }
                    },
                    ManagerAction::Transmit { payload, .. } => {
                        debug!(%payload, "sending payload");
                        if let Some(ws) = socket.as_mut() {
                            if let Err(e) = ws.send(tungstenite::Message::Text(payload.into())).await
                            {
                                warn!("websocket send failed: {e}");
                            }
                        }
                    },
                    ManagerAction::ScheduleReconnect { conn, delay } => {
                        socket = None;
                        let env = env.clone();
                        timer = Some((conn, Box::pin(async move { env.sleep(delay).await })));
                    },
                    ManagerAction::Notify { text } => {
                        if event_tx.send(SessionEvent::Notice(text)).await.is_err() {
                            return;
                        }
                    },
                    ManagerAction::Deliver { message } => {
                        if event_tx.send(SessionEvent::Message(message)).await.is_err() {
                            return;
                        }
                    },
                    ManagerAction::Log { level, message } => emit_log(level, &message),
                }
            }
        }

        tokio::select! {
            submitted = submit_rx.recv() => match submitted {
                Some(text) => pending.extend(manager.handle(ManagerEvent::Submit { text })),
                None => {
                    // Presentation layer dropped its handle.
                    manager.handle(ManagerEvent::Shutdown);
                    return;
                },
            },
            frame = next_frame(&mut socket) => {
                let conn = manager.current_connection();
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        debug!(payload = %text, "received payload");
                        pending.extend(manager.handle(ManagerEvent::Frame {
                            conn,
                            payload: text.to_string(),
                        }));
                    },
                    Some(Ok(tungstenite::Message::Close(_))) | None => {
                        socket = None;
                        pending.extend(manager.handle(ManagerEvent::Closed {
                            conn,
                            reason: "connection closed".into(),
                        }));
                    },
                    // Binary frames and ws-level ping/pong are not part of
                    // the chat protocol; tungstenite answers the latter.
                    Some(Ok(_)) => {},
                    Some(Err(e)) => {
                        socket = None;
                        pending.extend(manager.handle(ManagerEvent::Closed {
                            conn,
                            reason: e.to_string(),
                        }));
                    },
                }
            },
            conn = reconnect_due(&mut timer) => {
                pending.extend(manager.handle(ManagerEvent::ReconnectDue { conn }));
            },
        }
    }
}

/// Next frame from the socket; pends forever while disconnected.
async fn next_frame(
    socket: &mut Option<WsStream>,
) -> Option<Result<tungstenite::Message, tungstenite::Error>> {
    match socket.as_mut() {
        Some(ws) => ws.next().await,
        None => std::future::pending().await,
    }
}

/// Resolves with the session tag once the armed reconnect timer fires.
async fn reconnect_due(timer: &mut ReconnectTimer) -> ConnectionId {
    match timer.as_mut() {
        Some((conn, delay)) => {
            delay.as_mut().await;
            let conn = *conn;
            *timer = None;
            conn
        },
        None => std::future::pending().await,
    }
}

fn emit_log(level: LogLevel, message: &str) {
    match level {
        LogLevel::Debug => debug!("{message}"),
        LogLevel::Info => info!("{message}"),
        LogLevel::Warn => warn!("{message}"),
    }
}
