//! Simulation shell around the real connection manager.
//!
//! Mirrors the production transport driver, but over turmoil TCP with the
//! WebSocket handshake run against the in-simulation server. Tests observe
//! and steer the client through a [`ClientProbe`]: submissions and raw
//! payload injections are scheduled against virtual time, and everything
//! the client notified, delivered, or transmitted is recorded with the
//! virtual instant it happened at.

use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use futures::{SinkExt, StreamExt};
use palaver_client::{
    ConnectionId, ConnectionManager, Environment, ManagerAction, ManagerEvent, UserId,
};
use palaver_proto::ChatMessage;
use tokio_tungstenite::{WebSocketStream, client_async, tungstenite};
use turmoil::net::TcpStream;

use crate::sim_env::SimEnv;

/// How often the client shell polls the probe for scheduled work.
const PROBE_POLL_INTERVAL: Duration = Duration::from_millis(100);

type WsStream = WebSocketStream<TcpStream>;
type ReconnectTimer = Option<(ConnectionId, Pin<Box<dyn Future<Output = ()> + Send>>)>;

#[derive(Default)]
struct ProbeState {
    /// System notifications with the virtual time they arrived at.
    notices: Vec<(Duration, String)>,
    /// Chat messages that passed the routing filter.
    messages: Vec<ChatMessage>,
    /// Wire payloads the manager actually transmitted.
    transmitted: Vec<String>,
    /// User submissions scheduled against client start.
    submissions: Vec<(Duration, String)>,
    /// Raw payloads to push onto the wire, bypassing the manager.
    injections: Vec<(Duration, String)>,
}

/// Shared observation and steering handle for a simulated client.
#[derive(Clone, Default)]
pub struct ClientProbe {
    state: Arc<Mutex<ProbeState>>,
}

impl ClientProbe {
    /// Create an empty probe.
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> MutexGuard<'_, ProbeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Schedule a user submission `delay` after client start.
    pub fn submit_at(&self, delay: Duration, text: impl Into<String>) {
        self.locked().submissions.push((delay, text.into()));
    }

    /// Schedule a raw wire payload, sent without going through the
    /// manager. Lets tests originate targeted messages the production
    /// send path never builds.
    pub fn inject_raw_at(&self, delay: Duration, payload: impl Into<String>) {
        self.locked().injections.push((delay, payload.into()));
    }

    /// Recorded system notifications, oldest first.
    pub fn notices(&self) -> Vec<(Duration, String)> {
        self.locked().notices.clone()
    }

    /// Notification texts without timing, oldest first.
    pub fn notice_texts(&self) -> Vec<String> {
        self.locked().notices.iter().map(|(_, text)| text.clone()).collect()
    }

    /// Chat messages shown to the user, oldest first.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.locked().messages.clone()
    }

    /// Wire payloads the client transmitted, oldest first.
    pub fn transmitted(&self) -> Vec<String> {
        self.locked().transmitted.clone()
    }

    /// Drain scheduled work that is due at `elapsed`.
    fn take_due(&self, elapsed: Duration) -> (Vec<String>, Vec<String>) {
        let mut state = self.locked();
        let due = |queue: &mut Vec<(Duration, String)>| {
            let mut ready: Vec<(Duration, String)> = Vec::new();
            queue.retain(|(delay, text)| {
                if *delay <= elapsed {
                    ready.push((*delay, text.clone()));
                    false
                } else {
                    true
                }
            });
            ready.sort_by_key(|(delay, _)| *delay);
            ready.into_iter().map(|(_, text)| text).collect()
        };
        (due(&mut state.submissions), due(&mut state.injections))
    }
}

/// Drive a connection manager against `server` for `run_for` virtual time.
///
/// Intended as a turmoil client function. The manager, routing, and
/// reconnect logic are the production code; only the socket plumbing is
/// simulation-specific.
pub async fn run_client(
    server: &str,
    identity: UserId,
    nickname: &str,
    seed: u64,
    run_for: Duration,
    probe: ClientProbe,
) -> turmoil::Result {
    let env = SimEnv::new(seed);
    let started = tokio::time::Instant::now();
    let deadline = tokio::time::sleep(run_for);
    tokio::pin!(deadline);

    let mut manager = ConnectionManager::new(env.clone(), identity, nickname);
    let mut socket: Option<WsStream> = None;
    let mut timer: ReconnectTimer = None;
    let mut poll = tokio::time::interval(PROBE_POLL_INTERVAL);

    let mut pending = manager.start();
    loop {
        while !pending.is_empty() {
            for action in std::mem::take(&mut pending) {
                match action {
                    ManagerAction::Connect { conn } => {
                        match open_socket(server).await {
                            Ok(ws) => {
                                socket = Some(ws);
                                pending.extend(manager.handle(ManagerEvent::Opened { conn }));
                            },
                            Err(reason) => {
                                socket = None;
                                pending.extend(
                                    manager.handle(ManagerEvent::Closed { conn, reason }),
                                );
                            },
                        }
                    },
                    ManagerAction::Transmit { payload, .. } => {
                        probe.locked().transmitted.push(payload.clone());
                        if let Some(ws) = socket.as_mut() {
                            let _ = ws.send(tungstenite::Message::Text(payload.into())).await;
                        }
                    },
                    ManagerAction::ScheduleReconnect { conn, delay } => {
                        socket = None;
                        let env = env.clone();
                        timer = Some((conn, Box::pin(async move { env.sleep(delay).await })));
                    },
                    ManagerAction::Notify { text } => {
                        probe.locked().notices.push((started.elapsed(), text));
                    },
                    ManagerAction::Deliver { message } => {
                        probe.locked().messages.push(message);
                    },
                    ManagerAction::Log { .. } => {},
                }
            }
        }

        tokio::select! {
            () = &mut deadline => return Ok(()),
            frame = next_frame(&mut socket) => {
                let conn = manager.current_connection();
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
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
            _ = poll.tick() => {
                let (submissions, injections) = probe.take_due(started.elapsed());
                for text in submissions {
                    pending.extend(manager.handle(ManagerEvent::Submit { text }));
                }
                for payload in injections {
                    probe.locked().transmitted.push(payload.clone());
                    if let Some(ws) = socket.as_mut() {
                        let _ = ws.send(tungstenite::Message::Text(payload.into())).await;
                    }
                }
            },
        }
    }
}

/// Dial the server and complete the WebSocket handshake.
async fn open_socket(server: &str) -> Result<WsStream, String> {
    let stream =
        TcpStream::connect(format!("{server}:80")).await.map_err(|e| e.to_string())?;
    let (ws, _response) = client_async(format!("ws://{server}/ws"), stream)
        .await
        .map_err(|e| e.to_string())?;
    Ok(ws)
}

async fn next_frame(
    socket: &mut Option<WsStream>,
) -> Option<Result<tungstenite::Message, tungstenite::Error>> {
    match socket.as_mut() {
        Some(ws) => ws.next().await,
        None => std::future::pending().await,
    }
}

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
