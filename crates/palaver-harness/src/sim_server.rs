//! In-simulation chat server.
//!
//! Every connection gets the bounded history ring replayed on accept; each
//! parseable inbound message is assigned a sequence id (and a timestamp if
//! the sender omitted one), stored in the ring, and broadcast to every
//! connected client. Keepalive probes and forced disconnects are opt-in so
//! tests can exercise the client's ping/pong and reconnect paths.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use turmoil::net::{TcpListener, TcpStream};

/// Messages retained for replay to newly accepted connections.
const HISTORY_CAPACITY: usize = 100;

/// Wall-clock origin used when stamping timestamps.
const SIM_EPOCH: u64 = 1_700_000_000;

/// Server behavior knobs.
#[derive(Debug, Clone, Default)]
pub struct SimServerConfig {
    /// Interval between keepalive probes per connection; `None` disables
    /// them.
    pub ping_interval: Option<Duration>,

    /// Close each connection after this long, to exercise the client's
    /// reconnect path.
    pub kick_after: Option<Duration>,
}

struct ServerState {
    clients: HashMap<u64, mpsc::UnboundedSender<String>>,
    history: VecDeque<String>,
    next_client_id: u64,
    message_counter: u64,
    started: tokio::time::Instant,
}

impl ServerState {
    fn new() -> Self {
        Self {
            clients: HashMap::new(),
            history: VecDeque::new(),
            next_client_id: 0,
            message_counter: 0,
            started: tokio::time::Instant::now(),
        }
    }

    fn unix_time(&self) -> u64 {
        SIM_EPOCH + self.started.elapsed().as_secs()
    }
}

type Shared = Arc<Mutex<ServerState>>;

fn locked(state: &Shared) -> MutexGuard<'_, ServerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run the chat server on `addr` until the simulation ends.
///
/// Intended as a turmoil host function:
/// `sim.host("server", || serve("0.0.0.0:80", config.clone()))`.
pub async fn serve(addr: &str, config: SimServerConfig) -> turmoil::Result {
    let listener = TcpListener::bind(addr).await?;
    let state: Shared = Arc::new(Mutex::new(ServerState::new()));
    loop {
        let (stream, _peer) = listener.accept().await?;
        tokio::spawn(handle_connection(stream, Arc::clone(&state), config.clone()));
    }
}

async fn handle_connection(stream: TcpStream, state: Shared, config: SimServerConfig) {
    let Ok(ws) = accept_async(stream).await else {
        return;
    };
    let (mut write, mut read) = ws.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let (client_id, backlog) = {
        let mut s = locked(&state);
        let id = s.next_client_id;
        s.next_client_id += 1;
        s.clients.insert(id, tx);
        (id, s.history.iter().cloned().collect::<Vec<_>>())
    };

    // History replay, oldest first.
    for payload in backlog {
        if write.send(Message::Text(payload.into())).await.is_err() {
            locked(&state).clients.remove(&client_id);
            return;
        }
    }

    let mut pinger = config.ping_interval.map(tokio::time::interval);
    let mut kick = config.kick_after.map(|delay| Box::pin(tokio::time::sleep(delay)));

    loop {
        tokio::select! {
            outbound = rx.recv() => match outbound {
                Some(payload) => {
                    if write.send(Message::Text(payload.into())).await.is_err() {
                        break;
                    }
                },
                None => break,
            },
            inbound = read.next() => match inbound {
                Some(Ok(Message::Text(text))) => process_inbound(&state, text.as_str()),
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {},
            },
            () = ping_tick(&mut pinger) => {
                if write.send(Message::Text(r#"{"type":"ping"}"#.into())).await.is_err() {
                    break;
                }
            },
            () = kick_due(&mut kick) => {
                let _ = write.send(Message::Close(None)).await;
                break;
            },
        }
    }

    locked(&state).clients.remove(&client_id);
}

/// Assign id (and timestamp when missing), store, broadcast to everyone.
fn process_inbound(state: &Shared, text: &str) {
    let Ok(mut value) = serde_json::from_str::<serde_json::Value>(text) else {
        return;
    };
    if !value.is_object() {
        return;
    }

    let mut s = locked(state);
    let id = s.message_counter;
    s.message_counter += 1;
    value["id"] = json!(id);
    if value.get("timestamp").is_none() {
        value["timestamp"] = json!(s.unix_time());
    }

    let payload = value.to_string();
    if s.history.len() == HISTORY_CAPACITY {
        s.history.pop_front();
    }
    s.history.push_back(payload.clone());

    for sender in s.clients.values() {
        let _ = sender.send(payload.clone());
    }
}

async fn ping_tick(pinger: &mut Option<tokio::time::Interval>) {
    match pinger.as_mut() {
        Some(interval) => {
            interval.tick().await;
        },
        None => std::future::pending().await,
    }
}

async fn kick_due(kick: &mut Option<std::pin::Pin<Box<tokio::time::Sleep>>>) {
    match kick.as_mut() {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}
