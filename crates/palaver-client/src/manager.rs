//! Connection lifecycle and message routing.
//!
//! The manager owns exactly one logical connection at a time and walks it
//! through `Connecting -> Open -> Closed`. Every closure, regardless of
//! cause, schedules exactly one reconnect attempt after a fixed delay.
//! Inbound payloads are decoded, keepalive probes answered, and chat
//! messages filtered by the recipient-targeting rule before delivery.
//!
//! Pure state machine - returns actions, caller handles I/O.

use std::time::Duration;

use palaver_proto::{ChatMessage, PONG_WIRE, Recipients, UserId, WireMessage};

use crate::{
    env::Environment,
    event::{ConnectionId, LogLevel, ManagerAction, ManagerEvent},
};

/// Delay between a closure and the next connection attempt.
///
/// Fixed: no backoff growth, no maximum attempt count.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Lifecycle state of the current transport session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transport handshake in flight.
    Connecting,
    /// Bidirectional message flow active.
    Open,
    /// No live transport; a reconnect may be pending.
    Closed,
}

/// Connection manager for one chat session.
///
/// # Type Parameters
///
/// - `E`: Environment implementation for time/randomness
pub struct ConnectionManager<E: Environment> {
    env: E,

    /// Our stable identity, used for routing and as `from` on sends.
    identity: UserId,

    /// Display name attached to outgoing messages.
    nickname: String,

    state: SessionState,

    /// Tag of the session we currently care about. Events carrying any
    /// other tag are stale and ignored.
    current: ConnectionId,

    /// Set on `Shutdown`; suppresses reconnect scheduling.
    shutdown: bool,
}

impl<E: Environment> ConnectionManager<E> {
    /// Create a manager. No connection is attempted until [`start`].
    ///
    /// [`start`]: ConnectionManager::start
    pub fn new(env: E, identity: UserId, nickname: impl Into<String>) -> Self {
        Self {
            env,
            identity,
            nickname: nickname.into(),
            state: SessionState::Closed,
            current: ConnectionId(0),
            shutdown: false,
        }
    }

    /// Our stable identity.
    pub fn identity(&self) -> UserId {
        self.identity
    }

    /// Display name attached to outgoing messages.
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Tag of the session currently owned by the manager.
    pub fn current_connection(&self) -> ConnectionId {
        self.current
    }

    /// Begin the first connection attempt.
    pub fn start(&mut self) -> Vec<ManagerAction> {
        self.state = SessionState::Connecting;
        self.current = ConnectionId(self.current.0 + 1);
        vec![
            ManagerAction::Connect { conn: self.current },
            log(LogLevel::Info, format!("connecting (session {})", self.current)),
        ]
    }

    /// Process one event and return the actions it produced.
    pub fn handle(&mut self, event: ManagerEvent) -> Vec<ManagerAction> {
        match event {
            ManagerEvent::Opened { conn } => {
                if let Some(actions) = self.check_stale(conn, "opened") {
                    return actions;
                }
                self.state = SessionState::Open;
                vec![
                    ManagerAction::Notify { text: "Connected to the server.".into() },
                    log(LogLevel::Info, format!("session {conn} open")),
                ]
            },

            ManagerEvent::Frame { conn, payload } => {
                if let Some(actions) = self.check_stale(conn, "frame") {
                    return actions;
                }
                self.handle_frame(&payload)
            },

            ManagerEvent::Closed { conn, reason } => {
                if let Some(actions) = self.check_stale(conn, "closed") {
                    return actions;
                }
                self.state = SessionState::Closed;
                if self.shutdown {
                    return vec![log(
                        LogLevel::Info,
                        format!("session {conn} closed after shutdown: {reason}"),
                    )];
                }
                vec![
                    ManagerAction::Notify {
                        text: "Disconnected. Trying to reconnect in 3 seconds...".into(),
                    },
                    log(LogLevel::Warn, format!("session {conn} closed: {reason}")),
                    ManagerAction::ScheduleReconnect { conn, delay: RECONNECT_DELAY },
                ]
            },

            ManagerEvent::ReconnectDue { conn } => {
                if let Some(actions) = self.check_stale(conn, "reconnect timer") {
                    return actions;
                }
                if self.shutdown || self.state != SessionState::Closed {
                    return vec![log(
                        LogLevel::Debug,
                        format!("ignoring reconnect timer for session {conn}"),
                    )];
                }
                self.start()
            },

            ManagerEvent::Submit { text } => self.handle_submit(text),

            ManagerEvent::Shutdown => {
                self.shutdown = true;
                vec![log(LogLevel::Info, "session shut down".into())]
            },
        }
    }

    /// Routing rule: should this inbound message be shown to the user?
    ///
    /// Targeted messages (explicit non-empty recipient list, `all` false)
    /// are delivered only to listed identities and to their own sender.
    /// Everything else is a broadcast.
    fn should_deliver(&self, message: &ChatMessage) -> bool {
        match &message.to {
            Some(to) if to.is_targeted() => {
                to.users.contains(&self.identity) || message.from == self.identity
            },
            _ => true,
        }
    }

    fn handle_frame(&mut self, payload: &str) -> Vec<ManagerAction> {
        let message = match WireMessage::decode(payload) {
            Ok(message) => message,
            Err(e) => {
                // Not fatal: drop the single payload and keep the session.
                return vec![log(LogLevel::Warn, format!("dropping malformed payload: {e}"))];
            },
        };

        match message {
            WireMessage::Ping => vec![
                ManagerAction::Transmit { conn: self.current, payload: PONG_WIRE.to_string() },
                log(LogLevel::Debug, "keepalive ping answered".into()),
            ],
            WireMessage::Pong => {
                vec![log(LogLevel::Debug, "ignoring pong".into())]
            },
            WireMessage::Text(message) => {
                if self.should_deliver(&message) {
                    vec![ManagerAction::Deliver { message }]
                } else {
                    vec![log(
                        LogLevel::Debug,
                        format!("filtered targeted message {} from {}", message.id, message.from),
                    )]
                }
            },
        }
    }

    fn handle_submit(&mut self, text: String) -> Vec<ManagerAction> {
        if text.is_empty() {
            return Vec::new();
        }
        if self.state != SessionState::Open {
            // No queueing and no retry; the message is simply gone.
            return vec![log(
                LogLevel::Warn,
                format!("dropping submit while {:?}", self.state),
            )];
        }

        let message = ChatMessage {
            from: self.identity,
            to: Some(Recipients::broadcast()),
            name: self.nickname.clone(),
            data: text,
            id: 0, // server assigns the real id
            timestamp: self.env.unix_time(),
        };
        match WireMessage::Text(message).encode() {
            Ok(payload) => vec![ManagerAction::Transmit { conn: self.current, payload }],
            Err(e) => vec![log(LogLevel::Warn, format!("failed to encode message: {e}"))],
        }
    }

    /// Returns the replacement actions if `conn` is not the current
    /// session, `None` when the event may proceed.
    fn check_stale(&self, conn: ConnectionId, what: &str) -> Option<Vec<ManagerAction>> {
        (conn != self.current).then(|| {
            vec![log(
                LogLevel::Debug,
                format!("ignoring {what} from superseded session {conn} (current {})", self.current),
            )]
        })
    }
}

fn log(level: LogLevel, message: String) -> ManagerAction {
    ManagerAction::Log { level, message }
}
