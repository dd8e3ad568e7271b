//! Connection manager events and actions.

use std::time::Duration;

use palaver_proto::ChatMessage;

/// Identifier for one transport session instance.
///
/// Monotonically increasing. Every transport-side event carries the id of
/// the session that produced it; the manager ignores events tagged with a
/// superseded id, so a stale socket or reconnect timer can never disturb
/// the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Events the caller feeds into the manager.
///
/// The caller is responsible for:
/// - Opening transport sessions when asked and reporting their fate
/// - Delivering inbound text payloads
/// - Firing the reconnect timer
/// - Forwarding user-authored submissions
#[derive(Debug, Clone)]
pub enum ManagerEvent {
    /// Transport handshake completed.
    Opened {
        /// Session that opened.
        conn: ConnectionId,
    },

    /// Text payload received from the transport.
    Frame {
        /// Session that received it.
        conn: ConnectionId,
        /// Raw payload as it arrived.
        payload: String,
    },

    /// Transport closed, cleanly or not. Handshake failures report here
    /// too; the reconnect policy makes no distinction of cause.
    Closed {
        /// Session that closed.
        conn: ConnectionId,
        /// Human-readable cause, for diagnostics only.
        reason: String,
    },

    /// The reconnect delay armed after `conn` closed has elapsed.
    ReconnectDue {
        /// Session whose closure armed the timer.
        conn: ConnectionId,
    },

    /// User submitted a line of text.
    Submit {
        /// Message body.
        text: String,
    },

    /// Stop the session; no further reconnects will be scheduled.
    Shutdown,
}

/// Log severity for diagnostics emitted by the manager.
///
/// The manager is Sans-IO and never logs directly; drivers map these onto
/// their logging facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Verbose diagnostics (payload traffic, filtered messages).
    Debug,
    /// Lifecycle milestones.
    Info,
    /// Recovered problems (malformed payloads, dropped sends).
    Warn,
}

/// Actions the manager produces for the caller to execute.
#[derive(Debug, Clone)]
pub enum ManagerAction {
    /// Open a new transport session tagged with `conn`.
    Connect {
        /// Tag for the new session.
        conn: ConnectionId,
    },

    /// Send a text payload on the current transport session.
    Transmit {
        /// Session to send on.
        conn: ConnectionId,
        /// Wire payload.
        payload: String,
    },

    /// Arm the reconnect timer for `conn`.
    ScheduleReconnect {
        /// Session whose closure is being recovered from.
        conn: ConnectionId,
        /// Delay before the next connection attempt.
        delay: Duration,
    },

    /// Human-readable system notification for the presentation layer.
    Notify {
        /// Notification text.
        text: String,
    },

    /// Deliver a chat message that passed the routing rule.
    Deliver {
        /// The message to render.
        message: ChatMessage,
    },

    /// Diagnostic log line.
    Log {
        /// Severity.
        level: LogLevel,
        /// Log message.
        message: String,
    },
}
