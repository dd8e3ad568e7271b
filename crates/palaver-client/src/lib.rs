//! Palaver chat client core.
//!
//! The heart of this crate is [`ConnectionManager`], a Sans-IO state
//! machine owning the lifecycle of one logical WebSocket session: connect,
//! keepalive, inbound routing, and the unconditional reconnect-after-3s
//! policy. It receives events ([`ManagerEvent`]), processes them through
//! pure state machine logic, and returns actions ([`ManagerAction`]) for
//! the caller to execute.
//!
//! # Components
//!
//! - [`ConnectionManager`]: lifecycle and routing state machine
//! - [`ManagerEvent`] / [`ManagerAction`]: the event/action interface
//! - [`Environment`]: time and randomness abstraction
//! - [`ProfileStore`]: persisted identity, nickname, and theme
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::spawn`]: run a session over a real WebSocket
//! - [`transport::ChatSession`]: channel handle for the presentation layer

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
mod event;
mod manager;
mod profile;

#[cfg(feature = "transport")]
pub mod transport;

pub use env::Environment;
#[cfg(feature = "transport")]
pub use env::SystemEnv;
pub use event::{ConnectionId, LogLevel, ManagerAction, ManagerEvent};
pub use manager::{ConnectionManager, RECONNECT_DELAY, SessionState};
pub use palaver_proto::UserId;
pub use profile::{Profile, ProfileError, ProfileStore, Theme};
