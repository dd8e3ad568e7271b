//! Wire model for the Palaver chat protocol.
//!
//! Messages travel as JSON text over a WebSocket. Every payload is a
//! [`WireMessage`] tagged by its `type` field: `"text"` for user-visible
//! chat messages, `"ping"`/`"pong"` for the keepalive exchange.
//!
//! This crate holds only the data model and its JSON encoding. Connection
//! lifecycle and routing live in `palaver-client`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod identity;
mod message;

pub use error::WireError;
pub use identity::UserId;
pub use message::{ChatMessage, PONG_WIRE, Recipients, WireMessage};
