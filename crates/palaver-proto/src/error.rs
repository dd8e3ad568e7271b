//! Wire encoding errors.

use thiserror::Error;

/// Errors produced while encoding or decoding wire messages.
#[derive(Debug, Error)]
pub enum WireError {
    /// Payload was not a well-formed wire message.
    ///
    /// Receivers drop the offending payload; a malformed message is never
    /// fatal to the connection.
    #[error("malformed wire message: {0}")]
    Decode(#[source] serde_json::Error),

    /// Message could not be serialized.
    #[error("failed to encode wire message: {0}")]
    Encode(#[source] serde_json::Error),
}
