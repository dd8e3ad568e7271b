//! Fuzz target for WireMessage::decode
//!
//! Feeds arbitrary byte sequences through UTF-8 validation and JSON wire
//! decoding. Servers on the other end of the socket are untrusted, so the
//! decoder must return an error for every malformed payload.
//!
//! The fuzzer should NEVER panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use palaver_proto::WireMessage;

fuzz_target!(|data: &[u8]| {
    // Invalid UTF-8 never reaches the decoder; invalid JSON must only Err
    if let Ok(payload) = std::str::from_utf8(data) {
        let _ = WireMessage::decode(payload);
    }
});
