//! Deterministic simulation harness for Palaver chat testing.
//!
//! Turmoil-based shells around the real connection manager and a simulated
//! chat server, for reproducible end-to-end tests under virtual time:
//!
//! - [`SimEnv`]: virtual clock plus seeded RNG [`Environment`]
//! - [`sim_server::serve`]: in-simulation chat server over WebSocket with
//!   history replay, broadcast fan-out, and optional keepalive probes
//! - [`sim_client::run_client`]: the production connection manager driven
//!   over turmoil TCP, observed through a [`ClientProbe`]
//!
//! [`Environment`]: palaver_client::Environment

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod sim_client;
pub mod sim_env;
pub mod sim_server;

pub use sim_client::{ClientProbe, run_client};
pub use sim_env::SimEnv;
pub use sim_server::{SimServerConfig, serve};
