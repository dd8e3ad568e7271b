//! Terminal UI for the palaver chat client.
//!
//! Layered the usual way: the [`App`] state machine is pure (events in,
//! actions out) and unit-testable, the [`runtime`] owns the terminal and
//! the chat session and executes the actions, and [`ui`] turns app state
//! into ratatui widgets.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod app;
pub mod runtime;
pub mod terminal;
pub mod ui;

pub use app::{App, AppAction, AppEvent, ChatEntry, Screen};
pub use runtime::{Runtime, RuntimeError};
