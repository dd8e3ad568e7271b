//! UI events.
//!
//! Events fed into the App state machine from terminal input and the chat
//! session.

use crossterm::event::KeyEvent;
use palaver_proto::ChatMessage;

/// Events processed by the App state machine.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Keyboard input.
    Key(KeyEvent),

    /// Terminal resize (columns, rows).
    Resize(u16, u16),

    /// System notification from the chat session.
    Notice {
        /// Notification text.
        text: String,
    },

    /// Chat message that passed the routing filter.
    Message {
        /// The delivered message.
        message: ChatMessage,
    },
}
