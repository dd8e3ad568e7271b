//! UI state types.

use palaver_proto::ChatMessage;

/// Which screen is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Nickname entry before joining the chat.
    Login,

    /// The chat view.
    Chat,
}

/// One line in the chat log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEntry {
    /// System notification (connection state changes and the like).
    System {
        /// Notification text.
        text: String,
    },

    /// A delivered chat message.
    Message {
        /// The message as received.
        message: ChatMessage,
        /// Whether we authored it.
        mine: bool,
    },
}
