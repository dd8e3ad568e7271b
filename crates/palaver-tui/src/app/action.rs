//! UI actions.
//!
//! Actions produced by the App state machine for the runtime to execute.

use palaver_client::Theme;

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Quit the application.
    Quit,

    /// Join the chat under the given nickname.
    Join {
        /// Nickname to persist and announce.
        nickname: String,
    },

    /// Submit user-authored text for broadcast.
    Submit {
        /// The message body.
        text: String,
    },

    /// Persist a theme change.
    SetTheme(Theme),
}
