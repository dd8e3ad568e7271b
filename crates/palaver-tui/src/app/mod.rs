//! UI state machine.
//!
//! Pure state machine that processes terminal and session events, producing
//! actions for the runtime to execute. Completely decoupled from I/O, so
//! every screen transition and key binding is unit-testable.

mod action;
mod event;
mod state;

pub use action::AppAction;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
pub use event::AppEvent;
use palaver_client::Theme;
use palaver_proto::UserId;
pub use state::{ChatEntry, Screen};

/// Entries kept in the chat log before the oldest are dropped.
const ENTRY_CAP: usize = 500;

/// UI state machine.
#[derive(Debug, Clone)]
pub struct App {
    /// Active screen.
    screen: Screen,
    /// Our identity, for marking own messages.
    identity: UserId,
    /// Current nickname.
    nickname: String,
    /// Server host we talk to (status bar only).
    server_addr: String,
    /// Chat log, newest first.
    entries: Vec<ChatEntry>,
    /// Most recent system notification, shown in the status bar.
    last_notice: Option<String>,
    /// Input line buffer.
    input_buffer: String,
    /// Cursor position in the input buffer.
    input_cursor: usize,
    /// Active color theme.
    theme: Theme,
}

impl App {
    /// Create a new App on the login screen.
    ///
    /// The login input is pre-filled with the persisted nickname.
    pub fn new(identity: UserId, nickname: String, theme: Theme, server_addr: String) -> Self {
        let input_cursor = nickname.len();
        Self {
            screen: Screen::Login,
            identity,
            nickname: nickname.clone(),
            server_addr,
            entries: Vec::new(),
            last_notice: None,
            input_buffer: nickname,
            input_cursor,
            theme,
        }
    }

    /// Process an event and return actions for the runtime.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Resize(_, _) => vec![AppAction::Render],
            AppEvent::Notice { text } => {
                self.last_notice = Some(text.clone());
                self.push_entry(ChatEntry::System { text });
                vec![AppAction::Render]
            },
            AppEvent::Message { message } => {
                let mine = message.from == self.identity;
                self.push_entry(ChatEntry::Message { message, mine });
                vec![AppAction::Render]
            },
        }
    }

    /// Prepend an entry, dropping the oldest past the cap.
    fn push_entry(&mut self, entry: ChatEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(ENTRY_CAP);
    }

    /// Handle keyboard input.
    fn handle_key(&mut self, key: KeyEvent) -> Vec<AppAction> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('t') => {
                    self.theme = self.theme.toggled();
                    vec![AppAction::SetTheme(self.theme), AppAction::Render]
                },
                KeyCode::Char('c') => vec![AppAction::Quit],
                _ => vec![],
            };
        }

        match key.code {
            KeyCode::Char(c) => {
                self.input_buffer.insert(self.input_cursor, c);
                self.input_cursor = self.input_cursor.saturating_add(c.len_utf8());
                vec![AppAction::Render]
            },
            KeyCode::Backspace => {
                if let Some((offset, _)) = self.input_buffer[..self.input_cursor].char_indices().next_back()
                {
                    self.input_buffer.remove(offset);
                    self.input_cursor = offset;
                }
                vec![AppAction::Render]
            },
            KeyCode::Delete => {
                if self.input_cursor < self.input_buffer.len() {
                    self.input_buffer.remove(self.input_cursor);
                }
                vec![AppAction::Render]
            },
            KeyCode::Left => {
                self.input_cursor = self.input_buffer[..self.input_cursor]
                    .char_indices()
                    .next_back()
                    .map_or(0, |(offset, _)| offset);
                vec![AppAction::Render]
            },
            KeyCode::Right => {
                if self.input_cursor < self.input_buffer.len() {
                    let step = self.input_buffer[self.input_cursor..]
                        .chars()
                        .next()
                        .map_or(1, char::len_utf8);
                    self.input_cursor = self.input_cursor.saturating_add(step);
                }
                vec![AppAction::Render]
            },
            KeyCode::Home => {
                self.input_cursor = 0;
                vec![AppAction::Render]
            },
            KeyCode::End => {
                self.input_cursor = self.input_buffer.len();
                vec![AppAction::Render]
            },
            KeyCode::Enter => self.handle_enter(),
            KeyCode::Esc => vec![AppAction::Quit],
            _ => vec![],
        }
    }

    /// Handle Enter: join from the login screen, submit from the chat screen.
    fn handle_enter(&mut self) -> Vec<AppAction> {
        match self.screen {
            Screen::Login => {
                let nickname = self.input_buffer.trim().to_string();
                if nickname.is_empty() {
                    return vec![];
                }
                self.nickname = nickname.clone();
                self.input_buffer.clear();
                self.input_cursor = 0;
                self.screen = Screen::Chat;
                vec![AppAction::Join { nickname }, AppAction::Render]
            },
            Screen::Chat => {
                let text = std::mem::take(&mut self.input_buffer);
                self.input_cursor = 0;
                if text.trim().is_empty() {
                    return vec![AppAction::Render];
                }
                vec![AppAction::Submit { text }, AppAction::Render]
            },
        }
    }

    /// Active screen.
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Chat log entries, newest first.
    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    /// Most recent system notification.
    pub fn last_notice(&self) -> Option<&str> {
        self.last_notice.as_deref()
    }

    /// Input line contents.
    pub fn input_buffer(&self) -> &str {
        &self.input_buffer
    }

    /// Cursor column within the input line (character count, not bytes).
    pub fn input_cursor_column(&self) -> usize {
        self.input_buffer[..self.input_cursor].chars().count()
    }

    /// Current nickname.
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// Server host.
    pub fn server_addr(&self) -> &str {
        &self.server_addr
    }

    /// Active theme.
    pub fn theme(&self) -> Theme {
        self.theme
    }
}

#[cfg(test)]
mod tests {
    use palaver_proto::{ChatMessage, Recipients};

    use super::*;

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> AppEvent {
        AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    fn app() -> App {
        let identity = UserId::from_random_bytes([7; 16]);
        App::new(identity, "alice".into(), Theme::Dark, "192.168.4.1".into())
    }

    fn message(from: UserId, data: &str) -> ChatMessage {
        ChatMessage {
            from,
            to: Some(Recipients::broadcast()),
            name: "bob".into(),
            data: data.into(),
            id: 1,
            timestamp: 1_700_000_123,
        }
    }

    #[test]
    fn starts_on_login_with_nickname_prefilled() {
        let app = app();
        assert_eq!(app.screen(), Screen::Login);
        assert_eq!(app.input_buffer(), "alice");
        assert_eq!(app.input_cursor_column(), 5);
    }

    #[test]
    fn enter_on_login_joins_and_switches_to_chat() {
        let mut app = app();
        let actions = app.handle(key(KeyCode::Enter));
        assert_eq!(actions, vec![AppAction::Join { nickname: "alice".into() }, AppAction::Render]);
        assert_eq!(app.screen(), Screen::Chat);
        assert_eq!(app.input_buffer(), "");
    }

    #[test]
    fn enter_on_login_with_blank_nickname_does_nothing() {
        let mut app = app();
        for _ in 0..5 {
            app.handle(key(KeyCode::Backspace));
        }
        app.handle(key(KeyCode::Char(' ')));
        let actions = app.handle(key(KeyCode::Enter));
        assert!(actions.is_empty());
        assert_eq!(app.screen(), Screen::Login);
    }

    #[test]
    fn enter_on_chat_submits_the_input_line() {
        let mut app = app();
        app.handle(key(KeyCode::Enter));
        for c in "hello".chars() {
            app.handle(key(KeyCode::Char(c)));
        }
        let actions = app.handle(key(KeyCode::Enter));
        assert_eq!(actions, vec![AppAction::Submit { text: "hello".into() }, AppAction::Render]);
        assert_eq!(app.input_buffer(), "");
    }

    #[test]
    fn blank_submission_is_swallowed() {
        let mut app = app();
        app.handle(key(KeyCode::Enter));
        app.handle(key(KeyCode::Char(' ')));
        let actions = app.handle(key(KeyCode::Enter));
        assert_eq!(actions, vec![AppAction::Render]);
    }

    #[test]
    fn messages_arrive_newest_first_and_mark_own() {
        let mut app = app();
        let me = UserId::from_random_bytes([7; 16]);
        let other = UserId::from_random_bytes([9; 16]);
        app.handle(AppEvent::Message { message: message(other, "first") });
        app.handle(AppEvent::Message { message: message(me, "second") });

        let entries = app.entries();
        assert_eq!(entries.len(), 2);
        assert!(matches!(
            &entries[0],
            ChatEntry::Message { message, mine: true } if message.data == "second"
        ));
        assert!(matches!(
            &entries[1],
            ChatEntry::Message { message, mine: false } if message.data == "first"
        ));
    }

    #[test]
    fn notices_land_in_the_log_and_the_status_bar() {
        let mut app = app();
        app.handle(AppEvent::Notice { text: "Connected to the server.".into() });
        assert_eq!(app.last_notice(), Some("Connected to the server."));
        assert!(matches!(&app.entries()[0], ChatEntry::System { text } if text.contains("Connected")));
    }

    #[test]
    fn ctrl_t_toggles_the_theme() {
        let mut app = app();
        let actions = app.handle(ctrl('t'));
        assert_eq!(actions, vec![AppAction::SetTheme(Theme::Light), AppAction::Render]);
        assert_eq!(app.theme(), Theme::Light);
        app.handle(ctrl('t'));
        assert_eq!(app.theme(), Theme::Dark);
    }

    #[test]
    fn escape_and_ctrl_c_quit() {
        let mut app = app();
        assert_eq!(app.handle(key(KeyCode::Esc)), vec![AppAction::Quit]);
        assert_eq!(app.handle(ctrl('c')), vec![AppAction::Quit]);
    }

    #[test]
    fn cursor_editing_respects_char_boundaries() {
        let mut app = app();
        app.handle(key(KeyCode::Enter));
        for c in "héllo".chars() {
            app.handle(key(KeyCode::Char(c)));
        }
        app.handle(key(KeyCode::Home));
        app.handle(key(KeyCode::Right));
        app.handle(key(KeyCode::Right));
        app.handle(key(KeyCode::Backspace));
        assert_eq!(app.input_buffer(), "hllo");
        assert_eq!(app.input_cursor_column(), 1);
    }

    #[test]
    fn entry_log_is_bounded() {
        let mut app = app();
        let other = UserId::from_random_bytes([9; 16]);
        for index in 0..(ENTRY_CAP + 10) {
            app.handle(AppEvent::Message { message: message(other, &index.to_string()) });
        }
        assert_eq!(app.entries().len(), ENTRY_CAP);
        assert!(matches!(
            &app.entries()[0],
            ChatEntry::Message { message, .. } if message.data == (ENTRY_CAP + 9).to_string()
        ));
    }
}
