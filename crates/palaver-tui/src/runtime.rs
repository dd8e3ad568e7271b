//! Event loop.
//!
//! Owns the terminal, the profile store, and the chat session, and executes
//! the actions the [`App`] state machine produces.

use std::io;

use crossterm::event::{Event, EventStream, KeyEventKind};
use futures::StreamExt;
use palaver_client::{
    ProfileStore, SystemEnv,
    transport::{self, ChatSession, SessionEvent, TransportError},
};
use thiserror::Error;

use crate::{
    app::{App, AppAction, AppEvent},
    terminal::TerminalGuard,
    ui,
};

/// Runtime errors.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The chat session task is gone.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// The TUI runtime.
pub struct Runtime {
    terminal: TerminalGuard,
    app: App,
    store: ProfileStore,
    session: Option<ChatSession>,
    server: String,
}

impl Runtime {
    /// Set up the terminal and load the profile.
    pub fn new(server: String, profile_path: std::path::PathBuf) -> Result<Self, RuntimeError> {
        let env = SystemEnv;
        let store = ProfileStore::load_or_create(&env, profile_path);
        let profile = store.profile();
        let app =
            App::new(profile.user_id, profile.nickname.clone(), profile.theme, server.clone());

        let terminal = TerminalGuard::new()?;
        Ok(Self { terminal, app, store, session: None, server })
    }

    /// Run the main event loop until the user quits.
    pub async fn run(mut self) -> Result<(), RuntimeError> {
        self.render()?;

        let mut event_stream = EventStream::new();

        loop {
            let actions = tokio::select! {
                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(event)) => self.handle_terminal_event(event),
                        Some(Err(e)) => return Err(RuntimeError::Io(e)),
                        None => break,
                    }
                }

                event = next_session_event(&mut self.session) => {
                    let app_event = match event {
                        SessionEvent::Notice(text) => AppEvent::Notice { text },
                        SessionEvent::Message(message) => AppEvent::Message { message },
                    };
                    self.app.handle(app_event)
                }
            };

            if self.execute(actions).await? {
                break;
            }
        }

        if let Some(session) = &self.session {
            session.stop();
        }
        Ok(())
    }

    /// Translate a terminal event into app actions.
    fn handle_terminal_event(&mut self, event: Event) -> Vec<AppAction> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                self.app.handle(AppEvent::Key(key))
            },
            Event::Resize(cols, rows) => self.app.handle(AppEvent::Resize(cols, rows)),
            _ => vec![],
        }
    }

    /// Execute actions. Returns true when the app should quit.
    async fn execute(&mut self, actions: Vec<AppAction>) -> Result<bool, RuntimeError> {
        for action in actions {
            match action {
                AppAction::Render => self.render()?,
                AppAction::Quit => return Ok(true),
                AppAction::Join { nickname } => {
                    if let Err(e) = self.store.set_nickname(nickname.clone()) {
                        tracing::warn!("failed to persist nickname: {e}");
                    }
                    let identity = self.store.profile().user_id;
                    let session =
                        transport::spawn(SystemEnv, identity, nickname, self.server.clone());
                    self.session = Some(session);
                },
                AppAction::Submit { text } => {
                    if let Some(session) = &self.session {
                        session.submit(text).await?;
                    }
                },
                AppAction::SetTheme(theme) => {
                    if let Err(e) = self.store.set_theme(theme) {
                        tracing::warn!("failed to persist theme: {e}");
                    }
                },
            }
        }
        Ok(false)
    }

    /// Draw the current app state.
    fn render(&mut self) -> Result<(), RuntimeError> {
        self.terminal.terminal().draw(|frame| ui::render(frame, &self.app))?;
        Ok(())
    }
}

/// Next event from the chat session, or never if no session is running.
async fn next_session_event(session: &mut Option<ChatSession>) -> SessionEvent {
    match session {
        Some(active) => match active.events.recv().await {
            Some(event) => event,
            None => std::future::pending().await,
        },
        None => std::future::pending().await,
    }
}
