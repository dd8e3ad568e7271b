//! UI rendering.
//!
//! Rendering functions that convert App state into terminal output using
//! ratatui widgets. All functions are pure (no I/O), taking state and
//! returning widget trees.

mod chat;
mod input;
mod login;
mod status;

use palaver_client::Theme;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::Color,
};

use crate::app::{App, Screen};

/// Colors derived from the active theme.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    /// Default text color.
    pub fg: Color,
    /// Screen background.
    pub bg: Color,
    /// Nicknames and highlights.
    pub accent: Color,
    /// Own messages.
    pub own: Color,
    /// Timestamps and system noise.
    pub dim: Color,
    /// Status bar background.
    pub bar: Color,
}

impl Palette {
    /// Palette for a theme.
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                fg: Color::White,
                bg: Color::Black,
                accent: Color::Cyan,
                own: Color::Green,
                dim: Color::DarkGray,
                bar: Color::DarkGray,
            },
            Theme::Light => Self {
                fg: Color::Black,
                bg: Color::White,
                accent: Color::Blue,
                own: Color::Green,
                dim: Color::Gray,
                bar: Color::Gray,
            },
        }
    }
}

/// Render the entire UI.
pub fn render(frame: &mut Frame, app: &App) {
    let palette = Palette::for_theme(app.theme());

    match app.screen() {
        Screen::Login => login::render(frame, app, &palette),
        Screen::Chat => render_chat_screen(frame, app, &palette),
    }
}

/// Chat screen: message log on top, input line, one-row status bar.
fn render_chat_screen(frame: &mut Frame, app: &App, palette: &Palette) {
    const CHAT_MIN_HEIGHT: u16 = 3;
    const INPUT_HEIGHT: u16 = 3;
    const STATUS_HEIGHT: u16 = 1;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(CHAT_MIN_HEIGHT),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(frame.area());

    let [chat_area, input_area, status_area] = chunks.as_ref() else {
        return;
    };

    chat::render(frame, app, palette, *chat_area);
    input::render(frame, app, palette, *input_area);
    status::render(frame, app, palette, *status_area);
}
