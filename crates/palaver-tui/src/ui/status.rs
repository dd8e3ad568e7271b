//! Status bar.
//!
//! Shows the nickname, server host, and the most recent system notification.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use super::Palette;
use crate::app::App;

/// Render the status bar.
pub fn render(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let notice = app.last_notice().unwrap_or("Starting...");

    let status_line = Line::from(vec![
        Span::raw(" "),
        Span::styled(
            app.nickname().to_string(),
            Style::default().fg(palette.own).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" @ {} | ", app.server_addr())),
        Span::raw(notice.to_string()),
        Span::raw(" | Ctrl-T theme, Esc quit"),
    ]);

    let paragraph =
        Paragraph::new(status_line).style(Style::default().bg(palette.bar).fg(palette.fg));

    frame.render_widget(paragraph, area);
}
