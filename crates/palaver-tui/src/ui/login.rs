//! Login screen.
//!
//! Centered nickname prompt shown before the chat session starts.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::Palette;
use crate::app::App;

const BOX_WIDTH: u16 = 44;
const BOX_HEIGHT: u16 = 5;

/// Render the login screen.
#[allow(clippy::cast_possible_truncation)]
pub fn render(frame: &mut Frame, app: &App, palette: &Palette) {
    let area = frame.area();
    frame.render_widget(
        Block::default().style(Style::default().fg(palette.fg).bg(palette.bg)),
        area,
    );

    let prompt_area = centered_box(area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Choose a nickname ")
        .style(Style::default().fg(palette.fg).bg(palette.bg));

    let lines = vec![
        Line::from(vec![
            Span::raw("> "),
            Span::styled(
                app.input_buffer().to_string(),
                Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(
            "Enter joins, Esc quits",
            Style::default().fg(palette.dim),
        )),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), prompt_area);

    let cursor_x = prompt_area
        .x
        .saturating_add(3)
        .saturating_add(app.input_cursor_column() as u16)
        .min(prompt_area.x.saturating_add(prompt_area.width).saturating_sub(2));
    frame.set_cursor_position((cursor_x, prompt_area.y.saturating_add(1)));
}

/// Center a fixed-size box in the terminal.
fn centered_box(area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(BOX_HEIGHT),
            Constraint::Fill(1),
        ])
        .split(area);

    let middle = vertical.get(1).copied().unwrap_or(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(BOX_WIDTH),
            Constraint::Fill(1),
        ])
        .split(middle);

    horizontal.get(1).copied().unwrap_or(middle)
}
