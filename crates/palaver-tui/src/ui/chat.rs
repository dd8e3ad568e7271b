//! Chat log.
//!
//! Displays delivered messages and system notifications, newest at the top.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

use super::Palette;
use crate::app::{App, ChatEntry};

const BORDER_SIZE: u16 = 2;

/// Render the chat log.
pub fn render(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" palaver ")
        .style(Style::default().fg(palette.fg).bg(palette.bg));

    let items: Vec<ListItem> = if app.entries().is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "No messages yet.",
            Style::default().fg(palette.dim),
        )))]
    } else {
        app.entries().iter().map(|entry| entry_line(entry, palette)).collect()
    };

    let visible_height = area.height.saturating_sub(BORDER_SIZE) as usize;
    let visible_items: Vec<_> = items.into_iter().take(visible_height).collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}

/// One chat entry as a styled line.
fn entry_line(entry: &ChatEntry, palette: &Palette) -> ListItem<'static> {
    match entry {
        ChatEntry::System { text } => ListItem::new(Line::from(Span::styled(
            format!("-- {text}"),
            Style::default().fg(palette.dim).add_modifier(Modifier::ITALIC),
        ))),
        ChatEntry::Message { message, mine } => {
            let name_color = if *mine { palette.own } else { palette.accent };
            let name = if message.name.is_empty() { "anonymous" } else { &message.name };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("[{}] ", clock_time(message.timestamp)),
                    Style::default().fg(palette.dim),
                ),
                Span::styled(
                    format!("{name}: "),
                    Style::default().fg(name_color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(message.data.clone(), Style::default().fg(palette.fg)),
            ]))
        },
    }
}

/// Format a unix timestamp as HH:MM:SS (UTC).
fn clock_time(timestamp: u64) -> String {
    let seconds_today = timestamp % 86_400;
    let hours = seconds_today / 3_600;
    let minutes = (seconds_today % 3_600) / 60;
    let seconds = seconds_today % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
