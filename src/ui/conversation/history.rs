//! Message list for the active conversation

use crate::api::Message;
use chrono::{DateTime, NaiveDateTime};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Renders the messages of the active conversation, newest at the bottom.
pub struct ConversationHistory<'a> {
    title: &'a str,
    messages: &'a [Message],
    waiting: bool,
    scroll_back: usize,
}

impl<'a> ConversationHistory<'a> {
    pub fn new(title: &'a str, messages: &'a [Message]) -> Self {
        Self {
            title,
            messages,
            waiting: false,
            scroll_back: 0,
        }
    }

    /// Show the "waiting for reply" line under the last message
    pub fn waiting(mut self, waiting: bool) -> Self {
        self.waiting = waiting;
        self
    }

    /// Number of lines scrolled up from the bottom
    pub fn scroll_back(mut self, lines: usize) -> Self {
        self.scroll_back = lines;
        self
    }

    fn render_message(message: &Message, width: u16) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        let role_icon = match message.role.as_str() {
            "user" => "👤",
            "assistant" => "🤖",
            _ => "⚙️",
        };
        let timestamp = message
            .created_at
            .as_deref()
            .and_then(format_timestamp)
            .unwrap_or_default();
        let header = format!("{} {} {} {}", role_icon, message.role, timestamp, "─".repeat(20));
        lines.push(Line::from(vec![Span::styled(
            header,
            Style::default().fg(Color::DarkGray),
        )]));

        let style = content_style(&message.role);
        for content_line in wrap_text(&message.content, width.saturating_sub(2) as usize) {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(content_line, style),
            ]));
        }

        lines
    }
}

impl Widget for ConversationHistory<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("💬 {}", self.title));
        let inner_area = block.inner(area);
        block.render(area, buf);

        let mut all_lines: Vec<Line> = Vec::new();
        if self.messages.is_empty() && !self.waiting {
            all_lines.push(Line::from(vec![Span::styled(
                "No messages yet. Say something below.",
                Style::default().fg(Color::Gray),
            )]));
        }

        for message in self.messages {
            all_lines.extend(Self::render_message(message, inner_area.width));
            all_lines.push(Line::from(""));
        }

        if self.waiting {
            all_lines.push(Line::from(vec![
                Span::styled("🤖 ", Style::default().fg(Color::Green)),
                Span::styled("waiting for reply", Style::default().fg(Color::Green)),
                Span::styled("...", Style::default().fg(Color::Yellow)),
            ]));
        }

        let height = inner_area.height as usize;
        let total = all_lines.len();
        let end = total.saturating_sub(self.scroll_back).max(height.min(total));
        let start = end.saturating_sub(height);

        for (i, line) in all_lines[start..end].iter().enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}

fn content_style(role: &str) -> Style {
    match role {
        "user" => Style::default().fg(Color::Blue),
        "assistant" => Style::default().fg(Color::Green),
        _ => Style::default().fg(Color::Yellow),
    }
}

/// `HH:MM` for RFC 3339 or naive ISO timestamps
fn format_timestamp(raw: &str) -> Option<String> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.format("%H:%M").to_string());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|parsed| parsed.format("%H:%M").to_string())
}

/// Wrap text to fit within the given width, keeping explicit line breaks
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current_line = String::new();
        let mut current_width = 0;

        for word in paragraph.split_whitespace() {
            let word_width = word.chars().count();
            if current_width > 0 && current_width + 1 + word_width > width {
                lines.push(std::mem::take(&mut current_line));
                current_width = 0;
            }
            if current_width > 0 {
                current_line.push(' ');
                current_width += 1;
            }
            current_line.push_str(word);
            current_width += word_width;
        }

        lines.push(current_line);
    }

    lines
}
