use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

/// Landing screen shown while no conversation is active
pub struct WelcomeView {
    conversation_count: usize,
}

impl WelcomeView {
    pub fn new(conversation_count: usize) -> Self {
        Self { conversation_count }
    }
}

impl Widget for WelcomeView {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let history_hint = match self.conversation_count {
            0 => "No conversations yet.".to_string(),
            1 => "1 conversation in the sidebar.".to_string(),
            n => format!("{} conversations in the sidebar.", n),
        };

        let lines = vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                "⚡ Welcome to chatdeck",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            Line::from(vec![Span::styled(
                "Type a message below to start a new conversation.",
                Style::default().fg(Color::Gray),
            )]),
            Line::from(vec![Span::styled(history_hint, Style::default().fg(Color::Gray))]),
            Line::from(""),
            Line::from(vec![Span::styled(
                "Tab switches to the sidebar · /help lists commands",
                Style::default().fg(Color::DarkGray),
            )]),
        ];

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL))
            .render(area, buf);
    }
}
