//! Conversation list shown on the left

use crate::events::ChatSnapshot;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

/// What the sidebar asks the app to do after a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarAction {
    None,
    Select(String),
    NewChat,
    Delete(String),
    StartRename { id: String, title: String },
    ShowWelcome,
    Refresh,
    Hide,
}

#[derive(Default)]
pub struct Sidebar {
    state: ListState,
}

impl Sidebar {
    pub fn new() -> Self {
        Self::default()
    }

    fn clamp(&mut self, len: usize) {
        match self.state.selected() {
            _ if len == 0 => self.state.select(None),
            Some(index) if index >= len => self.state.select(Some(len - 1)),
            None => self.state.select(Some(0)),
            _ => {}
        }
    }

    #[cfg(test)]
    pub fn selected(&self) -> Option<usize> {
        self.state.selected()
    }

    /// Move the highlight onto the active conversation
    pub fn follow(&mut self, snapshot: &ChatSnapshot) {
        if let Some(current) = snapshot.current_id() {
            if let Some(index) = snapshot.conversations.iter().position(|c| c.id == current) {
                self.state.select(Some(index));
                return;
            }
        }
        self.clamp(snapshot.conversations.len());
    }

    pub fn handle_key(&mut self, key: KeyEvent, snapshot: &ChatSnapshot) -> SidebarAction {
        if key.kind != KeyEventKind::Press {
            return SidebarAction::None;
        }

        let conversations = &snapshot.conversations;
        self.clamp(conversations.len());
        let highlighted = self.state.selected().and_then(|i| conversations.get(i));

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(index) = self.state.selected() {
                    self.state.select(Some(index.saturating_sub(1)));
                }
                SidebarAction::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(index) = self.state.selected() {
                    self.state.select(Some((index + 1).min(conversations.len().saturating_sub(1))));
                }
                SidebarAction::None
            }
            KeyCode::Enter => highlighted
                .map(|c| SidebarAction::Select(c.id.clone()))
                .unwrap_or(SidebarAction::None),
            KeyCode::Char('d') | KeyCode::Delete => highlighted
                .map(|c| SidebarAction::Delete(c.id.clone()))
                .unwrap_or(SidebarAction::None),
            KeyCode::Char('e') => highlighted
                .map(|c| SidebarAction::StartRename {
                    id: c.id.clone(),
                    title: c.title.clone(),
                })
                .unwrap_or(SidebarAction::None),
            KeyCode::Char('n') => SidebarAction::NewChat,
            KeyCode::Char('w') => SidebarAction::ShowWelcome,
            KeyCode::Char('r') => SidebarAction::Refresh,
            KeyCode::Char('s') => SidebarAction::Hide,
            _ => SidebarAction::None,
        }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, snapshot: &ChatSnapshot, focused: bool) {
        self.clamp(snapshot.conversations.len());

        let current = snapshot.current_id();
        let items: Vec<ListItem> = snapshot
            .conversations
            .iter()
            .map(|conversation| {
                let marker = if Some(conversation.id.as_str()) == current { "● " } else { "  " };
                let title = if conversation.title.is_empty() {
                    "(untitled)"
                } else {
                    conversation.title.as_str()
                };
                ListItem::new(Line::from(vec![
                    Span::styled(marker, Style::default().fg(Color::Green)),
                    Span::raw(title.to_string()),
                ]))
            })
            .collect();

        let title = if snapshot.loading {
            "Conversations (loading...)"
        } else {
            "Conversations"
        };
        let border = if snapshot.disable_interaction() {
            Style::default().fg(Color::DarkGray)
        } else if focused {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Gray)
        };

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title).style(border))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("› ");

        frame.render_stateful_widget(list, area, &mut self.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Conversation;
    use crossterm::event::KeyModifiers;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn snapshot() -> ChatSnapshot {
        ChatSnapshot {
            conversations: vec![
                Conversation::new("a", "Trip"),
                Conversation::new("b", "Recipes"),
                Conversation::new("c", "Taxes"),
            ],
            ..ChatSnapshot::default()
        }
    }

    #[test]
    fn test_navigation_stays_in_bounds() {
        let snapshot = snapshot();
        let mut sidebar = Sidebar::new();

        sidebar.handle_key(press(KeyCode::Up), &snapshot);
        assert_eq!(sidebar.selected(), Some(0));
        for _ in 0..5 {
            sidebar.handle_key(press(KeyCode::Down), &snapshot);
        }
        assert_eq!(sidebar.selected(), Some(2));
        assert_eq!(
            sidebar.handle_key(press(KeyCode::Enter), &snapshot),
            SidebarAction::Select("c".to_string())
        );
    }

    #[test]
    fn test_actions_on_highlighted_conversation() {
        let snapshot = snapshot();
        let mut sidebar = Sidebar::new();
        sidebar.handle_key(press(KeyCode::Down), &snapshot);

        assert_eq!(
            sidebar.handle_key(press(KeyCode::Char('d')), &snapshot),
            SidebarAction::Delete("b".to_string())
        );
        assert_eq!(
            sidebar.handle_key(press(KeyCode::Char('e')), &snapshot),
            SidebarAction::StartRename {
                id: "b".to_string(),
                title: "Recipes".to_string()
            }
        );
    }

    #[test]
    fn test_empty_list_has_no_target() {
        let snapshot = ChatSnapshot::default();
        let mut sidebar = Sidebar::new();
        assert_eq!(sidebar.handle_key(press(KeyCode::Enter), &snapshot), SidebarAction::None);
        assert_eq!(sidebar.handle_key(press(KeyCode::Char('n')), &snapshot), SidebarAction::NewChat);
    }

    #[test]
    fn test_follow_tracks_active_conversation() {
        let mut snapshot = snapshot();
        snapshot.current = Some(Conversation::new("c", "Taxes"));
        let mut sidebar = Sidebar::new();

        sidebar.follow(&snapshot);

        assert_eq!(sidebar.selected(), Some(2));
    }
}
