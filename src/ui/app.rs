use crate::api::ChatApi;
use crate::config::Config;
use crate::controller::ConversationController;
use crate::events::{ChatSnapshot, UserAction, ViewMode};
use crate::ui::conversation::{
    get_help_text, ComposerResult, ConversationComposer, ConversationHistory, ParsedCommand, SlashCommand,
};
use crate::ui::sidebar::{Sidebar, SidebarAction};
use crate::ui::welcome::WelcomeView;
use crate::ui::Tui;
use anyhow::{Context, Result};
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tracing::debug;

const WELCOME_LABEL: &str = "new conversation";
const WELCOME_PLACEHOLDER: &str = "Ask anything to start a new conversation...";
const CHAT_LABEL: &str = "message input";
const CHAT_PLACEHOLDER: &str = "Type a message, / for commands...";

/// Run controller actions one at a time, in the order they were raised.
pub fn spawn_worker<A: ChatApi + 'static>(
    mut controller: ConversationController<A>,
    mut actions: mpsc::UnboundedReceiver<UserAction>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(action) = actions.recv().await {
            debug!(?action, "running action");
            controller.dispatch(action).await;
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Sidebar,
    Composer,
}

/// Interactive front end. Reads state snapshots, raises actions.
pub struct App {
    actions: mpsc::UnboundedSender<UserAction>,
    snapshot: ChatSnapshot,
    focus: Focus,
    sidebar: Sidebar,
    sidebar_open: bool,
    composer: ConversationComposer,
    pending_rename: Option<String>,
    show_help: bool,
    scroll_back: usize,
    banner: Option<(String, Instant)>,
    hint: Option<(String, Instant)>,
    banner_ttl: Duration,
    should_quit: bool,
}

impl App {
    pub fn new(actions: mpsc::UnboundedSender<UserAction>, config: &Config) -> Self {
        let mut composer = ConversationComposer::new(WELCOME_LABEL, WELCOME_PLACEHOLDER);
        composer.set_focus(true);

        Self {
            actions,
            snapshot: ChatSnapshot::default(),
            focus: Focus::Composer,
            sidebar: Sidebar::new(),
            sidebar_open: config.ui.sidebar_open,
            composer,
            pending_rename: None,
            show_help: false,
            scroll_back: 0,
            banner: None,
            hint: None,
            banner_ttl: Duration::from_secs(config.ui.error_banner_secs.max(1)),
            should_quit: false,
        }
    }

    pub async fn run(
        mut self,
        terminal: &mut Tui,
        mut updates: watch::Receiver<ChatSnapshot>,
    ) -> Result<()> {
        let mut events = EventStream::new();
        let mut tick = tokio::time::interval(Duration::from_millis(250));

        self.raise(UserAction::Refresh);

        while !self.should_quit {
            terminal
                .draw(|frame| self.draw(frame))
                .context("Failed to draw frame")?;

            tokio::select! {
                event = events.next() => match event {
                    Some(Ok(event)) => self.handle_event(event),
                    Some(Err(e)) => return Err(e).context("Failed to read terminal event"),
                    None => break,
                },
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = updates.borrow_and_update().clone();
                    self.apply_snapshot(snapshot);
                },
                _ = tick.tick() => self.expire_banner(),
            }
        }

        Ok(())
    }

    fn raise(&self, action: UserAction) {
        if self.actions.send(action).is_err() {
            tracing::error!("controller worker has stopped");
        }
    }

    fn apply_snapshot(&mut self, snapshot: ChatSnapshot) {
        let selection_changed = snapshot.current_id() != self.snapshot.current_id();
        let messages_changed = snapshot.messages.len() != self.snapshot.messages.len();

        match (&snapshot.error, &self.banner) {
            (None, _) => self.banner = None,
            (Some(error), Some((shown, _))) if error == shown => {}
            (Some(error), _) => self.banner = Some((error.clone(), Instant::now())),
        }

        self.snapshot = snapshot;
        if selection_changed {
            self.sidebar.follow(&self.snapshot);
            self.pending_rename = None;
        }
        if selection_changed || messages_changed {
            self.scroll_back = 0;
        }

        self.composer.set_disabled(self.snapshot.disable_interaction());
        match self.snapshot.view_mode {
            ViewMode::Welcome => self.composer.set_label(WELCOME_LABEL, WELCOME_PLACEHOLDER),
            ViewMode::Chat => self.composer.set_label(CHAT_LABEL, CHAT_PLACEHOLDER),
        }
    }

    fn expire_banner(&mut self) {
        if let Some((_, since)) = &self.banner {
            if since.elapsed() >= self.banner_ttl {
                self.raise(UserAction::DismissError);
                self.banner = None;
            }
        }
        if let Some((_, since)) = &self.hint {
            if since.elapsed() >= self.banner_ttl {
                self.hint = None;
            }
        }
    }

    fn set_focus(&mut self, focus: Focus) {
        self.focus = if self.sidebar_open { focus } else { Focus::Composer };
        self.composer.set_focus(self.focus == Focus::Composer);
    }

    fn handle_event(&mut self, event: Event) {
        if let Event::Key(key) = event {
            if key.kind == KeyEventKind::Press {
                self.handle_key(key);
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.show_help {
            self.show_help = false;
            return;
        }
        if ctrl && key.code == KeyCode::Char('b') {
            self.sidebar_open = !self.sidebar_open;
            self.set_focus(self.focus);
            return;
        }

        match key.code {
            KeyCode::Tab if self.sidebar_open && self.composer.palette_height() == 0 => {
                let next = match self.focus {
                    Focus::Sidebar => Focus::Composer,
                    Focus::Composer => Focus::Sidebar,
                };
                self.set_focus(next);
                return;
            }
            KeyCode::Esc if self.banner.is_some() && self.composer.palette_height() == 0 => {
                self.banner = None;
                self.raise(UserAction::DismissError);
                return;
            }
            KeyCode::Esc if self.hint.is_some() && self.composer.palette_height() == 0 => {
                self.hint = None;
                return;
            }
            KeyCode::PageUp => {
                self.scroll_back = self.scroll_back.saturating_add(5);
                return;
            }
            KeyCode::PageDown => {
                self.scroll_back = self.scroll_back.saturating_sub(5);
                return;
            }
            _ => {}
        }

        match self.focus {
            Focus::Sidebar => {
                let action = self.sidebar.handle_key(key, &self.snapshot);
                self.handle_sidebar_action(action);
            }
            Focus::Composer => {
                let result = self.composer.handle_key(key);
                self.handle_composer_result(result);
                // A rename target only lives as long as its prefilled command
                if !self.composer.content().starts_with("/rename") {
                    self.pending_rename = None;
                }
            }
        }
    }

    /// Network actions are dropped while a request is in flight.
    fn raise_when_idle(&self, action: UserAction) {
        if action.needs_network() && self.snapshot.disable_interaction() {
            debug!(?action, "ignoring action while busy");
            return;
        }
        self.raise(action);
    }

    fn handle_sidebar_action(&mut self, action: SidebarAction) {
        match action {
            SidebarAction::None => {}
            SidebarAction::Select(id) => self.raise_when_idle(UserAction::Select { id }),
            SidebarAction::NewChat => self.raise_when_idle(UserAction::NewChat),
            SidebarAction::Delete(id) => self.raise_when_idle(UserAction::Delete { id }),
            SidebarAction::Refresh => self.raise_when_idle(UserAction::Refresh),
            SidebarAction::ShowWelcome => self.raise_when_idle(UserAction::ShowWelcome),
            SidebarAction::StartRename { id, title } => {
                self.pending_rename = Some(id);
                self.composer.set_content(format!("/rename {}", title));
                self.set_focus(Focus::Composer);
            }
            SidebarAction::Hide => {
                self.sidebar_open = false;
                self.set_focus(Focus::Composer);
            }
        }
    }

    fn handle_composer_result(&mut self, result: ComposerResult) {
        let busy = self.snapshot.disable_interaction();
        match result {
            ComposerResult::None => {}
            ComposerResult::Submitted(content) if busy => self.composer.set_content(content),
            ComposerResult::Submitted(content) => {
                self.scroll_back = 0;
                let action = match self.snapshot.view_mode {
                    ViewMode::Welcome => UserAction::InitialMessage { content },
                    ViewMode::Chat => UserAction::Send { content },
                };
                self.raise_when_idle(action);
            }
            ComposerResult::Command(parsed) if busy && parsed.command.needs_idle() => {
                let restored = match parsed.argument() {
                    Some(argument) => format!("/{} {}", parsed.command.command(), argument),
                    None => format!("/{}", parsed.command.command()),
                };
                self.composer.set_content(restored);
            }
            ComposerResult::Command(parsed) => self.handle_command(parsed),
        }
    }

    fn handle_command(&mut self, parsed: ParsedCommand) {
        let argument = parsed.argument().map(str::to_string);
        let current = self.snapshot.current_id().map(str::to_string);

        match parsed.command {
            SlashCommand::New => self.raise_when_idle(UserAction::NewChat),
            SlashCommand::Open => match argument {
                Some(id) => self.raise_when_idle(UserAction::Open { id }),
                None => self.show_hint("Usage: /open <conversation id>"),
            },
            SlashCommand::Rename => {
                let target = self.pending_rename.take().or(current);
                match (target, argument) {
                    (Some(id), Some(title)) => self.raise_when_idle(UserAction::Rename { id, title }),
                    (None, _) => self.show_hint("Select a conversation to rename"),
                    (_, None) => self.show_hint("Usage: /rename <new title>"),
                }
            }
            SlashCommand::Delete => match current {
                Some(id) => self.raise_when_idle(UserAction::Delete { id }),
                None => self.show_hint("Select a conversation to delete"),
            },
            SlashCommand::Note => match argument {
                Some(content) => self.raise_when_idle(UserAction::Note { content }),
                None => self.show_hint("Usage: /note <text>"),
            },
            SlashCommand::Refresh => self.raise_when_idle(UserAction::Refresh),
            SlashCommand::Welcome => self.raise_when_idle(UserAction::ShowWelcome),
            SlashCommand::Help => self.show_help = true,
            SlashCommand::Quit => self.should_quit = true,
        }
    }

    /// Usage hints are local to the view and never reach the controller.
    fn show_hint(&mut self, hint: &str) {
        self.hint = Some((hint.to_string(), Instant::now()));
    }

    fn draw(&mut self, frame: &mut Frame) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(frame.size());

        let main_area = if self.sidebar_open {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(32), Constraint::Min(20)])
                .split(rows[0]);
            self.sidebar
                .render(frame, columns[0], &self.snapshot, self.focus == Focus::Sidebar);
            columns[1]
        } else {
            rows[0]
        };

        let panes = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(self.composer.desired_height()),
            ])
            .split(main_area);

        match self.snapshot.view_mode {
            ViewMode::Welcome => {
                frame.render_widget(WelcomeView::new(self.snapshot.conversations.len()), panes[0]);
            }
            ViewMode::Chat => {
                let title = self
                    .snapshot
                    .current
                    .as_ref()
                    .map(|c| c.title.as_str())
                    .unwrap_or("New conversation");
                let history = ConversationHistory::new(title, &self.snapshot.messages)
                    .waiting(self.snapshot.msg_loading)
                    .scroll_back(self.scroll_back);
                frame.render_widget(history, panes[0]);
            }
        }

        frame.render_widget(&self.composer, panes[1]);

        let palette_height = self.composer.palette_height().min(panes[0].height);
        if palette_height > 0 {
            let palette_area = Rect {
                x: panes[1].x,
                y: panes[1].y - palette_height,
                width: panes[1].width,
                height: palette_height,
            };
            self.composer.render_palette(palette_area, frame.buffer_mut());
        }

        if let Some((message, _)) = &self.banner {
            render_banner(frame, panes[0], message, "Error · Esc to dismiss", Color::Red);
        } else if let Some((hint, _)) = &self.hint {
            render_banner(frame, panes[0], hint, "Hint", Color::Yellow);
        }

        frame.render_widget(self.status_line(), rows[1]);

        if self.show_help {
            let area = frame.size();
            render_help(frame, area);
        }
    }

    fn status_line(&self) -> Paragraph<'static> {
        let activity = if self.snapshot.msg_loading {
            "waiting for reply"
        } else if self.snapshot.loading {
            "loading"
        } else {
            "ready"
        };

        Paragraph::new(Line::from(vec![
            Span::styled(
                format!(" {} ", self.snapshot.view_mode.display_name()),
                Style::default().fg(Color::Black).bg(Color::Green),
            ),
            Span::styled(format!(" {} ", activity), Style::default().fg(Color::Gray)),
            Span::styled(
                "Tab focus · Ctrl+B sidebar · /help · Ctrl+C quit",
                Style::default().fg(Color::DarkGray),
            ),
        ]))
    }
}

fn render_banner(frame: &mut Frame, area: Rect, message: &str, title: &str, color: Color) {
    let width = (message.chars().count() as u16 + 4).min(area.width.saturating_sub(2)).max(10);
    let height = 3.min(area.height);
    let banner_area = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height + 1),
        width: width.min(area.width),
        height,
    };

    frame.render_widget(Clear, banner_area);
    frame.render_widget(
        Paragraph::new(message.to_string())
            .style(Style::default().fg(color))
            .block(Block::default().borders(Borders::ALL).title(title)),
        banner_area,
    );
}

fn render_help(frame: &mut Frame, area: Rect) {
    let width = area.width.saturating_sub(8).min(80);
    let height = area.height.saturating_sub(4).min(20);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(get_help_text())
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Help · any key to close")),
        popup,
    );
}
