pub mod app;
pub mod conversation;
pub mod sidebar;
pub mod welcome;

use crate::api::HttpChatApi;
use crate::config::Config;
use crate::controller::ConversationController;
use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::Stdout;
use tokio::sync::mpsc;

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Run the interactive client until the user quits
pub async fn run(config: Config) -> Result<()> {
    let api = HttpChatApi::from_config(&config).context("Failed to set up API client")?;
    let controller = ConversationController::new(api, config.user_id.clone());
    tracing::info!(api = %config.api_base_url, user = %config.user_id, "starting TUI");

    let updates = controller.subscribe();
    let (actions, action_rx) = mpsc::unbounded_channel();
    let worker = app::spawn_worker(controller, action_rx);

    let mut terminal = setup_terminal()?;
    let result = app::App::new(actions, &config).run(&mut terminal, updates).await;
    restore_terminal(&mut terminal)?;

    // Cancels any action still waiting on the server.
    worker.abort();
    result
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}
