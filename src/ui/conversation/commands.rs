use std::str::FromStr;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Start an empty conversation
    New,
    /// Open a conversation by id
    Open,
    /// Rename the active conversation
    Rename,
    /// Delete the active conversation
    Delete,
    /// Store a message without asking the model
    Note,
    /// Reload the conversation list
    Refresh,
    /// Return to the welcome screen
    Welcome,
    /// Show help
    Help,
    /// Exit the application
    Quit,
}

pub fn command_entries() -> Vec<CommandEntry> {
    SlashCommand::iter()
        .map(|command| CommandEntry {
            command,
            keyword: command.command(),
            description: command.description(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: SlashCommand,
    pub argument: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEntry {
    pub command: SlashCommand,
    pub keyword: &'static str,
    pub description: &'static str,
}

impl ParsedCommand {
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::New => "start a new conversation",
            SlashCommand::Open => "open a conversation by id: /open <id>",
            SlashCommand::Rename => "rename the active conversation: /rename <title>",
            SlashCommand::Delete => "delete the active conversation",
            SlashCommand::Note => "store a message without a reply: /note <text>",
            SlashCommand::Refresh => "reload the conversation list",
            SlashCommand::Welcome => "return to the welcome screen",
            SlashCommand::Help => "show available commands",
            SlashCommand::Quit => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }

    /// Whether the command must wait until no request is in flight.
    pub fn needs_idle(self) -> bool {
        !matches!(
            self,
            SlashCommand::Help | SlashCommand::Quit | SlashCommand::Welcome
        )
    }
}

/// Return all built-in commands in a Vec paired with their command string.
pub fn built_in_slash_commands() -> Vec<(&'static str, SlashCommand)> {
    SlashCommand::iter().map(|c| (c.command(), c)).collect()
}

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<ParsedCommand> {
    let body = input.trim_start().strip_prefix('/')?.trim_start();
    let head = body.split_whitespace().next()?;
    let remainder = body[head.len()..].trim();

    let command = SlashCommand::from_str(&head.to_lowercase())
        .ok()
        .or_else(|| match head.to_lowercase().as_str() {
            "q" | "bye" | "exit" => Some(SlashCommand::Quit),
            "n" => Some(SlashCommand::New),
            "o" => Some(SlashCommand::Open),
            "rm" | "del" => Some(SlashCommand::Delete),
            "mv" => Some(SlashCommand::Rename),
            "home" | "w" => Some(SlashCommand::Welcome),
            "r" | "reload" => Some(SlashCommand::Refresh),
            "h" | "?" => Some(SlashCommand::Help),
            _ => None,
        })?;

    let argument = (!remainder.is_empty()).then(|| remainder.to_string());

    Some(ParsedCommand { command, argument })
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("Available commands:\n\n");
    for (command_str, command) in built_in_slash_commands() {
        help.push_str(&format!("/{} - {}\n", command_str, command.description()));
    }

    help.push_str("\nAliases: /q for /quit, /n for /new, /rm for /delete, /mv for /rename, /w for /welcome");
    help.push_str("\nKeys: Tab switches focus, Ctrl+B toggles the sidebar, PageUp/PageDown scroll, Esc dismisses errors, Ctrl+C quits.");
    help.push_str("\nSidebar: Enter opens, n new, d delete, e rename, w welcome, r refresh, s hide.");

    help
}
