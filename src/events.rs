use crate::api::{Conversation, Message};

/// User actions raised by the views and executed by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// Send a message to the active conversation (or start one)
    Send { content: String },

    /// First message typed on the welcome screen
    InitialMessage { content: String },

    /// Select a conversation from the list
    Select { id: String },

    /// Look a conversation up on the server and select it
    Open { id: String },

    /// Create an empty conversation and select it
    NewChat,

    /// Delete a conversation on the server and drop it locally
    Delete { id: String },

    /// Change a conversation title in the list
    Rename { id: String, title: String },

    /// Append a message without asking the model
    Note { content: String },

    /// Reload the conversation list
    Refresh,

    /// Go back to the welcome screen
    ShowWelcome,

    /// Hide the error banner
    DismissError,
}

impl UserAction {
    /// Whether the action talks to the server and must wait for idle.
    pub fn needs_network(&self) -> bool {
        !matches!(self, UserAction::ShowWelcome | UserAction::DismissError)
    }
}

/// Which main pane is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// No conversation selected yet
    #[default]
    Welcome,
    /// A conversation is open
    Chat,
}

impl ViewMode {
    pub fn display_name(&self) -> &'static str {
        match self {
            ViewMode::Welcome => "Welcome",
            ViewMode::Chat => "Chat",
        }
    }
}

/// Read-only copy of the controller state handed to the views
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatSnapshot {
    pub conversations: Vec<Conversation>,
    pub current: Option<Conversation>,
    pub messages: Vec<Message>,
    pub view_mode: ViewMode,
    pub loading: bool,
    pub msg_loading: bool,
    pub error: Option<String>,
}

impl ChatSnapshot {
    pub fn current_id(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.id.as_str())
    }

    /// Views disable their affordances while any request is in flight.
    pub fn disable_interaction(&self) -> bool {
        self.loading || self.msg_loading
    }
}
