use crate::api::{ApiError, ChatApi, Conversation, Message, NewMessage};
use crate::events::{ChatSnapshot, UserAction, ViewMode};
use std::fmt::Display;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Owns the conversation list, the active conversation and its messages,
/// and the welcome/chat toggle. Every user action is one method.
///
/// Errors never escape: each action records the failure in `error` and
/// leaves state consistent. The only compensating step is deleting a
/// conversation that was created for a first message that then failed.
pub struct ConversationController<A> {
    api: A,
    user_id: String,
    conversations: Vec<Conversation>,
    current: Option<Conversation>,
    messages: Vec<Message>,
    view_mode: ViewMode,
    loading: bool,
    msg_loading: bool,
    error: Option<String>,
    updates: watch::Sender<ChatSnapshot>,
}

impl<A: ChatApi> ConversationController<A> {
    pub fn new(api: A, user_id: impl Into<String>) -> Self {
        let (updates, _) = watch::channel(ChatSnapshot::default());
        Self {
            api,
            user_id: user_id.into(),
            conversations: Vec::new(),
            current: None,
            messages: Vec::new(),
            view_mode: ViewMode::Welcome,
            loading: false,
            msg_loading: false,
            error: None,
            updates,
        }
    }

    /// Receive a fresh snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.updates.subscribe()
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            conversations: self.conversations.clone(),
            current: self.current.clone(),
            messages: self.messages.clone(),
            view_mode: self.view_mode,
            loading: self.loading,
            msg_loading: self.msg_loading,
            error: self.error.clone(),
        }
    }

    #[cfg(test)]
    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn current(&self) -> Option<&Conversation> {
        self.current.as_ref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[cfg(test)]
    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[cfg(test)]
    pub fn disable_interaction(&self) -> bool {
        self.loading || self.msg_loading
    }

    /// Route a view action to its handler.
    pub async fn dispatch(&mut self, action: UserAction) {
        match action {
            UserAction::Send { content } => self.send_message(&content).await,
            UserAction::InitialMessage { content } => self.initial_message(&content).await,
            UserAction::Select { id } => self.select_by_id(&id).await,
            UserAction::Open { id } => self.open_conversation(&id).await,
            UserAction::NewChat => self.new_chat().await,
            UserAction::Delete { id } => self.delete_conversation(&id).await,
            UserAction::Rename { id, title } => self.rename_chat(&id, &title).await,
            UserAction::Note { content } => self.append_note(&content).await,
            UserAction::Refresh => self.fetch_conversations().await,
            UserAction::ShowWelcome => self.show_welcome(),
            UserAction::DismissError => self.dismiss_error(),
        }
    }

    /// Replace the conversation list with the server's.
    pub async fn fetch_conversations(&mut self) {
        self.set_loading(true);
        if let Err(err) = self.refresh_list().await {
            self.record_error(err);
        }
        self.set_loading(false);
    }

    /// Make `conversation` active and load its messages.
    ///
    /// Ignored when the conversation has no id. Message state is only
    /// replaced once the load succeeds.
    pub async fn select_conversation(&mut self, conversation: Conversation) {
        if !conversation.has_id() {
            return;
        }

        info!(conversation_id = %conversation.id, "selecting conversation");
        let id = conversation.id.clone();
        self.current = Some(conversation);
        self.view_mode = ViewMode::Chat;
        self.set_msg_loading(true);

        match self.api.get_messages(&id).await {
            Ok(messages) => self.messages = messages,
            Err(err) => self.record_error(err),
        }

        self.set_msg_loading(false);
    }

    /// Select a conversation from the current list by id.
    pub async fn select_by_id(&mut self, id: &str) {
        let Some(conversation) = self.conversations.iter().find(|c| c.id == id).cloned() else {
            return;
        };
        self.select_conversation(conversation).await;
    }

    /// Fetch a single conversation from the server and select it.
    pub async fn open_conversation(&mut self, id: &str) {
        self.set_loading(true);
        match self.api.get_conversation(id).await {
            Ok(conversation) => self.select_conversation(conversation).await,
            Err(err) => self.record_error(err),
        }
        self.set_loading(false);
    }

    /// Create an empty conversation, refresh the list and select it.
    pub async fn new_chat(&mut self) {
        self.set_loading(true);

        let title = self.default_title();
        info!(%title, "creating conversation");
        match self.create_and_refresh(&title).await {
            Ok(conversation) => self.select_conversation(conversation).await,
            Err(err) => self.record_error(err),
        }

        self.set_loading(false);
    }

    async fn create_and_refresh(&mut self, title: &str) -> Result<Conversation, ApiError> {
        let conversation = self.api.create_conversation(&self.user_id, title).await?;
        self.refresh_list().await?;
        Ok(conversation)
    }

    /// Send a message. Without an active conversation one is created first
    /// and removed again if the message cannot be delivered.
    pub async fn send_message(&mut self, content: &str) {
        let Some(id) = self.current.as_ref().map(|c| c.id.clone()) else {
            self.start_conversation(content, false).await;
            return;
        };

        info!(conversation_id = %id, "sending message");
        self.set_msg_loading(true);
        match self.deliver(&id, content).await {
            Ok(messages) => self.messages = messages,
            Err(err) => self.record_error(err),
        }
        self.set_msg_loading(false);
    }

    /// First message typed on the welcome screen.
    pub async fn initial_message(&mut self, content: &str) {
        self.start_conversation(content, true).await;
    }

    /// Optimistically create a conversation, make it active and send
    /// `content` to it. On failure the new conversation is deleted again.
    async fn start_conversation(&mut self, content: &str, switch_view_first: bool) {
        if switch_view_first {
            self.view_mode = ViewMode::Chat;
            self.publish();
        }

        let title = self.default_title();
        info!(%title, "starting conversation with first message");
        let conversation = match self.api.create_conversation(&self.user_id, &title).await {
            Ok(conversation) => conversation,
            Err(err) => {
                self.record_error(err);
                if self.current.is_none() {
                    self.view_mode = ViewMode::Welcome;
                    self.publish();
                }
                return;
            }
        };

        let id = conversation.id.clone();
        self.current = Some(conversation.clone());
        self.view_mode = ViewMode::Chat;
        self.set_msg_loading(true);

        match self.deliver(&id, content).await {
            Ok(messages) => {
                self.messages = messages;
                if !self.conversations.iter().any(|c| c.id == id) {
                    self.conversations.push(conversation);
                }
            }
            Err(err) => {
                self.record_error(err);
                self.roll_back(&id).await;
            }
        }

        self.set_msg_loading(false);
    }

    /// Send then reload; messages are returned only if both succeed.
    async fn deliver(&self, conversation_id: &str, content: &str) -> Result<Vec<Message>, ApiError> {
        self.api
            .chat_with_llm(conversation_id, &self.user_id, content)
            .await?;
        self.api.get_messages(conversation_id).await
    }

    async fn roll_back(&mut self, conversation_id: &str) {
        warn!(%conversation_id, "first message failed, deleting new conversation");
        if let Err(err) = self.api.delete_conversation(conversation_id).await {
            error!(%conversation_id, operation = err.operation(), error = %err, "rollback delete failed");
            self.record_error(err);
        }
        if let Err(err) = self.refresh_list().await {
            self.record_error(err);
        }

        self.current = None;
        self.messages.clear();
        self.view_mode = ViewMode::Welcome;
        self.publish();
    }

    /// Delete a conversation on the server, then drop it locally.
    pub async fn delete_conversation(&mut self, id: &str) {
        self.set_loading(true);
        info!(conversation_id = %id, "deleting conversation");
        let deleted = self.api.delete_conversation(id).await;
        self.set_loading(false);

        match deleted {
            Ok(()) => self.delete_chat(id).await,
            Err(err) => self.record_error(err),
        }
    }

    /// Refresh the list and forget `id` locally. Leaves the welcome screen
    /// showing if `id` was the active conversation.
    pub async fn delete_chat(&mut self, id: &str) {
        self.set_loading(true);
        if let Err(err) = self.refresh_list().await {
            self.record_error(err);
        }

        self.conversations.retain(|c| c.id != id);
        if self.current_id() == Some(id) {
            self.current = None;
            self.messages.clear();
            self.view_mode = ViewMode::Welcome;
        }
        self.set_loading(false);
    }

    /// Refresh the list and change the title locally. The new title is not
    /// sent to the server.
    pub async fn rename_chat(&mut self, id: &str, title: &str) {
        let title = title.trim();
        if title.is_empty() {
            return;
        }

        self.set_loading(true);
        if let Err(err) = self.refresh_list().await {
            self.record_error(err);
        }

        for conversation in self.conversations.iter_mut().filter(|c| c.id == id) {
            conversation.title = title.to_string();
        }
        if let Some(current) = self.current.as_mut().filter(|c| c.id == id) {
            current.title = title.to_string();
        }
        self.set_loading(false);
    }

    /// Store a user message on the active conversation without asking the
    /// model, then reload.
    pub async fn append_note(&mut self, content: &str) {
        let Some(id) = self.current.as_ref().map(|c| c.id.clone()) else {
            self.record_error("Select a conversation before adding a note");
            return;
        };

        self.set_msg_loading(true);
        match self.store_note(&id, content).await {
            Ok(messages) => self.messages = messages,
            Err(err) => self.record_error(err),
        }
        self.set_msg_loading(false);
    }

    async fn store_note(&self, conversation_id: &str, content: &str) -> Result<Vec<Message>, ApiError> {
        let note = NewMessage::user(conversation_id, content);
        self.api.add_message(conversation_id, &note).await?;
        self.api.get_messages(conversation_id).await
    }

    pub fn show_welcome(&mut self) {
        self.view_mode = ViewMode::Welcome;
        self.current = None;
        self.messages.clear();
        self.publish();
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
        self.publish();
    }

    async fn refresh_list(&mut self) -> Result<(), ApiError> {
        let fetched = self.api.list_conversations(&self.user_id).await?;
        let total = fetched.len();
        self.conversations = fetched.into_iter().filter(Conversation::has_id).collect();
        if self.conversations.len() != total {
            warn!(
                dropped = total - self.conversations.len(),
                "server returned conversations without an id"
            );
        }
        self.publish();
        Ok(())
    }

    fn default_title(&self) -> String {
        format!("Conversation {}", self.conversations.len() + 1)
    }

    fn current_id(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.id.as_str())
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
        self.publish();
    }

    fn set_msg_loading(&mut self, loading: bool) {
        self.msg_loading = loading;
        self.publish();
    }

    fn record_error(&mut self, err: impl Display) {
        let message = err.to_string();
        warn!(error = %message, "operation failed");
        self.error = Some(message);
        self.publish();
    }

    fn publish(&self) {
        self.updates.send_replace(self.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::InMemoryApi;

    fn controller(api: InMemoryApi) -> ConversationController<InMemoryApi> {
        ConversationController::new(api, "user1")
    }

    #[tokio::test]
    async fn test_fetch_conversations_mirrors_server() {
        let mut ctrl = controller(InMemoryApi::with_conversations(&["Trip", "Recipes", "Taxes"]));
        ctrl.fetch_conversations().await;

        assert_eq!(ctrl.conversations().len(), 3);
        assert!(ctrl.conversations().iter().all(|c| !c.id.is_empty()));
        assert!(!ctrl.disable_interaction());
        assert!(ctrl.error().is_none());
    }

    #[tokio::test]
    async fn test_fetch_drops_conversations_without_id() {
        let api = InMemoryApi::with_conversations(&["Trip", "Recipes"]);
        let mut orphan = Conversation::new("", "orphan");
        orphan.user_id = Some("user1".to_string());
        api.seed_conversation(orphan);
        let mut ctrl = controller(api);

        ctrl.fetch_conversations().await;

        let titles: Vec<&str> = ctrl.conversations().iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Trip", "Recipes"]);
        assert!(ctrl.conversations().iter().all(Conversation::has_id));
        assert!(ctrl.error().is_none());
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_stale_list() {
        let mut ctrl = controller(InMemoryApi::with_conversations(&["Trip"]));
        ctrl.fetch_conversations().await;
        ctrl.api().fail_on("list_conversations");

        ctrl.fetch_conversations().await;

        assert_eq!(ctrl.conversations().len(), 1);
        assert_eq!(
            ctrl.error(),
            Some("list_conversations failed (500): list_conversations is unavailable")
        );
        assert!(!ctrl.disable_interaction());
    }

    #[tokio::test]
    async fn test_select_without_id_is_ignored() {
        let api = InMemoryApi::with_conversations(&["Trip"]);
        let mut ctrl = controller(api);
        ctrl.fetch_conversations().await;
        let first = ctrl.conversations()[0].clone();
        ctrl.api().seed_message(&first.id, "user", "hello");
        ctrl.select_conversation(first.clone()).await;
        let before = ctrl.snapshot();

        ctrl.select_conversation(Conversation::new("", "ghost")).await;

        assert_eq!(ctrl.snapshot(), before);
        assert_eq!(ctrl.current().map(|c| c.id.as_str()), Some(first.id.as_str()));
        assert_eq!(ctrl.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_select_loads_messages_and_switches_view() {
        let mut ctrl = controller(InMemoryApi::with_conversations(&["Trip"]));
        ctrl.fetch_conversations().await;
        let id = ctrl.conversations()[0].id.clone();
        ctrl.api().seed_message(&id, "user", "where to?");
        ctrl.api().seed_message(&id, "assistant", "Lisbon");

        ctrl.select_by_id(&id).await;

        assert_eq!(ctrl.view_mode(), ViewMode::Chat);
        assert_eq!(ctrl.messages().len(), 2);
        assert_eq!(ctrl.messages()[1].content, "Lisbon");
    }

    #[tokio::test]
    async fn test_select_failure_keeps_previous_messages() {
        let mut ctrl = controller(InMemoryApi::with_conversations(&["A", "B"]));
        ctrl.fetch_conversations().await;
        let a = ctrl.conversations()[0].clone();
        let b = ctrl.conversations()[1].clone();
        ctrl.api().seed_message(&a.id, "user", "from a");
        ctrl.select_conversation(a).await;
        ctrl.api().fail_on("get_messages");

        ctrl.select_conversation(b.clone()).await;

        assert_eq!(ctrl.current().map(|c| c.id.clone()), Some(b.id));
        assert_eq!(ctrl.messages().len(), 1);
        assert!(ctrl.error().is_some());
    }

    #[tokio::test]
    async fn test_new_chat_from_empty_list() {
        let mut ctrl = controller(InMemoryApi::new());
        ctrl.fetch_conversations().await;

        ctrl.new_chat().await;

        assert_eq!(ctrl.conversations().len(), 1);
        assert_eq!(ctrl.conversations()[0].title, "Conversation 1");
        let current = ctrl.current().expect("new chat should be active");
        assert_eq!(current.title, "Conversation 1");
        assert_eq!(current.id, ctrl.conversations()[0].id);
        assert!(ctrl.messages().is_empty());
        assert_eq!(ctrl.view_mode(), ViewMode::Chat);
        assert!(!ctrl.disable_interaction());
    }

    #[tokio::test]
    async fn test_new_chat_title_counts_existing() {
        let mut ctrl = controller(InMemoryApi::with_conversations(&["Trip", "Recipes"]));
        ctrl.fetch_conversations().await;

        ctrl.new_chat().await;

        assert_eq!(ctrl.current().map(|c| c.title.as_str()), Some("Conversation 3"));
    }

    #[tokio::test]
    async fn test_send_without_active_rolls_back_on_chat_failure() {
        let mut ctrl = controller(InMemoryApi::new());
        ctrl.fetch_conversations().await;
        ctrl.api().fail_on("chat_with_llm");

        ctrl.send_message("hello?").await;

        assert!(ctrl.current().is_none());
        assert!(ctrl.messages().is_empty());
        assert_eq!(ctrl.view_mode(), ViewMode::Welcome);
        assert!(ctrl.error().is_some());
        assert!(ctrl.api().calls().contains(&"delete_conversation"));

        ctrl.api().recover();
        ctrl.fetch_conversations().await;
        assert!(ctrl.conversations().is_empty());
        assert!(ctrl.api().conversations().is_empty());
    }

    #[tokio::test]
    async fn test_send_without_active_creates_and_delivers() {
        let mut ctrl = controller(InMemoryApi::new());
        ctrl.fetch_conversations().await;

        ctrl.send_message("hi there").await;

        let current = ctrl.current().expect("conversation should be active").clone();
        assert_eq!(current.title, "Conversation 1");
        assert_eq!(ctrl.view_mode(), ViewMode::Chat);
        let contents: Vec<_> = ctrl.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["hi there", "echo: hi there"]);
        assert_eq!(ctrl.conversations().len(), 1);
        assert!(ctrl.error().is_none());
    }

    #[tokio::test]
    async fn test_send_with_active_keeps_state_on_failure() {
        let mut ctrl = controller(InMemoryApi::with_conversations(&["Trip"]));
        ctrl.fetch_conversations().await;
        let trip = ctrl.conversations()[0].clone();
        ctrl.api().seed_message(&trip.id, "user", "earlier");
        ctrl.select_conversation(trip.clone()).await;
        let messages_before = ctrl.messages().to_vec();
        ctrl.api().fail_on("chat_with_llm");

        ctrl.send_message("again").await;

        assert_eq!(ctrl.current(), Some(&trip));
        assert_eq!(ctrl.messages(), messages_before.as_slice());
        assert!(ctrl.error().is_some());
        assert!(!ctrl.api().calls().contains(&"delete_conversation"));
        assert_eq!(ctrl.api().conversations().len(), 1);
    }

    #[tokio::test]
    async fn test_send_with_active_reload_failure_is_not_partial() {
        let mut ctrl = controller(InMemoryApi::with_conversations(&["Trip"]));
        ctrl.fetch_conversations().await;
        let trip = ctrl.conversations()[0].clone();
        ctrl.select_conversation(trip).await;
        ctrl.api().fail_on("get_messages");

        ctrl.send_message("are you there").await;

        assert!(ctrl.messages().is_empty());
        assert!(!ctrl.disable_interaction());
    }

    #[tokio::test]
    async fn test_initial_message_rolls_back_on_failure() {
        let mut ctrl = controller(InMemoryApi::with_conversations(&["Trip"]));
        ctrl.fetch_conversations().await;
        ctrl.api().fail_on("chat_with_llm");

        ctrl.initial_message("plan a trip").await;

        assert!(ctrl.current().is_none());
        assert_eq!(ctrl.view_mode(), ViewMode::Welcome);
        assert_eq!(ctrl.conversations().len(), 1);
        assert_eq!(ctrl.conversations()[0].title, "Trip");
    }

    #[tokio::test]
    async fn test_initial_message_switches_to_chat() {
        let mut ctrl = controller(InMemoryApi::new());
        let mut updates = ctrl.subscribe();

        ctrl.initial_message("plan a trip").await;

        assert_eq!(ctrl.view_mode(), ViewMode::Chat);
        assert_eq!(ctrl.messages().len(), 2);
        assert!(updates.has_changed().unwrap());
        assert_eq!(*updates.borrow_and_update(), ctrl.snapshot());
    }

    #[tokio::test]
    async fn test_initial_message_create_failure_returns_to_welcome() {
        let mut ctrl = controller(InMemoryApi::new());
        ctrl.api().fail_on("create_conversation");

        ctrl.initial_message("hello").await;

        assert_eq!(ctrl.view_mode(), ViewMode::Welcome);
        assert!(ctrl.current().is_none());
        assert!(ctrl.error().is_some());
        assert!(!ctrl.api().calls().contains(&"chat_with_llm"));
    }

    #[tokio::test]
    async fn test_rollback_delete_failure_still_clears_active() {
        let mut ctrl = controller(InMemoryApi::new());
        ctrl.api().fail_on("chat_with_llm");
        ctrl.api().fail_on("delete_conversation");

        ctrl.send_message("hello").await;

        assert!(ctrl.current().is_none());
        assert_eq!(
            ctrl.error(),
            Some("delete_conversation failed (500): delete_conversation is unavailable")
        );
    }

    #[tokio::test]
    async fn test_delete_active_chat_returns_to_welcome() {
        let mut ctrl = controller(InMemoryApi::with_conversations(&["Trip", "Recipes"]));
        ctrl.fetch_conversations().await;
        let trip = ctrl.conversations()[0].clone();
        ctrl.api().seed_message(&trip.id, "user", "hi");
        ctrl.select_conversation(trip.clone()).await;

        ctrl.delete_chat(&trip.id).await;

        assert!(ctrl.current().is_none());
        assert!(ctrl.messages().is_empty());
        assert_eq!(ctrl.view_mode(), ViewMode::Welcome);
        assert!(ctrl.conversations().iter().all(|c| c.id != trip.id));
    }

    #[tokio::test]
    async fn test_delete_other_chat_keeps_active() {
        let mut ctrl = controller(InMemoryApi::with_conversations(&["Trip", "Recipes"]));
        ctrl.fetch_conversations().await;
        let trip = ctrl.conversations()[0].clone();
        let recipes = ctrl.conversations()[1].clone();
        ctrl.select_conversation(trip.clone()).await;

        ctrl.delete_conversation(&recipes.id).await;

        assert_eq!(ctrl.current(), Some(&trip));
        assert_eq!(ctrl.view_mode(), ViewMode::Chat);
        assert_eq!(ctrl.conversations().len(), 1);
        assert_eq!(ctrl.api().conversations().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_conversation_failure_keeps_list() {
        let mut ctrl = controller(InMemoryApi::with_conversations(&["Trip"]));
        ctrl.fetch_conversations().await;
        let id = ctrl.conversations()[0].id.clone();
        ctrl.api().fail_on("delete_conversation");

        ctrl.delete_conversation(&id).await;

        assert_eq!(ctrl.conversations().len(), 1);
        assert!(ctrl.error().is_some());
    }

    #[tokio::test]
    async fn test_rename_is_local_only() {
        let mut ctrl = controller(InMemoryApi::with_conversations(&["Trip"]));
        ctrl.fetch_conversations().await;
        let trip = ctrl.conversations()[0].clone();
        ctrl.select_conversation(trip.clone()).await;

        ctrl.rename_chat(&trip.id, "  Lisbon 2025 ").await;

        assert_eq!(ctrl.conversations()[0].title, "Lisbon 2025");
        assert_eq!(ctrl.current().map(|c| c.title.as_str()), Some("Lisbon 2025"));
        assert_eq!(ctrl.api().conversations()[0].title, "Trip");

        ctrl.fetch_conversations().await;
        assert_eq!(ctrl.conversations()[0].title, "Trip");
    }

    #[tokio::test]
    async fn test_show_welcome_clears_selection() {
        let mut ctrl = controller(InMemoryApi::with_conversations(&["Trip"]));
        ctrl.fetch_conversations().await;
        let trip = ctrl.conversations()[0].clone();
        ctrl.select_conversation(trip).await;

        ctrl.dispatch(UserAction::ShowWelcome).await;

        assert_eq!(ctrl.view_mode(), ViewMode::Welcome);
        assert!(ctrl.current().is_none());
        assert!(ctrl.messages().is_empty());
    }

    #[tokio::test]
    async fn test_append_note_requires_active_conversation() {
        let mut ctrl = controller(InMemoryApi::new());

        ctrl.append_note("remember milk").await;

        assert!(ctrl.error().is_some());
        assert!(!ctrl.api().calls().contains(&"add_message"));
    }

    #[tokio::test]
    async fn test_append_note_skips_model() {
        let mut ctrl = controller(InMemoryApi::with_conversations(&["Groceries"]));
        ctrl.fetch_conversations().await;
        let id = ctrl.conversations()[0].id.clone();
        ctrl.select_by_id(&id).await;

        ctrl.dispatch(UserAction::Note { content: "remember milk".into() }).await;

        assert_eq!(ctrl.messages().len(), 1);
        assert_eq!(ctrl.messages()[0].role, "user");
        assert!(!ctrl.api().calls().contains(&"chat_with_llm"));
    }

    #[tokio::test]
    async fn test_open_conversation_uses_lookup() {
        let api = InMemoryApi::with_conversations(&["Trip"]);
        let id = api.conversations()[0].id.clone();
        let mut ctrl = controller(api);

        ctrl.open_conversation(&id).await;

        assert_eq!(ctrl.current().map(|c| c.title.as_str()), Some("Trip"));
        assert!(ctrl.api().calls().contains(&"get_conversation"));

        ctrl.open_conversation("missing").await;
        assert_eq!(ctrl.current().map(|c| c.id.as_str()), Some(id.as_str()));
        assert!(ctrl.error().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_dismiss_error() {
        let mut ctrl = controller(InMemoryApi::new());
        ctrl.api().fail_on("list_conversations");
        ctrl.fetch_conversations().await;
        assert!(ctrl.error().is_some());

        ctrl.dispatch(UserAction::DismissError).await;

        assert!(ctrl.error().is_none());
    }
}
