//! In-memory [`ChatApi`] used by the controller and CLI tests

use crate::api::{ApiError, ApiResult, ChatApi, Conversation, Message, NewMessage};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
struct ServerState {
    conversations: Vec<Conversation>,
    messages: HashMap<String, Vec<Message>>,
    failing: HashSet<&'static str>,
    calls: Vec<&'static str>,
    next_id: u64,
}

/// Fake server. Operations listed via [`InMemoryApi::fail_on`] return a
/// 500 until [`InMemoryApi::recover`] is called.
#[derive(Default)]
pub struct InMemoryApi {
    state: Mutex<ServerState>,
}

impl InMemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conversations(titles: &[&str]) -> Self {
        let api = Self::new();
        {
            let mut state = api.state.lock().unwrap();
            for title in titles {
                let id = Self::allocate_id(&mut state);
                let mut conversation = Conversation::new(id.clone(), *title);
                conversation.user_id = Some("user1".to_string());
                state.conversations.push(conversation);
                state.messages.insert(id, Vec::new());
            }
        }
        api
    }

    pub fn fail_on(&self, operation: &'static str) {
        self.state.lock().unwrap().failing.insert(operation);
    }

    pub fn recover(&self) {
        self.state.lock().unwrap().failing.clear();
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        self.state.lock().unwrap().conversations.clone()
    }

    /// Store a conversation exactly as given, id included.
    pub fn seed_conversation(&self, conversation: Conversation) {
        let mut state = self.state.lock().unwrap();
        state.messages.entry(conversation.id.clone()).or_default();
        state.conversations.push(conversation);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn seed_message(&self, conversation_id: &str, role: &str, content: &str) {
        let mut state = self.state.lock().unwrap();
        let message = Self::build_message(&mut state, conversation_id, role, content);
        state
            .messages
            .entry(conversation_id.to_string())
            .or_default()
            .push(message);
    }

    fn allocate_id(state: &mut ServerState) -> String {
        state.next_id += 1;
        format!("{:024x}", state.next_id)
    }

    fn build_message(state: &mut ServerState, conversation_id: &str, role: &str, content: &str) -> Message {
        Message {
            id: Some(Self::allocate_id(state)),
            conversation_id: Some(conversation_id.to_string()),
            role: role.to_string(),
            content: content.to_string(),
            created_at: Some("2024-05-01T10:00:00".to_string()),
        }
    }

    fn begin(&self, operation: &'static str) -> ApiResult<std::sync::MutexGuard<'_, ServerState>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(operation);
        if state.failing.contains(operation) {
            return Err(ApiError::Status {
                operation,
                status: 500,
                message: format!("{} is unavailable", operation),
            });
        }
        Ok(state)
    }

    fn not_found(operation: &'static str) -> ApiError {
        ApiError::Status {
            operation,
            status: 404,
            message: "Conversation not found".to_string(),
        }
    }
}

#[async_trait]
impl ChatApi for InMemoryApi {
    async fn create_conversation(&self, user_id: &str, title: &str) -> ApiResult<Conversation> {
        let mut state = self.begin("create_conversation")?;
        let id = Self::allocate_id(&mut state);
        let mut conversation = Conversation::new(id.clone(), title);
        conversation.user_id = Some(user_id.to_string());
        state.conversations.push(conversation.clone());
        state.messages.insert(id, Vec::new());
        Ok(conversation)
    }

    async fn list_conversations(&self, user_id: &str) -> ApiResult<Vec<Conversation>> {
        let state = self.begin("list_conversations")?;
        Ok(state
            .conversations
            .iter()
            .filter(|c| c.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect())
    }

    async fn get_conversation(&self, conversation_id: &str) -> ApiResult<Conversation> {
        let state = self.begin("get_conversation")?;
        state
            .conversations
            .iter()
            .find(|c| c.id == conversation_id)
            .cloned()
            .ok_or_else(|| Self::not_found("get_conversation"))
    }

    async fn delete_conversation(&self, conversation_id: &str) -> ApiResult<()> {
        let mut state = self.begin("delete_conversation")?;
        state.conversations.retain(|c| c.id != conversation_id);
        state.messages.remove(conversation_id);
        Ok(())
    }

    async fn get_messages(&self, conversation_id: &str) -> ApiResult<Vec<Message>> {
        let state = self.begin("get_messages")?;
        Ok(state.messages.get(conversation_id).cloned().unwrap_or_default())
    }

    async fn add_message(&self, conversation_id: &str, message: &NewMessage) -> ApiResult<()> {
        let mut state = self.begin("add_message")?;
        if !state.messages.contains_key(conversation_id) {
            return Err(Self::not_found("add_message"));
        }
        let stored = Self::build_message(&mut state, conversation_id, &message.role, &message.content);
        if let Some(messages) = state.messages.get_mut(conversation_id) {
            messages.push(stored);
        }
        Ok(())
    }

    async fn chat_with_llm(
        &self,
        conversation_id: &str,
        _user_id: &str,
        content: &str,
    ) -> ApiResult<()> {
        let mut state = self.begin("chat_with_llm")?;
        if !state.messages.contains_key(conversation_id) {
            return Err(Self::not_found("chat_with_llm"));
        }
        let user = Self::build_message(&mut state, conversation_id, "user", content);
        let reply = Self::build_message(
            &mut state,
            conversation_id,
            "assistant",
            &format!("echo: {}", content),
        );
        if let Some(messages) = state.messages.get_mut(conversation_id) {
            messages.push(user);
            messages.push(reply);
        }
        Ok(())
    }

    async fn health(&self) -> ApiResult<()> {
        self.begin("health")?;
        Ok(())
    }
}
