//! Gateway to the remote conversation service

pub mod client;
pub mod error;
#[cfg(test)]
pub mod testing;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use client::HttpChatApi;
pub use error::{ApiError, ApiResult};

/// A conversation as known to the client.
///
/// The server may name the identifier either `id` or `_id`; both are folded
/// into [`Conversation::id`] while decoding, so nothing past this module has
/// to care which one was sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawConversation")]
pub struct Conversation {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Conversation {
    #[cfg(test)]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            user_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }
}

#[derive(Deserialize)]
struct RawConversation {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "_id")]
    underscore_id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

impl From<RawConversation> for Conversation {
    fn from(raw: RawConversation) -> Self {
        Self {
            id: canonical_id(raw.id, raw.underscore_id).unwrap_or_default(),
            title: raw.title.unwrap_or_default(),
            user_id: raw.user_id,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        }
    }
}

/// A single stored turn. Role and content are passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawMessage")]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Deserialize)]
struct RawMessage {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "_id")]
    underscore_id: Option<String>,
    #[serde(default)]
    conversation_id: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

impl From<RawMessage> for Message {
    fn from(raw: RawMessage) -> Self {
        Self {
            id: canonical_id(raw.id, raw.underscore_id),
            conversation_id: raw.conversation_id,
            role: raw.role.unwrap_or_default(),
            content: raw.content.unwrap_or_default(),
            created_at: raw.created_at,
        }
    }
}

fn canonical_id(id: Option<String>, underscore_id: Option<String>) -> Option<String> {
    id.filter(|id| !id.is_empty())
        .or(underscore_id.filter(|id| !id.is_empty()))
}

/// Body for appending a message without going through the model.
#[derive(Debug, Clone, Serialize)]
pub struct NewMessage {
    pub conversation_id: String,
    pub role: String,
    pub content: String,
}

impl NewMessage {
    pub fn user(conversation_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Remote operations the chat client depends on.
///
/// Every call is independently fallible; callers decide how to reconcile
/// their own state when one fails.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn create_conversation(&self, user_id: &str, title: &str) -> ApiResult<Conversation>;

    async fn list_conversations(&self, user_id: &str) -> ApiResult<Vec<Conversation>>;

    async fn get_conversation(&self, conversation_id: &str) -> ApiResult<Conversation>;

    async fn delete_conversation(&self, conversation_id: &str) -> ApiResult<()>;

    async fn get_messages(&self, conversation_id: &str) -> ApiResult<Vec<Message>>;

    async fn add_message(&self, conversation_id: &str, message: &NewMessage) -> ApiResult<()>;

    /// Sends a user turn to the model. The server stores both the user turn
    /// and the reply; nothing is returned to the caller.
    async fn chat_with_llm(
        &self,
        conversation_id: &str,
        user_id: &str,
        content: &str,
    ) -> ApiResult<()>;

    async fn health(&self) -> ApiResult<()>;
}
