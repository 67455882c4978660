use crate::api::{ApiError, ApiResult, ChatApi, Conversation, Message, NewMessage};
use crate::config::Config;
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tokio::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// JSON-over-HTTP implementation of [`ChatApi`]
#[derive(Clone)]
pub struct HttpChatApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpChatApi {
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::transport("configure client", format!("invalid base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::transport(
                "configure client",
                format!("base URL '{}' cannot hold paths", base_url),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::transport("configure client", e.to_string()))?;

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &Config) -> ApiResult<Self> {
        Self::new(&config.api_base_url, config.request_timeout())
    }

    /// Build `<base>/<segments...>`, escaping each segment.
    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ApiError::transport("build request", "base URL cannot hold paths"))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    /// The health probe lives at the server root, next to the `/api` prefix.
    fn health_url(&self) -> ApiResult<Url> {
        let under_api = self.base_url.path().trim_end_matches('/').ends_with("/api");
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ApiError::transport("build request", "base URL cannot hold paths"))?;
            path.pop_if_empty();
            if under_api {
                path.pop();
            }
            path.push("health");
        }
        Ok(url)
    }

    async fn send(&self, operation: &'static str, request: RequestBuilder) -> ApiResult<Response> {
        let request_id = Uuid::new_v4().to_string();
        debug!(operation, %request_id, "sending request");

        let response = request
            .header("X-Request-Id", &request_id)
            .send()
            .await
            .map_err(|e| ApiError::transport(operation, e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(operation, %request_id, status = status.as_u16(), "request succeeded");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body)
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| "request failed".to_string());
        warn!(operation, %request_id, status = status.as_u16(), %message, "request rejected");

        Err(ApiError::Status {
            operation,
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(operation: &'static str, response: Response) -> ApiResult<T> {
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::transport(operation, e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| ApiError::decode(operation, e.to_string()))
    }
}

/// Pull a readable message out of an error body. FastAPI-style servers put
/// it under `detail`.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
        match json.get("detail") {
            Some(serde_json::Value::String(detail)) => return Some(detail.clone()),
            Some(other) => return Some(other.to_string()),
            None => {}
        }
    }

    Some(trimmed.to_string())
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn create_conversation(&self, user_id: &str, title: &str) -> ApiResult<Conversation> {
        const OP: &str = "create conversation";
        let url = self.endpoint(&["conversations"])?;
        let payload = serde_json::json!({ "user_id": user_id, "title": title });
        let response = self.send(OP, self.client.post(url).json(&payload)).await?;
        Self::decode(OP, response).await
    }

    async fn list_conversations(&self, user_id: &str) -> ApiResult<Vec<Conversation>> {
        const OP: &str = "list conversations";
        let url = self.endpoint(&["conversations"])?;
        let request = self.client.get(url).query(&[("user_id", user_id)]);
        let response = self.send(OP, request).await?;
        Self::decode(OP, response).await
    }

    async fn get_conversation(&self, conversation_id: &str) -> ApiResult<Conversation> {
        const OP: &str = "load conversation";
        let url = self.endpoint(&["conversations", conversation_id])?;
        let response = self.send(OP, self.client.get(url)).await?;
        Self::decode(OP, response).await
    }

    async fn delete_conversation(&self, conversation_id: &str) -> ApiResult<()> {
        const OP: &str = "delete conversation";
        let url = self.endpoint(&["conversations", conversation_id])?;
        self.send(OP, self.client.delete(url)).await?;
        Ok(())
    }

    async fn get_messages(&self, conversation_id: &str) -> ApiResult<Vec<Message>> {
        const OP: &str = "load messages";
        let url = self.endpoint(&["conversations", conversation_id, "messages"])?;
        let response = self.send(OP, self.client.get(url)).await?;
        Self::decode(OP, response).await
    }

    async fn add_message(&self, conversation_id: &str, message: &NewMessage) -> ApiResult<()> {
        const OP: &str = "add message";
        let url = self.endpoint(&["conversations", conversation_id, "messages"])?;
        self.send(OP, self.client.post(url).json(message)).await?;
        Ok(())
    }

    async fn chat_with_llm(
        &self,
        conversation_id: &str,
        user_id: &str,
        content: &str,
    ) -> ApiResult<()> {
        const OP: &str = "chat";
        let url = self.endpoint(&["chat"])?;
        let payload = serde_json::json!({
            "conversation_id": conversation_id,
            "user_id": user_id,
            "content": content,
        });
        self.send(OP, self.client.post(url).json(&payload)).await?;
        Ok(())
    }

    async fn health(&self) -> ApiResult<()> {
        const OP: &str = "health check";
        let url = self.health_url()?;
        self.send(OP, self.client.get(url)).await?;
        Ok(())
    }
}
