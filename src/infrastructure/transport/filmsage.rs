#[cfg(test)]
#[path = "filmsage_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::domain::models::ChatError;
use crate::domain::models::ChatReply;
use crate::domain::models::ChatReplyPayload;
use crate::domain::models::ChatRequest;
use crate::domain::models::ChatResult;
use crate::domain::models::ChatTransport;
use crate::domain::models::ConversationId;
use crate::domain::models::ConversationSummary;
use crate::domain::models::LoadedConversation;
use crate::domain::models::Message;
use crate::domain::models::SaveRequest;
use crate::domain::models::SaveResponse;

/// REST client for the FilmSage chat backend.
pub struct FilmSageTransport {
    client: reqwest::Client,
    url: String,
    system_preamble: String,
}

impl FilmSageTransport {
    /// `timeout` of `None` leaves requests without a client side deadline.
    pub fn new(
        url: &str,
        timeout: Option<Duration>,
        system_preamble: &str,
    ) -> Result<FilmSageTransport> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        return Ok(FilmSageTransport {
            client: builder.build()?,
            url: url.trim_end_matches('/').to_string(),
            system_preamble: system_preamble.to_string(),
        });
    }

    fn endpoint(&self, path: &str) -> String {
        return format!("{url}{path}", url = self.url);
    }

    async fn check_status(res: reqwest::Response, path: &str) -> ChatResult<reqwest::Response> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let body = res.text().await.unwrap_or_default();
        tracing::error!(
            status = status.as_u16(),
            path,
            body = body.as_str(),
            "FilmSage request failed"
        );

        return Err(ChatError::Status {
            status: status.as_u16(),
            body,
        });
    }

    async fn parse_json<T: DeserializeOwned>(res: reqwest::Response, path: &str) -> ChatResult<T> {
        let bytes = res.bytes().await?;
        return serde_json::from_slice::<T>(&bytes).map_err(|err| {
            tracing::error!(path, error = %err, "FilmSage returned invalid JSON");
            return ChatError::InvalidResponse;
        });
    }

    /// 404s on a specific conversation are reported as `NotFound`.
    async fn check_conversation(
        res: reqwest::Response,
        path: &str,
        id: &ConversationId,
    ) -> ChatResult<reqwest::Response> {
        if res.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::error!(path, conversation_id = %id, "Conversation not found");
            return Err(ChatError::NotFound(id.clone()));
        }

        return FilmSageTransport::check_status(res, path).await;
    }
}

#[async_trait]
impl ChatTransport for FilmSageTransport {
    #[allow(clippy::implicit_return)]
    async fn send_message(
        &self,
        text: &str,
        history: &[Message],
        conversation_id: Option<&ConversationId>,
    ) -> ChatResult<ChatReply> {
        if text.trim().is_empty() {
            return Err(ChatError::Validation("Message is empty".to_string()));
        }

        let path = "/api/chat/chat";
        let req = ChatRequest {
            message: text.to_string(),
            history: history.to_vec(),
            conversation_id: conversation_id.cloned(),
        };
        tracing::debug!(method = "POST", path, history = history.len(), "Sending message");

        let res = self
            .client
            .post(self.endpoint(path))
            .json(&req)
            .send()
            .await?;
        let res = FilmSageTransport::check_status(res, path).await?;
        let payload = FilmSageTransport::parse_json::<ChatReplyPayload>(res, path).await?;

        return payload.into_reply().ok_or_else(|| {
            tracing::error!(path, "Reply had no response text");
            return ChatError::InvalidResponse;
        });
    }

    #[allow(clippy::implicit_return)]
    async fn load_conversation(&self, id: &ConversationId) -> ChatResult<LoadedConversation> {
        let path = format!("/api/chat/conversations/{id}");
        tracing::debug!(method = "GET", path = path.as_str(), "Loading conversation");

        let res = self.client.get(self.endpoint(&path)).send().await?;
        let res = FilmSageTransport::check_conversation(res, &path, id).await?;

        return FilmSageTransport::parse_json::<LoadedConversation>(res, &path).await;
    }

    #[allow(clippy::implicit_return)]
    async fn list_conversations(&self) -> ChatResult<Vec<ConversationSummary>> {
        let path = "/api/chat/conversations";
        tracing::debug!(method = "GET", path, "Listing conversations");

        let res = self.client.get(self.endpoint(path)).send().await?;
        let res = FilmSageTransport::check_status(res, path).await?;

        return FilmSageTransport::parse_json::<Vec<ConversationSummary>>(res, path).await;
    }

    #[allow(clippy::implicit_return)]
    async fn search_conversations(&self, term: &str) -> ChatResult<Vec<ConversationSummary>> {
        let path = "/api/chat-history/search";
        tracing::debug!(method = "GET", path, term, "Searching conversations");

        let res = self
            .client
            .get(self.endpoint(path))
            .query(&[("term", term)])
            .send()
            .await?;
        let res = FilmSageTransport::check_status(res, path).await?;

        return FilmSageTransport::parse_json::<Vec<ConversationSummary>>(res, path).await;
    }

    #[allow(clippy::implicit_return)]
    async fn delete_conversation(&self, id: &ConversationId) -> ChatResult<()> {
        let path = format!("/api/chat/conversations/{id}");
        tracing::debug!(method = "DELETE", path = path.as_str(), "Deleting conversation");

        let res = self.client.delete(self.endpoint(&path)).send().await?;
        FilmSageTransport::check_conversation(res, &path, id).await?;

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn save_conversation(
        &self,
        id: Option<&ConversationId>,
        messages: &[Message],
        title: Option<&str>,
    ) -> ChatResult<Option<ConversationId>> {
        let req = SaveRequest::new(messages, title, &self.system_preamble);

        match id {
            Some(id) => {
                let path = format!("/api/chat/conversations/{id}");
                tracing::debug!(
                    method = "PUT",
                    path = path.as_str(),
                    messages = req.messages.len(),
                    "Updating conversation"
                );

                let res = self.client.put(self.endpoint(&path)).json(&req).send().await?;
                FilmSageTransport::check_status(res, &path).await?;

                return Ok(Some(id.clone()));
            }
            None => {
                let path = "/api/chat/conversations";
                tracing::debug!(
                    method = "POST",
                    path,
                    messages = req.messages.len(),
                    "Creating conversation"
                );

                let res = self.client.post(self.endpoint(path)).json(&req).send().await?;
                let res = FilmSageTransport::check_status(res, path).await?;

                // A create that doesn't report its id still saved, the next
                // reload picks it up.
                let created = FilmSageTransport::parse_json::<SaveResponse>(res, path)
                    .await
                    .map(|e| return e.id)
                    .unwrap_or_else(|_| {
                        tracing::warn!(path, "Create response had no id");
                        return None;
                    });

                return Ok(created);
            }
        }
    }
}
