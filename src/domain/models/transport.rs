use std::sync::Arc;

use async_trait::async_trait;

use super::ChatReply;
use super::ChatResult;
use super::ConversationId;
use super::ConversationSummary;
use super::LoadedConversation;
use super::Message;

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends the user's message alongside the history that preceded it.
    async fn send_message(
        &self,
        text: &str,
        history: &[Message],
        conversation_id: Option<&ConversationId>,
    ) -> ChatResult<ChatReply>;

    async fn load_conversation(&self, id: &ConversationId) -> ChatResult<LoadedConversation>;

    /// Returned in server order, callers sort before display.
    async fn list_conversations(&self) -> ChatResult<Vec<ConversationSummary>>;

    async fn search_conversations(&self, term: &str) -> ChatResult<Vec<ConversationSummary>>;

    async fn delete_conversation(&self, id: &ConversationId) -> ChatResult<()>;

    /// Creates a conversation when `id` is `None`, otherwise updates it.
    /// Resolves to the id the conversation is stored under, which a create
    /// may fail to report.
    async fn save_conversation(
        &self,
        id: Option<&ConversationId>,
        messages: &[Message],
        title: Option<&str>,
    ) -> ChatResult<Option<ConversationId>>;
}

pub type TransportBox = Arc<dyn ChatTransport>;
