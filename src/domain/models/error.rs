use thiserror::Error;

use super::ConversationId;

/// Failures surfaced by a `ChatTransport`.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Server responded with status: {status}")]
    Status { status: u16, body: String },

    #[error("Unable to reach FilmSage: {0}")]
    Connection(#[from] reqwest::Error),

    #[error("Received an invalid response from FilmSage")]
    InvalidResponse,

    #[error("Conversation {0} was not found")]
    NotFound(ConversationId),

    #[error("{0}")]
    Validation(String),
}

impl ChatError {
    pub fn is_network(&self) -> bool {
        return matches!(
            self,
            ChatError::Status { .. } | ChatError::Connection(_) | ChatError::InvalidResponse
        );
    }

    pub fn is_not_found(&self) -> bool {
        return matches!(self, ChatError::NotFound(_));
    }
}

pub type ChatResult<T> = std::result::Result<T, ChatError>;
