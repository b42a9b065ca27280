#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;

use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;

use chrono::DateTime;
use chrono::Local;
use chrono::NaiveDateTime;
use chrono::TimeZone;
use serde::Deserializer;
use serde::Serializer;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::Message;

/// The backend hands out numeric ids but the client treats them as opaque.
/// Numbers and strings are both accepted on the way in. Ids that arrived as
/// numbers are written back out as numbers, everything else as the text it
/// was given.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

macro_rules! opaque_id {
    ($name:ident) => {
        #[derive(Clone)]
        pub struct $name {
            id: String,
            numeric: bool,
        }

        impl $name {
            pub fn new(id: &str) -> $name {
                return $name {
                    id: id.trim().to_string(),
                    numeric: false,
                };
            }

            pub fn as_str(&self) -> &str {
                return &self.id;
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                return f.debug_tuple(stringify!($name)).field(&self.id).finish();
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                return write!(f, "{}", self.id);
            }
        }

        // Identity is the text alone, however the id was received.
        impl PartialEq for $name {
            fn eq(&self, other: &$name) -> bool {
                return self.id == other.id;
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.id.hash(state);
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &$name) -> Option<Ordering> {
                return Some(self.cmp(other));
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &$name) -> Ordering {
                return self.id.cmp(&other.id);
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> $name {
                return $name::new(id);
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                if self.numeric {
                    if let Ok(num) = self.id.parse::<i64>() {
                        return serializer.serialize_i64(num);
                    }
                }

                return serializer.serialize_str(&self.id);
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<$name, D::Error> {
                let raw = <RawId as serde::Deserialize>::deserialize(deserializer)?;
                match raw {
                    RawId::Number(num) => {
                        return Ok($name {
                            id: num.to_string(),
                            numeric: true,
                        })
                    }
                    RawId::Text(text) => return Ok($name::new(&text)),
                }
            }
        }
    };
}

opaque_id!(ConversationId);
opaque_id!(MovieId);

/// Timestamps come back either as RFC3339 or as a zone-less local date time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Local));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Local.from_local_datetime(&naive).earliest();
        }
    }

    return None;
}

/// List projection of a stored conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: ConversationId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub preview: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl ConversationSummary {
    pub fn display_title(&self) -> String {
        if let Some(title) = &self.title {
            if !title.trim().is_empty() {
                return title.to_string();
            }
        }

        let created = self
            .created_at
            .as_deref()
            .and_then(parse_timestamp)
            .map(|date| return date.format("%m/%d/%Y").to_string())
            .unwrap_or_else(|| return "unknown date".to_string());

        return format!("Chat {} ({created})", self.id);
    }

    pub fn display_preview(&self) -> String {
        if let Some(preview) = &self.preview {
            if !preview.trim().is_empty() {
                return preview.to_string();
            }
        }

        return "No preview available".to_string();
    }

    pub fn updated(&self) -> Option<DateTime<Local>> {
        return self.updated_at.as_deref().and_then(parse_timestamp);
    }
}

/// Orders a freshly received list newest first. Entries without a readable
/// `updatedAt` sink to the bottom.
pub fn sort_by_recent(conversations: &mut [ConversationSummary]) {
    conversations.sort_by(|a, b| return b.updated().cmp(&a.updated()));
}

/// Response of `GET /api/chat/conversations/{id}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedConversation {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<Message>,
    pub conversation_id: Option<ConversationId>,
}

/// `response` is usually a string, older backends wrap it in another object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplyBody {
    Text(String),
    Nested { response: String },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReplyPayload {
    #[serde(default)]
    pub response: Option<ReplyBody>,
    #[serde(default)]
    pub last_mentioned_movie_id: Option<MovieId>,
    #[serde(default)]
    pub conversation_id: Option<ConversationId>,
}

/// A validated reply from `POST /api/chat/chat`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatReply {
    pub response: String,
    pub last_mentioned_movie_id: Option<MovieId>,
    pub conversation_id: Option<ConversationId>,
}

impl ChatReplyPayload {
    /// Returns `None` when the payload has no usable response text.
    pub fn into_reply(self) -> Option<ChatReply> {
        let text = match self.response? {
            ReplyBody::Text(text) => text,
            ReplyBody::Nested { response } => response,
        };

        if text.is_empty() {
            return None;
        }

        return Some(ChatReply {
            response: text,
            last_mentioned_movie_id: self.last_mentioned_movie_id,
            conversation_id: self.conversation_id,
        });
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SaveRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub messages: Vec<Message>,
}

impl SaveRequest {
    /// Drops assistant messages that are really the backend echoing its
    /// system preamble.
    pub fn new(messages: &[Message], title: Option<&str>, preamble: &str) -> SaveRequest {
        let messages = messages
            .iter()
            .filter(|msg| {
                if msg.is_system_echo(preamble) {
                    tracing::debug!("Excluding system prompt message from conversation save");
                    return false;
                }
                return true;
            })
            .cloned()
            .collect::<Vec<Message>>();

        return SaveRequest {
            title: title.map(|e| return e.to_string()),
            messages,
        };
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SaveResponse {
    #[serde(default)]
    pub id: Option<ConversationId>,
}
