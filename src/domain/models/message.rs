#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use serde::Deserializer;
use serde_derive::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl<'de> serde::Deserialize<'de> for Role {
    /// Anything that isn't the user is treated as the assistant, the backend
    /// has been seen sending `bot` and `system` for its own turns.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Role, D::Error> {
        let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
        if raw.eq_ignore_ascii_case("user") {
            return Ok(Role::User);
        }

        return Ok(Role::Assistant);
    }
}

/// A single chat turn. Messages are never edited once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, serde_derive::Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Message {
        return Message {
            role,
            content: content.to_string(),
        };
    }

    pub fn user(content: &str) -> Message {
        return Message::new(Role::User, content);
    }

    pub fn assistant(content: &str) -> Message {
        return Message::new(Role::Assistant, content);
    }

    /// True when the backend echoed its own instructions back as a reply.
    pub fn is_system_echo(&self, preamble: &str) -> bool {
        return self.role == Role::Assistant
            && !preamble.is_empty()
            && self.content.contains(preamble);
    }

    /// First line of the message, cut down for list displays.
    pub fn preview(&self, max_chars: usize) -> String {
        let line = self.content.lines().next().unwrap_or("").trim();
        if line.chars().count() <= max_chars {
            return line.to_string();
        }

        let cut = line
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        return format!("{cut}...");
    }
}
