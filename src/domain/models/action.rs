use super::ConversationId;

/// A conversation picked either by its position in the last listing
/// (1 based) or by id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConversationTarget {
    Index(usize),
    Id(ConversationId),
}

impl ConversationTarget {
    pub fn parse(raw: &str) -> Option<ConversationTarget> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Some(id) = raw.strip_prefix('#') {
            return Some(ConversationTarget::Id(ConversationId::new(id)));
        }

        if let Ok(idx) = raw.parse::<usize>() {
            return Some(ConversationTarget::Index(idx));
        }

        return Some(ConversationTarget::Id(ConversationId::new(raw)));
    }
}

/// Something the user asked for from the prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Send(String),
    ShowDetails(),
    NewChat(),
    Save(),
    ListConversations(),
    Search(String),
    Open(ConversationTarget),
    Delete(ConversationTarget),
    Help(),
    Quit(),
    Invalid(String),
}
