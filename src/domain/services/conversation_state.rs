#[cfg(test)]
#[path = "conversation_state_test.rs"]
mod tests;

use chrono::DateTime;
use chrono::Local;

use crate::domain::models::ConversationId;
use crate::domain::models::Message;
use crate::domain::models::MovieId;
use crate::domain::models::ReloadToken;
use crate::domain::models::Role;

const TITLE_MAX_CHARS: usize = 30;

/// The single active conversation. Mutated only by the chat controller.
#[derive(Debug, Default)]
pub struct ConversationState {
    history: Vec<Message>,
    conversation_id: Option<ConversationId>,
    last_mentioned_movie: Option<MovieId>,
    featured_mentioned: bool,
    reply_pending: bool,
    list_reload: Option<ReloadToken>,
    reload_counter: u64,
    lifetime: u64,
}

impl ConversationState {
    pub fn history(&self) -> &[Message] {
        return &self.history;
    }

    pub fn conversation_id(&self) -> Option<&ConversationId> {
        return self.conversation_id.as_ref();
    }

    /// Changes every time the conversation is reset or replaced. Results of
    /// work started under another lifetime belong to a conversation that is
    /// gone.
    pub fn lifetime(&self) -> u64 {
        return self.lifetime;
    }

    /// Ids are only assigned once per conversation. Returns true if `id` was
    /// adopted.
    pub fn assign_conversation_id(&mut self, id: ConversationId) -> bool {
        if self.conversation_id.is_some() {
            return false;
        }

        self.conversation_id = Some(id);
        return true;
    }

    pub fn is_active(&self, id: &ConversationId) -> bool {
        return self.conversation_id.as_ref() == Some(id);
    }

    pub fn last_mentioned_movie(&self) -> Option<&MovieId> {
        return self.last_mentioned_movie.as_ref();
    }

    /// `None` keeps whatever movie was mentioned last.
    pub fn remember_movie(&mut self, movie_id: Option<MovieId>) {
        if let Some(id) = movie_id {
            self.last_mentioned_movie = Some(id);
        }
    }

    pub fn featured_mentioned(&self) -> bool {
        return self.featured_mentioned;
    }

    pub fn set_featured_mentioned(&mut self, mentioned: bool) {
        self.featured_mentioned = self.featured_mentioned || mentioned;
    }

    /// A user message and its reply always land together.
    pub fn record_exchange(&mut self, user: Message, assistant: Message) {
        self.history.push(user);
        self.history.push(assistant);
    }

    /// Swaps in a stored conversation wholesale.
    pub fn replace(&mut self, id: ConversationId, messages: Vec<Message>) {
        self.reset();
        self.conversation_id = Some(id);
        self.history = messages;
    }

    /// Back to an empty, unsaved conversation. An in-flight list reload keeps
    /// its slot.
    pub fn reset(&mut self) {
        self.lifetime += 1;
        self.history.clear();
        self.conversation_id = None;
        self.last_mentioned_movie = None;
        self.featured_mentioned = false;
        self.reply_pending = false;
    }

    pub fn reply_pending(&self) -> bool {
        return self.reply_pending;
    }

    /// Returns false if a reply is already outstanding.
    pub fn begin_reply(&mut self) -> bool {
        if self.reply_pending {
            return false;
        }

        self.reply_pending = true;
        return true;
    }

    pub fn end_reply(&mut self) {
        self.reply_pending = false;
    }

    pub fn try_begin_list_reload(&mut self) -> Option<ReloadToken> {
        if self.list_reload.is_some() {
            return None;
        }

        self.reload_counter += 1;
        let token = ReloadToken::new(self.reload_counter);
        self.list_reload = Some(token);
        return Some(token);
    }

    /// Returns false for a token that no longer holds the slot.
    pub fn finish_list_reload(&mut self, token: ReloadToken) -> bool {
        if self.list_reload != Some(token) {
            return false;
        }

        self.list_reload = None;
        return true;
    }

    #[cfg(test)]
    pub fn list_reload_in_flight(&self) -> bool {
        return self.list_reload.is_some();
    }

    /// Title used when the conversation is first created on the server.
    pub fn draft_title(&self, now: DateTime<Local>) -> String {
        let first_user = self
            .history
            .iter()
            .find(|msg| return msg.role == Role::User && !msg.content.trim().is_empty());

        if let Some(msg) = first_user {
            let cut = msg
                .content
                .trim()
                .chars()
                .take(TITLE_MAX_CHARS)
                .collect::<String>();
            if cut.chars().count() == TITLE_MAX_CHARS {
                return format!("{cut}...");
            }
            return cut;
        }

        return format!("Chat {}", now.format("%-I:%M:%S %p"));
    }
}
