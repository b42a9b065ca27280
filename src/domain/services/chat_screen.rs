#[cfg(test)]
#[path = "chat_screen_test.rs"]
mod tests;

use std::time::Duration;
use std::time::Instant;

use crate::domain::models::Bubble;
use crate::domain::models::ChatView;
use crate::domain::models::ConversationId;
use crate::domain::models::ConversationListing;
use crate::domain::models::ConversationSummary;
use crate::domain::models::MovieId;
use crate::domain::models::SaveStatus;

pub const NEW_CONVERSATION_TITLE: &str = "New Conversation";

/// Retained state of everything drawn by the chat pipeline. Renderers read
/// from it, the controller writes to it through `ChatView`.
#[derive(Debug)]
pub struct ChatScreen {
    bubbles: Vec<Bubble>,
    revision: u64,
    loading: bool,
    typing: Option<u64>,
    listing: ConversationListing,
    active: Option<ConversationId>,
    title: String,
    save_status: SaveStatus,
    toasts: Vec<String>,
    toast_at: Option<Instant>,
    details: Vec<MovieId>,
}

impl Default for ChatScreen {
    fn default() -> ChatScreen {
        return ChatScreen {
            bubbles: vec![],
            revision: 0,
            loading: false,
            typing: None,
            listing: ConversationListing::Empty,
            active: None,
            title: NEW_CONVERSATION_TITLE.to_string(),
            save_status: SaveStatus::Idle,
            toasts: vec![],
            toast_at: None,
            details: vec![],
        };
    }
}

impl ChatScreen {
    pub fn bubbles(&self) -> &[Bubble] {
        return &self.bubbles;
    }

    /// Bumped whenever the transcript is cleared, so cached renders of
    /// earlier bubbles can be thrown away.
    pub fn revision(&self) -> u64 {
        return self.revision;
    }

    pub fn is_loading(&self) -> bool {
        return self.loading;
    }

    pub fn typing(&self) -> Option<u64> {
        return self.typing;
    }

    pub fn listing(&self) -> &ConversationListing {
        return &self.listing;
    }

    /// Summaries currently listed, in display order.
    pub fn listed(&self) -> &[ConversationSummary] {
        if let ConversationListing::Items(items) = &self.listing {
            return items;
        }

        return &[];
    }

    pub fn active(&self) -> Option<&ConversationId> {
        return self.active.as_ref();
    }

    pub fn title(&self) -> &str {
        return &self.title;
    }

    pub fn save_status(&self) -> &SaveStatus {
        return &self.save_status;
    }

    pub fn toasts(&self) -> &[String] {
        return &self.toasts;
    }

    pub fn last_toast(&self) -> Option<&str> {
        return self.toasts.last().map(|e| return e.as_str());
    }

    /// Hides the latest toast once it has been up for `shown_for`. Returns
    /// true if it was hidden.
    pub fn expire_toast(&mut self, shown_for: Duration) -> bool {
        let Some(at) = self.toast_at else {
            return false;
        };
        if at.elapsed() < shown_for {
            return false;
        }

        self.toast_at = None;
        self.toasts.clear();
        return true;
    }

    pub fn details(&self) -> &[MovieId] {
        return &self.details;
    }
}

impl ChatView for ChatScreen {
    fn append(&mut self, bubble: Bubble) {
        self.loading = false;
        self.bubbles.push(bubble);
    }

    fn clear_transcript(&mut self) {
        self.loading = false;
        self.typing = None;
        self.bubbles.clear();
        self.revision += 1;
    }

    fn show_loading(&mut self) {
        self.clear_transcript();
        self.loading = true;
    }

    fn set_typing(&mut self, elapsed_secs: Option<u64>) {
        self.typing = elapsed_secs;
    }

    fn set_conversations(&mut self, listing: ConversationListing) {
        self.listing = listing;
    }

    fn remove_conversation(&mut self, id: &ConversationId) {
        if let ConversationListing::Items(items) = &mut self.listing {
            items.retain(|item| return &item.id != id);
            if items.is_empty() {
                self.listing = ConversationListing::Empty;
            }
        }

        if self.active.as_ref() == Some(id) {
            self.active = None;
        }
    }

    fn set_active_conversation(&mut self, id: Option<&ConversationId>) {
        self.active = id.cloned();
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn set_save_status(&mut self, status: &SaveStatus) {
        self.save_status = status.clone();
    }

    fn toast(&mut self, message: &str) {
        tracing::debug!(message, "toast");
        self.toasts.push(message.to_string());
        self.toast_at = Some(Instant::now());
    }

    fn show_movie_details(&mut self, id: &MovieId) {
        self.details.push(id.clone());
    }
}
