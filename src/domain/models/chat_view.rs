use super::ConversationId;
use super::ConversationSummary;
use super::MovieId;
use super::SaveStatus;

/// One entry in the rendered transcript.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Bubble {
    /// Always rendered as literal text, never interpreted as markup.
    User(String),
    /// Raw reply text alongside its enriched markup.
    Assistant { text: String, markup: String },
    /// Client generated information, rendered as literal text.
    Notice(String),
    Error(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConversationListing {
    Loading,
    Searching(String),
    Items(Vec<ConversationSummary>),
    Empty,
    NoMatches(String),
    Error(String),
}

/// Everything the chat pipeline draws goes through here, so the pipeline can
/// run against an HTML document in tests or the terminal in the app.
pub trait ChatView {
    fn append(&mut self, bubble: Bubble);

    fn clear_transcript(&mut self);

    /// Placeholder shown while a stored conversation is fetched.
    fn show_loading(&mut self);

    /// `Some(seconds)` shows or updates the typing indicator, `None` removes it.
    fn set_typing(&mut self, elapsed_secs: Option<u64>);

    fn set_conversations(&mut self, listing: ConversationListing);

    fn remove_conversation(&mut self, id: &ConversationId);

    fn set_active_conversation(&mut self, id: Option<&ConversationId>);

    fn set_title(&mut self, title: &str);

    fn set_save_status(&mut self, status: &SaveStatus);

    fn toast(&mut self, message: &str);

    fn show_movie_details(&mut self, id: &MovieId);
}
