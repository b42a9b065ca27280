use tui_textarea::Input;

use super::ChatReply;
use super::ChatResult;
use super::ConversationId;
use super::ConversationSummary;
use super::LoadedConversation;
use super::SaveTrigger;

/// Held while a conversation list reload is in flight. Only the holder of
/// the current token can release the slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReloadToken(u64);

impl ReloadToken {
    pub fn new(n: u64) -> ReloadToken {
        return ReloadToken(n);
    }
}

/// Completions of work the chat controller started: transport calls finishing
/// and its own timers firing.
#[derive(Debug)]
pub enum ChatEvent {
    ReplyReceived(u64, String, ChatResult<ChatReply>),
    ConversationLoaded(ConversationId, ChatResult<LoadedConversation>),
    ConversationsListed(ReloadToken, ChatResult<Vec<ConversationSummary>>),
    SearchCompleted(String, ChatResult<Vec<ConversationSummary>>),
    ConversationDeleted(ConversationId, ChatResult<()>),
    ConversationSaved(SaveTrigger, u64, ChatResult<Option<ConversationId>>),
    AutosaveDue(),
    RefreshConversationsDue(),
    SaveStatusExpired(u64),
    TypingTick(u64),
}

pub enum Event {
    Chat(ChatEvent),
    KeyboardCharInput(Input),
    KeyboardCTRLC(),
    KeyboardCTRLN(),
    KeyboardCTRLS(),
    KeyboardEnter(),
    KeyboardPaste(String),
    UIResize(),
    UIScrollDown(),
    UIScrollUp(),
    UIScrollPageDown(),
    UIScrollPageUp(),
    UITick(),
}
