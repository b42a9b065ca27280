#[cfg(test)]
#[path = "controller_test.rs"]
mod tests;

use std::future::Future;
use std::time::Duration;

use chrono::Local;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::ConversationState;
use super::Enricher;
use super::PersistenceScheduler;
use super::SaveDecision;
use super::TimerHandle;
use super::NEW_CONVERSATION_TITLE;
use crate::domain::models::Bubble;
use crate::domain::models::ChatError;
use crate::domain::models::ChatEvent;
use crate::domain::models::ChatReply;
use crate::domain::models::ChatResult;
use crate::domain::models::ChatView;
use crate::domain::models::ConversationId;
use crate::domain::models::ConversationListing;
use crate::domain::models::ConversationSummary;
use crate::domain::models::ConversationTarget;
use crate::domain::models::LoadedConversation;
use crate::domain::models::Message;
use crate::domain::models::ReloadToken;
use crate::domain::models::Role;
use crate::domain::models::SaveIndicator;
use crate::domain::models::SaveStatus;
use crate::domain::models::SaveTrigger;
use crate::domain::models::TransportBox;
use crate::domain::models::sort_by_recent;

const DETAILS_PHRASES: [&str; 4] = [
    "show details",
    "show me details",
    "show trailer",
    "show me trailer",
];
pub const MIN_SEARCH_CHARS: usize = 2;
const REFRESH_AFTER_SAVE: Duration = Duration::from_millis(300);
const TYPING_TICK: Duration = Duration::from_secs(1);
pub const WELCOME_MESSAGE: &str = "New chat started. How can I help you today?";

/// True for messages that ask to see the last mentioned movie instead of
/// being sent to the backend.
pub fn is_details_request(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    return DETAILS_PHRASES.contains(&lowered.as_str());
}

/// Drives the chat pipeline. Owns the single `ConversationState`; all
/// network work runs on spawned tasks whose results come back as
/// `ChatEvent`s and are applied through `handle`.
pub struct ChatController<V: ChatView> {
    transport: TransportBox,
    enricher: Enricher,
    view: V,
    state: ConversationState,
    save_indicator: SaveIndicator,
    scheduler: PersistenceScheduler,
    tx: mpsc::UnboundedSender<ChatEvent>,
    listed: Vec<ConversationSummary>,
    typing: Option<TimerHandle>,
    save_badge_timer: Option<TimerHandle>,
    refresh_timer: Option<TimerHandle>,
    new_chat_pending: bool,
    in_flight: usize,
}

impl<V: ChatView> ChatController<V> {
    pub fn new(
        transport: TransportBox,
        enricher: Enricher,
        view: V,
        autosave_debounce: Duration,
        tx: mpsc::UnboundedSender<ChatEvent>,
    ) -> ChatController<V> {
        return ChatController {
            transport,
            enricher,
            view,
            state: ConversationState::default(),
            save_indicator: SaveIndicator::default(),
            scheduler: PersistenceScheduler::new(autosave_debounce),
            tx,
            listed: vec![],
            typing: None,
            save_badge_timer: None,
            refresh_timer: None,
            new_chat_pending: false,
            in_flight: 0,
        };
    }

    pub fn view(&self) -> &V {
        return &self.view;
    }

    pub fn view_mut(&mut self) -> &mut V {
        return &mut self.view;
    }

    pub fn state(&self) -> &ConversationState {
        return &self.state;
    }

    pub fn save_status(&self) -> &SaveStatus {
        return self.save_indicator.status();
    }

    /// True when no transport call is outstanding.
    pub fn is_idle(&self) -> bool {
        return self.in_flight == 0;
    }

    /// Maps a listing position or id to a conversation id.
    pub fn resolve_target(&self, target: &ConversationTarget) -> Option<ConversationId> {
        match target {
            ConversationTarget::Id(id) => return Some(id.clone()),
            ConversationTarget::Index(idx) => {
                if *idx == 0 {
                    return None;
                }
                return self.listed.get(idx - 1).map(|item| return item.id.clone());
            }
        }
    }

    fn spawn<F>(&mut self, work: F)
    where
        F: Future<Output = ChatEvent> + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(work.await);
        });
    }

    fn set_save_status(&mut self, status: SaveStatus) {
        let visible_for = status.visible_for();
        let generation = self.save_indicator.set(status);
        self.view.set_save_status(self.save_indicator.status());

        self.save_badge_timer = visible_for.map(|delay| {
            return TimerHandle::after(
                delay,
                self.tx.clone(),
                ChatEvent::SaveStatusExpired(generation),
            );
        });
    }

    fn start_typing(&mut self) {
        self.view.set_typing(Some(0));
        self.typing = Some(TimerHandle::every(TYPING_TICK, self.tx.clone(), |secs| {
            return ChatEvent::TypingTick(secs);
        }));
    }

    fn stop_typing(&mut self) {
        self.typing = None;
        self.view.set_typing(None);
    }

    fn set_listing(&mut self, listing: ConversationListing) {
        if let ConversationListing::Items(items) = &listing {
            self.listed = items.clone();
        } else {
            self.listed = vec![];
        }

        self.view.set_conversations(listing);
        self.view
            .set_active_conversation(self.state.conversation_id());
    }

    fn assistant_bubble(&mut self, text: &str) -> Bubble {
        let enrichment = self
            .enricher
            .enrich(text, self.state.featured_mentioned());
        self.state.set_featured_mentioned(enrichment.featured_mentioned);
        self.state.remember_movie(enrichment.movie_id);

        return Bubble::Assistant {
            text: text.to_string(),
            markup: enrichment.html,
        };
    }

    /// Sends a user message. Empty input and requests made while a reply is
    /// still pending are ignored.
    pub fn send_message(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            tracing::debug!(
                err = %ChatError::Validation("Message is empty".to_string()),
                "Ignoring send"
            );
            return;
        }

        if is_details_request(text) {
            self.show_details();
            return;
        }

        if !self.state.begin_reply() {
            self.view.toast("FilmSage is still replying");
            return;
        }

        self.view.append(Bubble::User(text.to_string()));
        self.start_typing();

        let transport = self.transport.clone();
        let history = self.state.history().to_vec();
        let conversation_id = self.state.conversation_id().cloned();
        let lifetime = self.state.lifetime();
        let message = text.to_string();
        self.spawn(async move {
            let res = transport
                .send_message(&message, &history, conversation_id.as_ref())
                .await;
            return ChatEvent::ReplyReceived(lifetime, message, res);
        });
    }

    pub fn show_details(&mut self) {
        match self.state.last_mentioned_movie() {
            Some(movie_id) => {
                let movie_id = movie_id.clone();
                tracing::debug!(movie_id = %movie_id, "Showing movie details");
                self.view.show_movie_details(&movie_id);
            }
            None => {
                self.view.append(Bubble::Error(
                    "No movie details available. Please ask about a movie first.".to_string(),
                ));
            }
        }
    }

    fn on_reply(&mut self, lifetime: u64, message: String, res: ChatResult<ChatReply>) {
        if lifetime != self.state.lifetime() {
            tracing::debug!("Dropping reply for a conversation that is gone");
            return;
        }

        self.stop_typing();
        self.state.end_reply();

        let reply = match res {
            Ok(reply) => reply,
            Err(ChatError::InvalidResponse) => {
                tracing::error!("Invalid response from chat endpoint");
                self.view.append(Bubble::Error(
                    "Sorry, I received an invalid response. Please try again.".to_string(),
                ));
                return;
            }
            Err(err) => {
                tracing::error!(error = %err, network = err.is_network(), "Chat request failed");
                self.view.append(Bubble::Error(format!(
                    "Sorry, I'm having trouble connecting: {err}"
                )));
                return;
            }
        };

        self.state.remember_movie(reply.last_mentioned_movie_id.clone());
        let bubble = self.assistant_bubble(&reply.response);
        self.state.record_exchange(
            Message::user(&message),
            Message::assistant(&reply.response),
        );
        self.view.append(bubble);

        if let Some(id) = reply.conversation_id {
            if self.state.assign_conversation_id(id) {
                self.view
                    .set_active_conversation(self.state.conversation_id());
            }
        }

        self.persist(SaveTrigger::Exchange);
    }

    /// Persists the conversation if `trigger` allows it for the current
    /// history. Returns true if a save was issued or scheduled.
    pub fn persist(&mut self, trigger: SaveTrigger) -> bool {
        let decision = self.scheduler.decide(
            trigger,
            self.state.history().len(),
            &self.tx,
            ChatEvent::AutosaveDue(),
        );

        match decision {
            SaveDecision::Skip => return false,
            SaveDecision::Deferred => return true,
            SaveDecision::Now => {
                self.save_now(trigger);
                return true;
            }
        }
    }

    /// Manual save from the user. Needs at least one exchange.
    pub fn save(&mut self) -> bool {
        if self.state.history().len() < SaveTrigger::Manual.min_history() {
            self.view.toast("Nothing to save yet");
            return false;
        }

        self.view.toast("Saving conversation...");
        return self.persist(SaveTrigger::Manual);
    }

    fn save_now(&mut self, trigger: SaveTrigger) {
        self.set_save_status(SaveStatus::Saving);

        let transport = self.transport.clone();
        let conversation_id = self.state.conversation_id().cloned();
        let lifetime = self.state.lifetime();
        let messages = self.state.history().to_vec();
        let title = match conversation_id {
            Some(_) => None,
            None => Some(self.state.draft_title(Local::now())),
        };

        tracing::debug!(
            %trigger,
            conversation_id = ?conversation_id,
            messages = messages.len(),
            "Saving conversation"
        );

        self.spawn(async move {
            let res = transport
                .save_conversation(conversation_id.as_ref(), &messages, title.as_deref())
                .await;
            return ChatEvent::ConversationSaved(trigger, lifetime, res);
        });
    }

    fn on_saved(
        &mut self,
        trigger: SaveTrigger,
        lifetime: u64,
        res: ChatResult<Option<ConversationId>>,
    ) {
        match res {
            Ok(id) => {
                // An id for a conversation that has since been reset must
                // not be adopted by its successor.
                if let Some(id) = id.filter(|_| return lifetime == self.state.lifetime()) {
                    if self.state.assign_conversation_id(id) {
                        self.view
                            .set_active_conversation(self.state.conversation_id());
                    }
                }
                self.set_save_status(SaveStatus::Saved);
                self.refresh_timer = Some(TimerHandle::after(
                    REFRESH_AFTER_SAVE,
                    self.tx.clone(),
                    ChatEvent::RefreshConversationsDue(),
                ));
            }
            Err(err) => {
                tracing::error!(%trigger, error = %err, "Failed to save conversation");
                self.set_save_status(SaveStatus::Error("Failed to save".to_string()));
                self.view.toast(&format!("Error saving: {err}"));
            }
        }

        if trigger == SaveTrigger::NewChat && self.new_chat_pending {
            self.finish_new_chat();
        }
    }

    /// Saves whatever is worth keeping, then starts over with an empty
    /// conversation once the save settles.
    pub fn start_new_chat(&mut self) {
        if self.new_chat_pending {
            return;
        }

        if self.state.reply_pending() {
            self.view.toast("FilmSage is still replying");
            return;
        }

        if self.state.history().len() >= SaveTrigger::NewChat.min_history() {
            self.view
                .toast("Saving conversation before starting new chat");
            self.new_chat_pending = true;
            if self.persist(SaveTrigger::NewChat) {
                return;
            }
            self.new_chat_pending = false;
        }

        self.finish_new_chat();
    }

    fn finish_new_chat(&mut self) {
        self.new_chat_pending = false;
        self.scheduler.cancel_pending();
        self.state.reset();

        self.view.clear_transcript();
        let welcome = self.assistant_bubble(WELCOME_MESSAGE);
        self.view.append(welcome);
        self.view.set_title(NEW_CONVERSATION_TITLE);
        self.view.set_active_conversation(None);
        self.view.toast("New conversation started");

        self.reload_conversations();
    }

    /// Best effort save before the app goes away. The handle resolves once
    /// the save settles, nothing else is reported back.
    pub fn unload(&mut self) -> Option<JoinHandle<()>> {
        self.typing = None;
        self.save_badge_timer = None;
        self.refresh_timer = None;
        self.scheduler.cancel_pending();

        if self.state.history().len() < SaveTrigger::Unload.min_history() {
            return None;
        }

        let transport = self.transport.clone();
        let conversation_id = self.state.conversation_id().cloned();
        let messages = self.state.history().to_vec();
        let title = match conversation_id {
            Some(_) => None,
            None => Some(self.state.draft_title(Local::now())),
        };

        return Some(tokio::spawn(async move {
            if let Err(err) = transport
                .save_conversation(conversation_id.as_ref(), &messages, title.as_deref())
                .await
            {
                tracing::error!(error = %err, "Unload save failed");
            }
        }));
    }

    pub fn open_conversation(&mut self, id: ConversationId) {
        if self.state.reply_pending() {
            self.view.toast("FilmSage is still replying");
            return;
        }

        self.view.show_loading();

        let transport = self.transport.clone();
        self.spawn(async move {
            let res = transport.load_conversation(&id).await;
            return ChatEvent::ConversationLoaded(id, res);
        });
    }

    fn on_loaded(&mut self, id: ConversationId, res: ChatResult<LoadedConversation>) {
        let loaded = match res {
            Ok(loaded) => loaded,
            Err(err) => {
                tracing::error!(
                    conversation_id = %id,
                    error = %err,
                    network = err.is_network(),
                    "Failed to load conversation"
                );
                // Gone from the server, so the sidebar entry is stale too.
                if err.is_not_found() {
                    self.listed.retain(|item| return item.id != id);
                    self.view.remove_conversation(&id);
                }
                self.view.clear_transcript();
                self.view.append(Bubble::Error(format!(
                    "Error loading conversation: {err}"
                )));
                return;
            }
        };

        self.scheduler.cancel_pending();
        self.state.replace(id.clone(), loaded.messages.clone());
        self.view.clear_transcript();

        for msg in loaded.messages.iter() {
            let bubble = match msg.role {
                Role::User => Bubble::User(msg.content.to_string()),
                Role::Assistant => self.assistant_bubble(&msg.content),
            };
            self.view.append(bubble);
        }

        let title = loaded
            .title
            .filter(|title| return !title.trim().is_empty())
            .or_else(|| {
                return self
                    .listed
                    .iter()
                    .find(|item| return item.id == id)
                    .map(|item| return item.display_title());
            })
            .unwrap_or_else(|| return format!("Chat {id}"));

        self.view.set_title(&title);
        self.view.set_active_conversation(Some(&id));
    }

    /// Reloads the conversation list. Does nothing while a reload is
    /// already in flight.
    pub fn reload_conversations(&mut self) {
        let Some(token) = self.state.try_begin_list_reload() else {
            tracing::debug!("Conversation list reload already in flight");
            return;
        };

        self.view.set_conversations(ConversationListing::Loading);

        let transport = self.transport.clone();
        self.spawn(async move {
            let res = transport.list_conversations().await;
            return ChatEvent::ConversationsListed(token, res);
        });
    }

    fn on_listed(&mut self, token: ReloadToken, res: ChatResult<Vec<ConversationSummary>>) {
        self.state.finish_list_reload(token);

        match res {
            Ok(mut items) => {
                if items.is_empty() {
                    self.set_listing(ConversationListing::Empty);
                    return;
                }
                sort_by_recent(&mut items);
                self.set_listing(ConversationListing::Items(items));
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to list conversations");
                self.set_listing(ConversationListing::Error(format!(
                    "Error loading conversations: {err}"
                )));
            }
        }
    }

    /// An empty term goes back to the full list, single characters are
    /// ignored.
    pub fn search_conversations(&mut self, term: &str) {
        let term = term.trim();
        if term.is_empty() {
            self.reload_conversations();
            return;
        }

        if term.chars().count() < MIN_SEARCH_CHARS {
            return;
        }

        self.view
            .set_conversations(ConversationListing::Searching(term.to_string()));

        let transport = self.transport.clone();
        let term = term.to_string();
        self.spawn(async move {
            let res = transport.search_conversations(&term).await;
            return ChatEvent::SearchCompleted(term, res);
        });
    }

    fn on_searched(&mut self, term: String, res: ChatResult<Vec<ConversationSummary>>) {
        match res {
            Ok(mut items) => {
                if items.is_empty() {
                    self.set_listing(ConversationListing::NoMatches(term));
                    return;
                }
                sort_by_recent(&mut items);
                self.set_listing(ConversationListing::Items(items));
            }
            Err(err) => {
                tracing::error!(term = term.as_str(), error = %err, "Conversation search failed");
                self.set_listing(ConversationListing::Error(format!(
                    "Error searching conversations: {err}"
                )));
            }
        }
    }

    pub fn delete_conversation(&mut self, id: ConversationId) {
        let transport = self.transport.clone();
        self.spawn(async move {
            let res = transport.delete_conversation(&id).await;
            return ChatEvent::ConversationDeleted(id, res);
        });
    }

    fn on_deleted(&mut self, id: ConversationId, res: ChatResult<()>) {
        if let Err(err) = res {
            tracing::error!(conversation_id = %id, error = %err, "Failed to delete conversation");
            self.view
                .toast(&format!("Error deleting conversation: {err}"));
            return;
        }

        self.listed.retain(|item| return item.id != id);
        self.view.remove_conversation(&id);
        self.view.toast("Conversation deleted successfully");

        if self.state.is_active(&id) {
            self.typing = None;
            self.scheduler.cancel_pending();
            self.state.reset();
            self.view.set_typing(None);
            self.view.clear_transcript();
            self.view.set_title(NEW_CONVERSATION_TITLE);
            self.view.set_active_conversation(None);
        }
    }

    /// Applies a completion or timer event.
    pub fn handle(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::ReplyReceived(lifetime, message, res) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.on_reply(lifetime, message, res);
            }
            ChatEvent::ConversationLoaded(id, res) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.on_loaded(id, res);
            }
            ChatEvent::ConversationsListed(token, res) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.on_listed(token, res);
            }
            ChatEvent::SearchCompleted(term, res) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.on_searched(term, res);
            }
            ChatEvent::ConversationDeleted(id, res) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.on_deleted(id, res);
            }
            ChatEvent::ConversationSaved(trigger, lifetime, res) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.on_saved(trigger, lifetime, res);
            }
            ChatEvent::AutosaveDue() => {
                self.scheduler.debounce_fired();
                if self.state.history().len() >= SaveTrigger::Exchange.min_history() {
                    self.save_now(SaveTrigger::Exchange);
                }
            }
            ChatEvent::RefreshConversationsDue() => {
                self.refresh_timer = None;
                self.reload_conversations();
            }
            ChatEvent::SaveStatusExpired(generation) => {
                if self.save_indicator.expire(generation) {
                    self.view.set_save_status(self.save_indicator.status());
                }
            }
            ChatEvent::TypingTick(secs) => {
                if self.typing.is_some() {
                    self.view.set_typing(Some(secs));
                }
            }
        }
    }
}
