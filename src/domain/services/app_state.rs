#[cfg(test)]
#[path = "app_state_test.rs"]
mod tests;

use std::time::Duration;

use ratatui::prelude::Rect;

use super::actions::help_text;
use super::BubbleList;
use super::ChatController;
use super::ChatScreen;
use super::Scroll;
use crate::domain::models::Action;
use crate::domain::models::Bubble;
use crate::domain::models::ChatEvent;
use crate::domain::models::ChatView;
use crate::domain::models::ConversationId;
use crate::domain::models::ConversationTarget;

const TOAST_DURATION: Duration = Duration::from_secs(3);

pub struct AppState {
    pub controller: ChatController<ChatScreen>,
    pub bubble_list: BubbleList,
    pub scroll: Scroll,
    pub last_known_height: u16,
    pub last_known_width: u16,
    details_base_url: String,
    details_announced: usize,
}

impl AppState {
    pub fn new(
        controller: ChatController<ChatScreen>,
        username: &str,
        details_base_url: &str,
    ) -> AppState {
        return AppState {
            controller,
            bubble_list: BubbleList::new(username),
            scroll: Scroll::default(),
            last_known_height: 0,
            last_known_width: 0,
            details_base_url: details_base_url.trim_end_matches('/').to_string(),
            details_announced: 0,
        };
    }

    pub fn screen(&self) -> &ChatScreen {
        return self.controller.view();
    }

    pub fn handle_chat_event(&mut self, event: ChatEvent) {
        self.controller.handle(event);
        self.sync_dependants();
    }

    /// Applies a prompt action. Returns false when the user asked to quit.
    pub fn handle_action(&mut self, action: Action) -> bool {
        match action {
            Action::Quit() => return false,
            Action::Send(text) => self.controller.send_message(&text),
            Action::ShowDetails() => self.controller.show_details(),
            Action::NewChat() => self.controller.start_new_chat(),
            Action::Save() => {
                self.controller.save();
            }
            Action::ListConversations() => self.controller.reload_conversations(),
            Action::Search(term) => self.controller.search_conversations(&term),
            Action::Open(target) => {
                if let Some(id) = self.resolve(&target) {
                    self.controller.open_conversation(id);
                }
            }
            Action::Delete(target) => {
                if let Some(id) = self.resolve(&target) {
                    self.controller.delete_conversation(id);
                }
            }
            Action::Help() => {
                self.controller
                    .view_mut()
                    .append(Bubble::Notice(help_text()));
            }
            Action::Invalid(msg) => {
                self.controller.view_mut().append(Bubble::Error(msg));
            }
        }

        self.sync_dependants();
        return true;
    }

    fn resolve(&mut self, target: &ConversationTarget) -> Option<ConversationId> {
        let id = self.controller.resolve_target(target);
        if id.is_none() {
            if let ConversationTarget::Index(idx) = target {
                self.controller.view_mut().toast(&format!(
                    "No conversation {idx} in the list. Use /list to see saved conversations."
                ));
            }
        }

        return id;
    }

    /// Housekeeping on the redraw tick.
    pub fn tick(&mut self) {
        self.controller.view_mut().expire_toast(TOAST_DURATION);
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.last_known_width = rect.width;
        self.last_known_height = rect.height;
        self.sync_dependants();
    }

    fn announce_details(&mut self) {
        let ids = self.controller.view().details()[self.details_announced..].to_vec();
        self.details_announced += ids.len();

        for id in ids {
            let msg = format!("Movie details: {}/api/movies/{id}", self.details_base_url);
            self.controller.view_mut().toast(&msg);
        }
    }

    pub fn sync_dependants(&mut self) {
        self.announce_details();

        let follow = self.scroll.is_at_end() || self.screen().typing().is_some();
        self.bubble_list
            .set_screen(self.controller.view(), self.last_known_width.into());
        self.scroll
            .set_state(self.bubble_list.len(), self.last_known_height.into());

        if follow {
            self.scroll.last();
        }
    }
}
