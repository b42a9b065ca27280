use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use test_utils::conversation_list_fixture;
use test_utils::trailer_reply_fixture;
use tokio::sync::mpsc;

use super::ChatController;
use super::WELCOME_MESSAGE;
use crate::domain::models::Bubble;
use crate::domain::models::ChatError;
use crate::domain::models::ChatEvent;
use crate::domain::models::ChatReply;
use crate::domain::models::ChatResult;
use crate::domain::models::ChatTransport;
use crate::domain::models::ConversationId;
use crate::domain::models::ConversationListing;
use crate::domain::models::ConversationSummary;
use crate::domain::models::ConversationTarget;
use crate::domain::models::LoadedConversation;
use crate::domain::models::Message;
use crate::domain::models::MovieId;
use crate::domain::models::SaveStatus;
use crate::domain::services::ChatScreen;
use crate::domain::services::Enricher;

#[derive(Default)]
struct MockTransport {
    replies: Mutex<VecDeque<ChatResult<ChatReply>>>,
    conversations: Mutex<VecDeque<ChatResult<LoadedConversation>>>,
    lists: Mutex<VecDeque<ChatResult<Vec<ConversationSummary>>>>,
    deletes: Mutex<VecDeque<ChatResult<()>>>,
    saves: Mutex<VecDeque<ChatResult<Option<ConversationId>>>>,
    calls: Mutex<Vec<String>>,
}

impl MockTransport {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        return self.calls.lock().unwrap().clone();
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn send_message(
        &self,
        text: &str,
        history: &[Message],
        conversation_id: Option<&ConversationId>,
    ) -> ChatResult<ChatReply> {
        let id = conversation_id
            .map(|e| return e.to_string())
            .unwrap_or_else(|| return "-".to_string());
        self.record(format!("send:{text}:{}:{id}", history.len()));

        return self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| return reply("Sure."));
    }

    async fn load_conversation(&self, id: &ConversationId) -> ChatResult<LoadedConversation> {
        self.record(format!("load:{id}"));
        return self
            .conversations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| return Err(ChatError::NotFound(id.clone())));
    }

    async fn list_conversations(&self) -> ChatResult<Vec<ConversationSummary>> {
        self.record("list".to_string());
        return self
            .lists
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| return Ok(vec![]));
    }

    async fn search_conversations(&self, term: &str) -> ChatResult<Vec<ConversationSummary>> {
        self.record(format!("search:{term}"));
        return self
            .lists
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| return Ok(vec![]));
    }

    async fn delete_conversation(&self, id: &ConversationId) -> ChatResult<()> {
        self.record(format!("delete:{id}"));
        return self
            .deletes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| return Ok(()));
    }

    async fn save_conversation(
        &self,
        id: Option<&ConversationId>,
        messages: &[Message],
        title: Option<&str>,
    ) -> ChatResult<Option<ConversationId>> {
        let id = id
            .map(|e| return e.to_string())
            .unwrap_or_else(|| return "new".to_string());
        self.record(format!(
            "save:{id}:{}:{}",
            messages.len(),
            title.unwrap_or("-")
        ));

        return self
            .saves
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| return Ok(Some(ConversationId::new("1"))));
    }
}

fn reply(text: &str) -> ChatResult<ChatReply> {
    return Ok(ChatReply {
        response: text.to_string(),
        last_mentioned_movie_id: None,
        conversation_id: None,
    });
}

fn fixture_list() -> Vec<ConversationSummary> {
    return serde_json::from_str(conversation_list_fixture()).unwrap();
}

struct Harness {
    controller: ChatController<ChatScreen>,
    transport: Arc<MockTransport>,
    rx: mpsc::UnboundedReceiver<ChatEvent>,
}

impl Harness {
    fn new(transport: MockTransport) -> Harness {
        return Harness::with_debounce(transport, Duration::ZERO);
    }

    fn with_debounce(transport: MockTransport, debounce: Duration) -> Harness {
        let (tx, rx) = mpsc::unbounded_channel::<ChatEvent>();
        let transport = Arc::new(transport);
        let controller = ChatController::new(
            transport.clone(),
            Enricher::default(),
            ChatScreen::default(),
            debounce,
            tx,
        );

        return Harness {
            controller,
            transport,
            rx,
        };
    }

    /// Applies events until no transport call is outstanding.
    async fn settle(&mut self) {
        while !self.controller.is_idle() {
            let event = self.rx.recv().await.unwrap();
            self.controller.handle(event);
        }
    }

    /// Applies events until one matching `wanted` arrives, which is handed
    /// back unapplied.
    async fn hold(&mut self, wanted: fn(&ChatEvent) -> bool) -> ChatEvent {
        loop {
            let event = self.rx.recv().await.unwrap();
            if wanted(&event) {
                return event;
            }
            self.controller.handle(event);
        }
    }

    /// Applies the next event, whatever it is.
    async fn next(&mut self) -> String {
        let event = self.rx.recv().await.unwrap();
        let name = format!("{event:?}")
            .split('(')
            .next()
            .unwrap()
            .to_string();
        self.controller.handle(event);
        return name;
    }

    fn screen(&self) -> &ChatScreen {
        return self.controller.view();
    }

    fn calls(&self) -> Vec<String> {
        return self.transport.calls();
    }
}

mod send_message {
    use super::*;

    #[tokio::test]
    async fn it_records_one_exchange_and_saves() -> Result<()> {
        let mut harness = Harness::new(MockTransport::default());
        harness.controller.send_message("  hi  ");
        assert_eq!(harness.screen().typing(), Some(0));
        harness.settle().await;

        assert_eq!(
            harness.controller.state().history(),
            &[Message::user("hi"), Message::assistant("Sure.")]
        );
        assert_eq!(harness.screen().bubbles().len(), 2);
        assert_eq!(harness.screen().bubbles()[0], Bubble::User("hi".to_string()));
        assert_eq!(harness.screen().typing(), None);
        assert_eq!(harness.calls(), vec!["send:hi:0:-", "save:new:2:hi"]);
        assert_eq!(
            harness.controller.state().conversation_id(),
            Some(&ConversationId::new("1"))
        );
        assert_eq!(harness.screen().active(), Some(&ConversationId::new("1")));
        assert_eq!(harness.controller.save_status(), &SaveStatus::Saved);

        return Ok(());
    }

    #[tokio::test]
    async fn it_updates_once_the_id_is_known() -> Result<()> {
        let mut harness = Harness::new(MockTransport::default());
        harness.controller.send_message("hi");
        harness.settle().await;
        harness.controller.send_message("more please");
        harness.settle().await;

        assert_eq!(
            harness.calls(),
            vec![
                "send:hi:0:-",
                "save:new:2:hi",
                "send:more please:2:1",
                "save:1:4:-"
            ]
        );

        return Ok(());
    }

    #[tokio::test]
    async fn it_leaves_history_alone_on_failure() -> Result<()> {
        let transport = MockTransport::default();
        transport
            .replies
            .lock()
            .unwrap()
            .push_back(Err(ChatError::Status {
                status: 500,
                body: "".to_string(),
            }));

        let mut harness = Harness::new(transport);
        harness.controller.send_message("hi");
        harness.settle().await;

        assert!(harness.controller.state().history().is_empty());
        assert_eq!(
            harness.screen().bubbles(),
            &[
                Bubble::User("hi".to_string()),
                Bubble::Error(
                    "Sorry, I'm having trouble connecting: Server responded with status: 500"
                        .to_string()
                ),
            ]
        );
        assert_eq!(harness.calls(), vec!["send:hi:0:-"]);
        assert!(!harness.controller.state().reply_pending());

        return Ok(());
    }

    #[tokio::test]
    async fn it_reports_invalid_responses() -> Result<()> {
        let transport = MockTransport::default();
        transport
            .replies
            .lock()
            .unwrap()
            .push_back(Err(ChatError::InvalidResponse));

        let mut harness = Harness::new(transport);
        harness.controller.send_message("hi");
        harness.settle().await;

        assert!(harness.controller.state().history().is_empty());
        assert_eq!(
            harness.screen().bubbles().last(),
            Some(&Bubble::Error(
                "Sorry, I received an invalid response. Please try again.".to_string()
            ))
        );

        return Ok(());
    }

    #[tokio::test]
    async fn it_ignores_empty_messages() -> Result<()> {
        let mut harness = Harness::new(MockTransport::default());
        harness.controller.send_message("   ");
        harness.settle().await;

        assert!(harness.screen().bubbles().is_empty());
        assert!(harness.calls().is_empty());

        return Ok(());
    }

    #[tokio::test]
    async fn it_rejects_a_second_send_while_waiting() -> Result<()> {
        let mut harness = Harness::new(MockTransport::default());
        harness.controller.send_message("first");
        harness.controller.send_message("second");
        harness.settle().await;

        assert_eq!(harness.calls(), vec!["send:first:0:-", "save:new:2:first"]);
        assert_eq!(
            harness.screen().toasts(),
            &["FilmSage is still replying".to_string()]
        );

        return Ok(());
    }

    #[tokio::test]
    async fn it_adopts_a_server_assigned_id() -> Result<()> {
        let transport = MockTransport::default();
        transport.replies.lock().unwrap().push_back(Ok(ChatReply {
            response: "Sure.".to_string(),
            last_mentioned_movie_id: Some(MovieId::new("155")),
            conversation_id: Some(ConversationId::new("42")),
        }));

        let mut harness = Harness::new(transport);
        harness.controller.send_message("hi");
        harness.settle().await;

        assert_eq!(harness.calls(), vec!["send:hi:0:-", "save:42:2:-"]);
        assert_eq!(
            harness.controller.state().last_mentioned_movie(),
            Some(&MovieId::new("155"))
        );

        return Ok(());
    }
}

mod show_details {
    use super::*;

    #[tokio::test]
    async fn it_needs_a_mentioned_movie() -> Result<()> {
        let mut harness = Harness::new(MockTransport::default());
        harness.controller.send_message("Show Details");
        harness.settle().await;

        assert!(harness.calls().is_empty());
        assert_eq!(
            harness.screen().bubbles(),
            &[Bubble::Error(
                "No movie details available. Please ask about a movie first.".to_string()
            )]
        );

        return Ok(());
    }

    #[tokio::test]
    async fn it_opens_the_trailer_movie() -> Result<()> {
        let transport = MockTransport::default();
        transport
            .replies
            .lock()
            .unwrap()
            .push_back(reply(trailer_reply_fixture()));

        let mut harness = Harness::new(transport);
        harness.controller.send_message("something like Oppenheimer?");
        harness.settle().await;
        harness.controller.send_message("show me trailer");

        assert_eq!(harness.screen().details(), &[MovieId::new("872585")]);
        assert_eq!(harness.controller.state().history().len(), 2);

        return Ok(());
    }

    #[tokio::test]
    async fn it_prefers_the_featured_movie_across_replies() -> Result<()> {
        let transport = MockTransport::default();
        transport
            .replies
            .lock()
            .unwrap()
            .push_back(reply("You might love Barbie (2023)."));
        transport
            .replies
            .lock()
            .unwrap()
            .push_back(reply(trailer_reply_fixture()));

        let mut harness = Harness::new(transport);
        harness.controller.send_message("pink movies?");
        harness.settle().await;
        harness.controller.send_message("something darker?");
        harness.settle().await;
        harness.controller.show_details();

        assert!(harness.controller.state().featured_mentioned());
        assert_eq!(harness.screen().details(), &[MovieId::new("346698")]);

        return Ok(());
    }
}

mod persistence {
    use super::*;

    #[tokio::test]
    async fn it_refuses_manual_saves_without_an_exchange() -> Result<()> {
        let mut harness = Harness::new(MockTransport::default());
        assert!(!harness.controller.save());
        harness.settle().await;

        assert!(harness.calls().is_empty());
        assert_eq!(harness.screen().toasts(), &["Nothing to save yet".to_string()]);
        assert_eq!(harness.controller.save_status(), &SaveStatus::Idle);

        return Ok(());
    }

    #[tokio::test]
    async fn it_saves_manually() -> Result<()> {
        let mut harness = Harness::new(MockTransport::default());
        harness.controller.send_message("hi");
        harness.settle().await;

        assert!(harness.controller.save());
        assert_eq!(harness.controller.save_status(), &SaveStatus::Saving);
        harness.settle().await;

        assert_eq!(harness.calls().last(), Some(&"save:1:2:-".to_string()));
        assert_eq!(harness.controller.save_status(), &SaveStatus::Saved);

        return Ok(());
    }

    #[tokio::test]
    async fn it_keeps_history_when_a_save_fails() -> Result<()> {
        let transport = MockTransport::default();
        transport
            .saves
            .lock()
            .unwrap()
            .push_back(Err(ChatError::Status {
                status: 503,
                body: "".to_string(),
            }));

        let mut harness = Harness::new(transport);
        harness.controller.send_message("hi");
        harness.settle().await;

        assert_eq!(harness.controller.state().history().len(), 2);
        assert_eq!(harness.controller.state().conversation_id(), None);
        assert_eq!(
            harness.controller.save_status(),
            &SaveStatus::Error("Failed to save".to_string())
        );
        assert_eq!(
            harness.screen().last_toast(),
            Some("Error saving: Server responded with status: 503")
        );

        return Ok(());
    }

    #[tokio::test(start_paused = true)]
    async fn it_refreshes_the_list_and_hides_the_badge() -> Result<()> {
        let mut harness = Harness::new(MockTransport::default());
        harness.controller.send_message("hi");
        harness.settle().await;
        assert_eq!(harness.screen().save_status(), &SaveStatus::Saved);

        assert_eq!(harness.next().await, "RefreshConversationsDue");
        assert_eq!(harness.next().await, "ConversationsListed");
        assert_eq!(harness.next().await, "SaveStatusExpired");

        assert_eq!(harness.screen().save_status(), &SaveStatus::Idle);
        assert_eq!(harness.calls().last(), Some(&"list".to_string()));

        return Ok(());
    }

    #[tokio::test(start_paused = true)]
    async fn it_debounces_autosaves() -> Result<()> {
        let mut harness =
            Harness::with_debounce(MockTransport::default(), Duration::from_millis(1000));
        harness.controller.send_message("a");
        harness.settle().await;
        harness.controller.send_message("b");
        harness.settle().await;
        assert_eq!(harness.calls(), vec!["send:a:0:-", "send:b:2:-"]);

        assert_eq!(harness.next().await, "AutosaveDue");
        harness.settle().await;
        assert_eq!(
            harness.calls(),
            vec!["send:a:0:-", "send:b:2:-", "save:new:4:a"]
        );

        return Ok(());
    }

    #[tokio::test]
    async fn it_saves_on_unload() -> Result<()> {
        let mut harness = Harness::new(MockTransport::default());
        assert!(harness.controller.unload().is_none());

        harness.controller.send_message("hi");
        harness.settle().await;

        let handle = harness.controller.unload();
        assert!(handle.is_some());
        handle.unwrap().await?;
        assert_eq!(harness.calls().last(), Some(&"save:1:2:-".to_string()));

        return Ok(());
    }
}

mod new_chat {
    use super::*;

    #[tokio::test]
    async fn it_saves_before_starting_over() -> Result<()> {
        let mut harness = Harness::new(MockTransport::default());
        harness.controller.send_message("hi");
        harness.settle().await;

        harness.controller.start_new_chat();
        assert_eq!(harness.controller.state().history().len(), 2);
        harness.settle().await;

        assert_eq!(
            harness.calls(),
            vec!["send:hi:0:-", "save:new:2:hi", "save:1:2:-", "list"]
        );
        assert!(harness.controller.state().history().is_empty());
        assert_eq!(harness.controller.state().conversation_id(), None);
        assert_eq!(harness.screen().title(), "New Conversation");
        assert_eq!(harness.screen().bubbles().len(), 1);
        assert!(matches!(
            &harness.screen().bubbles()[0],
            Bubble::Assistant { text, .. } if text == WELCOME_MESSAGE
        ));
        assert_eq!(
            harness.screen().toasts(),
            &[
                "Saving conversation before starting new chat".to_string(),
                "New conversation started".to_string(),
            ]
        );

        return Ok(());
    }

    #[tokio::test]
    async fn it_starts_over_even_if_the_save_fails() -> Result<()> {
        let transport = MockTransport::default();
        transport.saves.lock().unwrap().push_back(Ok(None));
        transport
            .saves
            .lock()
            .unwrap()
            .push_back(Err(ChatError::InvalidResponse));

        let mut harness = Harness::new(transport);
        harness.controller.send_message("hi");
        harness.settle().await;
        harness.controller.start_new_chat();
        harness.settle().await;

        assert!(harness.controller.state().history().is_empty());
        assert_eq!(
            harness.controller.save_status(),
            &SaveStatus::Error("Failed to save".to_string())
        );

        return Ok(());
    }

    #[tokio::test]
    async fn it_ignores_ids_saved_for_the_previous_conversation() -> Result<()> {
        let transport = MockTransport::default();
        transport
            .saves
            .lock()
            .unwrap()
            .extend([Ok(Some(ConversationId::new("A"))), Ok(Some(ConversationId::new("B")))]);

        let mut harness = Harness::new(transport);
        harness.controller.send_message("hi");
        let reply = harness
            .hold(|event| return matches!(event, ChatEvent::ReplyReceived(..)))
            .await;
        harness.controller.handle(reply);
        let late_save = harness
            .hold(|event| return matches!(event, ChatEvent::ConversationSaved(..)))
            .await;

        harness.controller.start_new_chat();
        let new_chat_save = harness
            .hold(|event| return matches!(event, ChatEvent::ConversationSaved(..)))
            .await;
        harness.controller.handle(new_chat_save);
        harness.controller.handle(late_save);
        harness.settle().await;

        assert!(harness.controller.state().history().is_empty());
        assert_eq!(harness.controller.state().conversation_id(), None);
        assert_eq!(harness.screen().active(), None);
        assert_eq!(harness.controller.save_status(), &SaveStatus::Saved);

        harness.controller.send_message("more");
        harness.settle().await;
        let last_save = harness
            .calls()
            .into_iter()
            .filter(|call| return call.starts_with("save:"))
            .last();
        assert_eq!(last_save.as_deref(), Some("save:new:2:more"));

        return Ok(());
    }

    #[tokio::test]
    async fn it_skips_the_save_for_an_empty_chat() -> Result<()> {
        let mut harness = Harness::new(MockTransport::default());
        harness.controller.start_new_chat();
        harness.settle().await;

        assert_eq!(harness.calls(), vec!["list"]);
        assert_eq!(harness.screen().listing(), &ConversationListing::Empty);

        return Ok(());
    }
}

mod conversations {
    use super::*;

    #[tokio::test]
    async fn it_lists_newest_first() -> Result<()> {
        let transport = MockTransport::default();
        transport.lists.lock().unwrap().push_back(Ok(fixture_list()));

        let mut harness = Harness::new(transport);
        harness.controller.reload_conversations();
        harness.controller.reload_conversations();
        assert_eq!(harness.screen().listing(), &ConversationListing::Loading);
        harness.settle().await;

        assert_eq!(harness.calls(), vec!["list"]);
        let ids = harness
            .screen()
            .listed()
            .iter()
            .map(|item| return item.id.to_string())
            .collect::<Vec<String>>();
        assert_eq!(ids, vec!["7", "5", "3"]);
        assert_eq!(
            harness
                .controller
                .resolve_target(&ConversationTarget::Index(2)),
            Some(ConversationId::new("5"))
        );
        assert_eq!(
            harness
                .controller
                .resolve_target(&ConversationTarget::Index(4)),
            None
        );

        harness.controller.reload_conversations();
        harness.settle().await;
        assert_eq!(harness.calls(), vec!["list", "list"]);

        return Ok(());
    }

    #[tokio::test]
    async fn it_shows_list_errors() -> Result<()> {
        let transport = MockTransport::default();
        transport
            .lists
            .lock()
            .unwrap()
            .push_back(Err(ChatError::Status {
                status: 500,
                body: "".to_string(),
            }));

        let mut harness = Harness::new(transport);
        harness.controller.reload_conversations();
        harness.settle().await;

        assert_eq!(
            harness.screen().listing(),
            &ConversationListing::Error(
                "Error loading conversations: Server responded with status: 500".to_string()
            )
        );
        assert!(!harness.controller.state().list_reload_in_flight());

        return Ok(());
    }

    #[tokio::test]
    async fn it_searches_with_two_or_more_characters() -> Result<()> {
        let mut harness = Harness::new(MockTransport::default());
        harness.controller.search_conversations("n");
        harness.settle().await;
        assert!(harness.calls().is_empty());

        harness.controller.search_conversations("nolan");
        harness.settle().await;
        assert_eq!(harness.calls(), vec!["search:nolan"]);
        assert_eq!(
            harness.screen().listing(),
            &ConversationListing::NoMatches("nolan".to_string())
        );

        harness.controller.search_conversations("  ");
        harness.settle().await;
        assert_eq!(harness.calls(), vec!["search:nolan", "list"]);

        return Ok(());
    }

    #[tokio::test]
    async fn it_replaces_history_when_loading() -> Result<()> {
        let transport = MockTransport::default();
        transport
            .conversations
            .lock()
            .unwrap()
            .push_back(Ok(LoadedConversation {
                title: Some("Heist night".to_string()),
                messages: vec![
                    Message::user("Heat?"),
                    Message::assistant("Heat (1995) is great."),
                ],
            }));

        let mut harness = Harness::new(transport);
        harness.controller.send_message("hi");
        harness.settle().await;

        harness
            .controller
            .open_conversation(ConversationId::new("9"));
        assert!(harness.screen().is_loading());
        harness.settle().await;

        assert_eq!(
            harness.controller.state().history(),
            &[
                Message::user("Heat?"),
                Message::assistant("Heat (1995) is great.")
            ]
        );
        assert_eq!(
            harness.controller.state().conversation_id(),
            Some(&ConversationId::new("9"))
        );
        assert_eq!(harness.screen().title(), "Heist night");
        assert_eq!(harness.screen().active(), Some(&ConversationId::new("9")));
        assert_eq!(harness.screen().bubbles().len(), 2);
        match &harness.screen().bubbles()[1] {
            Bubble::Assistant { markup, .. } => {
                assert!(markup.contains(r#"<span class="movie-mention">Heat (1995)</span>"#));
            }
            other => panic!("Expected an assistant bubble, got {other:?}"),
        }

        return Ok(());
    }

    #[tokio::test]
    async fn it_shows_load_failures_inline() -> Result<()> {
        let mut harness = Harness::new(MockTransport::default());
        harness
            .controller
            .open_conversation(ConversationId::new("9"));
        harness.settle().await;

        assert_eq!(
            harness.screen().bubbles(),
            &[Bubble::Error(
                "Error loading conversation: Conversation 9 was not found".to_string()
            )]
        );
        assert!(!harness.screen().is_loading());

        return Ok(());
    }

    #[tokio::test]
    async fn it_drops_missing_conversations_from_the_list() -> Result<()> {
        let transport = MockTransport::default();
        transport.lists.lock().unwrap().push_back(Ok(fixture_list()));
        transport
            .conversations
            .lock()
            .unwrap()
            .push_back(Err(ChatError::InvalidResponse));

        let mut harness = Harness::new(transport);
        harness.controller.reload_conversations();
        harness.settle().await;

        let listed_ids = |harness: &Harness| {
            return harness
                .screen()
                .listed()
                .iter()
                .map(|item| return item.id.to_string())
                .collect::<Vec<String>>();
        };

        harness
            .controller
            .open_conversation(ConversationId::new("5"));
        harness.settle().await;
        assert_eq!(listed_ids(&harness), vec!["7", "5", "3"]);

        harness
            .controller
            .open_conversation(ConversationId::new("5"));
        harness.settle().await;
        assert_eq!(listed_ids(&harness), vec!["7", "3"]);
        assert_eq!(
            harness
                .controller
                .resolve_target(&ConversationTarget::Index(2)),
            Some(ConversationId::new("3"))
        );

        return Ok(());
    }

    #[tokio::test]
    async fn it_resets_when_deleting_the_active_conversation() -> Result<()> {
        let mut harness = Harness::new(MockTransport::default());
        harness.controller.send_message("hi");
        harness.settle().await;

        harness
            .controller
            .delete_conversation(ConversationId::new("1"));
        harness.settle().await;

        assert!(harness.controller.state().history().is_empty());
        assert_eq!(harness.controller.state().conversation_id(), None);
        assert!(harness.screen().bubbles().is_empty());
        assert_eq!(harness.screen().active(), None);
        assert_eq!(
            harness.screen().last_toast(),
            Some("Conversation deleted successfully")
        );

        return Ok(());
    }

    #[tokio::test]
    async fn it_drops_replies_for_a_deleted_conversation() -> Result<()> {
        let mut harness = Harness::new(MockTransport::default());
        harness.controller.send_message("hi");
        harness.settle().await;

        harness.controller.send_message("more please");
        let late_reply = harness
            .hold(|event| return matches!(event, ChatEvent::ReplyReceived(..)))
            .await;
        harness
            .controller
            .delete_conversation(ConversationId::new("1"));
        let deleted = harness
            .hold(|event| return matches!(event, ChatEvent::ConversationDeleted(..)))
            .await;
        harness.controller.handle(deleted);
        harness.controller.handle(late_reply);
        harness.settle().await;

        assert!(harness.controller.state().history().is_empty());
        assert!(harness.screen().bubbles().is_empty());
        assert_eq!(harness.screen().typing(), None);
        assert_eq!(
            harness
                .calls()
                .iter()
                .filter(|call| return call.starts_with("save:"))
                .count(),
            1
        );

        return Ok(());
    }

    #[tokio::test]
    async fn it_keeps_the_active_conversation_when_deleting_another() -> Result<()> {
        let mut harness = Harness::new(MockTransport::default());
        harness.controller.send_message("hi");
        harness.settle().await;

        harness
            .controller
            .delete_conversation(ConversationId::new("3"));
        harness.settle().await;

        assert_eq!(harness.controller.state().history().len(), 2);
        assert_eq!(harness.screen().bubbles().len(), 2);

        return Ok(());
    }

    #[tokio::test]
    async fn it_reports_delete_failures() -> Result<()> {
        let transport = MockTransport::default();
        transport
            .deletes
            .lock()
            .unwrap()
            .push_back(Err(ChatError::NotFound(ConversationId::new("3"))));

        let mut harness = Harness::new(transport);
        harness
            .controller
            .delete_conversation(ConversationId::new("3"));
        harness.settle().await;

        assert_eq!(
            harness.screen().last_toast(),
            Some("Error deleting conversation: Conversation 3 was not found")
        );

        return Ok(());
    }
}
