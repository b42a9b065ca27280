use anyhow::Result;
use ratatui::text::Line;
use test_utils::conversation_list_fixture;

use super::ConversationPanel;
use crate::domain::models::parse_timestamp;
use crate::domain::models::sort_by_recent;
use crate::domain::models::ChatView;
use crate::domain::models::ConversationId;
use crate::domain::models::ConversationListing;
use crate::domain::models::ConversationSummary;
use crate::domain::models::SaveStatus;
use crate::domain::services::ChatScreen;

fn as_text(lines: &[Line]) -> Vec<String> {
    return lines
        .iter()
        .map(|line| {
            return line
                .spans
                .iter()
                .map(|span| return span.content.to_string())
                .collect::<String>();
        })
        .collect();
}

#[test]
fn it_numbers_conversations_and_marks_the_active_one() -> Result<()> {
    let mut items: Vec<ConversationSummary> = serde_json::from_str(conversation_list_fixture())?;
    sort_by_recent(&mut items);

    let mut screen = ChatScreen::default();
    screen.set_conversations(ConversationListing::Items(items));
    screen.set_active_conversation(Some(&ConversationId::new("5")));

    let now = parse_timestamp("2024-03-04T18:40:00").unwrap();
    let lines = ConversationPanel::lines(&screen, now);

    assert_eq!(
        as_text(&lines),
        vec![
            "  1. Chat 7 (03/02/2024)",
            "   No preview available",
            "   10m ago",
            "",
            "▶ 2. Nolan marathon",
            "   Rank the Nolan films",
            "   1d ago",
            "",
            "  3. Space movies",
            "   Something like Interstellar?",
            "   3d ago",
            "",
        ]
    );

    return Ok(());
}

#[test]
fn it_shows_list_states() {
    let now = parse_timestamp("2024-03-04T18:40:00").unwrap();
    let mut screen = ChatScreen::default();
    assert_eq!(
        as_text(&ConversationPanel::lines(&screen, now)),
        vec!["No saved conversations yet"]
    );

    screen.set_conversations(ConversationListing::Searching("heat".to_string()));
    assert_eq!(
        as_text(&ConversationPanel::lines(&screen, now)),
        vec!["Searching for \"heat\"..."]
    );

    screen.set_conversations(ConversationListing::NoMatches("heat".to_string()));
    assert_eq!(
        as_text(&ConversationPanel::lines(&screen, now)),
        vec!["No conversations matching \"heat\""]
    );
}

#[test]
fn it_puts_the_save_badge_in_the_header() {
    let mut screen = ChatScreen::default();
    assert_eq!(
        as_text(&[ConversationPanel::header(&screen)]),
        vec![" New Conversation "]
    );

    screen.set_save_status(&SaveStatus::Saved);
    assert_eq!(
        as_text(&[ConversationPanel::header(&screen)]),
        vec![" New Conversation [Saved]"]
    );
}

#[test]
fn it_shows_the_latest_toast() {
    let mut screen = ChatScreen::default();
    assert!(ConversationPanel::toast(&screen).spans.is_empty());

    screen.toast("first");
    screen.toast("second");
    assert_eq!(
        as_text(&[ConversationPanel::toast(&screen)]),
        vec![" second"]
    );
}
