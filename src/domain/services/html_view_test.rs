use anyhow::Result;
use chrono::Local;
use chrono::TimeZone;

use super::HtmlView;
use crate::domain::models::Bubble;
use crate::domain::models::ChatView;
use crate::domain::models::ConversationListing;
use crate::domain::models::SaveStatus;
use crate::domain::services::ChatScreen;

#[test]
fn it_renders_a_transcript_with_typing() {
    let mut screen = ChatScreen::default();
    screen.append(Bubble::User("Any heist films?".to_string()));
    screen.set_typing(Some(0));

    insta::assert_snapshot!(HtmlView::transcript(&screen), @r###"
    <div class="message user-message"><div class="message-content">Any heist films?</div></div>
    <div class="typing-indicator"><span></span><span></span><span></span><div class="thinking-text">FilmSage is thinking...</div></div>
    "###);
}

#[test]
fn it_renders_list_states() -> Result<()> {
    let now = Local.with_ymd_and_hms(2024, 3, 4, 19, 0, 0).unwrap();
    let mut screen = ChatScreen::default();

    assert_eq!(
        HtmlView::conversation_list(&screen, now),
        r#"<div class="empty-state">No saved conversations yet</div>"#
    );

    screen.set_conversations(ConversationListing::Loading);
    assert_eq!(
        HtmlView::conversation_list(&screen, now),
        r#"<div class="loading">Loading conversations...</div>"#
    );

    screen.set_conversations(ConversationListing::Error(
        "Error loading conversations: boom".to_string(),
    ));
    assert_eq!(
        HtmlView::conversation_list(&screen, now),
        r#"<div class="error-state">Error loading conversations: boom</div>"#
    );

    return Ok(());
}

#[test]
fn it_renders_a_document() -> Result<()> {
    let now = Local.with_ymd_and_hms(2024, 3, 4, 19, 0, 0).unwrap();
    let mut screen = ChatScreen::default();
    screen.set_title("Heist <films>");
    screen.set_save_status(&SaveStatus::Saved);
    screen.append(Bubble::Assistant {
        text: "Heat".to_string(),
        markup: "<p>Heat</p>".to_string(),
    });
    screen.toast("Saved");

    insta::assert_snapshot!(HtmlView::document(&screen, now), @r###"
    <!DOCTYPE html>
    <html>
    <head>
    <meta charset="utf-8">
    <title>Heist &lt;films&gt;</title>
    </head>
    <body>
    <header class="chat-header">
    <h1 class="chat-title">Heist &lt;films&gt;</h1>
    <div class="save-status saved">Saved</div>
    </header>
    <aside class="conversation-list">
    <div class="empty-state">No saved conversations yet</div>
    </aside>
    <main class="chat-messages">
    <div class="message bot-message"><div class="message-content"><p>Heat</p></div></div>
    </main>
    <div class="toasts">
    <div class="toast">Saved</div>
    </div>
    </body>
    </html>
    "###);

    return Ok(());
}
