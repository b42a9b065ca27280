#[cfg(test)]
#[path = "html_view_test.rs"]
mod tests;

use chrono::DateTime;
use chrono::Local;

use super::chat_markup;
use super::ChatScreen;
use crate::domain::models::ConversationListing;

pub struct HtmlView {}

impl HtmlView {
    /// Just the message bubbles, in display order.
    pub fn transcript(screen: &ChatScreen) -> String {
        let mut out = screen
            .bubbles()
            .iter()
            .map(chat_markup::bubble)
            .collect::<Vec<String>>()
            .join("\n");

        if screen.is_loading() {
            out.push_str(r#"<div class="loading-message">Loading conversation...</div>"#);
        }

        if let Some(elapsed) = screen.typing() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&chat_markup::typing_indicator(elapsed));
        }

        return out;
    }

    pub fn conversation_list(screen: &ChatScreen, now: DateTime<Local>) -> String {
        match screen.listing() {
            ConversationListing::Loading => {
                return r#"<div class="loading">Loading conversations...</div>"#.to_string();
            }
            ConversationListing::Searching(term) => {
                return format!(
                    r#"<div class="loading">Searching for "{}"...</div>"#,
                    chat_markup::escape_html(term)
                );
            }
            ConversationListing::Empty => {
                return r#"<div class="empty-state">No saved conversations yet</div>"#.to_string();
            }
            ConversationListing::NoMatches(term) => {
                return format!(
                    r#"<div class="empty-state">No conversations matching "{}"</div>"#,
                    chat_markup::escape_html(term)
                );
            }
            ConversationListing::Error(msg) => {
                return format!(
                    r#"<div class="error-state">{}</div>"#,
                    chat_markup::escape_html(msg)
                );
            }
            ConversationListing::Items(items) => {
                return items
                    .iter()
                    .map(|item| {
                        let active = screen.active() == Some(&item.id);
                        return chat_markup::conversation_item(item, active, now);
                    })
                    .collect::<Vec<String>>()
                    .join("\n");
            }
        }
    }

    /// Standalone page with the header, conversation list and transcript.
    pub fn document(screen: &ChatScreen, now: DateTime<Local>) -> String {
        let title = chat_markup::escape_html(screen.title());
        let toasts = screen
            .toasts()
            .iter()
            .map(|e| return chat_markup::toast(e))
            .collect::<Vec<String>>()
            .join("\n");

        return format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body>
<header class="chat-header">
<h1 class="chat-title">{title}</h1>
{badge}
</header>
<aside class="conversation-list">
{list}
</aside>
<main class="chat-messages">
{transcript}
</main>
<div class="toasts">
{toasts}
</div>
</body>
</html>
"#,
            badge = chat_markup::save_badge(screen.save_status()),
            list = HtmlView::conversation_list(screen, now),
            transcript = HtmlView::transcript(screen),
        );
    }
}
