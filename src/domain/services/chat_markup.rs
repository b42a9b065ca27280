#[cfg(test)]
#[path = "chat_markup_test.rs"]
mod tests;

use chrono::DateTime;
use chrono::Local;

use crate::domain::models::Bubble;
use crate::domain::models::ConversationSummary;
use crate::domain::models::SaveStatus;

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }

    return out;
}

/// User and client text is escaped, assistant markup is trusted as enriched.
pub fn bubble(bubble: &Bubble) -> String {
    let (class, content) = match bubble {
        Bubble::User(text) => ("message user-message", escape_html(text)),
        Bubble::Assistant { markup, .. } => ("message bot-message", markup.to_string()),
        Bubble::Notice(text) => ("message system-message", escape_html(text)),
        Bubble::Error(text) => ("message bot-message error-message", escape_html(text)),
    };

    return format!(r#"<div class="{class}"><div class="message-content">{content}</div></div>"#);
}

/// Status line shown while waiting on a reply.
pub fn thinking_text(elapsed_secs: u64) -> String {
    match elapsed_secs {
        0..=2 => return "FilmSage is thinking...".to_string(),
        10 => return "Almost there! Generating a thoughtful response...".to_string(),
        20 => return "This is a complex question, creating a detailed answer...".to_string(),
        30 => return "Thanks for your patience, final touches on your response...".to_string(),
        _ => return format!("FilmSage is processing your request... {elapsed_secs}s"),
    }
}

pub fn typing_indicator(elapsed_secs: u64) -> String {
    return format!(
        r#"<div class="typing-indicator"><span></span><span></span><span></span><div class="thinking-text">{}</div></div>"#,
        thinking_text(elapsed_secs)
    );
}

pub fn format_timestamp(then: DateTime<Local>, now: DateTime<Local>) -> String {
    let diff = now.signed_duration_since(then);
    let minutes = diff.num_minutes();

    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    if diff.num_hours() < 24 {
        return format!("{}h ago", diff.num_hours());
    }
    if diff.num_days() < 7 {
        return format!("{}d ago", diff.num_days());
    }

    return then.format("%m/%d/%Y").to_string();
}

pub fn conversation_item(
    summary: &ConversationSummary,
    active: bool,
    now: DateTime<Local>,
) -> String {
    let mut class = "conversation-item".to_string();
    if active {
        class.push_str(" active");
    }

    let date = summary
        .updated()
        .map(|updated| return format_timestamp(updated, now))
        .unwrap_or_default();

    return format!(
        r#"<div class="{class}" data-id="{}"><div class="conversation-title">{}</div><div class="conversation-preview">{}</div><div class="conversation-date">{date}</div></div>"#,
        escape_html(summary.id.as_str()),
        escape_html(&summary.display_title()),
        escape_html(&summary.display_preview()),
    );
}

/// Empty while idle, the badge is hidden.
pub fn save_badge(status: &SaveStatus) -> String {
    let class = match status {
        SaveStatus::Idle => return "".to_string(),
        SaveStatus::Saving => "saving",
        SaveStatus::Saved => "saved",
        SaveStatus::Error(_) => "error",
    };

    return format!(
        r#"<div class="save-status {class}">{}</div>"#,
        escape_html(&status.label())
    );
}

pub fn toast(message: &str) -> String {
    return format!(r#"<div class="toast">{}</div>"#, escape_html(message));
}
