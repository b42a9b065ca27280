#[cfg(test)]
#[path = "conversation_panel_test.rs"]
mod tests;

use chrono::DateTime;
use chrono::Local;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;

use super::chat_markup::format_timestamp;
use super::ChatScreen;
use crate::domain::models::ConversationListing;
use crate::domain::models::SaveStatus;

fn dim() -> Style {
    return Style::default().fg(Color::DarkGray);
}

/// Terminal counterparts of the sidebar, header and toast line.
pub struct ConversationPanel {}

impl ConversationPanel {
    /// Numbered so `/open <n>` and `/delete <n>` can refer to entries.
    pub fn lines(screen: &ChatScreen, now: DateTime<Local>) -> Vec<Line<'static>> {
        match screen.listing() {
            ConversationListing::Loading => {
                return vec![Line::styled("Loading conversations...", dim())];
            }
            ConversationListing::Searching(term) => {
                return vec![Line::styled(format!("Searching for \"{term}\"..."), dim())];
            }
            ConversationListing::Empty => {
                return vec![Line::styled("No saved conversations yet", dim())];
            }
            ConversationListing::NoMatches(term) => {
                return vec![Line::styled(
                    format!("No conversations matching \"{term}\""),
                    dim(),
                )];
            }
            ConversationListing::Error(msg) => {
                return vec![Line::styled(msg.to_string(), Style::default().fg(Color::Red))];
            }
            ConversationListing::Items(items) => {
                let mut lines = vec![];
                for (idx, item) in items.iter().enumerate() {
                    let mut title_style = Style::default().add_modifier(Modifier::BOLD);
                    let mut marker = "  ";
                    if screen.active() == Some(&item.id) {
                        title_style = title_style.fg(Color::Yellow);
                        marker = "▶ ";
                    }

                    lines.push(Line::from(vec![
                        Span::styled(marker, title_style),
                        Span::styled(format!("{}. {}", idx + 1, item.display_title()), title_style),
                    ]));
                    lines.push(Line::styled(format!("   {}", item.display_preview()), dim()));
                    if let Some(updated) = item.updated() {
                        lines.push(Line::styled(
                            format!("   {}", format_timestamp(updated, now)),
                            dim(),
                        ));
                    }
                    lines.push(Line::default());
                }

                return lines;
            }
        }
    }

    pub fn header(screen: &ChatScreen) -> Line<'static> {
        let mut spans = vec![Span::styled(
            format!(" {} ", screen.title()),
            Style::default().add_modifier(Modifier::BOLD),
        )];

        let badge_style = match screen.save_status() {
            SaveStatus::Idle => None,
            SaveStatus::Saving => Some(Style::default().fg(Color::Blue)),
            SaveStatus::Saved => Some(Style::default().fg(Color::Green)),
            SaveStatus::Error(_) => Some(Style::default().fg(Color::Red)),
        };
        if let Some(style) = badge_style {
            spans.push(Span::styled(format!("[{}]", screen.save_status().label()), style));
        }

        return Line::from(spans);
    }

    pub fn toast(screen: &ChatScreen) -> Line<'static> {
        return screen
            .last_toast()
            .map(|msg| {
                return Line::styled(
                    format!(" {msg}"),
                    Style::default().fg(Color::Black).bg(Color::Yellow),
                );
            })
            .unwrap_or_default();
    }
}
