#[cfg(test)]
#[path = "export_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use chrono::DateTime;
use chrono::Local;
use tokio::sync::mpsc;

use super::ChatController;
use super::ChatScreen;
use super::Enricher;
use super::HtmlView;
use crate::domain::models::Bubble;
use crate::domain::models::ChatEvent;
use crate::domain::models::ConversationId;
use crate::domain::models::TransportBox;

/// Renders stored conversations outside of the terminal UI.
pub struct TranscriptExport {}

impl TranscriptExport {
    /// Loads the conversation through the same pipeline the chat uses and
    /// returns the HTML document view, with the conversation list alongside.
    pub async fn render(
        transport: TransportBox,
        enricher: Enricher,
        id: ConversationId,
        now: DateTime<Local>,
    ) -> Result<String> {
        let (tx, mut rx) = mpsc::unbounded_channel::<ChatEvent>();
        let mut controller =
            ChatController::new(transport, enricher, ChatScreen::default(), Duration::ZERO, tx);

        controller.reload_conversations();
        controller.open_conversation(id.clone());

        while !controller.is_idle() {
            let Some(event) = rx.recv().await else {
                break;
            };
            controller.handle(event);
        }

        if !controller.state().is_active(&id) {
            let reason = controller
                .view()
                .bubbles()
                .iter()
                .find_map(|bubble| {
                    if let Bubble::Error(msg) = bubble {
                        return Some(msg.to_string());
                    }
                    return None;
                })
                .unwrap_or_else(|| return format!("Conversation {id} could not be loaded"));

            bail!(reason);
        }

        tracing::debug!(conversation_id = %id, "Exported conversation");
        return Ok(HtmlView::document(controller.view(), now));
    }
}
