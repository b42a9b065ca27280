#[cfg(test)]
#[path = "actions_test.rs"]
mod tests;

use crate::domain::models::Action;
use crate::domain::models::ConversationTarget;
use crate::domain::models::SlashCommand;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /new (/n) - Saves the current conversation, then starts a new one.
- /save (/s) - Saves the current conversation now.
- /list (/l) - Reloads the saved conversation list.
- /search (/f) [TERM] - Searches saved conversations. An empty term shows the full list again.
- /open (/o) [NUMBER,#ID] - Opens a saved conversation, either by its number in the list or by its id.
- /delete (/d) [NUMBER,#ID] - Deletes a saved conversation.
- /details (/trailer) - Shows details for the last movie FilmSage mentioned. Typing "show details" or "show me trailer" does the same.
- /quit /exit (/q) - Exit FilmSage.
- /help (/h) - Provides this help menu.

HOTKEYS:
- Up arrow - Scroll up
- Down arrow - Scroll down
- CTRL+U - Page up
- CTRL+D - Page down
- CTRL+N - Start a new conversation.
- CTRL+S - Save the current conversation.
- CTRL+C - Exit, after saving the current conversation.
        "#;

    return text.trim().to_string();
}

fn target_action(
    command: &SlashCommand,
    usage: &str,
    make: fn(ConversationTarget) -> Action,
) -> Action {
    match ConversationTarget::parse(&command.rest()) {
        Some(ConversationTarget::Index(0)) | None => return Action::Invalid(usage.to_string()),
        Some(target) => return make(target),
    }
}

pub struct ActionsService {}

impl ActionsService {
    /// Maps a line typed into the prompt to what the user asked for.
    pub fn from_input(text: &str) -> Action {
        let Some(command) = SlashCommand::parse(text) else {
            return Action::Send(text.trim().to_string());
        };

        if command.is_quit() {
            return Action::Quit();
        }
        if command.is_new_chat() {
            return Action::NewChat();
        }
        if command.is_save() {
            return Action::Save();
        }
        if command.is_list() {
            return Action::ListConversations();
        }
        if command.is_search() {
            return Action::Search(command.rest());
        }
        if command.is_open() {
            return target_action(
                &command,
                "You must pass a conversation number or #id with `/open`. Run `/help` for more details.",
                Action::Open,
            );
        }
        if command.is_delete() {
            return target_action(
                &command,
                "You must pass a conversation number or #id with `/delete`. Run `/help` for more details.",
                Action::Delete,
            );
        }
        if command.is_details() {
            return Action::ShowDetails();
        }

        return Action::Help();
    }
}
