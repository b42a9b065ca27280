mod action;
mod chat_view;
mod conversation;
mod error;
mod event;
mod loading;
mod message;
mod save_status;
mod slash_commands;
mod textarea;
mod transport;

pub use action::*;
pub use chat_view::*;
pub use conversation::*;
pub use error::*;
pub use event::*;
pub use loading::*;
pub use message::*;
pub use save_status::*;
pub use slash_commands::*;
pub use textarea::*;
pub use transport::*;
