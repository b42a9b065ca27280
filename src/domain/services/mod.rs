pub mod actions;
mod app_state;
mod bubble;
mod bubble_list;
pub mod chat_markup;
mod chat_screen;
mod controller;
mod conversation_panel;
mod conversation_state;
mod enrichment;
pub mod events;
mod export;
mod html_view;
mod markup_lines;
mod persistence;
mod scroll;
mod timers;

pub use app_state::*;
pub use bubble::*;
pub use bubble_list::*;
pub use chat_screen::*;
pub use controller::*;
pub use conversation_panel::*;
pub use conversation_state::*;
pub use enrichment::*;
pub use export::*;
pub use html_view::*;
pub use markup_lines::*;
pub use persistence::*;
pub use scroll::*;
pub use timers::*;
