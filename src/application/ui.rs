use std::io;
use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use crossterm::cursor;
use crossterm::event::DisableMouseCapture;
use crossterm::event::EnableMouseCapture;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::*;
use ratatui::widgets::Block;
use ratatui::widgets::BorderType;
use ratatui::widgets::Borders;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Scrollbar;
use ratatui::widgets::ScrollbarOrientation;
use ratatui::widgets::Wrap;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tokio::time;
#[cfg(feature = "dev")]
use tui_textarea::Input;
#[cfg(feature = "dev")]
use tui_textarea::Key;

use crate::application::cli;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::ChatEvent;
use crate::domain::models::ConversationId;
use crate::domain::models::Event;
use crate::domain::models::Loading;
use crate::domain::models::TextArea;
use crate::domain::services::actions::ActionsService;
use crate::domain::services::chat_markup::thinking_text;
use crate::domain::services::events::EventsService;
use crate::domain::services::AppState;
use crate::domain::services::ChatController;
use crate::domain::services::ChatScreen;
use crate::domain::services::ConversationPanel;

const SIDEBAR_MIN_TERMINAL_WIDTH: u16 = 90;
const SIDEBAR_WIDTH: u16 = 34;
const UNLOAD_SAVE_TIMEOUT: Duration = Duration::from_secs(5);

fn draw(frame: &mut Frame, app_state: &mut AppState, textarea: &tui_textarea::TextArea) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Max(4),
        ])
        .split(frame.size());

    frame.render_widget(
        Paragraph::new(ConversationPanel::header(app_state.screen())),
        layout[0],
    );

    let mut transcript_rect = layout[1];
    if layout[1].width >= SIDEBAR_MIN_TERMINAL_WIDTH {
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(1)])
            .split(layout[1]);

        frame.render_widget(
            Paragraph::new(ConversationPanel::lines(app_state.screen(), Local::now()))
                .wrap(Wrap { trim: false })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .title(" Conversations "),
                ),
            body[0],
        );
        transcript_rect = body[1];
    }

    if transcript_rect.width != app_state.last_known_width
        || transcript_rect.height != app_state.last_known_height
    {
        app_state.set_rect(transcript_rect);
    }

    app_state
        .bubble_list
        .render(frame, transcript_rect, app_state.scroll.position);
    frame.render_stateful_widget(
        Scrollbar::new(ScrollbarOrientation::VerticalRight),
        transcript_rect.inner(&Margin {
            vertical: 1,
            horizontal: 0,
        }),
        &mut app_state.scroll.scrollbar_state,
    );

    frame.render_widget(
        Paragraph::new(ConversationPanel::toast(app_state.screen())),
        layout[2],
    );

    if let Some(elapsed) = app_state.screen().typing() {
        Loading::new(&thinking_text(elapsed)).render(frame, layout[3]);
    } else {
        frame.render_widget(textarea.widget(), layout[3]);
    }
}

async fn start_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app_state: &mut AppState,
    rx: mpsc::UnboundedReceiver<ChatEvent>,
) -> Result<()> {
    let mut textarea = TextArea::default();
    let mut events = EventsService::new(rx);

    #[cfg(feature = "dev")]
    {
        let test_str = "Recommend three heist movies like Heat (1995), and show me trailer options.";
        for char in test_str.chars() {
            textarea.input(Input {
                key: Key::Char(char),
                ctrl: false,
                alt: false,
            });
        }
    }

    loop {
        terminal.draw(|frame| {
            draw(frame, app_state, &textarea);
        })?;

        match events.next().await? {
            Event::Chat(event) => {
                app_state.handle_chat_event(event);
            }
            Event::KeyboardCharInput(input) => {
                if app_state.screen().typing().is_none() {
                    textarea.input(input);
                }
            }
            Event::KeyboardPaste(text) => {
                if app_state.screen().typing().is_none() {
                    textarea.insert_str(text);
                }
            }
            Event::KeyboardCTRLC() => {
                break;
            }
            Event::KeyboardCTRLN() => {
                app_state.handle_action(Action::NewChat());
            }
            Event::KeyboardCTRLS() => {
                app_state.handle_action(Action::Save());
            }
            Event::KeyboardEnter() => {
                if app_state.screen().typing().is_some() {
                    continue;
                }

                let input_str = textarea.lines().join("\n");
                if input_str.trim().is_empty() {
                    continue;
                }

                textarea = TextArea::default();
                if !app_state.handle_action(ActionsService::from_input(&input_str)) {
                    break;
                }
            }
            Event::UIResize() => {
                app_state.sync_dependants();
            }
            Event::UIScrollDown() => {
                app_state.scroll.down();
            }
            Event::UIScrollUp() => {
                app_state.scroll.up();
            }
            Event::UIScrollPageDown() => {
                app_state.scroll.down_page();
            }
            Event::UIScrollPageUp() => {
                app_state.scroll.up_page();
            }
            Event::UITick() => {
                app_state.tick();
            }
        }
    }

    return Ok(());
}

pub fn destruct_terminal_for_panic() {
    let _ = disable_raw_mode();
    let _ = crossterm::execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
    let _ = crossterm::execute!(io::stdout(), cursor::Show);
}

async fn build_app_state(tx: mpsc::UnboundedSender<ChatEvent>) -> Result<AppState> {
    let enricher = cli::load_enricher().await?;
    let transport = cli::build_transport(&enricher)?;
    let autosave_debounce =
        Config::get_duration(ConfigKey::AutosaveDebounce)?.unwrap_or(Duration::ZERO);

    let controller = ChatController::new(
        transport,
        enricher,
        ChatScreen::default(),
        autosave_debounce,
        tx,
    );

    let mut app_state = AppState::new(
        controller,
        &Config::get(ConfigKey::Username),
        &Config::get(ConfigKey::ApiUrl),
    );

    let conversation_id = Config::get(ConfigKey::ConversationId);
    if conversation_id.is_empty() {
        app_state.controller.start_new_chat();
    } else {
        app_state.controller.reload_conversations();
        app_state
            .controller
            .open_conversation(ConversationId::new(&conversation_id));
    }

    return Ok(app_state);
}

pub async fn start() -> Result<()> {
    let (tx, rx) = mpsc::unbounded_channel::<ChatEvent>();
    let mut app_state = build_app_state(tx).await?;

    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    enable_raw_mode()?;
    crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let term_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(term_backend)?;

    let res = start_loop(&mut terminal, &mut app_state, rx).await;

    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    res?;

    if let Some(handle) = app_state.controller.unload() {
        match time::timeout(UNLOAD_SAVE_TIMEOUT, handle).await {
            Ok(res) => res?,
            Err(_) => tracing::warn!("Timed out saving the conversation on exit"),
        }
    }

    return Ok(());
}
