use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::error;

use super::app::{App, AppState, EventSender, UiEvent};
use super::page::{Page, Panel};
use super::render::render_ui;
use crate::constants::{UI_REFRESH_INTERVAL_MS, UI_SCROLL_LINES};

/// Run the terminal UI until the user quits
pub async fn run_ui(mut app: App) -> Result<()> {
    if !crossterm::tty::IsTty::is_tty(&io::stdout()) {
        eprintln!("❌ docchat requires an interactive terminal.");
        eprintln!("   Use `docchat ingest <pdf>` and `docchat ask \"<question>\"` in scripts.");
        return Err(anyhow::anyhow!("No interactive terminal available"));
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let (tx, mut rx) = mpsc::unbounded_channel::<UiEvent>();

    // pdf-extract panics are caught; keep their reports off the alternate screen
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(|info| {
        error!(panic = %info, "Panic while the interface was running");
    }));

    let res = run_app(&mut terminal, &mut app, &tx, &mut rx).await;

    std::panic::set_hook(default_hook);
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    tx: &EventSender,
    rx: &mut mpsc::UnboundedReceiver<UiEvent>,
) -> Result<()> {
    while app.running {
        terminal.draw(|f| render_ui(f, app))?;

        if event::poll(Duration::from_millis(UI_REFRESH_INTERVAL_MS))? {
            if let Event::Key(key) = event::read()? {
                handle_key(app, key, tx);
            }
        }

        while let Ok(event) = rx.try_recv() {
            app.handle_event(event);
        }

        app.on_tick();
        // Let spawned work make progress between frames
        tokio::task::yield_now().await;
    }

    Ok(())
}

/// Apply one key press
pub fn handle_key(app: &mut App, key: KeyEvent, tx: &EventSender) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    if key.code == KeyCode::BackTab {
        app.go_to(app.page.cycle());
        return;
    }

    match app.state {
        AppState::Normal => handle_normal_key(app, key, tx),
        AppState::Insert => handle_insert_key(app, key, tx),
        AppState::Command => handle_command_key(app, key, tx),
    }
}

fn handle_normal_key(app: &mut App, key: KeyEvent, tx: &EventSender) {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('i') => {
            if app.page == Page::Chatbot && app.focus.accepts_text() {
                app.state = AppState::Insert;
                app.clear_status();
            } else {
                app.set_status("Nothing to type into here");
            }
        }
        KeyCode::Char(':') => {
            app.state = AppState::Command;
            app.command_input.clear();
        }
        KeyCode::Tab if app.page == Page::Chatbot => app.focus = app.focus.cycle(),
        KeyCode::Char(' ') | KeyCode::Enter
            if app.page == Page::Chatbot && app.focus == Panel::Embeddings =>
        {
            app.toggle_embeddings(tx)
        }
        KeyCode::Char('s') => app.toggle_sidebar(),
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => app.scroll_up(UI_SCROLL_LINES * 5),
        KeyCode::PageDown => app.scroll_down(UI_SCROLL_LINES * 5),
        _ => {}
    }
}

fn handle_insert_key(app: &mut App, key: KeyEvent, tx: &EventSender) {
    match key.code {
        KeyCode::Esc => app.state = AppState::Normal,
        KeyCode::Tab => {
            app.focus = app.focus.cycle();
            if !app.focus.accepts_text() {
                app.state = AppState::Normal;
            }
        }
        KeyCode::Enter => match app.focus {
            Panel::Upload => {
                let path = app.upload_input.trim().to_string();
                if !path.is_empty() {
                    app.upload(&expand_home(&path), tx);
                }
            }
            Panel::Chat => app.send_message(tx),
            Panel::Embeddings => {}
        },
        KeyCode::Backspace => {
            if let Some(input) = app.active_input() {
                input.pop();
            }
        }
        KeyCode::Char(c) => match app.active_input() {
            Some(input) => input.push(c),
            None => app.set_status(crate::constants::CHAT_LOCKED_INFO),
        },
        _ => {}
    }
}

fn handle_command_key(app: &mut App, key: KeyEvent, tx: &EventSender) {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
            app.command_input.clear();
        }
        KeyCode::Enter => {
            let command = std::mem::take(&mut app.command_input);
            app.state = AppState::Normal;
            handle_command(app, &command, tx);
        }
        KeyCode::Backspace => {
            if app.command_input.pop().is_none() {
                app.state = AppState::Normal;
            }
        }
        KeyCode::Char(c) => app.command_input.push(c),
        _ => {}
    }
}

/// Execute a `:command`
pub fn handle_command(app: &mut App, command: &str, tx: &EventSender) {
    let command = command.trim();
    let (name, argument) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };

    match name {
        "q" | "quit" => app.quit(),
        "clear" => app.clear_chat(),
        "upload" => {
            if argument.is_empty() {
                app.set_status("Usage: :upload <path to pdf>");
            } else {
                app.page = Page::Chatbot;
                app.focus = Panel::Upload;
                app.upload(&expand_home(argument), tx);
            }
        }
        "embed" => {
            app.page = Page::Chatbot;
            app.focus = Panel::Embeddings;
            app.toggle_embeddings(tx);
        }
        "sidebar" | "sb" => app.toggle_sidebar(),
        "help" | "h" => app.set_status(
            ":q quit | :clear | :home :chat :contact | :upload <path> | :embed | \
             i insert, Esc normal, Tab focus, Shift+Tab pages, Space toggles embeddings",
        ),
        other => match Page::from_str(other) {
            Some(page) => app.go_to(page),
            None => app.set_status(format!("Unknown command: {}", command)),
        },
    }
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(dirs) = directories::BaseDirs::new() {
            return dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(path)
}
