use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, InputMode, Screen};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe edits.
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices().nth(char_idx).map(|(i, _)| i).unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Works in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // The delete confirmation modal swallows everything else
    if app.confirm_delete.is_some() {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('s') => app.confirm_pending_delete(),
            KeyCode::Char('n') | KeyCode::Esc => app.cancel_pending_delete(),
            _ => {}
        }
        return;
    }

    app.status_error = None;

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    // Screen switching
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('1') => {
            app.enter_screen(Screen::Dashboard);
            return;
        }
        KeyCode::Char('2') => {
            app.enter_screen(Screen::Chat);
            return;
        }
        KeyCode::Char('3') => {
            app.enter_screen(Screen::Companies);
            return;
        }
        KeyCode::Char('4') => {
            app.enter_screen(Screen::Orders);
            return;
        }
        _ => {}
    }

    match app.screen {
        Screen::Dashboard => handle_dashboard(app, key),
        Screen::Chat => handle_chat_normal(app, key),
        Screen::Companies => handle_companies(app, key),
        Screen::Orders => handle_orders(app, key),
    }
}

fn handle_dashboard(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('r') {
        app.reload_dashboard();
    }
}

fn handle_chat_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('i') | KeyCode::Char('e') => {
            app.input_mode = InputMode::Editing;
            app.chat_cursor = app.chat_input.chars().count();
        }
        KeyCode::Char('r') => {
            if app.chat_failure.is_some() {
                app.retry_chat();
            } else if app.chat_history.error().is_some() {
                app.chat_history.invalidate();
                app.load_history();
            }
        }
        KeyCode::Char('C') => app.clear_chat(),
        KeyCode::Char('j') | KeyCode::Down => app.scroll_chat_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_chat_up(),
        KeyCode::Char('g') => app.chat_scroll = 0,
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),
        _ => {}
    }
}

fn handle_companies(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.companies_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.companies_nav_up(),
        KeyCode::Char('n') | KeyCode::Right => app.companies_next_page(),
        KeyCode::Char('p') | KeyCode::Left => app.companies_prev_page(),
        KeyCode::Char('r') => {
            app.companies.invalidate();
            app.load_companies();
        }
        KeyCode::Char('d') => app.request_delete(),
        _ => {}
    }
}

fn handle_orders(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.orders_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.orders_nav_up(),
        KeyCode::Char('n') | KeyCode::Right => app.orders_next_page(),
        KeyCode::Char('p') | KeyCode::Left => app.orders_prev_page(),
        KeyCode::Char('r') => {
            app.orders.invalidate();
            app.load_orders();
        }
        KeyCode::Char('d') => app.request_delete(),
        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            app.submit_chat();
        }
        KeyCode::Backspace => {
            if app.chat_cursor > 0 {
                app.chat_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
                app.chat_input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.chat_input.chars().count();
            if app.chat_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
                app.chat_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.chat_cursor = app.chat_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.chat_input.chars().count();
            app.chat_cursor = (app.chat_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.chat_cursor = 0;
        }
        KeyCode::End => {
            app.chat_cursor = app.chat_input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
            app.chat_input.insert(byte_pos, c);
            app.chat_cursor += 1;
        }
        _ => {}
    }
}
