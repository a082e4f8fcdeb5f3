//! Keyboard input handling.
//!
//! Maps terminal key events to [`App`] actions.  Adding a new keybinding is
//! a single match arm in [`handle_key_event`].
//!
//! ## For contributors
//!
//! Movement keys double as the scroll trigger: after moving, the app asks for
//! more entries if the selection is near the bottom.  The load controller
//! drops the request if a load is already running.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::app::App;

/// Rows moved by PageDown / Space.
const PAGE: usize = 10;

/// Process a single key event, updating app state accordingly.
///
/// Only reacts to key-press events (ignoring release / repeat) so that each
/// physical keypress triggers exactly one action.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Down | KeyCode::Char('j') => {
            app.select_next();
            app.load_if_near_bottom();
        }
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::Home | KeyCode::Char('g') => app.select_first(),
        KeyCode::End | KeyCode::Char('G') => {
            app.select_last();
            app.load_if_near_bottom();
        }
        KeyCode::PageDown | KeyCode::Char(' ') => {
            app.page_down(PAGE);
            app.load_if_near_bottom();
        }
        KeyCode::Char('m') => app.load_more(),
        KeyCode::Char('r') => app.reload(),
        KeyCode::Char('f') => app.follow_selected(),
        _ => {}
    }
}
