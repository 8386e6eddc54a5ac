use crate::app::App;
use crate::cursor::Direction;
use crate::pages::Page;
use crate::selection::{Motion, SelectMode};
use anyhow::Result;
use crossterm::event::{
    KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

/// Whether a key still goes to the default handling of the visible view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    Consumed,
    PassThrough,
}

/// Routes one key press: hotkeys of the active page first, then the default
/// navigation of the page for keys that were passed through.
pub(crate) fn handle_key_event(app: &mut App, key: KeyEvent) -> Result<KeyDisposition> {
    let disposition = route_hotkey(app, key)?;
    if disposition == KeyDisposition::PassThrough {
        handle_default_key(app, key);
    }
    Ok(disposition)
}

/// Left clicks select in the browse trees; the wheel scrolls the diff page.
pub(crate) fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match (app.pages.top(), mouse.kind) {
        (Page::Browse, MouseEventKind::Down(MouseButton::Left)) => {
            app.click_tree(mouse.column, mouse.row);
        }
        (Page::Diff, MouseEventKind::ScrollDown) => {
            app.scroll_diff_down(1);
        }
        (Page::Diff, MouseEventKind::ScrollUp) => {
            app.scroll_diff_up(1);
        }
        _ => {}
    }
}

fn route_hotkey(app: &mut App, key: KeyEvent) -> Result<KeyDisposition> {
    if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return Ok(KeyDisposition::Consumed);
    }
    if matches!(key.code, KeyCode::Char('?') | KeyCode::Char('h')) && key.modifiers.is_empty() {
        app.show_help();
        return Ok(KeyDisposition::Consumed);
    }

    match app.pages.top() {
        Page::Browse => handle_browse_key(app, key),
        Page::Diff => Ok(dismiss_on_esc(app, key, Page::Diff)),
        Page::Help => Ok(dismiss_on_esc(app, key, Page::Help)),
    }
}

fn dismiss_on_esc(app: &mut App, key: KeyEvent, page: Page) -> KeyDisposition {
    if key.code == KeyCode::Esc {
        app.dismiss(page);
        return KeyDisposition::Consumed;
    }
    KeyDisposition::PassThrough
}

fn handle_browse_key(app: &mut App, key: KeyEvent) -> Result<KeyDisposition> {
    let ctrl = key.modifiers == KeyModifiers::CONTROL;
    match key.code {
        KeyCode::Right if ctrl => {
            app.cycle_version(Direction::Forward);
        }
        KeyCode::Left if ctrl => {
            app.cycle_version(Direction::Backward);
        }
        KeyCode::Tab => app.switch_focus(),
        KeyCode::Char('d') if !ctrl => {
            app.open_diff();
        }
        KeyCode::Char('r') if !ctrl => app.reload()?,
        KeyCode::Char('s') if !ctrl => app.set_mode(SelectMode::Single),
        KeyCode::Char('m') if !ctrl => app.set_mode(SelectMode::Multiple),
        KeyCode::Char('q') if !ctrl => app.should_quit = true,
        _ => return Ok(KeyDisposition::PassThrough),
    }
    Ok(KeyDisposition::Consumed)
}

fn handle_default_key(app: &mut App, key: KeyEvent) {
    match app.pages.top() {
        Page::Browse => {
            let motion = match key.code {
                KeyCode::Down | KeyCode::Char('j') => Motion::Next,
                KeyCode::Up | KeyCode::Char('k') => Motion::Previous,
                KeyCode::Home => Motion::First,
                KeyCode::End => Motion::Last,
                _ => return,
            };
            let side = app.selection.focused_pane();
            app.selection.navigate(side, motion);
        }
        Page::Diff => {
            match key.code {
                KeyCode::Down | KeyCode::Char('j') => app.scroll_diff_down(1),
                KeyCode::Up | KeyCode::Char('k') => app.scroll_diff_up(1),
                KeyCode::PageDown => app.scroll_diff_down(20),
                KeyCode::PageUp => app.scroll_diff_up(20),
                _ => false,
            };
        }
        Page::Help => {}
    }
}
