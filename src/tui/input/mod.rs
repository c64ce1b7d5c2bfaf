mod navigate;
mod text;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use super::app::{App, Mode};

use navigate::handle_navigate;
use text::{handle_create, handle_edit, handle_search, insert_text};

/// Handle a key event in the current mode
pub fn handle_key(app: &mut App, key: KeyEvent) {
    // Ignore bare modifier key presses (Shift, Ctrl, Alt, etc.)
    if matches!(key.code, KeyCode::Modifier(_)) {
        return;
    }

    // Ctrl-C always quits, whatever is being typed
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    // Help overlay swallows the next key
    if app.show_help {
        app.show_help = false;
        return;
    }

    match app.mode {
        Mode::Navigate => handle_navigate(app, key),
        Mode::Search => handle_search(app, key),
        Mode::Edit => handle_edit(app, key),
        Mode::Create => handle_create(app, key),
    }
}

/// Handle a mouse event. With pro mode enabled the pointer is ignored.
pub fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let relevant = matches!(
        mouse.kind,
        MouseEventKind::Down(MouseButton::Left)
            | MouseEventKind::ScrollUp
            | MouseEventKind::ScrollDown
    );
    if !relevant || app.mode != Mode::Navigate || app.show_help {
        return;
    }
    if app.pro_mode_enabled() {
        app.set_status("pro mode: keyboard only (p to turn off)");
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollUp => app.move_cursor(-1),
        MouseEventKind::ScrollDown => app.move_cursor(1),
        _ => {
            let Some(area) = app.list_area else {
                return;
            };
            let inside = mouse.column >= area.x
                && mouse.column < area.x + area.width
                && mouse.row >= area.y
                && mouse.row < area.y + area.height;
            if !inside {
                return;
            }
            let index = app.scroll_offset + (mouse.row - area.y) as usize;
            if index < app.rows().len() {
                app.cursor = index;
            }
        }
    }
}

/// Handle a bracketed paste. Only lands while typing; newlines become spaces.
pub fn handle_paste(app: &mut App, pasted: &str) {
    if app.mode == Mode::Navigate || pasted.is_empty() {
        return;
    }
    let clean = pasted.replace(['\r', '\n'], " ");
    insert_text(app, &clean);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::page_ops::set_pro_mode;
    use crate::tui::render::test_helpers::app_with_seed;
    use crossterm::event::KeyEventKind;
    use ratatui::layout::Rect;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn pro_mode_blocks_the_pointer() {
        let mut app = app_with_seed();
        app.list_area = Some(Rect::new(0, 2, 80, 20));
        handle_mouse(&mut app, click(5, 4));
        assert_eq!(app.cursor, 0);
        assert!(app.status.as_ref().unwrap().text.contains("keyboard only"));
    }

    #[test]
    fn click_selects_row_without_pro_mode() {
        let mut app = app_with_seed();
        set_pro_mode(&mut app.page, false).unwrap();
        app.list_area = Some(Rect::new(0, 2, 80, 20));

        handle_mouse(&mut app, click(5, 4));
        assert_eq!(app.cursor, 2);

        // below the last row: ignored
        handle_mouse(&mut app, click(5, 15));
        assert_eq!(app.cursor, 2);

        let scroll = MouseEvent {
            kind: MouseEventKind::ScrollDown,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse(&mut app, scroll);
        assert_eq!(app.cursor, 3);
    }

    #[test]
    fn help_swallows_one_key() {
        let mut app = app_with_seed();
        handle_key(&mut app, key(KeyCode::Char('?')));
        assert!(app.show_help);
        handle_key(&mut app, key(KeyCode::Char('j')));
        assert!(!app.show_help);
        assert_eq!(app.cursor, 0);
    }

    #[test]
    fn ctrl_c_quits_from_any_mode() {
        let mut app = app_with_seed();
        handle_key(&mut app, key(KeyCode::Char('n')));
        assert_eq!(app.mode, Mode::Create);
        let mut ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        ctrl_c.kind = KeyEventKind::Press;
        handle_key(&mut app, ctrl_c);
        assert!(app.should_quit);
    }

    #[test]
    fn paste_only_while_typing() {
        let mut app = app_with_seed();
        handle_paste(&mut app, "ignored");
        assert!(app.edit_buffer.is_empty());

        handle_key(&mut app, key(KeyCode::Char('n')));
        handle_paste(&mut app, "two\nlines");
        assert_eq!(app.edit_buffer, "two lines");
    }
}
