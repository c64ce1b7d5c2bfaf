use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::ops::page_ops;
use crate::ops::page_ops::TaskError;
use crate::tui::app::{App, Mode};
use crate::util::unicode::{
    next_grapheme_boundary, prev_grapheme_boundary, word_start_after, word_start_before,
};

/// Insert `s` at the cursor
pub(super) fn insert_text(app: &mut App, s: &str) {
    app.edit_buffer.insert_str(app.edit_cursor, s);
    app.edit_cursor += s.len();
    if app.mode == Mode::Search {
        let query = app.edit_buffer.clone();
        app.preview_search(&query);
    }
}

/// Cursor movement and deletion shared by every text mode.
/// Returns false when the key is not an editing key.
fn edit_line(app: &mut App, key: KeyEvent) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    let buf = &app.edit_buffer;
    let at = app.edit_cursor;

    match key.code {
        KeyCode::Left if ctrl || alt => app.edit_cursor = word_start_before(buf, at),
        KeyCode::Right if ctrl || alt => app.edit_cursor = word_start_after(buf, at),
        KeyCode::Left => app.edit_cursor = prev_grapheme_boundary(buf, at).unwrap_or(0),
        KeyCode::Right => app.edit_cursor = next_grapheme_boundary(buf, at).unwrap_or(buf.len()),
        KeyCode::Home => app.edit_cursor = 0,
        KeyCode::End => app.edit_cursor = buf.len(),
        KeyCode::Char('a') if ctrl => app.edit_cursor = 0,
        KeyCode::Char('e') if ctrl => app.edit_cursor = buf.len(),
        KeyCode::Char('u') if ctrl => {
            app.edit_buffer.drain(..at);
            app.edit_cursor = 0;
        }
        KeyCode::Char('w') if ctrl => {
            let start = word_start_before(buf, at);
            app.edit_buffer.drain(start..at);
            app.edit_cursor = start;
        }
        KeyCode::Backspace if alt => {
            let start = word_start_before(buf, at);
            app.edit_buffer.drain(start..at);
            app.edit_cursor = start;
        }
        KeyCode::Backspace => {
            if let Some(start) = prev_grapheme_boundary(buf, at) {
                app.edit_buffer.drain(start..at);
                app.edit_cursor = start;
            }
        }
        KeyCode::Delete => {
            if let Some(end) = next_grapheme_boundary(buf, at) {
                app.edit_buffer.drain(at..end);
            }
        }
        KeyCode::Char(c) if !ctrl => {
            let mut tmp = [0u8; 4];
            insert_text(app, c.encode_utf8(&mut tmp));
            return true;
        }
        _ => return false,
    }

    if app.mode == Mode::Search {
        let query = app.edit_buffer.clone();
        app.preview_search(&query);
    }
    true
}

pub(super) fn handle_search(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            let query = app.edit_buffer.trim().to_string();
            app.end_input();
            app.commit_search(&query);
        }
        KeyCode::Esc => {
            app.end_input();
            app.restore_committed_search();
        }
        KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.search_regex = !app.search_regex;
            let query = app.edit_buffer.clone();
            app.preview_search(&query);
        }
        _ => {
            edit_line(app, key);
        }
    }
}

pub(super) fn handle_edit(app: &mut App, key: KeyEvent) {
    let Some(loc) = app.editing.clone() else {
        app.end_input();
        return;
    };
    match key.code {
        KeyCode::Enter => {
            let title = app.edit_buffer.clone();
            match page_ops::update_task(&mut app.page, loc.task_id(), &title) {
                Ok(_) => app.end_input(),
                // stay in edit mode so the title can be fixed
                Err(TaskError::EmptyTitle) => app.set_error("title cannot be empty"),
                Err(e) => {
                    app.end_input();
                    app.set_error(e.to_string());
                }
            }
        }
        KeyCode::Esc => {
            let result = page_ops::toggle_edit(&mut app.page, loc.task_id());
            app.end_input();
            app.report(result);
        }
        _ => {
            edit_line(app, key);
        }
    }
}

pub(super) fn handle_create(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            let title = app.edit_buffer.clone();
            match page_ops::create_task(&mut app.page, &title) {
                Ok(id) => {
                    app.end_input();
                    app.select_id(&id);
                }
                Err(TaskError::EmptyTitle) => app.set_error("title cannot be empty"),
                Err(e) => {
                    app.end_input();
                    app.set_error(e.to_string());
                }
            }
        }
        KeyCode::Esc => {
            let result = page_ops::cancel_create_subtask(&mut app.page);
            app.end_input();
            app.report(result);
        }
        _ => {
            edit_line(app, key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::TaskStatus;
    use crate::tui::input::handle_key;
    use crate::tui::render::test_helpers::app_with_seed;

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn ctrl(app: &mut App, c: char) {
        handle_key(app, KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL));
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn create_top_level_task() {
        let mut app = app_with_seed();
        press(&mut app, KeyCode::Char('n'));
        type_str(&mut app, "water plants");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.mode, Mode::Navigate);
        let last = app.page.state().tasks.last().unwrap();
        assert_eq!(last.title, "water plants");
        assert_eq!(app.selected_row().unwrap().task_id, last.id);
    }

    #[test]
    fn create_subtask_then_target_clears() {
        let mut app = app_with_seed();
        press(&mut app, KeyCode::Char('G'));
        press(&mut app, KeyCode::Char('a'));
        type_str(&mut app, "sketch");
        press(&mut app, KeyCode::Enter);

        let state = app.page.state();
        assert_eq!(state.tasks[1].sub_tasks[0].title, "sketch");
        assert!(state.parent_task_id_for_create.is_none());
    }

    #[test]
    fn esc_cancels_create_and_target() {
        let mut app = app_with_seed();
        press(&mut app, KeyCode::Char('a'));
        type_str(&mut app, "never mind");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, Mode::Navigate);
        assert!(app.page.state().parent_task_id_for_create.is_none());
        assert_eq!(app.page.state().tasks[0].sub_tasks.len(), 3);
    }

    #[test]
    fn empty_title_stays_in_create() {
        let mut app = app_with_seed();
        press(&mut app, KeyCode::Char('n'));
        type_str(&mut app, "   ");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Create);
        assert!(app.status.as_ref().unwrap().is_error);
    }

    #[test]
    fn edit_commit_and_cancel() {
        let mut app = app_with_seed();
        press(&mut app, KeyCode::Char('e'));
        ctrl(&mut app, 'u');
        type_str(&mut app, "Todo app");
        press(&mut app, KeyCode::Enter);
        let first = &app.page.state().tasks[0];
        assert_eq!(first.title, "Todo app");
        assert_eq!(first.status, TaskStatus::NotDone);

        press(&mut app, KeyCode::Char('e'));
        type_str(&mut app, "!!!");
        press(&mut app, KeyCode::Esc);
        let first = &app.page.state().tasks[0];
        assert_eq!(first.title, "Todo app");
        assert_eq!(first.status, TaskStatus::NotDone);
    }

    #[test]
    fn cursor_editing() {
        let mut app = app_with_seed();
        press(&mut app, KeyCode::Char('n'));
        type_str(&mut app, "buy milk");
        press(&mut app, KeyCode::Home);
        type_str(&mut app, "to ");
        assert_eq!(app.edit_buffer, "to buy milk");
        press(&mut app, KeyCode::End);
        ctrl(&mut app, 'w');
        assert_eq!(app.edit_buffer, "to buy ");
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Delete);
        assert_eq!(app.edit_buffer, "to bu");
    }

    #[test]
    fn search_previews_then_commits() {
        let mut app = app_with_seed();
        press(&mut app, KeyCode::Char('/'));
        type_str(&mut app, "pallete");
        assert_eq!(app.rows().len(), 4);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Navigate);
        assert_eq!(app.ui.get().last_search.as_deref(), Some("pallete"));
    }

    #[test]
    fn search_esc_restores_committed_filter() {
        let mut app = app_with_seed();
        app.commit_search("think");
        press(&mut app, KeyCode::Char('/'));
        ctrl(&mut app, 'u');
        type_str(&mut app, "todo");
        assert_eq!(app.rows()[0].task_id, "t-1");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.search.as_ref().unwrap().query(), "think");
        assert_eq!(app.rows().len(), 1);
    }

    #[test]
    fn ctrl_r_switches_to_regex() {
        let mut app = app_with_seed();
        press(&mut app, KeyCode::Char('/'));
        type_str(&mut app, "^think");
        assert!(app.rows().is_empty());
        ctrl(&mut app, 'r');
        assert_eq!(app.rows().len(), 1);
        press(&mut app, KeyCode::Enter);
        assert!(app.ui.get().regex);
    }
}
