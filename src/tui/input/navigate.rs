use crossterm::event::{KeyCode, KeyEvent};

use crate::model::task::TaskStatus;
use crate::ops::page_ops;
use crate::tui::app::{App, Mode};

pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.show_help = true,

        // Movement
        KeyCode::Char('j') | KeyCode::Down => app.move_cursor(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_cursor(-1),
        KeyCode::Char('g') | KeyCode::Home => app.cursor = 0,
        KeyCode::Char('G') | KeyCode::End => app.move_cursor(isize::MAX / 2),
        KeyCode::PageDown => app.move_cursor(10),
        KeyCode::PageUp => app.move_cursor(-10),

        // Task actions
        KeyCode::Char(' ') | KeyCode::Char('x') => toggle_selected(app),
        KeyCode::Char('e') | KeyCode::Enter => begin_edit(app),
        KeyCode::Char('n') => begin_create(app),
        KeyCode::Char('a') => begin_create_subtask(app),
        KeyCode::Char('d') | KeyCode::Delete => delete_selected(app),
        KeyCode::Char('p') => toggle_pro_mode(app),

        // Search
        KeyCode::Char('/') => {
            let current = app
                .search
                .as_ref()
                .map(|p| p.query().to_string())
                .unwrap_or_default();
            app.begin_input(Mode::Search, &current);
        }
        KeyCode::Esc => {
            if app.search.is_some() {
                app.commit_search("");
                app.set_status("search cleared");
            } else {
                app.status = None;
            }
        }
        _ => {}
    }
}

fn toggle_selected(app: &mut App) {
    let Some(row) = app.selected_row() else {
        return;
    };
    let result = page_ops::toggle_task(&mut app.page, &row.task_id);
    app.report(result);
}

/// Put the selected task in edit status and load its title for editing.
/// A task already in edit status (left over from another session) stays so.
fn begin_edit(app: &mut App) {
    let Some(row) = app.selected_row() else {
        return;
    };
    let Some(task) = app.selected_task() else {
        return;
    };
    let title = task.title.clone();
    if task.status != TaskStatus::InEdit {
        let result = page_ops::toggle_edit(&mut app.page, &row.task_id);
        if app.report(result).is_none() {
            return;
        }
    }
    app.begin_input(Mode::Edit, &title);
    app.editing = Some(row.location());
}

fn begin_create(app: &mut App) {
    app.begin_input(Mode::Create, "");
}

fn begin_create_subtask(app: &mut App) {
    let Some(row) = app.selected_row() else {
        app.set_error("nothing selected: press n to add a task");
        return;
    };
    let result = page_ops::begin_create_subtask(&mut app.page, row.top_level_id());
    if app.report(result).is_some() {
        app.begin_input(Mode::Create, "");
    }
}

fn delete_selected(app: &mut App) {
    let Some(row) = app.selected_row() else {
        return;
    };
    let result = page_ops::delete_task(&mut app.page, &row.task_id);
    if let Some(removed) = app.report(result) {
        app.clamp_cursor();
        app.set_status(format!("deleted \"{}\"", removed.title));
    }
}

fn toggle_pro_mode(app: &mut App) {
    let result = page_ops::toggle_pro_mode(&mut app.page);
    if let Some(mode) = app.report(result) {
        let hint = if mode.is_enabled() {
            "keyboard only"
        } else {
            "mouse enabled"
        };
        app.set_status(format!("pro mode {} ({})", mode.label(), hint));
    }
}
