use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::model::task::Task;
use crate::tui::app::{App, Mode, Row};
use crate::util::unicode::{display_width, truncate_to_width};

use super::{input_spans, push_highlighted_spans};

const TOP_INDENT: &str = " ";
const SUB_INDENT: &str = "     ";
const TARGET_MARKER: &str = "  \u{2190} new subtask";

/// Render the task list, keeping the cursor row in view
pub fn render_task_list(frame: &mut Frame, app: &mut App, area: Rect) {
    app.list_area = Some(area);
    let rows = app.rows();
    let visible_height = area.height as usize;

    if rows.is_empty() {
        let msg = if app.search.is_some() {
            " no matching tasks"
        } else {
            " No tasks: press n to add one"
        };
        let empty =
            Paragraph::new(msg).style(Style::default().fg(app.theme.dim).bg(app.theme.background));
        frame.render_widget(empty, area);
        return;
    }

    app.clamp_cursor();
    let cursor = app.cursor;
    if cursor < app.scroll_offset {
        app.scroll_offset = cursor;
    } else if cursor >= app.scroll_offset + visible_height {
        app.scroll_offset = cursor.saturating_sub(visible_height.saturating_sub(1));
    }
    let scroll = app.scroll_offset.min(rows.len());

    let end = rows.len().min(scroll + visible_height);
    let state = app.page.state();
    let lines: Vec<Line> = rows[scroll..end]
        .iter()
        .zip(scroll..end)
        .filter_map(|(row, i)| {
            let task = state.get(&row.location())?;
            let is_target = row.parent_id.is_none()
                && state.parent_task_id_for_create.as_deref() == Some(row.task_id.as_str());
            Some(task_line(app, row, task, i == cursor, is_target, area.width as usize))
        })
        .collect();

    let paragraph = Paragraph::new(lines).style(Style::default().bg(app.theme.background));
    frame.render_widget(paragraph, area);
}

fn task_line<'a>(
    app: &App,
    row: &Row,
    task: &Task,
    is_cursor: bool,
    is_target: bool,
    width: usize,
) -> Line<'a> {
    let bg = if is_cursor {
        app.theme.selection_bg
    } else {
        app.theme.background
    };
    let base = Style::default().bg(bg);
    let indent = if row.parent_id.is_some() {
        SUB_INDENT
    } else {
        TOP_INDENT
    };

    let checkbox_color = if task.is_done() {
        app.theme.green
    } else {
        app.theme.status_color(task.status)
    };

    let mut spans: Vec<Span> = vec![
        Span::styled(indent, base),
        Span::styled(
            format!("[{}] ", task.status.checkbox_char()),
            base.fg(checkbox_color),
        ),
    ];
    let prefix_width = display_width(indent) + 4;

    let being_edited = app.mode == Mode::Edit
        && app
            .editing
            .as_ref()
            .is_some_and(|loc| loc.task_id() == row.task_id);

    if being_edited {
        spans.extend(input_spans(
            &app.edit_buffer,
            app.edit_cursor,
            base.fg(app.theme.text_bright),
            base.fg(app.theme.highlight),
        ));
    } else {
        let marker_width = if is_target {
            display_width(TARGET_MARKER)
        } else {
            0
        };
        let room = width.saturating_sub(prefix_width + marker_width);
        let title = truncate_to_width(&task.title, room);

        let mut title_style = base.fg(app.theme.status_color(task.status));
        if task.is_done() {
            title_style = title_style.add_modifier(Modifier::CROSSED_OUT);
        }
        if is_cursor {
            title_style = title_style.add_modifier(Modifier::BOLD);
        }
        let match_style = Style::default()
            .fg(app.theme.search_match_fg)
            .bg(app.theme.search_match_bg);
        push_highlighted_spans(
            &mut spans,
            &title,
            title_style,
            match_style,
            app.search.as_ref().map(|p| p.regex()),
        );

        if is_target {
            spans.push(Span::styled(TARGET_MARKER, base.fg(app.theme.highlight)));
        }
    }

    // Fill the rest of the row so the selection reads as a bar
    let used: usize = spans.iter().map(|s| display_width(&s.content)).sum();
    if is_cursor && used < width {
        spans.push(Span::styled(" ".repeat(width - used), base));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::store::MemoryStore;
    use crate::model::config::AppConfig;
    use crate::ops::page_ops::{begin_create_subtask, open_page_with};
    use crate::ops::reducer::SequentialIds;
    use crate::tui::render::test_helpers::*;
    use crate::tui::theme::Theme;

    fn render_list(app: &mut App, w: u16, h: u16) -> String {
        render_to_string(w, h, |frame, area| render_task_list(frame, app, area))
    }

    #[test]
    fn empty_list_hint() {
        let mut config = AppConfig::default();
        config.behavior.seed_on_first_run = false;
        let store = MemoryStore::shared();
        let page = open_page_with(store.clone(), &config, SequentialIds::new("t"));
        let ui = crate::io::state::load_ui_state(store);
        let mut app = App::new("Empty".into(), page, ui, Theme::default(), false);

        let output = render_list(&mut app, 40, 3);
        assert_eq!(output, " No tasks: press n to add one");
    }

    #[test]
    fn no_matches_message() {
        let mut app = app_with_seed();
        app.commit_search("zzz");
        let output = render_list(&mut app, 40, 3);
        assert_eq!(output, " no matching tasks");
    }

    #[test]
    fn long_titles_are_truncated() {
        let mut app = app_with_seed();
        let output = render_list(&mut app, 20, 5);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[2], "     [ ] keyboard a\u{2026}");
        assert!(lines.iter().all(|l| display_width(l) <= 20));
    }

    #[test]
    fn create_target_is_marked() {
        let mut app = app_with_seed();
        begin_create_subtask(&mut app.page, "t-5").unwrap();
        let output = render_list(&mut app, 50, 6);
        assert_eq!(
            output.lines().last(),
            Some(" [ ] think 5k project  \u{2190} new subtask")
        );
    }

    #[test]
    fn edited_title_shows_buffer_and_cursor() {
        let mut app = app_with_seed();
        app.begin_input(Mode::Edit, "Todo.app");
        app.editing = Some(app.rows()[0].location());
        app.edit_cursor = 4;
        let output = render_list(&mut app, 40, 2);
        assert_eq!(output.lines().next(), Some(" [ ] Todo\u{258C}.app"));
    }

    #[test]
    fn scrolls_to_keep_cursor_visible() {
        let mut app = app_with_seed();
        app.cursor = 4;
        let output = render_list(&mut app, 40, 2);
        assert_eq!(app.scroll_offset, 3);
        assert_eq!(
            output,
            "     [ ] command pallete\n [ ] think 5k project"
        );
    }
}
