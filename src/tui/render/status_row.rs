use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, Mode};
use crate::util::unicode::{display_width, truncate_to_width};

use super::input_spans;

const KEY_HINTS: &str = "n new  a subtask  x done  e edit  d delete  / search  ? help";

/// Render the status row (bottom of screen)
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;
    let dim = Style::default().fg(app.theme.dim).bg(bg);
    let bright = Style::default().fg(app.theme.text_bright).bg(bg);
    let cursor = Style::default().fg(app.theme.highlight).bg(bg);

    let (mut spans, hint): (Vec<Span>, &str) = match app.mode {
        Mode::Navigate => {
            if let Some(status) = &app.status {
                let color = if status.is_error {
                    app.theme.red
                } else {
                    app.theme.text
                };
                let text = truncate_to_width(&status.text, width.saturating_sub(1));
                (
                    vec![Span::styled(format!(" {}", text), Style::default().fg(color).bg(bg))],
                    "",
                )
            } else if let Some(pattern) = &app.search {
                (
                    vec![Span::styled(format!(" /{}", pattern.query()), dim)],
                    "Esc clear",
                )
            } else if app.show_key_hints {
                (vec![Span::styled(format!(" {}", KEY_HINTS), dim)], "")
            } else {
                (Vec::new(), "")
            }
        }
        Mode::Search => {
            let mut spans = vec![Span::styled(" /", bright)];
            spans.extend(input_spans(&app.edit_buffer, app.edit_cursor, bright, cursor));
            let hint = if app.search_regex {
                "regex  Enter apply  Esc cancel"
            } else {
                "Ctrl-R regex  Enter apply  Esc cancel"
            };
            (spans, hint)
        }
        Mode::Edit => (
            vec![Span::styled(" editing title", bright)],
            "Enter save  Esc cancel",
        ),
        Mode::Create => {
            let state = app.page.state();
            let prompt = match state
                .parent_task_id_for_create
                .as_deref()
                .and_then(|id| state.find_task(id))
            {
                Some(parent) => format!(" new subtask of \"{}\": ", parent.title),
                None => " new task: ".to_string(),
            };
            let mut spans = vec![Span::styled(prompt, dim)];
            spans.extend(input_spans(&app.edit_buffer, app.edit_cursor, bright, cursor));
            (spans, "Enter add  Esc cancel")
        }
    };

    // Errors from a text mode replace the hint
    let error = app
        .status
        .as_ref()
        .filter(|s| s.is_error && app.mode != Mode::Navigate);
    let (hint, hint_style) = match error {
        Some(s) => (s.text.as_str(), Style::default().fg(app.theme.red).bg(bg)),
        None => (hint, dim),
    };

    let content_width: usize = spans.iter().map(|s| display_width(&s.content)).sum();
    let hint_width = display_width(hint) + 1;
    if !hint.is_empty() && content_width + hint_width < width {
        let padding = width - content_width - hint_width;
        spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
        spans.push(Span::styled(hint.to_string(), hint_style));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}
