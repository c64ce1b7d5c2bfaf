pub mod help_overlay;
pub mod status_row;
pub mod task_list;
#[cfg(test)]
pub mod test_helpers;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use regex::Regex;

use crate::util::unicode::display_width;

use super::app::App;

/// Main render function: header, task list, status row, overlays
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Background fill
    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    // Layout: header (2 rows) | task list | status row (1 row)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // title + separator
            Constraint::Min(1),    // task list
            Constraint::Length(1), // status row
        ])
        .split(area);

    render_header(frame, app, chunks[0]);
    task_list::render_task_list(frame, app, chunks[1]);

    // Help overlay (rendered on top of everything)
    if app.show_help {
        help_overlay::render_help_overlay(frame, app, frame.area());
    }

    status_row::render_status_row(frame, app, chunks[2]);
}

/// List name, progress and the pro mode indicator, with a separator below
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;
    let (tasks, subs, done) = app.page.state().counts();

    let mut spans = vec![
        Span::styled(" ", Style::default().bg(bg)),
        Span::styled(
            app.name.clone(),
            Style::default()
                .fg(app.theme.text_bright)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}/{} done", done, tasks + subs),
            Style::default().fg(app.theme.dim).bg(bg),
        ),
    ];

    let indicator = if app.pro_mode_enabled() {
        Span::styled(
            "[pro]",
            Style::default()
                .fg(app.theme.highlight)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled("[mouse]", Style::default().fg(app.theme.dim).bg(bg))
    };
    let used: usize = spans.iter().map(|s| display_width(&s.content)).sum();
    let indicator_width = display_width(&indicator.content) + 1;
    if used + indicator_width < width {
        spans.push(Span::styled(
            " ".repeat(width - used - indicator_width),
            Style::default().bg(bg),
        ));
        spans.push(indicator);
    }

    let separator = Line::from(Span::styled(
        "\u{2500}".repeat(width),
        Style::default().fg(app.theme.dim).bg(bg),
    ));
    let paragraph = Paragraph::new(vec![Line::from(spans), separator]).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

/// Push spans for text with regex match highlighting. If no regex or no matches,
/// pushes a single span with `base_style`. Otherwise splits text at match boundaries.
pub(super) fn push_highlighted_spans<'a>(
    spans: &mut Vec<Span<'a>>,
    text: &str,
    base_style: Style,
    highlight_style: Style,
    search_re: Option<&Regex>,
) {
    let re = match search_re {
        Some(r) => r,
        None => {
            spans.push(Span::styled(text.to_string(), base_style));
            return;
        }
    };

    let mut last_end = 0;
    for m in re.find_iter(text) {
        // empty matches would split the text for nothing
        if m.start() == m.end() {
            continue;
        }
        if m.start() > last_end {
            spans.push(Span::styled(
                text[last_end..m.start()].to_string(),
                base_style,
            ));
        }
        spans.push(Span::styled(
            text[m.start()..m.end()].to_string(),
            highlight_style,
        ));
        last_end = m.end();
    }
    if last_end < text.len() || text.is_empty() {
        spans.push(Span::styled(text[last_end..].to_string(), base_style));
    }
}

/// Spans for a line being typed, with a block cursor at byte `cursor`
pub(super) fn input_spans<'a>(
    buffer: &str,
    cursor: usize,
    text_style: Style,
    cursor_style: Style,
) -> Vec<Span<'a>> {
    let at = cursor.min(buffer.len());
    let (before, after) = buffer.split_at(at);
    vec![
        Span::styled(before.to_string(), text_style),
        Span::styled("\u{258C}", cursor_style), // ▌ cursor
        Span::styled(after.to_string(), text_style),
    ]
}
