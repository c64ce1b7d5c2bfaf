use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;

use crate::io::state::load_ui_state;
use crate::io::store::{MemoryStore, SharedStore};
use crate::model::config::AppConfig;
use crate::ops::page_ops::open_page_with;
use crate::ops::reducer::SequentialIds;
use crate::tui::app::App;
use crate::tui::theme::Theme;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

/// An App over `store`, seeded with t-1..t-5 when nothing is stored yet:
///
/// ```text
/// t-1 Todo.dev
///     t-2 child task
///     t-3 keyboard accessibility
///     t-4 command pallete
/// t-5 think 5k project
/// ```
pub fn app_with_store(store: SharedStore) -> App {
    let page = open_page_with(store.clone(), &AppConfig::default(), SequentialIds::new("t"));
    let ui = load_ui_state(store);
    App::new("Todo.dev".into(), page, ui, Theme::default(), false)
}

/// An App over a fresh in-memory store
pub fn app_with_seed() -> App {
    app_with_store(MemoryStore::shared())
}
