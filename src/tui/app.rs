use std::io;
use std::path::Path;
use std::time::Duration;

use crossterm::event::{
    self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    Event, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;

use crate::io::persisted::PersistedState;
use crate::io::project_io::open_project;
use crate::io::state::{UiState, load_ui_state};
use crate::io::watcher::StoreWatcher;
use crate::model::state::TaskLocation;
use crate::model::task::Task;
use crate::ops::page_ops::{self, PageStore, TaskError};
use crate::ops::search::{SearchPattern, filter_tasks};

use super::input;
use super::render;
use super::theme::Theme;

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    /// Typing a search query; the list filters as you type
    Search,
    /// Editing the title of `App::editing`
    Edit,
    /// Typing the title of a new task (or subtask, when a create target is set)
    Create,
}

/// One visible line of the task list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub task_id: String,
    /// Set for subtasks
    pub parent_id: Option<String>,
}

impl Row {
    pub fn location(&self) -> TaskLocation {
        match &self.parent_id {
            None => TaskLocation::Task {
                task_id: self.task_id.clone(),
            },
            Some(parent_id) => TaskLocation::SubTask {
                task_id: self.task_id.clone(),
                parent_id: parent_id.clone(),
            },
        }
    }

    /// Id of the top-level task this row belongs to
    pub fn top_level_id(&self) -> &str {
        self.parent_id.as_deref().unwrap_or(&self.task_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

/// Main application state
pub struct App {
    /// List name from config.toml
    pub name: String,
    pub page: PageStore,
    pub ui: PersistedState<UiState>,
    pub theme: Theme,
    pub mode: Mode,
    pub should_quit: bool,
    pub show_help: bool,
    pub show_key_hints: bool,
    /// Index into `rows()`
    pub cursor: usize,
    pub scroll_offset: usize,
    /// Where the list was last drawn (for mouse hit testing)
    pub list_area: Option<Rect>,
    /// Text being typed in Search, Edit or Create mode
    pub edit_buffer: String,
    /// Byte offset of the cursor in `edit_buffer`
    pub edit_cursor: usize,
    /// Task whose title is being edited
    pub editing: Option<TaskLocation>,
    /// Active filter
    pub search: Option<SearchPattern>,
    /// Treat typed queries as regular expressions
    pub search_regex: bool,
    pub status: Option<StatusMessage>,
    /// Another process changed the store while we were typing
    pub pending_reload: bool,
}

impl App {
    pub fn new(
        name: String,
        page: PageStore,
        ui: PersistedState<UiState>,
        theme: Theme,
        show_key_hints: bool,
    ) -> Self {
        let saved = ui.get().clone();
        let search_regex = saved.regex;
        let search = saved
            .last_search
            .as_deref()
            .filter(|q| !q.is_empty())
            .and_then(|q| SearchPattern::new(q, search_regex).ok());

        let mut app = App {
            name,
            page,
            ui,
            theme,
            mode: Mode::Navigate,
            should_quit: false,
            show_help: false,
            show_key_hints,
            cursor: 0,
            scroll_offset: 0,
            list_area: None,
            edit_buffer: String::new(),
            edit_cursor: 0,
            editing: None,
            search,
            search_regex,
            status: None,
            pending_reload: false,
        };
        if let Some(id) = saved.cursor_id {
            app.select_id(&id);
        }
        app
    }

    /// Visible rows: filtered top-level tasks, each followed by its subtasks
    pub fn rows(&self) -> Vec<Row> {
        let state = self.page.state();
        let mut rows = Vec::new();
        for task in filter_tasks(&state.tasks, self.search.as_ref()) {
            rows.push(Row {
                task_id: task.id.clone(),
                parent_id: None,
            });
            for sub in &task.sub_tasks {
                rows.push(Row {
                    task_id: sub.id.clone(),
                    parent_id: Some(task.id.clone()),
                });
            }
        }
        rows
    }

    pub fn selected_row(&self) -> Option<Row> {
        self.rows().into_iter().nth(self.cursor)
    }

    pub fn selected_task(&self) -> Option<&Task> {
        let row = self.selected_row()?;
        self.page.state().get(&row.location())
    }

    pub fn clamp_cursor(&mut self) {
        let len = self.rows().len();
        if self.cursor >= len {
            self.cursor = len.saturating_sub(1);
        }
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.rows().len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let next = self.cursor as isize + delta;
        self.cursor = next.clamp(0, len as isize - 1) as usize;
    }

    /// Put the cursor on `id` if it is visible
    pub fn select_id(&mut self, id: &str) {
        if let Some(i) = self.rows().iter().position(|r| r.task_id == id) {
            self.cursor = i;
        }
    }

    pub fn pro_mode_enabled(&self) -> bool {
        self.page.state().pro_mode.is_enabled()
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: true,
        });
    }

    /// Unwrap an operation result, turning errors into a status message
    pub fn report<T>(&mut self, result: Result<T, TaskError>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                self.set_error(e.to_string());
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Text entry
    // -----------------------------------------------------------------------

    pub fn begin_input(&mut self, mode: Mode, initial: &str) {
        self.mode = mode;
        self.edit_buffer = initial.to_string();
        self.edit_cursor = self.edit_buffer.len();
        self.status = None;
    }

    pub fn end_input(&mut self) {
        self.mode = Mode::Navigate;
        self.edit_buffer.clear();
        self.edit_cursor = 0;
        self.editing = None;
        self.reload_if_pending();
    }

    // -----------------------------------------------------------------------
    // Search
    // -----------------------------------------------------------------------

    /// Compile `query` for the live preview. Invalid regexes keep the last
    /// good filter.
    pub fn preview_search(&mut self, query: &str) {
        if query.is_empty() {
            self.search = None;
        } else if let Ok(p) = SearchPattern::new(query, self.search_regex) {
            self.search = Some(p);
        }
        self.cursor = 0;
    }

    /// Make `query` the filter and remember it
    pub fn commit_search(&mut self, query: &str) {
        let selected = self.selected_row().map(|r| r.task_id);
        if query.is_empty() {
            self.search = None;
        } else {
            match SearchPattern::new(query, self.search_regex) {
                Ok(p) => self.search = Some(p),
                Err(e) => {
                    self.set_error(format!("invalid search pattern: {}", e));
                    return;
                }
            }
        }
        let regex = self.search_regex;
        let last_search = self.search.as_ref().map(|p| p.query().to_string());
        if let Err(e) = self.ui.update(|s| UiState {
            last_search,
            regex,
            ..s.clone()
        }) {
            self.set_error(e.to_string());
        }
        self.cursor = 0;
        if let Some(id) = selected {
            self.select_id(&id);
        }
        self.clamp_cursor();
    }

    /// Restore the filter that was committed last
    pub fn restore_committed_search(&mut self) {
        let saved = self.ui.get().clone();
        self.search_regex = saved.regex;
        self.search = saved
            .last_search
            .as_deref()
            .filter(|q| !q.is_empty())
            .and_then(|q| SearchPattern::new(q, saved.regex).ok());
        self.clamp_cursor();
    }

    // -----------------------------------------------------------------------
    // External changes
    // -----------------------------------------------------------------------

    /// Re-read the stored state; defers while the user is typing.
    pub fn on_store_changed(&mut self) {
        if self.mode != Mode::Navigate {
            self.pending_reload = true;
            return;
        }
        let selected = self.selected_row().map(|r| r.task_id);
        if self.page.reload() {
            if let Some(id) = selected {
                self.select_id(&id);
            }
            self.clamp_cursor();
            self.set_status("reloaded: tasks changed on disk");
        }
    }

    fn reload_if_pending(&mut self) {
        if self.pending_reload {
            self.pending_reload = false;
            self.on_store_changed();
        }
    }

    /// Remember the selected task for next time
    pub fn save_ui_state(&mut self) {
        let cursor_id = self.selected_row().map(|r| r.task_id);
        if self.ui.get().cursor_id == cursor_id {
            return;
        }
        if let Err(e) = self.ui.update(|s| UiState {
            cursor_id,
            ..s.clone()
        }) {
            tracing::warn!(error = %e, "could not save ui state");
        }
    }
}

/// Run the TUI application
pub fn run(data_dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let project = open_project(data_dir.map(Path::new), &cwd)?;

    let store = project.store();
    let page = page_ops::open_page(store.clone(), &project.config);
    let ui = load_ui_state(store);
    let theme = Theme::from_config(&project.config.ui);
    let mut app = App::new(
        project.config.app.name.clone(),
        page,
        ui,
        theme,
        project.config.ui.show_key_hints,
    );

    // Watching is best effort: without it the list just won't auto-refresh
    let watcher = match StoreWatcher::start(&project.data_dir) {
        Ok(w) => Some(w),
        Err(e) => {
            app.set_error(format!("not watching for changes: {}", e));
            None
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(
            io::stdout(),
            DisableBracketedPaste,
            DisableMouseCapture,
            LeaveAlternateScreen
        );
        original_hook(panic_info);
    }));

    // Run event loop
    let result = run_event_loop(&mut terminal, &mut app, watcher.as_ref());

    app.save_ui_state();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    watcher: Option<&StoreWatcher>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(250))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => input::handle_key(app, key),
                Event::Mouse(mouse) => input::handle_mouse(app, mouse),
                Event::Paste(text) => input::handle_paste(app, &text),
                _ => {}
            }
        }

        if let Some(w) = watcher
            && !w.poll().is_empty()
        {
            app.on_store_changed();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::render::test_helpers::{app_with_seed, app_with_store};
    use crate::io::store::MemoryStore;
    use crate::ops::page_ops::create_task;

    #[test]
    fn rows_flatten_subtasks() {
        let app = app_with_seed();
        let rows = app.rows();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].parent_id, None);
        assert_eq!(rows[1].parent_id.as_deref(), Some("t-1"));
        assert_eq!(rows[4].task_id, "t-5");
        assert_eq!(rows[2].top_level_id(), "t-1");
    }

    #[test]
    fn cursor_stays_in_bounds() {
        let mut app = app_with_seed();
        app.move_cursor(-3);
        assert_eq!(app.cursor, 0);
        app.move_cursor(100);
        assert_eq!(app.cursor, 4);
    }

    #[test]
    fn commit_search_filters_and_persists() {
        let mut app = app_with_seed();
        app.commit_search("think");
        assert_eq!(app.rows().len(), 1);
        assert_eq!(app.ui.get().last_search.as_deref(), Some("think"));

        app.commit_search("");
        assert_eq!(app.rows().len(), 5);
        assert_eq!(app.ui.get().last_search, None);
    }

    #[test]
    fn search_is_restored_on_start() {
        let mem = MemoryStore::shared();
        {
            let mut app = app_with_store(mem.clone());
            app.commit_search("keyboard");
        }
        let app = app_with_store(mem);
        assert_eq!(app.search.as_ref().map(|p| p.query()), Some("keyboard"));
        // the matching subtask keeps its parent and siblings visible
        assert_eq!(app.rows().len(), 4);
    }

    #[test]
    fn invalid_regex_preview_keeps_last_filter() {
        let mut app = app_with_seed();
        app.search_regex = true;
        app.preview_search("thi");
        app.preview_search("thi(");
        assert_eq!(app.search.as_ref().map(|p| p.query()), Some("thi"));
    }

    #[test]
    fn reload_is_deferred_while_typing() {
        let mem = MemoryStore::shared();
        let mut app = app_with_store(mem.clone());
        let mut other = app_with_store(mem);
        create_task(&mut other.page, "from the cli").unwrap();

        app.begin_input(Mode::Create, "");
        app.on_store_changed();
        assert!(app.pending_reload);
        assert_eq!(app.page.state().tasks.len(), 2);

        app.end_input();
        assert!(!app.pending_reload);
        assert_eq!(app.page.state().tasks.len(), 3);
    }

    #[test]
    fn cursor_is_remembered() {
        let mem = MemoryStore::shared();
        {
            let mut app = app_with_store(mem.clone());
            app.select_id("t-3");
            app.save_ui_state();
        }
        let app = app_with_store(mem);
        assert_eq!(app.selected_row().unwrap().task_id, "t-3");
    }
}
