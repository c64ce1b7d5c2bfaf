use std::ops::Range;

use regex::Regex;

use crate::model::task::Task;

/// A compiled, case-insensitive search.
///
/// Plain queries match as literal substrings; `regex` queries are compiled
/// as-is. Both go through one `Regex` so the TUI can highlight matches.
#[derive(Debug, Clone)]
pub struct SearchPattern {
    query: String,
    re: Regex,
}

impl SearchPattern {
    pub fn new(query: &str, regex: bool) -> Result<Self, regex::Error> {
        let body = if regex {
            query.to_string()
        } else {
            regex::escape(query)
        };
        let re = Regex::new(&format!("(?i){}", body))?;
        Ok(SearchPattern {
            query: query.to_string(),
            re,
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.re.is_match(text)
    }

    /// Byte ranges of every match in `text`
    pub fn find_spans(&self, text: &str) -> Vec<Range<usize>> {
        self.re.find_iter(text).map(|m| m.start()..m.end()).collect()
    }

    pub fn regex(&self) -> &Regex {
        &self.re
    }

    /// Does this task, or any of its subtasks, match?
    pub fn matches_task(&self, task: &Task) -> bool {
        self.is_match(&task.title) || task.sub_tasks.iter().any(|s| self.is_match(&s.title))
    }
}

/// Tasks to display for an optional query.
///
/// A top-level task is kept when its title or any subtask title matches;
/// kept tasks are shown with all their subtasks. No query, or an empty one,
/// keeps everything.
pub fn filter_tasks<'a>(tasks: &'a [Task], pattern: Option<&SearchPattern>) -> Vec<&'a Task> {
    match pattern {
        Some(p) if !p.query().is_empty() => tasks.iter().filter(|t| p.matches_task(t)).collect(),
        _ => tasks.iter().collect(),
    }
}
