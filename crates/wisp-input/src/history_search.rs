//! Incremental reverse history search (Ctrl+R).
//!
//! This state only walks a match list; computing the matches for a query is
//! the job of the [`HistorySearchFn`] the caller supplies.

use std::sync::Arc;

/// Matches for a query, most recent first.
pub type HistorySearchFn = Arc<dyn Fn(&str) -> Vec<String> + Send + Sync>;

#[derive(Debug, Clone, Default)]
pub struct HistorySearchState {
    active: bool,
    query: String,
    matches: Vec<String>,
    match_index: usize,
    original_input: String,
    original_cursor: usize,
}

impl HistorySearchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a search, remembering the line to restore on cancel.
    pub fn start(&mut self, current_text: &str, cursor_pos: usize) {
        *self = Self {
            active: true,
            original_input: current_text.to_string(),
            original_cursor: cursor_pos,
            ..Self::default()
        };
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn matches(&self) -> &[String] {
        &self.matches
    }

    pub fn match_index(&self) -> usize {
        self.match_index
    }

    pub fn original_input(&self) -> &str {
        &self.original_input
    }

    /// Extend the query; the match walk restarts at the most recent match.
    pub fn add_char(&mut self, c: char) {
        self.query.push(c);
        self.match_index = 0;
    }

    /// Drop the last query character.  Returns `false` on an empty query.
    pub fn delete_char(&mut self) -> bool {
        let removed = self.query.pop().is_some();
        self.match_index = 0;
        removed
    }

    pub fn set_matches(&mut self, matches: Vec<String>) {
        self.matches = matches;
        self.clamp_index();
    }

    pub fn current_match(&self) -> Option<&str> {
        self.matches.get(self.match_index).map(String::as_str)
    }

    /// Step to an older match.  Returns `false` at the oldest one.
    pub fn next_match(&mut self) -> bool {
        if self.match_index + 1 >= self.matches.len() {
            return false;
        }
        self.match_index += 1;
        true
    }

    /// Step to a newer match.  Returns `false` at the newest one.
    pub fn prev_match(&mut self) -> bool {
        if self.match_index == 0 || self.matches.is_empty() {
            return false;
        }
        self.match_index -= 1;
        true
    }

    /// End the search with the current match, or the original line when
    /// nothing matched.
    pub fn accept(&mut self) -> String {
        let chosen = match self.matches.get(self.match_index) {
            Some(m) => m.clone(),
            None => std::mem::take(&mut self.original_input),
        };
        self.reset();
        chosen
    }

    /// End the search and return the original `(text, cursor)`.
    pub fn cancel(&mut self) -> (String, usize) {
        let original = (std::mem::take(&mut self.original_input), self.original_cursor);
        self.reset();
        original
    }

    fn clamp_index(&mut self) {
        if self.matches.is_empty() {
            self.match_index = 0;
        } else {
            self.match_index = self.match_index.min(self.matches.len() - 1);
        }
    }
}
