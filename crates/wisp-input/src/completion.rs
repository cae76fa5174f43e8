// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Tab-completion cycling state.
//!
//! A completion session replaces one word span of the line.  Each cycle step
//! splices the selected candidate over the span and then moves the span onto
//! the inserted text, so the next step replaces the candidate instead of
//! appending after it.

use std::ops::Range;

use crate::buffer::Buffer;

/// Source of completion candidates for the word under the cursor.
pub trait CompletionProvider: Send + Sync {
    /// Candidates replacing the word at `cursor_pos` (characters) in `line`.
    fn get_completions(&self, line: &str, cursor_pos: usize) -> anyhow::Result<Vec<String>>;
}

/// State of the active completion cycle.
#[derive(Debug, Clone, Default)]
pub struct CompletionState {
    suggestions: Vec<String>,
    /// `None` until the first cycle step.
    selected: Option<usize>,
    prefix: String,
    span: Range<usize>,
    original_text: String,
    original_cursor: usize,
    active: bool,
}

impl CompletionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a completion session over `span` of the current line.
    ///
    /// `original` is the line before any candidate was applied; [`cancel`]
    /// hands it back.
    ///
    /// [`cancel`]: Self::cancel
    pub fn activate(
        &mut self,
        suggestions: Vec<String>,
        prefix: impl Into<String>,
        span: Range<usize>,
        original: &Buffer,
    ) {
        self.active = !suggestions.is_empty();
        if !self.active {
            self.reset();
            return;
        }
        self.suggestions = suggestions;
        self.selected = None;
        self.prefix = prefix.into();
        self.span = span;
        self.original_text = original.text();
        self.original_cursor = original.pos();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Deactivate and return the pre-completion `(text, cursor)` snapshot.
    pub fn cancel(&mut self) -> Option<(String, usize)> {
        if !self.active {
            return None;
        }
        let snapshot = (
            std::mem::take(&mut self.original_text),
            self.original_cursor,
        );
        self.reset();
        Some(snapshot)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// A single candidate is applied directly and never listed.
    pub fn is_visible(&self) -> bool {
        self.active && self.suggestions.len() > 1
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_suggestion(&self) -> Option<&str> {
        self.selected
            .and_then(|i| self.suggestions.get(i))
            .map(String::as_str)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Character range the next candidate will replace.
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    /// Advance to the next candidate, wrapping past the last one.
    pub fn next_suggestion(&mut self) -> Option<String> {
        if !self.active || self.suggestions.is_empty() {
            return None;
        }
        let n = self.suggestions.len();
        let next = match self.selected {
            Some(i) => (i + 1) % n,
            None => 0,
        };
        self.selected = Some(next);
        Some(self.suggestions[next].clone())
    }

    /// Step back to the previous candidate, wrapping before the first one.
    pub fn prev_suggestion(&mut self) -> Option<String> {
        if !self.active || self.suggestions.is_empty() {
            return None;
        }
        let n = self.suggestions.len();
        let prev = match self.selected {
            Some(i) => i.checked_sub(1).unwrap_or(n - 1),
            None => n - 1,
        };
        self.selected = Some(prev);
        Some(self.suggestions[prev].clone())
    }

    /// Record where the just-applied candidate now sits in the line.
    pub fn update_boundaries(&mut self, new_prefix: impl Into<String>, span: Range<usize>) {
        self.prefix = new_prefix.into();
        self.span = span;
    }
}

// ── Pure helpers ──────────────────────────────────────────────────────────────

/// Word span around `pos`: the maximal run of non-whitespace characters
/// touching the cursor.  Inside a whitespace gap the span is empty
/// (`pos..pos`).
pub fn word_boundary(text: &str, pos: usize) -> Range<usize> {
    let runes: Vec<char> = text.chars().collect();
    let pos = pos.min(runes.len());
    let mut start = pos;
    while start > 0 && !runes[start - 1].is_whitespace() {
        start -= 1;
    }
    let mut end = pos;
    while end < runes.len() && !runes[end].is_whitespace() {
        end += 1;
    }
    start..end
}

/// Replace `start..end` of `text` with `suggestion`.
///
/// Reversed bounds are swapped and bounds past the end are clamped, so a
/// stale span still yields a well-formed line.  Returns the new text and the
/// cursor position right after the inserted suggestion.
pub fn apply_suggestion(text: &str, suggestion: &str, start: usize, end: usize) -> (String, usize) {
    let runes: Vec<char> = text.chars().collect();
    let (start, end) = if start > end { (end, start) } else { (start, end) };
    let start = start.min(runes.len());
    let end = end.min(runes.len());

    let mut out: String = runes[..start].iter().collect();
    out.push_str(suggestion);
    out.extend(&runes[end..]);
    (out, start + suggestion.chars().count())
}
