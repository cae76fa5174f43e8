// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Editable line buffer.
//!
//! Text is held as a sequence of Unicode scalar values so every offset the
//! rest of the engine deals in (cursor, word spans, completion ranges) is a
//! character index, never a byte index.  Every mutation leaves the cursor in
//! `0..=len`.

/// The line being edited plus its cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    runes: Vec<char>,
    cursor: usize,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a buffer holding `text` with the cursor at the end.
    pub fn with_text(text: &str) -> Self {
        let mut buf = Self::new();
        buf.set_text(text);
        buf
    }

    pub fn text(&self) -> String {
        self.runes.iter().collect()
    }

    pub fn runes(&self) -> &[char] {
        &self.runes
    }

    pub fn len(&self) -> usize {
        self.runes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runes.is_empty()
    }

    /// Cursor position in characters.
    pub fn pos(&self) -> usize {
        self.cursor
    }

    pub fn at_end(&self) -> bool {
        self.cursor == self.runes.len()
    }

    /// Character at `index`, or `None` when out of bounds.
    pub fn rune_at(&self, index: usize) -> Option<char> {
        self.runes.get(index).copied()
    }

    /// Text before the cursor.
    pub fn text_before_cursor(&self) -> String {
        self.runes[..self.cursor].iter().collect()
    }

    /// Replace the whole text; the cursor moves to the end.
    pub fn set_text(&mut self, text: &str) {
        self.runes = text.chars().collect();
        self.cursor = self.runes.len();
    }

    /// Move the cursor, clamping to `0..=len`.
    pub fn set_pos(&mut self, pos: usize) {
        self.cursor = pos.min(self.runes.len());
    }

    pub fn clear(&mut self) {
        self.runes.clear();
        self.cursor = 0;
    }

    pub fn insert(&mut self, text: &str) {
        let runes: Vec<char> = text.chars().collect();
        self.insert_runes(&runes);
    }

    /// Insert at the cursor and advance past the inserted text.
    pub fn insert_runes(&mut self, runes: &[char]) {
        if runes.is_empty() {
            return;
        }
        let at = self.cursor;
        self.runes.splice(at..at, runes.iter().copied());
        self.cursor = at + runes.len();
    }

    // ── Deletion ──────────────────────────────────────────────────────────────

    /// Backspace.  Returns `false` when the cursor is already at the start.
    pub fn delete_char_backward(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.runes.remove(self.cursor - 1);
        self.cursor -= 1;
        true
    }

    /// Delete under the cursor.  Returns `false` at the end of the line.
    pub fn delete_char_forward(&mut self) -> bool {
        if self.cursor >= self.runes.len() {
            return false;
        }
        self.runes.remove(self.cursor);
        true
    }

    pub fn delete_word_backward(&mut self) -> bool {
        let start = self.word_backward_pos();
        self.delete_range(start, self.cursor)
    }

    pub fn delete_word_forward(&mut self) -> bool {
        let end = self.word_forward_pos();
        self.delete_range(self.cursor, end)
    }

    /// Kill from the start of the line up to the cursor (Ctrl+U).
    pub fn delete_before_cursor(&mut self) -> bool {
        self.delete_range(0, self.cursor)
    }

    /// Kill from the cursor to the end of the line (Ctrl+K).
    pub fn delete_after_cursor(&mut self) -> bool {
        self.delete_range(self.cursor, self.runes.len())
    }

    fn delete_range(&mut self, start: usize, end: usize) -> bool {
        let end = end.min(self.runes.len());
        if start >= end {
            return false;
        }
        self.runes.drain(start..end);
        if self.cursor > end {
            self.cursor -= end - start;
        } else if self.cursor > start {
            self.cursor = start;
        }
        true
    }

    // ── Cursor movement ───────────────────────────────────────────────────────

    pub fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    pub fn move_right(&mut self) -> bool {
        if self.cursor >= self.runes.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    pub fn move_to_start(&mut self) {
        self.cursor = 0;
    }

    pub fn move_to_end(&mut self) {
        self.cursor = self.runes.len();
    }

    pub fn word_backward(&mut self) {
        self.cursor = self.word_backward_pos();
    }

    pub fn word_forward(&mut self) {
        self.cursor = self.word_forward_pos();
    }

    /// Start of the word left of the cursor: skip the whitespace gap, then the
    /// word itself.
    fn word_backward_pos(&self) -> usize {
        let mut i = self.cursor;
        while i > 0 && self.runes[i - 1].is_whitespace() {
            i -= 1;
        }
        while i > 0 && !self.runes[i - 1].is_whitespace() {
            i -= 1;
        }
        i
    }

    /// End of the word right of the cursor.
    fn word_forward_pos(&self) -> usize {
        let len = self.runes.len();
        let mut i = self.cursor;
        while i < len && self.runes[i].is_whitespace() {
            i += 1;
        }
        while i < len && !self.runes[i].is_whitespace() {
            i += 1;
        }
        i
    }
}
