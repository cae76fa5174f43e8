// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Event routing: key, paste, resize and prediction events, and the two
//! modal key handlers (history search, completion).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{debug, trace};

use crate::{
    keymap::Action,
    model::{InputEvent, InputMode, InputModel},
    prediction::PredictionResult,
};

/// The character a key event types, if it types one.
pub(super) fn printable(key: &KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char(c)
            if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                && !c.is_control() =>
        {
            Some(c)
        }
        _ => None,
    }
}

/// Pasted text as a single line: line breaks and tabs become spaces, other
/// control characters are dropped.
pub(super) fn sanitize_paste(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\n' | '\r' | '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

impl InputModel {
    /// Apply one event.  Poll [`result`](Self::result) afterwards.
    pub async fn update(&mut self, event: InputEvent) {
        if self.result.is_some() {
            return;
        }
        match event {
            InputEvent::Key(key) => {
                if key.kind == KeyEventKind::Release || !self.focused {
                    return;
                }
                self.handle_key(key).await;
            }
            InputEvent::Paste(text) => {
                if self.focused {
                    self.handle_paste(&text).await;
                }
            }
            InputEvent::Resize { width, height } => {
                self.width = width;
                self.height = height;
            }
            InputEvent::Prediction(result) => self.apply_prediction(result),
        }
    }

    async fn handle_key(&mut self, key: KeyEvent) {
        let action = self.keymap.lookup(&key);
        trace!(?key, %action, mode = ?self.mode(), "key");
        match self.mode() {
            InputMode::HistorySearch => self.handle_history_search_key(action, &key).await,
            InputMode::Completion => self.handle_completion_key(action, &key).await,
            InputMode::Normal => self.dispatch(action, &key).await,
        }
    }

    async fn handle_paste(&mut self, text: &str) {
        let clean = sanitize_paste(text);
        if clean.is_empty() {
            return;
        }
        match self.mode() {
            InputMode::HistorySearch => {
                for c in clean.chars() {
                    self.history_search.add_char(c);
                }
                self.refresh_search();
            }
            InputMode::Completion | InputMode::Normal => {
                self.completion.reset();
                self.edit(|b| b.insert(&clean)).await;
            }
        }
    }

    /// Store a background result if it is still current.  Failed requests
    /// leave the displayed prediction alone.
    fn apply_prediction(&mut self, result: PredictionResult) {
        if let Some(err) = &result.error {
            debug!(state_id = result.state_id, error = %err, "prediction error");
            return;
        }
        if self.prediction.set_prediction(result.state_id, &result.prediction) {
            trace!(state_id = result.state_id, source = ?result.source, "prediction applied");
        }
    }

    // ── History search mode ───────────────────────────────────────────────────

    async fn handle_history_search_key(&mut self, action: Action, key: &KeyEvent) {
        match action {
            Action::HistorySearchBackward | Action::HistoryPrevious => {
                if self.history_search.next_match() {
                    self.show_search_match();
                }
            }
            Action::HistoryNext => {
                if self.history_search.prev_match() {
                    self.show_search_match();
                }
            }
            Action::DeleteCharacterBackward => {
                if self.history_search.delete_char() {
                    self.refresh_search();
                }
            }
            Action::Cancel | Action::Interrupt => {
                let (text, cursor) = self.history_search.cancel();
                self.buffer.set_text(&text);
                self.buffer.set_pos(cursor);
            }
            Action::Submit => {
                self.accept_search().await;
                self.dispatch(Action::Submit, key).await;
            }
            // The ghost text was hidden while searching, so the motion
            // only moves the cursor.
            a if a.is_cursor_motion() => {
                self.accept_search().await;
                self.move_cursor(a);
            }
            Action::None => {
                if let Some(c) = printable(key) {
                    self.history_search.add_char(c);
                    self.refresh_search();
                }
            }
            // Everything else is swallowed while searching.
            _ => {}
        }
    }

    /// Re-run the search for the current query and show the first match.
    pub(super) fn refresh_search(&mut self) {
        let matches = match &self.history_search_fn {
            Some(search) if !self.history_search.query().is_empty() => {
                search(self.history_search.query())
            }
            _ => Vec::new(),
        };
        trace!(query = self.history_search.query(), matches = matches.len(), "history search");
        self.history_search.set_matches(matches);
        self.show_search_match();
    }

    fn show_search_match(&mut self) {
        let shown = self
            .history_search
            .current_match()
            .unwrap_or(self.history_search.original_input())
            .to_string();
        self.buffer.set_text(&shown);
    }

    /// Keep the shown match.  Predictions last saw the text from before the
    /// search, so nothing is sent when the match is that same text.
    async fn accept_search(&mut self) {
        let original = self.history_search.original_input().to_string();
        let chosen = self.history_search.accept();
        self.buffer.set_text(&chosen);
        if chosen != original {
            self.leave_history_navigation();
            self.notify_changed().await;
        }
    }

    // ── Completion mode ───────────────────────────────────────────────────────

    async fn handle_completion_key(&mut self, action: Action, key: &KeyEvent) {
        match action {
            Action::Complete | Action::HistoryNext => self.cycle_completion(true).await,
            Action::CompleteBackward | Action::HistoryPrevious => {
                self.cycle_completion(false).await;
            }
            Action::Cancel => {
                if let Some((text, cursor)) = self.completion.cancel() {
                    self.buffer.set_text(&text);
                    self.buffer.set_pos(cursor);
                    self.notify_changed().await;
                }
            }
            // Enter keeps the highlighted candidate and closes the list.
            Action::Submit => self.completion.reset(),
            other => {
                self.completion.reset();
                self.dispatch(other, key).await;
            }
        }
    }
}
