// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Action dispatcher for normal editing: maps every `Action` variant to
//! buffer, completion, history and prediction changes.

use crossterm::event::KeyEvent;
use tracing::{trace, warn};

use crate::{
    buffer::Buffer,
    completion::{apply_suggestion, word_boundary},
    keymap::Action,
    model::{events::printable, InputModel, ResultKind},
};

impl InputModel {
    // ── Action dispatcher ─────────────────────────────────────────────────────

    pub(super) async fn dispatch(&mut self, action: Action, key: &KeyEvent) {
        match action {
            Action::None => {
                if let Some(c) = printable(key) {
                    self.edit(|b| b.insert_runes(&[c])).await;
                }
            }

            Action::CharacterForward | Action::LineEnd if self.buffer.at_end() => {
                self.accept_prediction().await;
            }
            Action::CharacterForward
            | Action::CharacterBackward
            | Action::WordForward
            | Action::WordBackward
            | Action::LineStart
            | Action::LineEnd => self.move_cursor(action),

            Action::DeleteCharacterBackward => self.edit(Buffer::delete_char_backward).await,
            Action::DeleteCharacterForward => self.edit(Buffer::delete_char_forward).await,
            Action::DeleteWordBackward => self.edit(Buffer::delete_word_backward).await,
            Action::DeleteWordForward => self.edit(Buffer::delete_word_forward).await,
            Action::DeleteBeforeCursor => self.edit(Buffer::delete_before_cursor).await,
            Action::DeleteAfterCursor => self.edit(Buffer::delete_after_cursor).await,

            Action::AcceptPrediction => self.accept_prediction().await,
            Action::Complete => self.start_completion(true).await,
            Action::CompleteBackward => self.start_completion(false).await,

            Action::HistoryPrevious => self.step_history(true).await,
            Action::HistoryNext => self.step_history(false).await,
            Action::HistorySearchBackward => {
                self.history_search.start(&self.buffer.text(), self.buffer.pos());
            }

            Action::Cancel => {}
            Action::Submit => {
                let value = self.buffer.text();
                self.finish(ResultKind::Submit, value);
            }
            Action::Interrupt => {
                let value = self.buffer.text();
                self.finish(ResultKind::Interrupt, value);
            }
            Action::EndOfFile => {
                if self.buffer.is_empty() {
                    self.finish(ResultKind::Eof, String::new());
                } else {
                    self.edit(Buffer::delete_char_forward).await;
                }
            }
        }
    }

    /// Apply a cursor motion only; never accepts a prediction.
    pub(super) fn move_cursor(&mut self, action: Action) {
        match action {
            Action::CharacterForward => {
                self.buffer.move_right();
            }
            Action::CharacterBackward => {
                self.buffer.move_left();
            }
            Action::WordForward => self.buffer.word_forward(),
            Action::WordBackward => self.buffer.word_backward(),
            Action::LineStart => self.buffer.move_to_start(),
            Action::LineEnd => self.buffer.move_to_end(),
            _ => {}
        }
    }

    // ── Text mutation ─────────────────────────────────────────────────────────

    /// Run a buffer operation and, if the text changed, leave history
    /// navigation and tell the prediction state.
    pub(super) async fn edit<R>(&mut self, op: impl FnOnce(&mut Buffer) -> R) {
        let before = self.buffer.text();
        op(&mut self.buffer);
        if self.buffer.text() != before {
            self.leave_history_navigation();
            self.notify_changed().await;
        }
    }

    /// Replace the whole text while staying in history navigation.  The
    /// prediction state is only told when the text is different.
    pub(super) async fn replace_text(&mut self, text: &str) {
        let changed = self.buffer.text() != text;
        self.buffer.set_text(text);
        if changed {
            self.notify_changed().await;
        }
    }

    /// Hand the current text to the prediction state and route whatever it
    /// produces into the model's result channel.
    pub(super) async fn notify_changed(&mut self) {
        let text = self.buffer.text();
        let Some(rx) = self.prediction.on_input_changed(&text).await else {
            return;
        };
        let tx = self.prediction_tx.clone();
        tokio::spawn(async move {
            // A dropped sender means the request was superseded.
            if let Ok(result) = rx.await {
                let _ = tx.send(result);
            }
        });
    }

    /// Splice the shown prediction into the buffer.
    async fn accept_prediction(&mut self) {
        let prediction = self.prediction.prediction();
        if prediction.is_empty() || prediction == self.buffer.text() {
            return;
        }
        trace!(prediction = %prediction, "accepting prediction");
        self.edit(|b| b.set_text(&prediction)).await;
    }

    // ── Completion ────────────────────────────────────────────────────────────

    async fn start_completion(&mut self, forward: bool) {
        let Some(provider) = self.completion_provider.clone() else {
            return;
        };
        let text = self.buffer.text();
        let pos = self.buffer.pos();
        let candidates = match provider.get_completions(&text, pos) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "completion lookup failed");
                return;
            }
        };
        if candidates.is_empty() {
            return;
        }

        let span = word_boundary(&text, pos);
        let prefix: String = text.chars().skip(span.start).take(pos - span.start).collect();

        if let [only] = candidates.as_slice() {
            let (new_text, cursor) = apply_suggestion(&text, only, span.start, span.end);
            self.edit(|b| {
                b.set_text(&new_text);
                b.set_pos(cursor);
            })
            .await;
            return;
        }

        trace!(prefix = %prefix, count = candidates.len(), "completion started");
        self.completion.activate(candidates, prefix, span, &self.buffer);
        self.cycle_completion(forward).await;
    }

    /// Apply the next (or previous) candidate over the tracked span.
    pub(super) async fn cycle_completion(&mut self, forward: bool) {
        let next = if forward {
            self.completion.next_suggestion()
        } else {
            self.completion.prev_suggestion()
        };
        let Some(suggestion) = next else {
            return;
        };

        let span = self.completion.span();
        let (text, cursor) = apply_suggestion(&self.buffer.text(), &suggestion, span.start, span.end);
        let start = cursor - suggestion.chars().count();
        self.replace_text(&text).await;
        self.buffer.set_pos(cursor);
        self.completion.update_boundaries(suggestion, start..cursor);
    }

    // ── History navigation ────────────────────────────────────────────────────

    async fn step_history(&mut self, older: bool) {
        let target = match (self.history_index, older) {
            (None, true) => 0,
            (Some(i), true) => i + 1,
            (None, false) => return,
            (Some(0), false) => {
                let draft = std::mem::take(&mut self.history_draft);
                self.history_index = None;
                self.replace_text(&draft).await;
                return;
            }
            (Some(i), false) => i - 1,
        };
        let Some(entry) = self.history_values.get(target).cloned() else {
            return;
        };
        if self.history_index.is_none() {
            self.history_draft = self.buffer.text();
        }
        self.history_index = Some(target);
        self.replace_text(&entry).await;
    }
}
