// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Input model: owns the buffer and the three pieces of editor state, routes
//! events to them, and reports how the session ended.
//!
//! Only one `update` runs at a time.  Prediction results computed in the
//! background come back through the channel returned by
//! [`InputModel::take_prediction_events`] and must be fed back in as
//! [`InputEvent::Prediction`].

mod dispatch;
mod events;

use std::sync::Arc;

use crossterm::event::KeyEvent;
use tokio::sync::mpsc;

use crate::{
    buffer::Buffer,
    completion::{CompletionProvider, CompletionState},
    history_search::{HistorySearchFn, HistorySearchState},
    keymap::KeyMap,
    prediction::{PredictionResult, PredictionState},
};

/// Everything the model reacts to.
#[derive(Debug, Clone)]
pub enum InputEvent {
    Key(KeyEvent),
    Paste(String),
    Resize { width: u16, height: u16 },
    Prediction(PredictionResult),
}

/// Which component currently owns key handling.  History search wins over
/// completion, which wins over plain editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Completion,
    HistorySearch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Submit,
    Interrupt,
    Eof,
}

/// How an input session ended.  Written once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputResult {
    pub kind: ResultKind,
    pub value: String,
}

pub struct InputModel {
    buffer: Buffer,
    keymap: KeyMap,
    completion: CompletionState,
    history_search: HistorySearchState,
    prediction: PredictionState,

    completion_provider: Option<Arc<dyn CompletionProvider>>,
    history_search_fn: Option<HistorySearchFn>,

    /// Previous lines, most recent first.
    history_values: Vec<String>,
    /// Position in `history_values` while walking it with Up/Down.
    history_index: Option<usize>,
    /// The in-progress line saved when history walking started.
    history_draft: String,

    result: Option<InputResult>,
    focused: bool,
    width: u16,
    height: u16,

    prediction_tx: mpsc::UnboundedSender<PredictionResult>,
    prediction_rx: Option<mpsc::UnboundedReceiver<PredictionResult>>,
}

impl InputModel {
    pub fn new(keymap: KeyMap, prediction: PredictionState) -> Self {
        let (prediction_tx, prediction_rx) = mpsc::unbounded_channel();
        Self {
            buffer: Buffer::new(),
            keymap,
            completion: CompletionState::new(),
            history_search: HistorySearchState::new(),
            prediction,
            completion_provider: None,
            history_search_fn: None,
            history_values: Vec::new(),
            history_index: None,
            history_draft: String::new(),
            result: None,
            focused: true,
            width: 80,
            height: 24,
            prediction_tx,
            prediction_rx: Some(prediction_rx),
        }
    }

    pub fn with_completion_provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.completion_provider = Some(provider);
        self
    }

    pub fn with_history_search(mut self, search: HistorySearchFn) -> Self {
        self.history_search_fn = Some(search);
        self
    }

    /// Receiver for background prediction results.  Available once.
    pub fn take_prediction_events(&mut self) -> Option<mpsc::UnboundedReceiver<PredictionResult>> {
        self.prediction_rx.take()
    }

    // ── Read access ───────────────────────────────────────────────────────────

    pub fn value(&self) -> String {
        self.buffer.text()
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn keymap(&self) -> &KeyMap {
        &self.keymap
    }

    pub fn completion(&self) -> &CompletionState {
        &self.completion
    }

    pub fn history_search(&self) -> &HistorySearchState {
        &self.history_search
    }

    pub fn prediction(&self) -> &PredictionState {
        &self.prediction
    }

    /// Full stored prediction.
    pub fn current_prediction(&self) -> String {
        self.prediction.prediction()
    }

    /// What to draw dimmed after the cursor.  Empty outside normal editing.
    pub fn ghost_text(&self) -> String {
        if self.mode() != InputMode::Normal || !self.focused {
            return String::new();
        }
        self.prediction.prediction_suggestion(&self.buffer.text())
    }

    pub fn result(&self) -> Option<&InputResult> {
        self.result.as_ref()
    }

    pub fn mode(&self) -> InputMode {
        if self.history_search.is_active() {
            InputMode::HistorySearch
        } else if self.completion.is_active() {
            InputMode::Completion
        } else {
            InputMode::Normal
        }
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn history_values(&self) -> &[String] {
        &self.history_values
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Replace the line, dropping any completion or search in progress.
    pub async fn set_value(&mut self, text: &str) {
        self.completion.reset();
        self.history_search.reset();
        self.leave_history_navigation();
        self.buffer.set_text(text);
        self.notify_changed().await;
    }

    /// Lines available to Up/Down and Ctrl+R, most recent first.
    pub fn set_history_values(&mut self, values: Vec<String>) {
        self.history_values = values;
        self.leave_history_navigation();
    }

    /// Swap bindings between sessions.
    pub fn set_keymap(&mut self, keymap: KeyMap) {
        self.keymap = keymap;
    }

    /// Clear all per-session state so the model can read another line.
    pub fn reset(&mut self) {
        self.clear_session();
        self.result = None;
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    fn clear_session(&mut self) {
        self.buffer.clear();
        self.completion.reset();
        self.history_search.reset();
        self.prediction.reset();
        self.leave_history_navigation();
    }

    fn leave_history_navigation(&mut self) {
        self.history_index = None;
        self.history_draft.clear();
    }

    /// Record the terminal result; later calls keep the first one.
    fn finish(&mut self, kind: ResultKind, value: String) {
        if self.result.is_some() {
            return;
        }
        tracing::debug!(?kind, "input session finished");
        self.clear_session();
        self.result = Some(InputResult { kind, value });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> InputModel {
        InputModel::new(KeyMap::emacs(), PredictionState::disabled())
    }

    #[test]
    fn fresh_model_is_normal_and_empty() {
        let m = model();
        assert_eq!(m.mode(), InputMode::Normal);
        assert_eq!(m.value(), "");
        assert!(m.result().is_none());
        assert!(m.is_focused());
    }

    #[test]
    fn finish_is_write_once() {
        let mut m = model();
        m.finish(ResultKind::Submit, "ls".into());
        m.finish(ResultKind::Interrupt, "other".into());
        assert_eq!(
            m.result(),
            Some(&InputResult { kind: ResultKind::Submit, value: "ls".into() })
        );
        m.reset();
        assert!(m.result().is_none());
    }

    #[test]
    fn prediction_receiver_is_handed_out_once() {
        let mut m = model();
        assert!(m.take_prediction_events().is_some());
        assert!(m.take_prediction_events().is_none());
    }

    #[test]
    fn blur_and_focus_toggle() {
        let mut m = model();
        m.blur();
        assert!(!m.is_focused());
        m.focus();
        assert!(m.is_focused());
    }
}
