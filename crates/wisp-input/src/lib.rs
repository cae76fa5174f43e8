// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Line-editing engine for an interactive shell prompt.
//!
//! [`InputModel`] is the entry point: feed it [`InputEvent`]s, render from its
//! accessors, and read [`InputModel::result`] once the line is done.
pub mod buffer;
pub mod completion;
pub mod error;
pub mod history_search;
pub mod keymap;
pub mod model;
pub mod prediction;

pub use buffer::Buffer;
pub use completion::{apply_suggestion, word_boundary, CompletionProvider, CompletionState};
pub use error::InputError;
pub use history_search::{HistorySearchFn, HistorySearchState};
pub use keymap::{Action, KeyBinding, KeyMap};
pub use model::{InputEvent, InputMode, InputModel, InputResult, ResultKind};
pub use prediction::{
    PredictionOptions, PredictionProvider, PredictionReceiver, PredictionResult, PredictionSource,
    PredictionState, PredictionTrigger,
};
