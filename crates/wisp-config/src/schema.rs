// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Serde default helper: `true`.
///
/// `#[serde(default)]` on a `bool` always falls back to `false`, so fields
/// that are on unless disabled need a named function.
fn default_true() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    200
}

fn default_agent_prefix() -> char {
    '#'
}

fn default_max_entries() -> usize {
    1000
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub prediction: PredictionConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    /// Per-action key binding overrides.
    ///
    /// Keys are action names, values replace the action's default keys:
    ///
    /// ```toml
    /// [keys]
    /// line_start = ["ctrl+a", "home"]
    /// history_search_backward = ["ctrl+r", "f3"]
    /// delete_word_forward = []   # unbind
    /// ```
    #[serde(default)]
    pub keys: KeysConfig,
}

/// Ghost-text prediction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// Turn predictions off entirely.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Quiet period (milliseconds) before the debounced tier is queried.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Leading character that switches a line into chat/agent mode.
    /// Debounced predictions are not requested for such lines.
    #[serde(default = "default_agent_prefix")]
    pub agent_prefix: char,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: default_debounce_ms(),
            agent_prefix: default_agent_prefix(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Number of submitted lines kept for the current session.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_entries: default_max_entries() }
    }
}

/// Action name → key specifications.  Ordered so that overrides are applied
/// deterministically.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeysConfig {
    pub bindings: BTreeMap<String, Vec<String>>,
}

impl KeysConfig {
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
