// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Session-local history plus the prediction, search and completion sources
//! the REPL plugs into the input model.

use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::trace;
use wisp_input::{
    word_boundary, CompletionProvider, HistorySearchFn, InputError, PredictionProvider,
    PredictionTrigger,
};

// ── History ───────────────────────────────────────────────────────────────────

/// Lines submitted in this session, most recent first.
#[derive(Clone)]
pub struct SessionHistory {
    entries: Arc<Mutex<VecDeque<String>>>,
    max_entries: usize,
}

impl SessionHistory {
    pub fn new(max_entries: usize) -> Self {
        Self { entries: Arc::new(Mutex::new(VecDeque::new())), max_entries }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a submitted line.  Blank lines are skipped and an older copy
    /// of the same line is moved to the front.
    pub fn push(&self, line: &str) {
        if line.trim().is_empty() || self.max_entries == 0 {
            return;
        }
        let mut entries = self.lock();
        entries.retain(|e| e != line);
        entries.push_front(line.to_string());
        entries.truncate(self.max_entries);
    }

    pub fn entries(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    /// Most recent entry that strictly extends `prefix`.
    pub fn complete_prefix(&self, prefix: &str) -> Option<String> {
        self.lock()
            .iter()
            .find(|e| e.len() > prefix.len() && e.starts_with(prefix))
            .cloned()
    }

    /// Entries containing `query`, most recent first.
    pub fn search(&self, query: &str) -> Vec<String> {
        self.lock().iter().filter(|e| e.contains(query)).cloned().collect()
    }

    pub fn search_fn(&self) -> HistorySearchFn {
        let history = self.clone();
        Arc::new(move |query: &str| history.search(query))
    }
}

// ── Prediction ────────────────────────────────────────────────────────────────

/// Predicts from session history.
///
/// The instant tier finds the newest entry the input is a prefix of.  The
/// debounced tier only handles the empty line, where it offers the last
/// command.
pub struct HistoryPredictor {
    history: SessionHistory,
}

impl HistoryPredictor {
    pub fn new(history: SessionHistory) -> Self {
        Self { history }
    }
}

#[async_trait]
impl PredictionProvider for HistoryPredictor {
    async fn predict(&self, input: &str, trigger: PredictionTrigger) -> anyhow::Result<String> {
        let prediction = match trigger {
            PredictionTrigger::Instant if !input.is_empty() => self.history.complete_prefix(input),
            PredictionTrigger::Debounced if input.is_empty() => {
                self.history.entries().into_iter().next()
            }
            _ => None,
        };
        trace!(input, ?trigger, hit = prediction.is_some(), "history prediction");
        Ok(prediction.unwrap_or_default())
    }
}

// ── Completion ────────────────────────────────────────────────────────────────

/// Completes the word under the cursor against directory entries.
///
/// `src/ma` lists `src/` for names starting with `ma`; directories get a
/// trailing `/`.  Dotfiles are only offered when the typed name starts with
/// a dot.
pub struct PathCompleter {
    root: PathBuf,
}

impl PathCompleter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn list(&self, dir: &Path) -> io::Result<Vec<(String, bool)>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            names.push((entry.file_name().to_string_lossy().into_owned(), is_dir));
        }
        Ok(names)
    }
}

impl CompletionProvider for PathCompleter {
    fn get_completions(&self, line: &str, cursor_pos: usize) -> anyhow::Result<Vec<String>> {
        let span = word_boundary(line, cursor_pos);
        let word: String = line.chars().skip(span.start).take(cursor_pos - span.start).collect();

        let (dir_part, name_prefix) = match word.rfind('/') {
            Some(i) => word.split_at(i + 1),
            None => ("", word.as_str()),
        };
        let dir = if dir_part.is_empty() {
            self.root.clone()
        } else if Path::new(dir_part).is_absolute() {
            PathBuf::from(dir_part)
        } else {
            self.root.join(dir_part)
        };

        let names = match self.list(&dir) {
            Ok(names) => names,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(InputError::Completion(format!("{}: {e}", dir.display())).into())
            }
        };

        let mut out: Vec<String> = names
            .into_iter()
            .filter(|(name, _)| name.starts_with(name_prefix))
            .filter(|(name, _)| !name.starts_with('.') || name_prefix.starts_with('.'))
            .map(|(name, is_dir)| {
                let slash = if is_dir { "/" } else { "" };
                format!("{dir_part}{name}{slash}")
            })
            .collect();
        out.sort();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(lines: &[&str]) -> SessionHistory {
        let h = SessionHistory::new(3);
        for l in lines {
            h.push(l);
        }
        h
    }

    #[test]
    fn push_dedupes_caps_and_orders_newest_first() {
        let h = history(&["ls", "pwd", "  ", "ls", "make", "git status"]);
        assert_eq!(h.entries(), ["git status", "make", "ls"]);
    }

    #[test]
    fn prefix_completion_needs_a_longer_entry() {
        let h = history(&["git status", "git", "ls -la"]);
        assert_eq!(h.complete_prefix("gi").as_deref(), Some("git"));
        assert_eq!(h.complete_prefix("git").as_deref(), Some("git status"));
        assert_eq!(h.complete_prefix("ls -la"), None);
    }

    #[test]
    fn search_is_substring_newest_first() {
        let h = history(&["git push", "make", "git pull"]);
        let search = h.search_fn();
        assert_eq!(search("git"), ["git pull", "git push"]);
        assert!(search("zzz").is_empty());
    }

    #[tokio::test]
    async fn predictor_tiers() {
        let h = history(&["cargo test", "cargo build"]);
        let p = HistoryPredictor::new(h);
        assert_eq!(p.predict("cargo t", PredictionTrigger::Instant).await.unwrap(), "cargo test");
        assert_eq!(p.predict("cargo t", PredictionTrigger::Debounced).await.unwrap(), "");
        assert_eq!(p.predict("", PredictionTrigger::Instant).await.unwrap(), "");
        assert_eq!(p.predict("", PredictionTrigger::Debounced).await.unwrap(), "cargo build");
    }

    #[test]
    fn path_completer_lists_matching_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("setup.sh"), "").unwrap();
        std::fs::write(dir.path().join(".secret"), "").unwrap();
        std::fs::write(dir.path().join("src/main.rs"), "").unwrap();
        let c = PathCompleter::new(dir.path());

        assert_eq!(c.get_completions("cat s", 5).unwrap(), ["setup.sh", "src/"]);
        assert_eq!(c.get_completions("cat src/m", 9).unwrap(), ["src/main.rs"]);
        assert_eq!(c.get_completions("cat .s", 6).unwrap(), [".secret"]);
        assert!(c.get_completions("cat nope/x", 10).unwrap().is_empty());
    }
}
