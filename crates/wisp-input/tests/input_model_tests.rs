// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! End-to-end key handling through `InputModel` with the default bindings.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::time::timeout;
use wisp_input::{
    CompletionProvider, HistorySearchFn, InputError, InputEvent, InputMode, InputModel,
    InputResult, KeyMap, PredictionOptions, PredictionProvider, PredictionResult,
    PredictionSource, PredictionState, PredictionTrigger, ResultKind,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

struct Fixed(Vec<&'static str>);

impl CompletionProvider for Fixed {
    fn get_completions(&self, _line: &str, _cursor_pos: usize) -> anyhow::Result<Vec<String>> {
        Ok(self.0.iter().map(|s| s.to_string()).collect())
    }
}

struct Failing;

impl CompletionProvider for Failing {
    fn get_completions(&self, _line: &str, _cursor_pos: usize) -> anyhow::Result<Vec<String>> {
        anyhow::bail!("permission denied")
    }
}

/// Instant answers only: "git" → "git status", "git push" → "git push origin main".
struct GitStatus;

#[async_trait]
impl PredictionProvider for GitStatus {
    async fn predict(&self, input: &str, trigger: PredictionTrigger) -> anyhow::Result<String> {
        Ok(match (trigger, input) {
            (PredictionTrigger::Instant, "git") => "git status".into(),
            (PredictionTrigger::Instant, "git push") => "git push origin main".into(),
            _ => String::new(),
        })
    }
}

fn model() -> InputModel {
    InputModel::new(KeyMap::emacs(), PredictionState::disabled())
}

fn substring_search(entries: &[&str]) -> HistorySearchFn {
    let entries: Vec<String> = entries.iter().map(|s| s.to_string()).collect();
    Arc::new(move |query: &str| entries.iter().filter(|e| e.contains(query)).cloned().collect())
}

async fn press(m: &mut InputModel, code: KeyCode) {
    m.update(InputEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))).await;
}

async fn ctrl(m: &mut InputModel, c: char) {
    m.update(InputEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))).await;
}

async fn type_str(m: &mut InputModel, text: &str) {
    for c in text.chars() {
        press(m, KeyCode::Char(c)).await;
    }
}

// ── Editing ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn typing_and_word_deletion() {
    let mut m = model();
    type_str(&mut m, "git commit -m").await;
    assert_eq!(m.value(), "git commit -m");

    ctrl(&mut m, 'w').await;
    assert_eq!(m.value(), "git commit ");
    ctrl(&mut m, 'a').await;
    assert_eq!(m.buffer().pos(), 0);
    ctrl(&mut m, 'k').await;
    assert_eq!(m.value(), "");
}

#[tokio::test]
async fn eof_deletes_forward_on_a_non_empty_line() {
    let mut m = model();
    type_str(&mut m, "ab").await;
    press(&mut m, KeyCode::Left).await;
    ctrl(&mut m, 'd').await;
    assert_eq!(m.value(), "a");
    assert!(m.result().is_none());
}

#[tokio::test]
async fn paste_inserts_a_single_line() {
    let mut m = model();
    type_str(&mut m, "x ").await;
    m.update(InputEvent::Paste("echo\nhi".into())).await;
    assert_eq!(m.value(), "x echo hi");
}

#[tokio::test]
async fn blurred_model_ignores_keys_but_tracks_size() {
    let mut m = model();
    m.blur();
    type_str(&mut m, "ls").await;
    m.update(InputEvent::Resize { width: 120, height: 40 }).await;
    assert_eq!(m.value(), "");
    assert_eq!((m.width(), m.height()), (120, 40));

    m.focus();
    type_str(&mut m, "ls").await;
    assert_eq!(m.value(), "ls");
}

// ── Results ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn submit_records_the_line_and_clears_the_session() {
    let mut m = model();
    type_str(&mut m, "make").await;
    press(&mut m, KeyCode::Enter).await;
    assert_eq!(
        m.result(),
        Some(&InputResult { kind: ResultKind::Submit, value: "make".into() })
    );
    assert_eq!(m.value(), "");

    // The session is over until reset.
    type_str(&mut m, "ls").await;
    assert_eq!(m.value(), "");
    m.reset();
    type_str(&mut m, "ls").await;
    assert_eq!(m.value(), "ls");
}

#[tokio::test]
async fn interrupt_and_eof_results() {
    let mut m = model();
    type_str(&mut m, "half typed").await;
    ctrl(&mut m, 'c').await;
    assert_eq!(m.result().map(|r| r.kind), Some(ResultKind::Interrupt));
    assert_eq!(m.result().map(|r| r.value.as_str()), Some("half typed"));

    m.reset();
    ctrl(&mut m, 'd').await;
    assert_eq!(m.result(), Some(&InputResult { kind: ResultKind::Eof, value: String::new() }));
}

// ── Completion ────────────────────────────────────────────────────────────────

fn completing(items: Vec<&'static str>) -> InputModel {
    model().with_completion_provider(Arc::new(Fixed(items)))
}

#[tokio::test]
async fn tab_cycles_candidates_and_escape_restores() {
    let mut m = completing(vec!["alpha", "beta", "gamma"]);
    type_str(&mut m, "ls a").await;

    press(&mut m, KeyCode::Tab).await;
    assert_eq!(m.mode(), InputMode::Completion);
    assert!(m.completion().is_visible());
    assert_eq!(m.value(), "ls alpha");

    press(&mut m, KeyCode::Tab).await;
    assert_eq!(m.value(), "ls beta");
    press(&mut m, KeyCode::BackTab).await;
    assert_eq!(m.value(), "ls alpha");
    press(&mut m, KeyCode::Up).await;
    assert_eq!(m.value(), "ls gamma");

    press(&mut m, KeyCode::Esc).await;
    assert_eq!(m.mode(), InputMode::Normal);
    assert_eq!(m.value(), "ls a");
    assert_eq!(m.buffer().pos(), 4);
}

#[tokio::test]
async fn enter_accepts_candidate_without_submitting() {
    let mut m = completing(vec!["src/", "tests/"]);
    type_str(&mut m, "cd ").await;
    press(&mut m, KeyCode::Tab).await;
    press(&mut m, KeyCode::Tab).await;
    press(&mut m, KeyCode::Enter).await;

    assert_eq!(m.mode(), InputMode::Normal);
    assert_eq!(m.value(), "cd tests/");
    assert!(m.result().is_none());
}

#[tokio::test]
async fn typing_closes_completion_and_edits_normally() {
    let mut m = completing(vec!["alpha", "beta"]);
    type_str(&mut m, "a").await;
    press(&mut m, KeyCode::Tab).await;
    type_str(&mut m, "x").await;
    assert_eq!(m.mode(), InputMode::Normal);
    assert_eq!(m.value(), "alphax");
}

#[tokio::test]
async fn single_candidate_is_applied_directly() {
    let mut m = completing(vec!["Cargo.toml"]);
    type_str(&mut m, "cat Car x").await;
    for _ in 0..2 {
        press(&mut m, KeyCode::Left).await;
    }
    press(&mut m, KeyCode::Tab).await;
    assert_eq!(m.mode(), InputMode::Normal);
    assert_eq!(m.value(), "cat Cargo.toml x");
    assert_eq!(m.buffer().pos(), "cat Cargo.toml".len());
}

#[tokio::test]
async fn completion_errors_leave_the_line_alone() {
    let mut m = model().with_completion_provider(Arc::new(Failing));
    type_str(&mut m, "ls ").await;
    press(&mut m, KeyCode::Tab).await;
    assert_eq!(m.mode(), InputMode::Normal);
    assert_eq!(m.value(), "ls ");
}

// ── History ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn up_and_down_walk_history_and_restore_the_draft() {
    let mut m = model();
    m.set_history_values(vec!["second".into(), "first".into()]);
    type_str(&mut m, "dr").await;

    press(&mut m, KeyCode::Up).await;
    assert_eq!(m.value(), "second");
    press(&mut m, KeyCode::Up).await;
    assert_eq!(m.value(), "first");
    press(&mut m, KeyCode::Up).await;
    assert_eq!(m.value(), "first");

    press(&mut m, KeyCode::Down).await;
    assert_eq!(m.value(), "second");
    press(&mut m, KeyCode::Down).await;
    assert_eq!(m.value(), "dr");
    press(&mut m, KeyCode::Down).await;
    assert_eq!(m.value(), "dr");
}

fn searching() -> InputModel {
    model().with_history_search(substring_search(&["git push", "git pull", "make"]))
}

#[tokio::test]
async fn reverse_search_walks_matches_and_submits() {
    let mut m = searching();
    ctrl(&mut m, 'r').await;
    assert_eq!(m.mode(), InputMode::HistorySearch);

    type_str(&mut m, "gi").await;
    assert_eq!(m.history_search().query(), "gi");
    assert_eq!(m.value(), "git push");

    ctrl(&mut m, 'r').await;
    assert_eq!(m.value(), "git pull");
    // Already at the oldest match.
    ctrl(&mut m, 'r').await;
    assert_eq!(m.value(), "git pull");

    press(&mut m, KeyCode::Enter).await;
    assert_eq!(
        m.result(),
        Some(&InputResult { kind: ResultKind::Submit, value: "git pull".into() })
    );
}

#[tokio::test]
async fn cancelling_search_restores_the_line() {
    let mut m = searching();
    type_str(&mut m, "draft").await;
    ctrl(&mut m, 'r').await;
    type_str(&mut m, "ma").await;
    assert_eq!(m.value(), "make");

    press(&mut m, KeyCode::Esc).await;
    assert_eq!(m.mode(), InputMode::Normal);
    assert_eq!(m.value(), "draft");
    assert_eq!(m.buffer().pos(), 5);
}

#[tokio::test]
async fn cursor_motion_accepts_search_then_moves() {
    let mut m = searching();
    ctrl(&mut m, 'r').await;
    type_str(&mut m, "pu").await;
    ctrl(&mut m, 'a').await;
    assert_eq!(m.mode(), InputMode::Normal);
    assert_eq!(m.value(), "git push");
    assert_eq!(m.buffer().pos(), 0);
}

#[tokio::test]
async fn accepting_the_unchanged_line_keeps_the_prediction_state() {
    let mut m = searching();
    type_str(&mut m, "make").await;
    let id = m.prediction().state_id();

    ctrl(&mut m, 'r').await;
    type_str(&mut m, "ma").await;
    assert_eq!(m.value(), "make");
    ctrl(&mut m, 'a').await;
    assert_eq!(m.mode(), InputMode::Normal);
    assert_eq!(m.prediction().state_id(), id);

    // Same for a history entry equal to the line.
    m.set_history_values(vec!["make".into()]);
    press(&mut m, KeyCode::Up).await;
    assert_eq!(m.value(), "make");
    assert_eq!(m.prediction().state_id(), id);
}

#[tokio::test]
async fn search_without_matches_shows_original() {
    let mut m = searching();
    type_str(&mut m, "ls").await;
    ctrl(&mut m, 'r').await;
    type_str(&mut m, "zz").await;
    assert_eq!(m.value(), "ls");
    press(&mut m, KeyCode::Backspace).await;
    assert_eq!(m.history_search().query(), "z");
}

// ── Prediction ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn completion_cycle_to_the_same_text_sends_nothing() {
    let mut m = completing(vec!["ls", "lsof"]);
    type_str(&mut m, "ls").await;
    let id = m.prediction().state_id();

    press(&mut m, KeyCode::Tab).await;
    assert_eq!(m.value(), "ls");
    assert_eq!(m.prediction().state_id(), id);

    press(&mut m, KeyCode::Tab).await;
    assert_eq!(m.value(), "lsof");
    assert_eq!(m.prediction().state_id(), id + 1);
}

fn predicting() -> InputModel {
    let provider: Arc<dyn PredictionProvider> = Arc::new(GitStatus);
    let opts = PredictionOptions { debounce: Duration::from_secs(10), agent_prefix: Some('#') };
    InputModel::new(KeyMap::emacs(), PredictionState::new(Some(provider), opts))
}

#[tokio::test]
async fn prediction_results_flow_back_and_can_be_accepted() {
    let mut m = predicting();
    let mut events = m.take_prediction_events().expect("receiver");

    type_str(&mut m, "git").await;
    let result = timeout(Duration::from_secs(1), events.recv())
        .await
        .expect("instant result forwarded")
        .expect("channel open");
    assert_eq!(result.source, PredictionSource::History);
    m.update(InputEvent::Prediction(result)).await;

    assert_eq!(m.current_prediction(), "git status");
    assert_eq!(m.ghost_text(), " status");

    press(&mut m, KeyCode::Right).await;
    assert_eq!(m.value(), "git status");
    assert_eq!(m.ghost_text(), "");
}

#[tokio::test]
async fn stale_and_failed_results_are_ignored() {
    let mut m = predicting();
    type_str(&mut m, "git").await;
    let live = m.prediction().state_id();

    m.update(InputEvent::Prediction(PredictionResult {
        state_id: live - 1,
        input: "gi".into(),
        prediction: "gist".into(),
        source: PredictionSource::Llm,
        error: None,
    }))
    .await;
    assert_eq!(m.current_prediction(), "git status");

    m.update(InputEvent::Prediction(PredictionResult {
        state_id: live,
        input: "git".into(),
        prediction: String::new(),
        source: PredictionSource::Llm,
        error: Some(InputError::Prediction("timeout".into())),
    }))
    .await;
    assert_eq!(m.current_prediction(), "git status");
}

#[tokio::test]
async fn ghost_text_is_hidden_while_completing() {
    let mut m = predicting().with_completion_provider(Arc::new(Fixed(vec!["git", "gitk"])));
    type_str(&mut m, "git").await;
    assert_eq!(m.ghost_text(), " status");

    press(&mut m, KeyCode::Tab).await;
    assert_eq!(m.mode(), InputMode::Completion);
    assert_eq!(m.ghost_text(), "");
}

#[tokio::test]
async fn submit_clears_the_prediction() {
    let mut m = predicting();
    type_str(&mut m, "git").await;
    press(&mut m, KeyCode::Enter).await;
    assert_eq!(m.current_prediction(), "");
    assert!(!m.prediction().is_dirty());
}

#[tokio::test]
async fn leaving_search_with_a_motion_keeps_the_match() {
    for motion in [KeyCode::Right, KeyCode::End] {
        let mut m = predicting()
            .with_history_search(substring_search(&["git push", "git push origin main"]));
        ctrl(&mut m, 'r').await;
        type_str(&mut m, "push").await;
        assert_eq!(m.value(), "git push");

        press(&mut m, motion).await;
        assert_eq!(m.mode(), InputMode::Normal);
        assert_eq!(m.value(), "git push", "motion {motion:?}");
        assert_eq!(m.ghost_text(), " origin main");

        // Now that it is shown, the next motion takes it.
        press(&mut m, motion).await;
        assert_eq!(m.value(), "git push origin main");
    }

    let mut m = predicting()
        .with_history_search(substring_search(&["git push", "git push origin main"]));
    ctrl(&mut m, 'r').await;
    type_str(&mut m, "push").await;
    ctrl(&mut m, 'f').await;
    assert_eq!(m.value(), "git push");
    ctrl(&mut m, 'r').await;
    type_str(&mut m, "push").await;
    ctrl(&mut m, 'e').await;
    assert_eq!(m.value(), "git push");
}
