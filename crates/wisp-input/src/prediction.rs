// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Ghost-text prediction with two latency tiers.
//!
//! Every input change bumps a monotonically increasing state ID.  A result is
//! only ever stored if it carries the ID that is live at the moment it is
//! applied, so a slow debounced answer for an old input can never overwrite
//! a newer one.
//!
//! - **Instant tier**: awaited inline by [`PredictionState::on_input_changed`]
//!   (history lookups and other cheap sources).  A hit is stored before the
//!   call returns.
//! - **Debounced tier**: only tried when the instant tier has nothing.  A
//!   background task waits for a quiet period, asks the provider, and sends
//!   the answer on a oneshot channel.  The next input change cancels it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use wisp_config::PredictionConfig;

use crate::error::InputError;

/// Which tier is asking.  One backend may answer both differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionTrigger {
    Instant,
    Debounced,
}

/// Where a displayed prediction came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionSource {
    History,
    Llm,
}

impl From<PredictionTrigger> for PredictionSource {
    fn from(trigger: PredictionTrigger) -> Self {
        match trigger {
            PredictionTrigger::Instant => PredictionSource::History,
            PredictionTrigger::Debounced => PredictionSource::Llm,
        }
    }
}

#[async_trait]
pub trait PredictionProvider: Send + Sync {
    /// Predict the full line the user is heading towards.  An empty string
    /// means "no prediction".  Dropping the future cancels the request.
    async fn predict(&self, input: &str, trigger: PredictionTrigger) -> anyhow::Result<String>;
}

/// Outcome of one prediction request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionResult {
    /// State ID the request was made for.
    pub state_id: u64,
    pub input: String,
    pub prediction: String,
    pub source: PredictionSource,
    pub error: Option<InputError>,
}

/// Single-slot channel carrying at most one [`PredictionResult`].
pub type PredictionReceiver = oneshot::Receiver<PredictionResult>;

#[derive(Debug, Clone)]
pub struct PredictionOptions {
    pub debounce: Duration,
    /// Lines starting with this character are chat/agent input; the
    /// debounced tier is skipped for them.
    pub agent_prefix: Option<char>,
}

impl Default for PredictionOptions {
    fn default() -> Self {
        Self { debounce: Duration::from_millis(200), agent_prefix: Some('#') }
    }
}

impl From<&PredictionConfig> for PredictionOptions {
    fn from(cfg: &PredictionConfig) -> Self {
        Self {
            debounce: Duration::from_millis(cfg.debounce_ms),
            agent_prefix: Some(cfg.agent_prefix),
        }
    }
}

#[derive(Default)]
struct Inner {
    prediction: String,
    input_for_prediction: String,
    state_id: u64,
    dirty: bool,
    cancel_pending: Option<CancellationToken>,
}

struct Shared {
    inner: Mutex<Inner>,
    provider: Option<Arc<dyn PredictionProvider>>,
    options: PredictionOptions,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, state_id: u64) -> bool {
        self.lock().state_id == state_id
    }
}

/// What `on_input_changed` decided while holding the lock.
enum Plan {
    Nothing,
    NullState,
    Predict,
}

/// Prediction state for one editing session.
pub struct PredictionState {
    shared: Arc<Shared>,
}

impl PredictionState {
    pub fn new(provider: Option<Arc<dyn PredictionProvider>>, options: PredictionOptions) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner::default()),
                provider,
                options,
            }),
        }
    }

    /// A state without a provider; input changes never produce predictions.
    pub fn disabled() -> Self {
        Self::new(None, PredictionOptions::default())
    }

    pub fn debounce(&self) -> Duration {
        self.shared.options.debounce
    }

    pub fn prediction(&self) -> String {
        self.shared.lock().prediction.clone()
    }

    pub fn input_for_prediction(&self) -> String {
        self.shared.lock().input_for_prediction.clone()
    }

    pub fn state_id(&self) -> u64 {
        self.shared.lock().state_id
    }

    pub fn is_dirty(&self) -> bool {
        self.shared.lock().dirty
    }

    /// Store `prediction` if `state_id` is still the live one.
    ///
    /// This is the only way results from outside reach the state; a stale ID
    /// is rejected without touching anything.
    pub fn set_prediction(&self, state_id: u64, prediction: &str) -> bool {
        let mut inner = self.shared.lock();
        if inner.state_id != state_id {
            trace!(state_id, live = inner.state_id, "rejecting stale prediction");
            return false;
        }
        inner.prediction = prediction.to_string();
        true
    }

    /// Ghost text for `input`: the unconsumed suffix when the prediction
    /// extends `input`, otherwise the whole prediction.
    pub fn prediction_suggestion(&self, input: &str) -> String {
        let inner = self.shared.lock();
        match inner.prediction.strip_prefix(input) {
            Some(rest) => rest.to_string(),
            None => inner.prediction.clone(),
        }
    }

    /// Cancel pending work and clear everything, including the dirty flag.
    /// The state ID still advances so in-flight results are rejected.
    pub fn reset(&self) {
        let mut inner = self.shared.lock();
        if let Some(token) = inner.cancel_pending.take() {
            token.cancel();
        }
        inner.state_id += 1;
        inner.prediction.clear();
        inner.input_for_prediction.clear();
        inner.dirty = false;
    }

    /// React to a buffer change.
    ///
    /// Returns `None` when no result will follow, otherwise a receiver that
    /// yields at most one result.  Instant hits arrive on an already-filled
    /// channel; debounced results arrive later, and the sender is dropped
    /// without sending if the request is superseded.
    pub async fn on_input_changed(&self, input: &str) -> Option<PredictionReceiver> {
        let (state_id, plan) = {
            let mut inner = self.shared.lock();
            if !input.is_empty() {
                inner.dirty = true;
            }
            if let Some(token) = inner.cancel_pending.take() {
                token.cancel();
            }
            inner.state_id += 1;
            inner.input_for_prediction = input.to_string();
            let state_id = inner.state_id;

            let plan = if input.is_empty() {
                if inner.dirty {
                    inner.prediction.clear();
                    Plan::NullState
                } else {
                    Plan::Nothing
                }
            } else if !inner.prediction.is_empty() && inner.prediction.starts_with(input) {
                // Typing along an already shown suggestion.
                Plan::Nothing
            } else {
                inner.prediction.clear();
                Plan::Predict
            };
            (state_id, plan)
        };

        debug!(state_id, input, "input changed");
        match plan {
            Plan::Nothing => None,
            Plan::NullState => self.start_debounced(state_id, input),
            Plan::Predict => {
                if let Some(rx) = self.try_instant(state_id, input).await {
                    return Some(rx);
                }
                self.start_debounced(state_id, input)
            }
        }
    }

    async fn try_instant(&self, state_id: u64, input: &str) -> Option<PredictionReceiver> {
        let provider = self.shared.provider.clone()?;
        let prediction = match provider.predict(input, PredictionTrigger::Instant).await {
            Ok(p) if !p.is_empty() => p,
            Ok(_) => return None,
            Err(e) => {
                debug!(state_id, error = %e, "instant prediction failed");
                return None;
            }
        };
        if !self.set_prediction(state_id, &prediction) {
            return None;
        }

        let (tx, rx) = oneshot::channel();
        let result = PredictionResult {
            state_id,
            input: input.to_string(),
            prediction,
            source: PredictionSource::History,
            error: None,
        };
        // The receiver is still in hand, so this cannot fail.
        let _ = tx.send(result);
        Some(rx)
    }

    fn start_debounced(&self, state_id: u64, input: &str) -> Option<PredictionReceiver> {
        let provider = self.shared.provider.clone()?;
        if let Some(prefix) = self.shared.options.agent_prefix {
            if input.starts_with(prefix) {
                trace!(state_id, "agent input, skipping debounced prediction");
                return None;
            }
        }

        let token = CancellationToken::new();
        {
            let mut inner = self.shared.lock();
            if inner.state_id != state_id {
                return None;
            }
            inner.cancel_pending = Some(token.clone());
        }

        let (tx, rx) = oneshot::channel();
        let shared = Arc::clone(&self.shared);
        let input = input.to_string();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(shared.options.debounce) => {}
            }
            if !shared.is_current(state_id) {
                return;
            }

            trace!(state_id, input = %input, "requesting debounced prediction");
            let outcome = tokio::select! {
                _ = token.cancelled() => return,
                r = provider.predict(&input, PredictionTrigger::Debounced) => r,
            };
            if token.is_cancelled() || !shared.is_current(state_id) {
                return;
            }

            let result = match outcome {
                Ok(prediction) => PredictionResult {
                    state_id,
                    input,
                    prediction,
                    source: PredictionSource::Llm,
                    error: None,
                },
                Err(e) => {
                    debug!(state_id, error = %e, "debounced prediction failed");
                    PredictionResult {
                        state_id,
                        input,
                        prediction: String::new(),
                        source: PredictionSource::Llm,
                        error: Some(InputError::Prediction(format!("{e:#}"))),
                    }
                }
            };
            let _ = tx.send(result);
        });
        Some(rx)
    }
}

impl Drop for PredictionState {
    fn drop(&mut self) {
        if let Some(token) = self.shared.lock().cancel_pending.take() {
            token.cancel();
        }
    }
}
