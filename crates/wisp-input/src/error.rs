// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("invalid key specification '{spec}': {reason}")]
    InvalidKey { spec: String, reason: String },

    #[error("prediction failed: {0}")]
    Prediction(String),

    #[error("completion failed: {0}")]
    Completion(String),
}

impl InputError {
    pub(crate) fn invalid_key(spec: &str, reason: impl Into<String>) -> Self {
        InputError::InvalidKey { spec: spec.to_string(), reason: reason.into() }
    }
}
