// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Layered TOML configuration for the wisp prompt.
mod loader;
mod schema;

pub use loader::{config_search_paths, load};
pub use schema::*;
