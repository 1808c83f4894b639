// SPDX-License-Identifier: MIT OR Apache-2.0

//! rgpick - Interactive ripgrep front-end library
//!
//! Search orchestration (debounce, staleness checks), the external tool
//! executor, and the persistent search history used by the rgpick CLI.

pub mod config;
pub mod controller;
pub mod errors;
pub mod executor;
pub mod history;
pub mod output;
pub mod presenter;
pub mod session;
