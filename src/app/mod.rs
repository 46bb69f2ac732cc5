//! Core application modules for Prompt Dash.
//!
//! This module contains the business logic and data models for prompt
//! catalog aggregation and the HTTP surfaces around it.
//!
//! # Module Organization
//!
//! - [`prompt_explorer`] - catalog engine: record store, version ordering,
//!   grouping projections, query filtering, and the fetch boundary
//! - [`export`] - aggregated catalog export in the archival JSON envelope
//! - [`server`] - view server re-exposing aggregated catalog views over HTTP
//!
//! # Architecture
//!
//! The layering is deliberately one-directional:
//! - [`prompt_explorer`] holds the snapshot and derives every view from it
//! - [`server`] and [`export`] only consume engine output; they never reach
//!   into records directly

pub mod export;
pub mod prompt_explorer;
pub mod server;

pub use prompt_explorer::PromptExplorer;
