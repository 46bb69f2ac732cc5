//! Prompt Dash - Prompt Catalog Dashboard and Aggregation Service
//!
//! Prompt Dash turns a flat feed of versioned prompt records (agent prompts
//! captured during LLM runs, each tagged with a project version and a numeric
//! agent revision) into the grouped, filtered, stat-annotated views a
//! dashboard needs. The catalog is fetched from an HTTP endpoint, validated,
//! and held as an immutable in-memory snapshot; every view is re-derived from
//! that snapshot on demand.
//!
//! # Core Features
//!
//! - **Catalog Aggregation**: partition prompt records into project groups
//!   under three selectable projections (function+version, project version,
//!   capture run)
//! - **Semantic Version Ordering**: total order over dotted version strings
//!   and numeric agent revisions, newest first
//! - **Search and Scoped Filtering**: case-insensitive substring search over
//!   prompt bodies, names, and descriptions, with an optional function-name
//!   scope
//! - **Consistent Statistics**: record/group/match counts computed atomically
//!   from a single snapshot
//! - **View Server**: a small HTTP API re-exposing the aggregated catalog for
//!   browser dashboards
//!
//! # Architecture Overview
//!
//! The crate separates the pure aggregation engine from its I/O boundaries:
//!
//! - **Engine** ([`app::prompt_explorer`]): record store, version comparator,
//!   grouping index, and query filter - no I/O, fully unit-testable
//! - **Fetch Boundary** ([`app::prompt_explorer::fetch`]): HTTP catalog
//!   client and the last-write-wins fetch coordinator
//! - **View Server** ([`app::server`]): axum endpoints consuming engine
//!   output
//!
//! The snapshot is replaced wholesale on each successful fetch; a failed or
//! stale fetch never disturbs the last-known-good catalog.

#![warn(clippy::all, rust_2018_idioms)]

// Include logging macros first
#[macro_use]
pub mod logging_macros;

pub mod app;
pub use app::prompt_explorer::PromptExplorer;
