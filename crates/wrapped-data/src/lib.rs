//! Data ingestion layer for claude-wrapped.
//!
//! Responsible for discovering and tolerantly reading the history,
//! transcript and facet files under the Claude configuration directory,
//! reducing them to aggregates and running the top-level pipeline that
//! produces the [`Summary`](wrapped_core::models::Summary).

pub mod analysis;
pub mod facets;
pub mod history;
pub mod reader;
pub mod transcripts;

pub use wrapped_core as core;
