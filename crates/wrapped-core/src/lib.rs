//! Core types and pure computations for claude-wrapped.
//!
//! Holds the data model shared by every crate, the error type, CLI settings,
//! local-time helpers, the goal classifier, the streak and highlight
//! calculators and the archetype scorer. Nothing in here touches the
//! filesystem except [`settings`].

pub mod archetypes;
pub mod calculations;
pub mod data_processors;
pub mod error;
pub mod goals;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{Result, WrappedError};
