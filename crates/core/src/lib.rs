//! MBS code selection and conflict-detection engine.
//!
//! Pure, synchronous rules for deciding whether a billing code can join an
//! existing selection, plus a small stateful [`selection::SelectionManager`]
//! that owns one consultation's selection and re-derives it wholesale on
//! every change.

pub mod config;
pub mod conflict;
pub mod error;
pub mod recommendation;
pub mod selection;
pub mod types;

pub use error::CoreError;
