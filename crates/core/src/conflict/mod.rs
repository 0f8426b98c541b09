//! Conflict detection engine.
//!
//! Rule types, the per-category rule catalog, the pairwise evaluator and
//! whole-selection summaries. Nothing here holds state.

pub mod catalog;
pub mod evaluator;
pub mod rules;
pub mod summary;
