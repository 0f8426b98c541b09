//! Stateful selection management for a single consultation.

pub mod history;
pub mod manager;
pub mod state;

pub use manager::SelectionManager;
pub use state::SelectionState;
