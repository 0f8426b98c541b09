//! Per-consultation owner of the selection state.
//!
//! One [`SelectionManager`] exists per open consultation; instances share
//! nothing. Every mutating operation builds a fresh [`SelectionState`] with
//! [`SelectionState::derive`] and swaps it in whole, so callers never see a
//! partially updated state.

use std::collections::BTreeSet;

use crate::config::SelectionConfig;
use crate::conflict::evaluator::validate_complex_conflicts;
use crate::conflict::rules::ConflictValidationResult;
use crate::conflict::summary::{
    calculate_selection_summary, validate_code_selection, SelectionSummary, SelectionValidation,
};
use crate::recommendation::{validate_catalog, CodeRecommendation};
use crate::types::MbsCode;

use super::history::SelectionHistory;
use super::state::SelectionState;

/// Callback invoked with the new state after every change.
pub type SelectionListener = Box<dyn Fn(&SelectionState) + Send + Sync>;

pub struct SelectionManager {
    config: SelectionConfig,
    recommendations: Vec<CodeRecommendation>,
    state: SelectionState,
    history: SelectionHistory,
    listeners: Vec<SelectionListener>,
}

impl SelectionManager {
    /// A manager with no recommendations loaded.
    pub fn new(config: SelectionConfig) -> Self {
        Self {
            config,
            recommendations: Vec::new(),
            state: SelectionState::empty(),
            history: SelectionHistory::new(),
            listeners: Vec::new(),
        }
    }

    pub fn with_recommendations(
        config: SelectionConfig,
        recommendations: Vec<CodeRecommendation>,
    ) -> Self {
        let mut manager = Self::new(config);
        manager.load_recommendations(recommendations);
        manager
    }

    // -- Accessors -----------------------------------------------------------

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    pub fn recommendations(&self) -> &[CodeRecommendation] {
        &self.recommendations
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Register a change listener.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&SelectionState) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    // -- Loading -------------------------------------------------------------

    /// Replace the recommendation set for a newly analysed consultation.
    ///
    /// The selection and its history are discarded. Invalid recommendation
    /// data is logged and kept; the engine degrades per code.
    pub fn load_recommendations(&mut self, recommendations: Vec<CodeRecommendation>) {
        if let Err(e) = validate_catalog(&recommendations) {
            tracing::warn!(error = %e, "Recommendation catalog failed validation");
        }
        tracing::info!(
            recommendations = recommendations.len(),
            "Loaded recommendations, selection reset"
        );

        self.recommendations = recommendations;
        self.history.clear();
        self.commit(BTreeSet::new());
    }

    // -- Queries -------------------------------------------------------------

    /// Evaluate `code` against the current selection without changing it.
    pub fn check_code(&self, code: &str) -> ConflictValidationResult {
        if let Some(rejection) = self.capacity_rejection(code) {
            return rejection;
        }
        validate_complex_conflicts(&self.state.selected_codes, code, &self.recommendations)
    }

    pub fn summary(&self) -> SelectionSummary {
        calculate_selection_summary(&self.state.selected_codes, &self.recommendations)
    }

    pub fn validate(&self) -> SelectionValidation {
        validate_code_selection(&self.state, &self.recommendations)
    }

    // -- Mutations -----------------------------------------------------------

    /// Add `code` if the selection has room and no blocking conflict results.
    ///
    /// Gated by [`validate_complex_conflicts`], which also reports the
    /// synthesized consultation and specialty conflicts, not only the plain
    /// pairwise scan.
    ///
    /// The validation result is returned whether or not the selection
    /// changed. Selecting an already-selected code changes nothing.
    pub fn select_code(&mut self, code: &str) -> ConflictValidationResult {
        if self.state.contains(code) {
            let mut result = ConflictValidationResult::allowed();
            result.warnings.push(format!("Code {code} is already selected"));
            return result;
        }

        let result = self.check_code(code);
        if !result.can_select {
            tracing::debug!(
                code = %code,
                conflicts = result.conflicts.len(),
                "Selection rejected"
            );
            return result;
        }

        let mut next = self.state.selected_codes.clone();
        next.insert(code.to_string());
        self.record_and_commit(next);
        tracing::debug!(code = %code, selected = self.state.len(), "Code selected");

        result
    }

    /// Remove `code`. Returns `false` if it was not selected.
    pub fn deselect_code(&mut self, code: &str) -> bool {
        if !self.state.contains(code) {
            return false;
        }

        let mut next = self.state.selected_codes.clone();
        next.remove(code);
        self.record_and_commit(next);
        tracing::debug!(code = %code, selected = self.state.len(), "Code deselected");
        true
    }

    /// Deselect `code` if selected, otherwise try to select it.
    pub fn toggle_code_selection(&mut self, code: &str) -> ConflictValidationResult {
        if self.deselect_code(code) {
            ConflictValidationResult::allowed()
        } else {
            self.select_code(code)
        }
    }

    pub fn clear_selection(&mut self) {
        if self.state.is_empty() {
            return;
        }
        self.record_and_commit(BTreeSet::new());
        tracing::debug!("Selection cleared");
    }

    /// Restore the previous selection. Returns `false` if there is none.
    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.state.selected_codes) {
            Some(previous) => {
                self.commit(previous);
                true
            }
            None => false,
        }
    }

    /// Re-apply the last undone change. Returns `false` if there is none.
    pub fn redo(&mut self) -> bool {
        match self.history.redo(&self.state.selected_codes) {
            Some(next) => {
                self.commit(next);
                true
            }
            None => false,
        }
    }

    // -- Internals -----------------------------------------------------------

    fn capacity_rejection(&self, code: &str) -> Option<ConflictValidationResult> {
        if self.state.len() < self.config.max_codes {
            return None;
        }
        let mut result = ConflictValidationResult::rejected(format!(
            "Maximum of {} codes can be selected",
            self.config.max_codes
        ));
        result.suggestions.push(format!(
            "Deselect a code to free up capacity before selecting {code}"
        ));
        Some(result)
    }

    fn record_and_commit(&mut self, next: BTreeSet<MbsCode>) {
        self.history.record(self.state.selected_codes.clone());
        self.commit(next);
    }

    /// Derive and publish a new state. Listeners run only when the selection
    /// or its derived fields actually changed.
    fn commit(&mut self, selected_codes: BTreeSet<MbsCode>) {
        let next = SelectionState::derive(selected_codes, &self.recommendations);
        if next == self.state {
            return;
        }
        self.state = next;
        for listener in &self.listeners {
            listener(&self.state);
        }
    }
}
