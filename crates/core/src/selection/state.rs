//! Selection snapshot derived from a set of selected codes.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::conflict::evaluator::{rules_between, time_documentation_warning, unresolved_warning};
use crate::conflict::rules::{dedup_conflicts, dedup_strings, ConflictRule, ConflictSeverity};
use crate::conflict::summary::total_fee;
use crate::recommendation::{find_recommendation, CodeRecommendation};
use crate::types::MbsCode;

/// Immutable snapshot of one consultation's selection.
///
/// Every field other than `selected_codes` is derived; build snapshots with
/// [`SelectionState::derive`] so `total_fee` and `conflicts` never drift.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    pub selected_codes: BTreeSet<MbsCode>,
    /// Rules of any severity currently relating each code to another
    /// selected code. Codes with nothing active are absent.
    pub conflicts: BTreeMap<MbsCode, Vec<ConflictRule>>,
    pub total_fee: f64,
    pub warnings: Vec<String>,
}

impl SelectionState {
    /// The state of a freshly loaded consultation.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Recompute every derived field from the selected codes.
    pub fn derive(
        selected_codes: BTreeSet<MbsCode>,
        recommendations: &[CodeRecommendation],
    ) -> Self {
        let mut conflicts = BTreeMap::new();
        let mut warnings = Vec::new();
        let mut total_minutes = 0u32;

        for code in &selected_codes {
            let Some(rec) = find_recommendation(recommendations, code) else {
                warnings.push(unresolved_warning(code));
                continue;
            };
            total_minutes = total_minutes.saturating_add(rec.time_minutes());

            let active: Vec<ConflictRule> = selected_codes
                .iter()
                .filter(|other| *other != code)
                .filter_map(|other| find_recommendation(recommendations, other))
                .flat_map(|other| rules_between(rec, other))
                .collect();
            let active = dedup_conflicts(active);

            warnings.extend(
                active
                    .iter()
                    .filter(|r| r.severity == ConflictSeverity::Warning)
                    .map(|r| r.message.clone()),
            );
            if !active.is_empty() {
                conflicts.insert(code.clone(), active);
            }
        }

        warnings.extend(time_documentation_warning(total_minutes));

        Self {
            total_fee: total_fee(&selected_codes, recommendations),
            selected_codes,
            conflicts,
            warnings: dedup_strings(warnings),
        }
    }

    pub fn contains(&self, code: &str) -> bool {
        self.selected_codes.contains(code)
    }

    pub fn len(&self) -> usize {
        self.selected_codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected_codes.is_empty()
    }

    /// Whether any active rule is blocking.
    pub fn has_blocking_conflicts(&self) -> bool {
        self.conflicts
            .values()
            .flatten()
            .any(ConflictRule::is_blocking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendation::MbsCategory;

    fn rec(code: &str, fee: f64, category: Option<MbsCategory>, minutes: u32) -> CodeRecommendation {
        CodeRecommendation {
            code: code.to_string(),
            description: format!("Item {code}"),
            confidence: 0.9,
            schedule_fee: fee,
            category,
            conflicts: Vec::new(),
            compatible_with: Vec::new(),
            time_requirement: Some(minutes),
        }
    }

    fn selected(codes: &[&str]) -> BTreeSet<MbsCode> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn empty_state_is_consistent() {
        let state = SelectionState::empty();
        assert!(state.is_empty());
        assert_eq!(state.total_fee, 0.0);
        assert!(state.conflicts.is_empty());
        assert!(!state.has_blocking_conflicts());
    }

    #[test]
    fn derive_sums_fees() {
        let recs = vec![
            rec("23", 41.20, None, 0),
            rec("36", 75.05, None, 0),
            rec("11700", 19.80, None, 0),
        ];
        let state = SelectionState::derive(selected(&["23", "36", "11700"]), &recs);
        assert_eq!(state.total_fee, 136.05);
        assert_eq!(state.len(), 3);
    }

    #[test]
    fn derive_annotates_both_sides_of_a_warning() {
        let recs = vec![
            rec("23", 41.20, Some(MbsCategory::ProfessionalAttendances), 10),
            rec("177", 62.15, Some(MbsCategory::TherapeuticProcedures), 20),
        ];
        let state = SelectionState::derive(selected(&["23", "177"]), &recs);
        assert_eq!(state.conflicts["23"].len(), 1);
        assert_eq!(state.conflicts["177"].len(), 1);
        assert_eq!(state.warnings.len(), 1);
        assert!(!state.has_blocking_conflicts());
    }

    #[test]
    fn derive_adds_time_documentation_warning() {
        let recs = vec![rec("A", 10.0, None, 45), rec("B", 10.0, None, 15)];
        let state = SelectionState::derive(selected(&["A", "B"]), &recs);
        assert!(state.conflicts.is_empty());
        assert_eq!(state.warnings.len(), 1);
        assert!(state.warnings[0].contains("documentation"));
    }

    #[test]
    fn derive_saturates_huge_time_requirements() {
        let recs = vec![
            rec("A", 10.0, None, 3_000_000_000),
            rec("B", 10.0, None, 3_000_000_000),
        ];
        let state = SelectionState::derive(selected(&["A", "B"]), &recs);
        assert_eq!(state.warnings.len(), 1);
        assert!(state.warnings[0].contains("documentation"));
    }

    #[test]
    fn derive_flags_unknown_codes() {
        let state = SelectionState::derive(selected(&["ghost"]), &[]);
        assert_eq!(state.total_fee, 0.0);
        assert_eq!(state.warnings, vec![unresolved_warning("ghost")]);
    }

    #[test]
    fn derive_is_deterministic() {
        let recs = vec![
            rec("23", 41.20, Some(MbsCategory::ProfessionalAttendances), 0),
            rec("36", 75.05, Some(MbsCategory::ProfessionalAttendances), 0),
        ];
        let a = SelectionState::derive(selected(&["23", "36"]), &recs);
        let b = SelectionState::derive(selected(&["36", "23"]), &recs);
        assert_eq!(a, b);
        assert!(a.has_blocking_conflicts());
    }
}
