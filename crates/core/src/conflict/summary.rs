//! Whole-selection rollups.
//!
//! Both functions check every unordered pair of selected codes, so they are
//! quadratic in selection size. Selections are capped by
//! [`crate::config::SelectionConfig::max_codes`], which keeps this cheap.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::recommendation::{find_recommendation, round_to_cents, CodeRecommendation};
use crate::selection::state::SelectionState;
use crate::types::MbsCode;

use super::evaluator::{detect_conflicts, rules_between, unresolved_warning};
use super::rules::{dedup_conflicts, dedup_strings, ConflictRule, ConflictSeverity};

/// Read-only rollup of a selection. Always recomputed, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionSummary {
    pub selected_count: usize,
    pub total_fee: f64,
    /// Distinct rules of any severity active between selected codes.
    pub conflict_count: usize,
    pub has_blocking_conflicts: bool,
    pub warnings: Vec<String>,
}

/// Consistency verdict for an entire selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionValidation {
    pub is_valid: bool,
    /// Blocking conflicts only.
    pub conflicts: Vec<ConflictRule>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Sum of schedule fees for the codes found in the catalog, rounded to cents.
pub fn total_fee(
    selected_codes: &BTreeSet<MbsCode>,
    recommendations: &[CodeRecommendation],
) -> f64 {
    let sum: f64 = selected_codes
        .iter()
        .filter_map(|c| find_recommendation(recommendations, c))
        .map(|r| r.schedule_fee)
        .sum();
    round_to_cents(sum)
}

/// Every unordered pair of selected codes, in code order.
fn pairs(selected_codes: &BTreeSet<MbsCode>) -> Vec<(&str, &str)> {
    let codes: Vec<&str> = selected_codes.iter().map(String::as_str).collect();
    let mut out = Vec::new();
    for (i, a) in codes.iter().enumerate() {
        for b in &codes[i + 1..] {
            out.push((*a, *b));
        }
    }
    out
}

fn unresolved_warnings(
    selected_codes: &BTreeSet<MbsCode>,
    recommendations: &[CodeRecommendation],
) -> Vec<String> {
    selected_codes
        .iter()
        .filter(|c| find_recommendation(recommendations, c).is_none())
        .map(|c| unresolved_warning(c))
        .collect()
}

/// Fee total, conflict count and warnings for a selection.
pub fn calculate_selection_summary(
    selected_codes: &BTreeSet<MbsCode>,
    recommendations: &[CodeRecommendation],
) -> SelectionSummary {
    let mut rules = Vec::new();
    for (a, b) in pairs(selected_codes) {
        let (Some(ra), Some(rb)) = (
            find_recommendation(recommendations, a),
            find_recommendation(recommendations, b),
        ) else {
            continue;
        };
        rules.extend(rules_between(ra, rb));
    }
    let rules = dedup_conflicts(rules);

    let mut warnings = unresolved_warnings(selected_codes, recommendations);
    warnings.extend(
        rules
            .iter()
            .filter(|r| r.severity == ConflictSeverity::Warning)
            .map(|r| r.message.clone()),
    );

    SelectionSummary {
        selected_count: selected_codes.len(),
        total_fee: total_fee(selected_codes, recommendations),
        conflict_count: rules.len(),
        has_blocking_conflicts: rules.iter().any(ConflictRule::is_blocking),
        warnings: dedup_strings(warnings),
    }
}

/// Check that no pair of selected codes is in blocking conflict.
pub fn validate_code_selection(
    selection: &SelectionState,
    recommendations: &[CodeRecommendation],
) -> SelectionValidation {
    let selected_codes = &selection.selected_codes;
    let mut conflicts = Vec::new();
    let mut warnings = unresolved_warnings(selected_codes, recommendations);
    let mut suggestions = Vec::new();

    for (a, b) in pairs(selected_codes) {
        if find_recommendation(recommendations, a).is_none()
            || find_recommendation(recommendations, b).is_none()
        {
            continue;
        }
        let single: BTreeSet<MbsCode> = BTreeSet::from([a.to_string()]);
        let result = detect_conflicts(&single, b, recommendations);
        conflicts.extend(result.conflicts);
        warnings.extend(result.warnings);
        suggestions.extend(result.suggestions);
    }

    let conflicts = dedup_conflicts(conflicts);

    SelectionValidation {
        is_valid: conflicts.is_empty(),
        conflicts,
        warnings: dedup_strings(warnings),
        suggestions: dedup_strings(suggestions),
    }
}
