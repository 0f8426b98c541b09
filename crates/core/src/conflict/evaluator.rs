//! Conflict evaluator. Pure logic, no state.
//!
//! Every code's effective rules are its declared `conflicts` plus whatever
//! the rule catalog generates for its category. Rules are checked from both
//! sides of every pair, so a rule only needs to be declared once.

use std::collections::BTreeSet;

use crate::recommendation::{find_recommendation, CodeRecommendation, MbsCategory};
use crate::types::MbsCode;

use super::catalog::{
    code_label, generate_conflict_rules, is_consultation_level, CONSULTATION_LEVEL_MESSAGE,
};
use super::rules::{
    dedup_conflicts, dedup_strings, ConflictReason, ConflictRule, ConflictSeverity,
    ConflictValidationResult,
};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Combined service time at which documentation is flagged.
pub const TIME_DOCUMENTATION_THRESHOLD_MINUTES: u32 = 60;

pub const CODE_NOT_FOUND_WARNING: &str = "Code not found in recommendations";

pub const CONSULTATION_LEVEL_SUGGESTION: &str = CONSULTATION_LEVEL_MESSAGE;

const SPECIALTY_SERVICE_MESSAGE: &str =
    "Mental health services require a dedicated consultation and cannot be billed with a \
     general attendance item";

// ---------------------------------------------------------------------------
// Rule resolution
// ---------------------------------------------------------------------------

/// Declared rules followed by catalog rules for the code's category.
///
/// A recommendation without a category only contributes its declared rules.
pub fn effective_rules(rec: &CodeRecommendation) -> Vec<ConflictRule> {
    let mut rules = rec.conflicts.clone();
    if let Some(category) = rec.category {
        rules.extend(generate_conflict_rules(
            &rec.code,
            category,
            rec.time_minutes(),
        ));
    }
    rules
}

/// Rules relating `a` and `b`, taken from both sides and deduplicated.
pub fn rules_between(a: &CodeRecommendation, b: &CodeRecommendation) -> Vec<ConflictRule> {
    let mut found: Vec<ConflictRule> = effective_rules(a)
        .into_iter()
        .filter(|r| r.involves(&b.code))
        .collect();
    found.extend(effective_rules(b).into_iter().filter(|r| r.involves(&a.code)));
    dedup_conflicts(found)
}

// ---------------------------------------------------------------------------
// Selection scan
// ---------------------------------------------------------------------------

/// Raw findings of checking one candidate against a selection.
#[derive(Debug, Default)]
struct SelectionScan {
    conflicts: Vec<ConflictRule>,
    warnings: Vec<String>,
    blockers: BTreeSet<MbsCode>,
    consultation_blockers: BTreeSet<MbsCode>,
    unresolved: bool,
}

impl SelectionScan {
    fn record(&mut self, other: &str, rule: ConflictRule) {
        match rule.severity {
            ConflictSeverity::Blocking => {
                self.blockers.insert(other.to_string());
                if rule.reason.is_consultation_level() {
                    self.consultation_blockers.insert(other.to_string());
                }
                self.conflicts.push(rule);
            }
            ConflictSeverity::Warning => self.warnings.push(rule.message),
        }
    }

    /// Whether a blocking conflict with `reason` already relates both codes.
    fn covers(&self, reason: ConflictReason, a: &str, b: &str) -> bool {
        self.conflicts
            .iter()
            .any(|r| r.reason == reason && r.involves(a) && r.involves(b))
    }

    fn can_select(&self) -> bool {
        self.conflicts.is_empty() && !self.unresolved
    }

    fn finish(mut self, candidate: &str) -> (ConflictValidationResult, BTreeSet<MbsCode>) {
        self.conflicts = dedup_conflicts(self.conflicts);
        let can_select = self.can_select();

        let mut suggestions = Vec::new();
        if !self.blockers.is_empty() {
            suggestions.push(deselect_suggestion(&self.blockers, candidate));
        }
        if !self.consultation_blockers.is_empty() {
            suggestions.push(CONSULTATION_LEVEL_SUGGESTION.to_string());
        }

        let result = ConflictValidationResult {
            can_select,
            conflicts: self.conflicts,
            warnings: dedup_strings(self.warnings),
            suggestions,
            compatible_codes: Vec::new(),
        };
        (result, self.consultation_blockers)
    }
}

fn scan_selection(
    selected_codes: &BTreeSet<MbsCode>,
    candidate: &CodeRecommendation,
    recommendations: &[CodeRecommendation],
) -> SelectionScan {
    let mut scan = SelectionScan::default();

    for code in selected_codes {
        if *code == candidate.code {
            continue;
        }
        let Some(other) = find_recommendation(recommendations, code) else {
            scan.unresolved = true;
            scan.warnings.push(unresolved_warning(code));
            continue;
        };
        for rule in rules_between(candidate, other) {
            scan.record(code, rule);
        }
    }

    scan
}

/// Warning raised once combined service time reaches
/// [`TIME_DOCUMENTATION_THRESHOLD_MINUTES`].
pub fn time_documentation_warning(total_minutes: u32) -> Option<String> {
    (total_minutes >= TIME_DOCUMENTATION_THRESHOLD_MINUTES).then(|| {
        format!(
            "Combined service time of {total_minutes} minutes may require additional documentation"
        )
    })
}

/// Warning for a selected code that is missing from the catalog.
pub fn unresolved_warning(code: &str) -> String {
    format!("Selected code {code} not found in recommendations")
}

fn deselect_suggestion(blockers: &BTreeSet<MbsCode>, candidate: &str) -> String {
    let codes: Vec<&str> = blockers.iter().map(String::as_str).collect();
    let noun = if codes.len() == 1 { "code" } else { "codes" };
    format!(
        "Deselect {noun} {} and select {candidate} instead",
        codes.join(", ")
    )
}

// ---------------------------------------------------------------------------
// Public evaluators
// ---------------------------------------------------------------------------

/// Decide whether `candidate_code` can join `selected_codes`.
///
/// Blocking rules become conflicts, warning rules become warning messages.
/// Warnings are reported whether or not the candidate is selectable.
pub fn detect_conflicts(
    selected_codes: &BTreeSet<MbsCode>,
    candidate_code: &str,
    recommendations: &[CodeRecommendation],
) -> ConflictValidationResult {
    let Some(candidate) = find_recommendation(recommendations, candidate_code) else {
        return ConflictValidationResult::rejected(CODE_NOT_FOUND_WARNING);
    };

    let (result, _) =
        scan_selection(selected_codes, candidate, recommendations).finish(candidate_code);
    result
}

/// [`detect_conflicts`] plus synthesized consultation-level and
/// specialty-service conflicts, a combined-time warning, upgrade suggestions
/// and the list of codes still compatible with the resulting selection.
pub fn validate_complex_conflicts(
    selected_codes: &BTreeSet<MbsCode>,
    candidate_code: &str,
    recommendations: &[CodeRecommendation],
) -> ConflictValidationResult {
    let Some(candidate) = find_recommendation(recommendations, candidate_code) else {
        return ConflictValidationResult::rejected(CODE_NOT_FOUND_WARNING);
    };

    let mut scan = scan_selection(selected_codes, candidate, recommendations);
    let others = resolved_others(selected_codes, candidate_code, recommendations);

    for other in &others {
        if is_consultation_level(&candidate.code) && is_consultation_level(&other.code) {
            if !scan.covers(ConflictReason::CategoryExclusive, &candidate.code, &other.code) {
                let rule = pair_rule(
                    candidate,
                    other,
                    ConflictReason::CategoryExclusive,
                    CONSULTATION_LEVEL_MESSAGE,
                );
                scan.record(&other.code, rule);
            }
            scan.consultation_blockers.insert(other.code.clone());
        }

        if is_specialty_pair(candidate.category, other.category)
            && !scan.covers(ConflictReason::SpecialtyService, &candidate.code, &other.code)
        {
            let rule = pair_rule(
                candidate,
                other,
                ConflictReason::SpecialtyService,
                SPECIALTY_SERVICE_MESSAGE,
            );
            scan.record(&other.code, rule);
        }
    }

    let total_minutes: u32 = others
        .iter()
        .map(|r| r.time_minutes())
        .chain(std::iter::once(candidate.time_minutes()))
        .fold(0u32, u32::saturating_add);
    scan.warnings.extend(time_documentation_warning(total_minutes));

    let (mut result, consultation_blockers) = scan.finish(candidate_code);

    if result.can_select {
        result.compatible_codes =
            compatible_codes(selected_codes, candidate, &others, recommendations);
    } else {
        for other in others
            .iter()
            .filter(|o| consultation_blockers.contains(&o.code))
        {
            if candidate.schedule_fee > other.schedule_fee {
                result.suggestions.push(format!(
                    "Upgrade to {} and remove {}",
                    code_label(&candidate.code),
                    code_label(&other.code)
                ));
            }
        }
    }

    result
}

/// Selected recommendations other than the candidate, skipping unknown codes.
fn resolved_others<'a>(
    selected_codes: &BTreeSet<MbsCode>,
    candidate_code: &str,
    recommendations: &'a [CodeRecommendation],
) -> Vec<&'a CodeRecommendation> {
    selected_codes
        .iter()
        .filter(|c| c.as_str() != candidate_code)
        .filter_map(|c| find_recommendation(recommendations, c))
        .collect()
}

fn pair_rule(
    candidate: &CodeRecommendation,
    other: &CodeRecommendation,
    reason: ConflictReason,
    message: &str,
) -> ConflictRule {
    ConflictRule::new(
        vec![candidate.code.clone(), other.code.clone()],
        reason,
        ConflictSeverity::Blocking,
        message,
    )
}

fn is_specialty_pair(a: Option<MbsCategory>, b: Option<MbsCategory>) -> bool {
    matches!(
        (a, b),
        (
            Some(MbsCategory::MentalHealthServices),
            Some(MbsCategory::ProfessionalAttendances)
        ) | (
            Some(MbsCategory::ProfessionalAttendances),
            Some(MbsCategory::MentalHealthServices)
        )
    )
}

/// The candidate, then every unselected recommendation listed in the
/// `compatible_with` of each member of the resulting selection. Only the
/// members' lists are consulted, not the other code's own list.
fn compatible_codes(
    selected_codes: &BTreeSet<MbsCode>,
    candidate: &CodeRecommendation,
    others: &[&CodeRecommendation],
    recommendations: &[CodeRecommendation],
) -> Vec<MbsCode> {
    let mut members: Vec<&CodeRecommendation> = others.to_vec();
    members.push(candidate);

    let mut codes = vec![candidate.code.clone()];
    codes.extend(
        recommendations
            .iter()
            .filter(|r| r.code != candidate.code && !selected_codes.contains(&r.code))
            .filter(|r| members.iter().all(|m| m.is_compatible_with(&r.code)))
            .map(|r| r.code.clone()),
    );
    codes
}
