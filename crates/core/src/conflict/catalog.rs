//! Rule catalog: conflict rules implied by a code's category alone.
//!
//! Rules are generated from a per-category template table so that the
//! evaluator can re-derive them on every call without caching.

use crate::recommendation::MbsCategory;
use crate::types::MbsCode;

use super::rules::{ConflictReason, ConflictRule, ConflictSeverity};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Level B general practice attendance.
pub const CONSULTATION_LEVEL_B: &str = "23";
/// Level C general practice attendance.
pub const CONSULTATION_LEVEL_C: &str = "36";
/// Level D general practice attendance.
pub const CONSULTATION_LEVEL_D: &str = "44";

/// Message for the category-exclusive consultation rule.
pub const CONSULTATION_LEVEL_MESSAGE: &str =
    "Only one consultation level can be billed per attendance";

/// The mutually exclusive consultation-level items, lowest level first.
pub const CONSULTATION_LEVEL_CODES: &[&str] = &[
    CONSULTATION_LEVEL_B,
    CONSULTATION_LEVEL_C,
    CONSULTATION_LEVEL_D,
];

// ---------------------------------------------------------------------------
// Template table
// ---------------------------------------------------------------------------

/// Shape of a rule a category generates. Every template is raised against
/// the canonical consultation-level codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleTemplate {
    pub reason: ConflictReason,
    pub severity: ConflictSeverity,
}

const ATTENDANCE_TEMPLATES: &[RuleTemplate] = &[
    RuleTemplate {
        reason: ConflictReason::TimeOverlap,
        severity: ConflictSeverity::Blocking,
    },
    RuleTemplate {
        reason: ConflictReason::CategoryExclusive,
        severity: ConflictSeverity::Blocking,
    },
];

const MENTAL_HEALTH_TEMPLATES: &[RuleTemplate] = &[RuleTemplate {
    reason: ConflictReason::SpecialtyService,
    severity: ConflictSeverity::Blocking,
}];

// Procedures are meant to combine with consultations, so warning only.
const PROCEDURE_TEMPLATES: &[RuleTemplate] = &[RuleTemplate {
    reason: ConflictReason::TimeManagement,
    severity: ConflictSeverity::Warning,
}];

/// Rule templates attached to a category.
pub fn rule_templates(category: MbsCategory) -> &'static [RuleTemplate] {
    match category {
        MbsCategory::ProfessionalAttendances => ATTENDANCE_TEMPLATES,
        MbsCategory::MentalHealthServices => MENTAL_HEALTH_TEMPLATES,
        MbsCategory::TherapeuticProcedures => PROCEDURE_TEMPLATES,
        MbsCategory::DiagnosticProcedures
        | MbsCategory::DiagnosticImaging
        | MbsCategory::PathologyServices
        | MbsCategory::Other => &[],
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Generate the rules that apply to `code` in isolation.
///
/// Deterministic: the same inputs always yield the same rules in the same
/// order.
pub fn generate_conflict_rules(
    code: &str,
    category: MbsCategory,
    time_requirement: u32,
) -> Vec<ConflictRule> {
    let counterparts: Vec<&str> = CONSULTATION_LEVEL_CODES
        .iter()
        .copied()
        .filter(|c| *c != code)
        .collect();

    rule_templates(category)
        .iter()
        .map(|template| {
            let mut codes: Vec<MbsCode> = Vec::with_capacity(counterparts.len() + 1);
            codes.push(code.to_string());
            codes.extend(counterparts.iter().map(|c| c.to_string()));

            ConflictRule::new(
                codes,
                template.reason,
                template.severity,
                rule_message(template.reason, code, &counterparts, time_requirement),
            )
            .with_category(category)
        })
        .collect()
}

fn rule_message(
    reason: ConflictReason,
    code: &str,
    counterparts: &[&str],
    time_requirement: u32,
) -> String {
    match reason {
        ConflictReason::TimeOverlap => format!(
            "Consultation item {code} overlaps in time with items {}",
            counterparts.join(", ")
        ),
        ConflictReason::CategoryExclusive => CONSULTATION_LEVEL_MESSAGE.to_string(),
        ConflictReason::SpecialtyService => format!(
            "Mental health item {code} requires a dedicated consultation and cannot be billed \
             with a general consultation"
        ),
        ConflictReason::TimeManagement => format!(
            "Procedure {code} ({time_requirement} min) must be documented separately from \
             consultation time"
        ),
        other => format!("Item {code} has a {} rule", other.as_str()),
    }
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// Whether `code` is one of the canonical consultation levels.
pub fn is_consultation_level(code: &str) -> bool {
    CONSULTATION_LEVEL_CODES.contains(&code)
}

/// Display label used in suggestions.
pub fn code_label(code: &str) -> String {
    match code {
        CONSULTATION_LEVEL_B => "Level B consultation (item 23)".to_string(),
        CONSULTATION_LEVEL_C => "Level C consultation (item 36)".to_string(),
        CONSULTATION_LEVEL_D => "Level D consultation (item 44)".to_string(),
        _ => format!("code {code}"),
    }
}
