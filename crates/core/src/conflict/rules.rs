//! Conflict rule and validation result types.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::recommendation::MbsCategory;
use crate::types::MbsCode;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Why two or more codes cannot (or should not) be billed together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConflictReason {
    #[serde(rename = "time_overlap_consultation_levels")]
    TimeOverlap,
    #[serde(rename = "category_exclusive_consultation")]
    CategoryExclusive,
    #[serde(rename = "specialty_service_conflict")]
    SpecialtyService,
    #[serde(rename = "time_management_warning")]
    TimeManagement,
    #[serde(rename = "age_restriction")]
    AgeRestriction,
    #[serde(rename = "frequency_limit")]
    FrequencyLimit,
    #[serde(rename = "prerequisite_missing")]
    PrerequisiteMissing,
    #[serde(rename = "billing_rule")]
    BillingRule,
}

impl ConflictReason {
    /// Stable string representation matching the serde tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TimeOverlap => "time_overlap_consultation_levels",
            Self::CategoryExclusive => "category_exclusive_consultation",
            Self::SpecialtyService => "specialty_service_conflict",
            Self::TimeManagement => "time_management_warning",
            Self::AgeRestriction => "age_restriction",
            Self::FrequencyLimit => "frequency_limit",
            Self::PrerequisiteMissing => "prerequisite_missing",
            Self::BillingRule => "billing_rule",
        }
    }

    /// Reasons that express "only one consultation level per attendance".
    pub fn is_consultation_level(&self) -> bool {
        matches!(self, Self::TimeOverlap | Self::CategoryExclusive)
    }
}

/// Whether a rule violation blocks selection or is informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictSeverity {
    Warning,
    Blocking,
}

// ---------------------------------------------------------------------------
// Structs
// ---------------------------------------------------------------------------

/// Optional applicability conditions attached to a rule by the backend.
///
/// Carried through unchanged; the engine has no patient context to evaluate
/// them against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleConditions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_per_day: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<MbsCode>,
}

/// A relationship between two or more codes.
///
/// `conflicting_codes` always contains the declaring code. Rules are
/// symmetric: a rule declared on A naming B applies when B is evaluated
/// against A.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictRule {
    pub conflicting_codes: Vec<MbsCode>,
    pub reason: ConflictReason,
    pub severity: ConflictSeverity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<MbsCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<RuleConditions>,
}

impl ConflictRule {
    pub fn new(
        conflicting_codes: Vec<MbsCode>,
        reason: ConflictReason,
        severity: ConflictSeverity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            conflicting_codes,
            reason,
            severity,
            message: message.into(),
            category: None,
            conditions: None,
        }
    }

    /// Scope the rule to a category.
    pub fn with_category(mut self, category: MbsCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn is_blocking(&self) -> bool {
        self.severity == ConflictSeverity::Blocking
    }

    /// Whether `code` is one of the codes this rule relates.
    pub fn involves(&self, code: &str) -> bool {
        self.conflicting_codes.iter().any(|c| c == code)
    }

    /// Identity used for deduplication: the order-independent code set and
    /// the reason.
    pub fn dedup_key(&self) -> (BTreeSet<&str>, ConflictReason) {
        (
            self.conflicting_codes.iter().map(String::as_str).collect(),
            self.reason,
        )
    }
}

/// Answer to "can this code be added to the current selection?".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictValidationResult {
    pub can_select: bool,
    /// Blocking conflicts only.
    pub conflicts: Vec<ConflictRule>,
    pub warnings: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    /// Codes that can be selected alongside the candidate. Only populated by
    /// the enriched evaluator when the candidate is selectable.
    #[serde(default)]
    pub compatible_codes: Vec<MbsCode>,
}

impl ConflictValidationResult {
    /// A selectable result with nothing to report.
    pub fn allowed() -> Self {
        Self {
            can_select: true,
            conflicts: Vec::new(),
            warnings: Vec::new(),
            suggestions: Vec::new(),
            compatible_codes: Vec::new(),
        }
    }

    /// A non-selectable result carrying a single warning and no conflicts.
    pub fn rejected(warning: impl Into<String>) -> Self {
        Self {
            can_select: false,
            warnings: vec![warning.into()],
            ..Self::allowed()
        }
    }
}

// ---------------------------------------------------------------------------
// Deduplication
// ---------------------------------------------------------------------------

/// Drop rules whose code set and reason match an earlier rule.
pub fn dedup_conflicts(rules: Vec<ConflictRule>) -> Vec<ConflictRule> {
    let mut seen: HashSet<(Vec<MbsCode>, ConflictReason)> = HashSet::new();
    rules
        .into_iter()
        .filter(|rule| {
            let (codes, reason) = rule.dedup_key();
            let owned: Vec<MbsCode> = codes.into_iter().map(str::to_string).collect();
            seen.insert((owned, reason))
        })
        .collect()
}

/// Drop repeated strings, keeping first occurrences in order.
pub fn dedup_strings(items: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    items
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn codes(list: &[&str]) -> Vec<MbsCode> {
        list.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn reason_as_str_matches_serde_tag() {
        for reason in [
            ConflictReason::TimeOverlap,
            ConflictReason::CategoryExclusive,
            ConflictReason::SpecialtyService,
            ConflictReason::TimeManagement,
            ConflictReason::AgeRestriction,
            ConflictReason::FrequencyLimit,
            ConflictReason::PrerequisiteMissing,
            ConflictReason::BillingRule,
        ] {
            assert_eq!(serde_json::to_value(reason).unwrap(), json!(reason.as_str()));
        }
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(ConflictSeverity::Blocking).unwrap(),
            json!("blocking")
        );
    }

    #[test]
    fn rule_serializes_camel_case_without_empty_optionals() {
        let rule = ConflictRule::new(
            codes(&["23", "36"]),
            ConflictReason::CategoryExclusive,
            ConflictSeverity::Blocking,
            "one level only",
        );
        let v = serde_json::to_value(&rule).unwrap();
        assert_eq!(v["conflictingCodes"], json!(["23", "36"]));
        assert!(v.get("category").is_none());
        assert!(v.get("conditions").is_none());
    }

    #[test]
    fn conditions_survive_round_trip() {
        let v = json!({
            "conflictingCodes": ["721", "723"],
            "reason": "frequency_limit",
            "severity": "warning",
            "message": "Once per 12 months",
            "conditions": { "maxPerDay": 1, "requires": ["721"] }
        });
        let rule: ConflictRule = serde_json::from_value(v).unwrap();
        let conditions = rule.conditions.as_ref().unwrap();
        assert_eq!(conditions.max_per_day, Some(1));
        assert_eq!(conditions.requires, codes(&["721"]));
        assert!(conditions.min_age.is_none());
    }

    #[test]
    fn dedup_ignores_code_order() {
        let a = ConflictRule::new(
            codes(&["23", "36"]),
            ConflictReason::TimeOverlap,
            ConflictSeverity::Blocking,
            "from 23",
        );
        let b = ConflictRule::new(
            codes(&["36", "23"]),
            ConflictReason::TimeOverlap,
            ConflictSeverity::Blocking,
            "from 36",
        );
        let deduped = dedup_conflicts(vec![a, b]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].message, "from 23");
    }

    #[test]
    fn dedup_keeps_distinct_reasons() {
        let a = ConflictRule::new(
            codes(&["23", "36"]),
            ConflictReason::TimeOverlap,
            ConflictSeverity::Blocking,
            "overlap",
        );
        let b = ConflictRule::new(
            codes(&["23", "36"]),
            ConflictReason::CategoryExclusive,
            ConflictSeverity::Blocking,
            "exclusive",
        );
        assert_eq!(dedup_conflicts(vec![a, b]).len(), 2);
    }

    #[test]
    fn dedup_strings_preserves_first_order() {
        let out = dedup_strings(vec!["b".into(), "a".into(), "b".into()]);
        assert_eq!(out, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn rejected_result_has_no_conflicts() {
        let r = ConflictValidationResult::rejected("nope");
        assert!(!r.can_select);
        assert!(r.conflicts.is_empty());
        assert_eq!(r.warnings, vec!["nope".to_string()]);
    }
}
