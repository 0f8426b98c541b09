//! Code recommendations as received from the upstream recommendation service.
//!
//! Recommendations are read-only inputs to the engine. The catalog is a plain
//! slice in backend order; lookups are linear because a consultation rarely
//! carries more than a few dozen candidates.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::conflict::rules::ConflictRule;
use crate::error::CoreError;
use crate::types::MbsCode;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const CATEGORY_PROFESSIONAL_ATTENDANCES: &str = "professional_attendances";
pub const CATEGORY_MENTAL_HEALTH_SERVICES: &str = "mental_health_services";
pub const CATEGORY_THERAPEUTIC_PROCEDURES: &str = "therapeutic_procedures";
pub const CATEGORY_DIAGNOSTIC_PROCEDURES: &str = "diagnostic_procedures";
pub const CATEGORY_DIAGNOSTIC_IMAGING: &str = "diagnostic_imaging";
pub const CATEGORY_PATHOLOGY_SERVICES: &str = "pathology_services";
pub const CATEGORY_OTHER: &str = "other";

/// All category strings the engine recognises.
pub const VALID_CATEGORIES: &[&str] = &[
    CATEGORY_PROFESSIONAL_ATTENDANCES,
    CATEGORY_MENTAL_HEALTH_SERVICES,
    CATEGORY_THERAPEUTIC_PROCEDURES,
    CATEGORY_DIAGNOSTIC_PROCEDURES,
    CATEGORY_DIAGNOSTIC_IMAGING,
    CATEGORY_PATHOLOGY_SERVICES,
    CATEGORY_OTHER,
];

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// MBS category of a recommended item.
///
/// Unrecognised category strings deserialize to [`MbsCategory::Other`], which
/// carries no category-based rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MbsCategory {
    ProfessionalAttendances,
    MentalHealthServices,
    TherapeuticProcedures,
    DiagnosticProcedures,
    DiagnosticImaging,
    PathologyServices,
    Other,
}

impl MbsCategory {
    /// Convert from the wire string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            CATEGORY_PROFESSIONAL_ATTENDANCES => Ok(Self::ProfessionalAttendances),
            CATEGORY_MENTAL_HEALTH_SERVICES => Ok(Self::MentalHealthServices),
            CATEGORY_THERAPEUTIC_PROCEDURES => Ok(Self::TherapeuticProcedures),
            CATEGORY_DIAGNOSTIC_PROCEDURES => Ok(Self::DiagnosticProcedures),
            CATEGORY_DIAGNOSTIC_IMAGING => Ok(Self::DiagnosticImaging),
            CATEGORY_PATHOLOGY_SERVICES => Ok(Self::PathologyServices),
            CATEGORY_OTHER => Ok(Self::Other),
            _ => Err(format!(
                "Invalid MBS category '{s}'. Must be one of: {}",
                VALID_CATEGORIES.join(", ")
            )),
        }
    }

    /// Convert to the wire string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProfessionalAttendances => CATEGORY_PROFESSIONAL_ATTENDANCES,
            Self::MentalHealthServices => CATEGORY_MENTAL_HEALTH_SERVICES,
            Self::TherapeuticProcedures => CATEGORY_THERAPEUTIC_PROCEDURES,
            Self::DiagnosticProcedures => CATEGORY_DIAGNOSTIC_PROCEDURES,
            Self::DiagnosticImaging => CATEGORY_DIAGNOSTIC_IMAGING,
            Self::PathologyServices => CATEGORY_PATHOLOGY_SERVICES,
            Self::Other => CATEGORY_OTHER,
        }
    }
}

impl From<String> for MbsCategory {
    fn from(value: String) -> Self {
        Self::from_str_value(&value).unwrap_or(Self::Other)
    }
}

impl From<MbsCategory> for String {
    fn from(value: MbsCategory) -> Self {
        value.as_str().to_string()
    }
}

// ---------------------------------------------------------------------------
// Structs
// ---------------------------------------------------------------------------

/// A candidate billing code surfaced by the recommendation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeRecommendation {
    pub code: MbsCode,
    pub description: String,
    /// Model confidence in `[0.0, 1.0]`.
    pub confidence: f64,
    pub schedule_fee: f64,
    #[serde(default)]
    pub category: Option<MbsCategory>,
    /// Rules declared by this code. Other codes' rules naming this code
    /// apply as well; see [`crate::conflict::evaluator`].
    #[serde(default)]
    pub conflicts: Vec<ConflictRule>,
    #[serde(default)]
    pub compatible_with: Vec<MbsCode>,
    /// Minimum service time in minutes, when the item is time-based.
    #[serde(default)]
    pub time_requirement: Option<u32>,
}

impl CodeRecommendation {
    /// Time requirement in minutes, treating an absent value as zero.
    pub fn time_minutes(&self) -> u32 {
        self.time_requirement.unwrap_or(0)
    }

    /// Whether `code` appears in this recommendation's `compatible_with` list.
    pub fn is_compatible_with(&self, code: &str) -> bool {
        self.compatible_with.iter().any(|c| c == code)
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Find a recommendation by code.
pub fn find_recommendation<'a>(
    recommendations: &'a [CodeRecommendation],
    code: &str,
) -> Option<&'a CodeRecommendation> {
    recommendations.iter().find(|r| r.code == code)
}

/// Like [`find_recommendation`] but reports a missing code as an error.
pub fn find_recommendation_or_err<'a>(
    recommendations: &'a [CodeRecommendation],
    code: &str,
) -> Result<&'a CodeRecommendation, CoreError> {
    find_recommendation(recommendations, code).ok_or_else(|| CoreError::NotFound {
        entity: "recommendation",
        code: code.to_string(),
    })
}

/// Round a currency amount to whole cents.
pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a single recommendation's data.
///
/// The engine never rejects a catalog because of these problems; callers use
/// this to log bad upstream data.
pub fn validate_recommendation(rec: &CodeRecommendation) -> Result<(), CoreError> {
    if rec.code.trim().is_empty() {
        return Err(CoreError::Validation(
            "recommendation code must not be empty".to_string(),
        ));
    }

    if !(0.0..=1.0).contains(&rec.confidence) {
        return Err(CoreError::Validation(format!(
            "confidence for code {} must be between 0.0 and 1.0, got {}",
            rec.code, rec.confidence
        )));
    }

    if !rec.schedule_fee.is_finite() || rec.schedule_fee < 0.0 {
        return Err(CoreError::Validation(format!(
            "schedule fee for code {} must be a non-negative amount, got {}",
            rec.code, rec.schedule_fee
        )));
    }

    for (i, rule) in rec.conflicts.iter().enumerate() {
        if rule.conflicting_codes.len() < 2 {
            return Err(CoreError::Validation(format!(
                "conflicts[{i}] of code {} must reference at least two codes",
                rec.code
            )));
        }
        if !rule.involves(&rec.code) {
            return Err(CoreError::Validation(format!(
                "conflicts[{i}] of code {} must include the declaring code",
                rec.code
            )));
        }
    }

    Ok(())
}

/// Validate every recommendation and reject duplicate codes.
pub fn validate_catalog(recommendations: &[CodeRecommendation]) -> Result<(), CoreError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for rec in recommendations {
        validate_recommendation(rec)?;
        if !seen.insert(rec.code.as_str()) {
            return Err(CoreError::Validation(format!(
                "duplicate recommendation for code {}",
                rec.code
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
