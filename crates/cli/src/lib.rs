//! Replay harness for the selection engine.
//!
//! Loads a recommendation set from JSON, replays a sequence of selection
//! operations through a [`SelectionManager`] and reports what happened.

use std::path::Path;

use anyhow::{bail, Context};
use serde::Serialize;

use mbs_core::config::SelectionConfig;
use mbs_core::conflict::rules::ConflictValidationResult;
use mbs_core::conflict::summary::{SelectionSummary, SelectionValidation};
use mbs_core::recommendation::CodeRecommendation;
use mbs_core::selection::{SelectionManager, SelectionState};

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// One replayable selection operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayOp {
    Select(String),
    Deselect(String),
    Toggle(String),
    Clear,
    Undo,
    Redo,
}

impl ReplayOp {
    /// Parse a single token: `23` / `+23` select, `-23` deselect, `~23`
    /// toggle, `!` clear, `<` undo, `>` redo.
    pub fn parse(token: &str) -> anyhow::Result<Self> {
        let token = token.trim();
        let op = match token {
            "" => bail!("empty replay operation"),
            "!" => Self::Clear,
            "<" => Self::Undo,
            ">" => Self::Redo,
            _ => match token.split_at(token.chars().next().map_or(0, char::len_utf8)) {
                ("+", code) => Self::Select(non_empty(code, token)?),
                ("-", code) => Self::Deselect(non_empty(code, token)?),
                ("~", code) => Self::Toggle(non_empty(code, token)?),
                _ => Self::Select(token.to_string()),
            },
        };
        Ok(op)
    }

    /// Parse a comma-separated list of operations.
    pub fn parse_list(list: &str) -> anyhow::Result<Vec<Self>> {
        list.split(',')
            .filter(|t| !t.trim().is_empty())
            .map(Self::parse)
            .collect()
    }

    fn label(&self) -> String {
        match self {
            Self::Select(code) => format!("select {code}"),
            Self::Deselect(code) => format!("deselect {code}"),
            Self::Toggle(code) => format!("toggle {code}"),
            Self::Clear => "clear".to_string(),
            Self::Undo => "undo".to_string(),
            Self::Redo => "redo".to_string(),
        }
    }
}

fn non_empty(code: &str, token: &str) -> anyhow::Result<String> {
    let code = code.trim();
    if code.is_empty() {
        bail!("replay operation '{token}' is missing a code");
    }
    Ok(code.to_string())
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcome {
    pub operation: String,
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ConflictValidationResult>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub operations: Vec<OperationOutcome>,
    pub state: SelectionState,
    pub summary: SelectionSummary,
    pub validation: SelectionValidation,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Read a JSON array of recommendations from `path`.
pub fn load_recommendations(path: &Path) -> anyhow::Result<Vec<CodeRecommendation>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read recommendations from {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse recommendations in {}", path.display()))
}

/// Apply `ops` in order to a fresh manager over `recommendations`.
pub fn replay(
    config: SelectionConfig,
    recommendations: Vec<CodeRecommendation>,
    ops: &[ReplayOp],
) -> ReplayReport {
    let mut manager = SelectionManager::with_recommendations(config, recommendations);
    let mut operations = Vec::with_capacity(ops.len());

    for op in ops {
        let before = manager.state().clone();
        let result = match op {
            ReplayOp::Select(code) => Some(manager.select_code(code)),
            ReplayOp::Toggle(code) => Some(manager.toggle_code_selection(code)),
            ReplayOp::Deselect(code) => {
                manager.deselect_code(code);
                None
            }
            ReplayOp::Clear => {
                manager.clear_selection();
                None
            }
            ReplayOp::Undo => {
                manager.undo();
                None
            }
            ReplayOp::Redo => {
                manager.redo();
                None
            }
        };
        let changed = manager.state() != &before;
        tracing::info!(operation = %op.label(), changed, "Replayed operation");

        operations.push(OperationOutcome {
            operation: op.label(),
            changed,
            result,
        });
    }

    ReplayReport {
        operations,
        summary: manager.summary(),
        validation: manager.validate(),
        state: manager.state().clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATALOG: &str = r#"[
        {"code": "23", "description": "Level B", "confidence": 0.9,
         "scheduleFee": 41.20, "category": "professional_attendances"},
        {"code": "36", "description": "Level C", "confidence": 0.8,
         "scheduleFee": 75.05, "category": "professional_attendances"},
        {"code": "177", "description": "Procedure", "confidence": 0.7,
         "scheduleFee": 62.15, "category": "therapeutic_procedures",
         "compatibleWith": ["23", "36"]}
    ]"#;

    // -- parsing -------------------------------------------------------------

    #[test]
    fn parses_all_operation_forms() {
        let ops = ReplayOp::parse_list("23, +36,-23,~177,!,<,>").unwrap();
        assert_eq!(
            ops,
            vec![
                ReplayOp::Select("23".into()),
                ReplayOp::Select("36".into()),
                ReplayOp::Deselect("23".into()),
                ReplayOp::Toggle("177".into()),
                ReplayOp::Clear,
                ReplayOp::Undo,
                ReplayOp::Redo,
            ]
        );
    }

    #[test]
    fn rejects_operator_without_code() {
        assert!(ReplayOp::parse("-").is_err());
        assert!(ReplayOp::parse("  ").is_err());
    }

    #[test]
    fn empty_list_is_no_ops() {
        assert!(ReplayOp::parse_list("").unwrap().is_empty());
    }

    // -- loading -------------------------------------------------------------

    #[test]
    fn loads_recommendations_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();
        let recs = load_recommendations(file.path()).unwrap();
        assert_eq!(recs.len(), 3);
        assert_eq!(recs[2].compatible_with, vec!["23", "36"]);
    }

    #[test]
    fn load_reports_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        let err = load_recommendations(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    // -- replay --------------------------------------------------------------

    #[test]
    fn replay_reports_rejection_and_final_state() {
        let recs: Vec<CodeRecommendation> = serde_json::from_str(CATALOG).unwrap();
        let ops = ReplayOp::parse_list("23,177,36").unwrap();
        let report = replay(SelectionConfig::default(), recs, &ops);

        assert_eq!(report.operations.len(), 3);
        assert!(report.operations[0].changed);
        assert!(report.operations[1].changed);
        assert!(!report.operations[2].changed);
        assert!(!report.operations[2].result.as_ref().unwrap().can_select);
        assert_eq!(report.state.total_fee, 103.35);
        assert_eq!(report.summary.selected_count, 2);
        assert!(report.validation.is_valid);
    }

    #[test]
    fn replay_undo_restores_previous_selection() {
        let recs: Vec<CodeRecommendation> = serde_json::from_str(CATALOG).unwrap();
        let ops = ReplayOp::parse_list("23,177,<").unwrap();
        let report = replay(SelectionConfig::default(), recs, &ops);
        assert_eq!(report.state.selected_codes.len(), 1);
        assert!(report.operations[2].changed);
    }
}
