//! REST API types for the onboarding service.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::import::{ImportMode, ImportReport};
use crate::models::{ImportResult, ParseError, ParseOutcome, ParsedEmployeeRow};

/// Response to a preview upload: what would be imported.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub job_id: String,

    /// "ready", "warning" (some rows rejected) or "error" (nothing importable)
    pub status: String,

    pub rows: Vec<ParsedEmployeeRow>,
    pub errors: Vec<ParseError>,
    pub summary: ParseSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseSummary {
    pub valid: usize,
    pub rejected: usize,
}

/// Response to an import upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub job_id: String,

    /// "done" (everything imported), "partial" or "failed"
    pub status: String,

    pub mode: ImportMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,

    pub results: Vec<ImportResult>,

    /// Lines rejected before import
    pub parse_errors: Vec<ParseError>,

    pub summary: ImportSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub parsed: usize,
    pub rejected: usize,
    pub imported: usize,
    pub failed: usize,
}

impl From<ParseOutcome> for PreviewResponse {
    fn from(outcome: ParseOutcome) -> Self {
        let status = if outcome.rows.is_empty() {
            "error"
        } else if outcome.errors.is_empty() {
            "ready"
        } else {
            "warning"
        };

        PreviewResponse {
            job_id: Uuid::new_v4().to_string(),
            status: status.to_string(),
            summary: ParseSummary {
                valid: outcome.rows.len(),
                rejected: outcome.errors.len(),
            },
            rows: outcome.rows,
            errors: outcome.errors,
        }
    }
}

impl ImportResponse {
    pub fn new(parse_errors: Vec<ParseError>, parsed: usize, report: ImportReport) -> Self {
        let imported = report.succeeded();
        let failed = report.failed();
        let status = if failed == 0 && parse_errors.is_empty() {
            "done"
        } else if imported == 0 {
            "failed"
        } else {
            "partial"
        };

        ImportResponse {
            job_id: Uuid::new_v4().to_string(),
            status: status.to_string(),
            mode: report.mode,
            fallback_reason: report.fallback_reason,
            results: report.results,
            summary: ImportSummary {
                parsed,
                rejected: parse_errors.len(),
                imported,
                failed,
            },
            parse_errors,
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "results": [],
    })
}
