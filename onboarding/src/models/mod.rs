//! Domain models for the onboarding pipeline.
//!
//! This module contains the core data structures passed between stages:
//!
//! - [`ParsedEmployeeRow`] - One validated onboarding record
//! - [`ParseError`] - One rejected source line
//! - [`ParseOutcome`] - Everything the parser produced for one file
//! - [`ImportResult`] - Outcome of creating one employee
//! - [`EmployeePayload`] - Request body for the employee API
//! - [`BatchResponse`] / [`BatchStatus`] - Batch endpoint response

use serde::{Deserialize, Serialize};

/// Role sent for every onboarded account.
pub const EMPLOYEE_ROLE: &str = "employee";

// =============================================================================
// Canonical Fields
// =============================================================================

/// Canonical onboarding field a CSV column can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    FullName,
    Email,
    CostCenterId,
    Department,
}

impl Field {
    /// Fields every file must provide a column for.
    pub const REQUIRED: [Field; 3] = [Field::FullName, Field::Email, Field::CostCenterId];

    /// Name as it appears in payloads and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::FullName => "full_name",
            Field::Email => "email",
            Field::CostCenterId => "cost_center_id",
            Field::Department => "department",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Parser Output
// =============================================================================

/// A validated onboarding record.
///
/// Only built once every validation rule has passed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedEmployeeRow {
    /// 1-based source line (header is line 1).
    pub line: usize,
    pub full_name: String,
    /// Lowercased email.
    pub email: String,
    #[serde(default)]
    pub department: String,
    pub cost_center_id: u64,
}

/// A rejected source line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
    /// Original line text, untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
            raw: None,
        }
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.raw {
            Some(raw) => write!(f, "Line {}: {} ({})", self.line, self.message, raw),
            None => write!(f, "Line {}: {}", self.line, self.message),
        }
    }
}

/// Everything the parser produced for one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseOutcome {
    pub rows: Vec<ParsedEmployeeRow>,
    pub errors: Vec<ParseError>,
}

impl ParseOutcome {
    /// Outcome for a file that cannot be processed at all.
    pub fn structural(message: impl Into<String>) -> Self {
        Self {
            rows: Vec::new(),
            errors: vec![ParseError::new(1, message)],
        }
    }

    /// True when the whole file was rejected (empty, or missing required columns).
    pub fn is_structural_failure(&self) -> bool {
        self.rows.is_empty() && self.errors.len() == 1 && self.errors[0].line == 1
    }

    pub fn summary(&self) -> String {
        format!(
            "Parsed: {} valid rows, {} rejected",
            self.rows.len(),
            self.errors.len()
        )
    }
}

// =============================================================================
// Import Output
// =============================================================================

/// Outcome of attempting to create one employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportResult {
    pub line: usize,
    pub email: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ImportResult {
    pub fn succeeded(row: &ParsedEmployeeRow) -> Self {
        Self {
            line: row.line,
            email: row.email.clone(),
            success: true,
            message: None,
        }
    }

    pub fn failed(row: &ParsedEmployeeRow, message: impl Into<String>) -> Self {
        Self {
            line: row.line,
            email: row.email.clone(),
            success: false,
            message: Some(message.into()),
        }
    }
}

// =============================================================================
// Employee API Payloads
// =============================================================================

/// Request body for employee creation (single and batch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeePayload {
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub role: String,
    pub department: String,
    pub cost_center_id: u64,
}

impl EmployeePayload {
    pub fn from_row(row: &ParsedEmployeeRow, password: String) -> Self {
        Self {
            email: row.email.clone(),
            full_name: row.full_name.clone(),
            password,
            role: EMPLOYEE_ROLE.to_string(),
            department: row.department.clone(),
            cost_center_id: row.cost_center_id,
        }
    }
}

/// Employee as returned by the single-creation endpoint.
///
/// Only the fields the pipeline looks at; everything else is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

// =============================================================================
// Batch Endpoint Response
// =============================================================================

/// Per-row status reported by the batch endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStatus {
    Created,
    Conflict,
    /// Any other status, with the server's message if it sent one.
    Error(Option<String>),
}

/// One entry of the batch response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawBatchItem")]
pub struct BatchItemResult {
    pub email: String,
    pub status: BatchStatus,
}

#[derive(Deserialize)]
struct RawBatchItem {
    email: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
}

impl From<RawBatchItem> for BatchItemResult {
    fn from(raw: RawBatchItem) -> Self {
        let status = match raw.status.as_str() {
            "created" => BatchStatus::Created,
            "conflict" => BatchStatus::Conflict,
            _ => BatchStatus::Error(raw.message),
        };
        Self {
            email: raw.email,
            status,
        }
    }
}

/// Aggregate counts reported by the batch endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    #[serde(default)]
    pub created: usize,
    #[serde(default)]
    pub conflicts: usize,
    #[serde(default)]
    pub errors: usize,
    #[serde(default)]
    pub total: usize,
}

/// Body of a successful batch call.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BatchResponse {
    #[serde(default)]
    pub summary: BatchSummary,
    #[serde(default)]
    pub results: Vec<BatchItemResult>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row() -> ParsedEmployeeRow {
        ParsedEmployeeRow {
            line: 2,
            full_name: "Joao Silva".into(),
            email: "joao@empresa.com".into(),
            department: String::new(),
            cost_center_id: 1,
        }
    }

    #[test]
    fn test_batch_status_mapping() {
        let response: BatchResponse = serde_json::from_value(json!({
            "summary": { "created": 1, "conflicts": 1, "errors": 2, "total": 4 },
            "results": [
                { "email": "a@x.com", "status": "created" },
                { "email": "b@x.com", "status": "conflict", "message": "dup" },
                { "email": "c@x.com", "status": "error", "message": "bad cost center" },
                { "email": "d@x.com", "status": "exploded" }
            ]
        }))
        .unwrap();

        assert_eq!(response.summary.total, 4);
        assert_eq!(response.results[0].status, BatchStatus::Created);
        assert_eq!(response.results[1].status, BatchStatus::Conflict);
        assert_eq!(
            response.results[2].status,
            BatchStatus::Error(Some("bad cost center".into()))
        );
        assert_eq!(response.results[3].status, BatchStatus::Error(None));
    }

    #[test]
    fn test_batch_response_missing_results() {
        let response: BatchResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.results.is_empty());
    }

    #[test]
    fn test_payload_from_row() {
        let payload = EmployeePayload::from_row(&row(), "Podium#abc".into());
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["role"], "employee");
        assert_eq!(value["department"], "");
        assert_eq!(value["cost_center_id"], 1);
        assert_eq!(value["password"], "Podium#abc");
    }

    #[test]
    fn test_structural_outcome() {
        let outcome = ParseOutcome::structural("empty file");
        assert!(outcome.is_structural_failure());
        assert_eq!(outcome.errors[0].line, 1);
    }

    #[test]
    fn test_import_result_serialization_skips_empty_message() {
        let value = serde_json::to_value(ImportResult::succeeded(&row())).unwrap();
        assert!(value.get("message").is_none());
        assert_eq!(value["line"], 2);
    }
}
