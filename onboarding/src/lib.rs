//! # Podium Onboarding - bulk employee import
//!
//! Turns a spreadsheet export of employees into Podium accounts: the CSV is
//! parsed and validated row by row, then valid rows are created through the
//! employee API, in one batch call when the backend supports it and one by
//! one otherwise.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│   Import    │────▶│ Employee API│
//! │  (ISO/UTF8) │     │ (validated) │     │ (batch/seq) │     │   (HTTP)    │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use onboarding::{import_employees, parse_employees_file, ClientConfig, HttpEmployeeApi};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let outcome = parse_employees_file("team.csv", None)?;
//!     let api = HttpEmployeeApi::new(ClientConfig::from_env()?)?;
//!     let report = import_employees(&api, &outcome.rows, None, None).await;
//!     println!("{} imported, {} failed", report.succeeded(), report.failed());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Rows, parse errors, payloads and batch responses
//! - [`parser`] - CSV parsing with delimiter and encoding detection
//! - [`validation`] - Per-row validation rules
//! - [`client`] - Employee API client and in-flight request tracking
//! - [`import`] - Batch and sequential import executor
//! - [`policy`] - Cost-center ride policies
//! - [`config`] - Environment configuration
//! - [`api`] - HTTP service and log streaming

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Parsing
pub mod parser;
pub mod validation;

// Employee API
pub mod client;
pub mod import;

// Policies
pub mod policy;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ApiError, ConfigError, CsvError, ImportError, PolicyError, ServerError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    BatchResponse, BatchStatus, EmployeePayload, EmployeeRecord, ImportResult, ParseError,
    ParseOutcome, ParsedEmployeeRow,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_employees_bytes, parse_employees_csv,
    parse_employees_file,
};

pub use validation::{is_valid_email, validate_row, RowViolation};

// =============================================================================
// Re-exports - Client
// =============================================================================

pub use client::{EmployeeApi, HttpEmployeeApi, RequestGuard, RequestTracker};
pub use config::ClientConfig;

// =============================================================================
// Re-exports - Import
// =============================================================================

pub use import::{
    generate_password, import_employees, import_employees_batch, import_employees_sequential,
    CancellationToken, ImportMode, ImportReport,
};

// =============================================================================
// Re-exports - Policy
// =============================================================================

pub use policy::{
    is_within_business_hours, policy_allows_ride, validate_cost_center_policy, BusinessHours,
    CostCenterPolicy, PolicyViolation,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, ImportResponse, PreviewResponse};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
