//! Import executor: create employee accounts for validated rows.
//!
//! Two strategies, and the composition the shells use:
//!
//! - [`import_employees_batch`] - one request for every row. Fails as a whole
//!   on any transport or endpoint problem; nothing partial is kept.
//! - [`import_employees_sequential`] - one request per row, strictly in order,
//!   one attempt each. Row failures are recorded, never returned as `Err`.
//! - [`import_employees`] - batch first, sequential if the batch call fails.
//!   Results always come from exactly one of the two paths.
//!
//! # Example
//!
//! ```rust,ignore
//! use onboarding::{import_employees, parse_employees_csv, HttpEmployeeApi, ClientConfig};
//!
//! let api = HttpEmployeeApi::new(ClientConfig::from_env()?)?;
//! let outcome = parse_employees_csv(&text);
//! let progress = |done: usize, total: usize| eprintln!("{}/{}", done, total);
//! let report = import_employees(&api, &outcome.rows, Some(&progress), None).await;
//! println!("{} imported, {} failed", report.succeeded(), report.failed());
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::api::logs::{log_error_indent, log_info, log_progress, log_success, log_warning};
use crate::client::EmployeeApi;
use crate::config::{PASSWORD_PREFIX, PASSWORD_SUFFIX_LEN};
use crate::error::{ApiError, BatchResult};
use crate::models::{BatchStatus, EmployeePayload, ImportResult, ParsedEmployeeRow};

/// Message for a batch row the server reported as already existing.
pub const CONFLICT_MESSAGE: &str = "record already exists";

/// Message for a failed row whose error had no text.
pub const DEFAULT_FAILURE_MESSAGE: &str = "import failed";

/// Message for rows skipped or abandoned because the import was cancelled.
pub const CANCELLED_MESSAGE: &str = "import cancelled";

/// Progress callback: `(completed, total)` rows.
pub type ProgressFn<'a> = &'a (dyn Fn(usize, usize) + Send + Sync);

fn report_progress(on_progress: Option<ProgressFn<'_>>, completed: usize, total: usize) {
    if let Some(report) = on_progress {
        report(completed, total);
    }
    log_progress(completed, total);
}

// =============================================================================
// Cancellation
// =============================================================================

/// Cooperative cancellation for a running import.
///
/// Clones share state: cancelling any clone cancels them all.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        // The sender lives as long as `self`, so this only ends by cancellation.
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Passwords
// =============================================================================

/// One-off password for the mandatory backend field.
///
/// The employee never sees it; access goes through password reset.
pub fn generate_password() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(PASSWORD_SUFFIX_LEN)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    format!("{}{}", PASSWORD_PREFIX, suffix)
}

// =============================================================================
// Batch Import
// =============================================================================

/// Create every row with a single batch call.
///
/// Upload progress is translated from bytes to an estimated row count while
/// the request is sent; `(total, total)` is always reported once the call
/// has resolved successfully.
pub async fn import_employees_batch<A>(
    api: &A,
    rows: &[ParsedEmployeeRow],
    on_progress: Option<ProgressFn<'_>>,
) -> BatchResult<Vec<ImportResult>>
where
    A: EmployeeApi + ?Sized,
{
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let total = rows.len();

    let payloads: Vec<EmployeePayload> = rows
        .iter()
        .map(|row| EmployeePayload::from_row(row, generate_password()))
        .collect();
    let lines: HashMap<&str, usize> = rows.iter().map(|r| (r.email.as_str(), r.line)).collect();

    let upload = move |sent: usize, total_bytes: usize| {
        if total_bytes > 0 {
            let completed = ((sent as f64 / total_bytes as f64) * total as f64).round() as usize;
            report_progress(on_progress, completed.min(total), total);
        }
    };

    log_info(format!("Submitting {} employees in one batch request...", total));
    let response = api.batch_create_employees(&payloads, Some(&upload)).await?;

    let results: Vec<ImportResult> = response
        .results
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            let line = lines
                .get(item.email.to_lowercase().as_str())
                .copied()
                .unwrap_or(idx + 1);
            let (success, message) = match item.status {
                BatchStatus::Created => (true, None),
                BatchStatus::Conflict => (false, Some(CONFLICT_MESSAGE.to_string())),
                BatchStatus::Error(message) => (false, message),
            };
            ImportResult {
                line,
                email: item.email,
                success,
                message,
            }
        })
        .collect();

    report_progress(on_progress, total, total);
    Ok(results)
}

// =============================================================================
// Sequential Import
// =============================================================================

/// Create rows one request at a time, in input order.
///
/// Always returns one result per row. After cancellation the request in
/// flight is abandoned and every row not yet finished is reported with
/// [`CANCELLED_MESSAGE`]. Progress is reported after each attempted row.
pub async fn import_employees_sequential<A>(
    api: &A,
    rows: &[ParsedEmployeeRow],
    on_progress: Option<ProgressFn<'_>>,
    cancel: Option<&CancellationToken>,
) -> Vec<ImportResult>
where
    A: EmployeeApi + ?Sized,
{
    let total = rows.len();
    let mut results = Vec::with_capacity(total);

    for (idx, row) in rows.iter().enumerate() {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            break;
        }

        let payload = EmployeePayload::from_row(row, generate_password());
        let outcome = match cancel {
            Some(token) => tokio::select! {
                result = api.create_employee(&payload) => result,
                _ = token.cancelled() => Err(ApiError::Cancelled),
            },
            None => api.create_employee(&payload).await,
        };

        match outcome {
            Ok(_) => results.push(ImportResult::succeeded(row)),
            Err(ApiError::Cancelled) => results.push(ImportResult::failed(row, CANCELLED_MESSAGE)),
            Err(err) => {
                let message = err.to_string();
                let message = if message.trim().is_empty() {
                    DEFAULT_FAILURE_MESSAGE.to_string()
                } else {
                    message
                };
                log_error_indent(format!("Line {} ({}): {}", row.line, row.email, message), 1);
                results.push(ImportResult::failed(row, message));
            }
        }

        report_progress(on_progress, idx + 1, total);
    }

    if results.len() < total {
        log_warning(format!(
            "Import cancelled, {} rows not attempted",
            total - results.len()
        ));
        let skipped = rows[results.len()..]
            .iter()
            .map(|row| ImportResult::failed(row, CANCELLED_MESSAGE));
        results.extend(skipped);
    }

    results
}

// =============================================================================
// Batch With Sequential Fallback
// =============================================================================

/// Which strategy produced the results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    Batch,
    Sequential,
}

/// Final outcome of an import run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub mode: ImportMode,
    pub results: Vec<ImportResult>,
    /// Why the batch path was abandoned, when it was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

impl ImportReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ImportResult> {
        self.results.iter().filter(|r| !r.success)
    }
}

/// Import with the batch endpoint, falling back to sequential creation if
/// the batch call fails.
///
/// Progress seen by `on_progress` never goes backwards. Upload ticks from a
/// batch call that then fails are not undone: the sequential pass stays
/// silent until it overtakes the highest count already reported.
pub async fn import_employees<A>(
    api: &A,
    rows: &[ParsedEmployeeRow],
    on_progress: Option<ProgressFn<'_>>,
    cancel: Option<&CancellationToken>,
) -> ImportReport
where
    A: EmployeeApi + ?Sized,
{
    let high_water = AtomicUsize::new(0);
    let forward = |completed: usize, total: usize| {
        if high_water.fetch_max(completed, Ordering::SeqCst) <= completed {
            if let Some(report) = on_progress {
                report(completed, total);
            }
        }
    };
    let on_progress: Option<ProgressFn<'_>> = Some(&forward);

    let report = match import_employees_batch(api, rows, on_progress).await {
        Ok(results) => ImportReport {
            mode: ImportMode::Batch,
            results,
            fallback_reason: None,
        },
        Err(err) => {
            log_warning(format!("{}; falling back to sequential import", err));
            let results = import_employees_sequential(api, rows, on_progress, cancel).await;
            ImportReport {
                mode: ImportMode::Sequential,
                results,
                fallback_reason: Some(err.to_string()),
            }
        }
    };

    log_success(format!(
        "Import finished: {} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    ));
    report
}
