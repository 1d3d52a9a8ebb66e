//! Per-row validation rules for onboarding records.
//!
//! Rules run in a fixed order and the first failure wins, so a rejected line
//! carries exactly one reason:
//!
//! 1. name present
//! 2. email shaped like `local@domain.tld` (after lowercasing)
//! 3. cost center is a positive integer
//! 4. email not already accepted on an earlier line
//!
//! # Example
//!
//! ```rust,ignore
//! use std::collections::HashMap;
//! use onboarding::validation::{validate_row, RowDraft};
//!
//! let draft = RowDraft {
//!     line: 2,
//!     full_name: "Joao Silva".into(),
//!     email: "JOAO@empresa.com".into(),
//!     department: String::new(),
//!     cost_center: 1,
//! };
//! let row = validate_row(draft, &HashMap::new()).unwrap();
//! assert_eq!(row.email, "joao@empresa.com");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use thiserror::Error;

use crate::models::ParsedEmployeeRow;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Why a data line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowViolation {
    #[error("Name is required")]
    MissingName,

    #[error("Invalid email")]
    InvalidEmail,

    #[error("Invalid cost center")]
    InvalidCostCenter,

    #[error("Duplicate email (first seen on line {first_line})")]
    DuplicateEmail { first_line: usize },
}

/// A data line after column mapping, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowDraft {
    pub line: usize,
    pub full_name: String,
    pub email: String,
    pub department: String,
    /// Cost center id; `0` when the cell was empty or not a whole number.
    pub cost_center: u64,
}

/// Check an email against the accepted shape.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Integers below this (2^53) survive an `f64` round trip exactly.
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

/// Read a cost-center cell as an id.
///
/// Digits are read exactly, with an optional all-zero fraction (`3.0`).
/// Exponent spellings (`1e3`) go through `f64` and must be whole and below
/// 2^53. Anything else, including negatives and values past `u64::MAX`,
/// becomes `0`, which the positivity rule rejects later.
pub fn parse_cost_center(value: &str) -> u64 {
    let value = value.trim();

    if value.contains(['e', 'E']) {
        return match value.parse::<f64>() {
            Ok(n) if n > 0.0 && n.fract() == 0.0 && n < MAX_EXACT_FLOAT_INT => n as u64,
            _ => 0,
        };
    }

    let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
    if !fraction.bytes().all(|b| b == b'0') {
        return 0;
    }
    whole.parse::<u64>().unwrap_or(0)
}

/// Validate a draft against every rule.
///
/// `seen` maps emails already accepted in this file to their line.
pub fn validate_row(
    draft: RowDraft,
    seen: &HashMap<String, usize>,
) -> Result<ParsedEmployeeRow, RowViolation> {
    let full_name = draft.full_name.trim().to_string();
    if full_name.is_empty() {
        return Err(RowViolation::MissingName);
    }

    let email = draft.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(RowViolation::InvalidEmail);
    }

    let cost_center_id = draft.cost_center;
    if cost_center_id == 0 {
        return Err(RowViolation::InvalidCostCenter);
    }

    if let Some(&first_line) = seen.get(&email) {
        return Err(RowViolation::DuplicateEmail { first_line });
    }

    Ok(ParsedEmployeeRow {
        line: draft.line,
        full_name,
        email,
        department: draft.department.trim().to_string(),
        cost_center_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, email: &str, cost_center: u64) -> RowDraft {
        RowDraft {
            line: 2,
            full_name: name.into(),
            email: email.into(),
            department: String::new(),
            cost_center,
        }
    }

    #[test]
    fn test_valid_row() {
        let row = validate_row(draft("Ana", "Ana@Empresa.com", 3), &HashMap::new()).unwrap();
        assert_eq!(row.email, "ana@empresa.com");
        assert_eq!(row.cost_center_id, 3);
        assert_eq!(row.department, "");
    }

    #[test]
    fn test_first_failure_wins() {
        // Every rule is broken; only the name is reported.
        let err = validate_row(draft("  ", "nope", 0), &HashMap::new()).unwrap_err();
        assert_eq!(err, RowViolation::MissingName);

        let err = validate_row(draft("Ana", "nope", 0), &HashMap::new()).unwrap_err();
        assert_eq!(err, RowViolation::InvalidEmail);

        let err = validate_row(draft("Ana", "ana@x.com", 0), &HashMap::new()).unwrap_err();
        assert_eq!(err, RowViolation::InvalidCostCenter);
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last+tag@sub.domain.com.br"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("@c.com"));
        assert!(!is_valid_email("a@@c.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_cost_center_parsing() {
        assert_eq!(parse_cost_center("12"), 12);
        assert_eq!(parse_cost_center(" 7 "), 7);
        assert_eq!(parse_cost_center("3.0"), 3);
        assert_eq!(parse_cost_center("1e3"), 1000);
        assert_eq!(parse_cost_center(""), 0);
        assert_eq!(parse_cost_center("abc"), 0);
        assert_eq!(parse_cost_center("inf"), 0);
        assert_eq!(parse_cost_center("NaN"), 0);
    }

    #[test]
    fn test_cost_center_must_be_positive_integer() {
        for value in ["-1", "0", "2.5", "-3.0"] {
            assert_eq!(parse_cost_center(value), 0, "{}", value);
        }
        let err = validate_row(draft("Ana", "ana@x.com", 0), &HashMap::new()).unwrap_err();
        assert_eq!(err, RowViolation::InvalidCostCenter);

        let row = validate_row(draft("Ana", "ana@x.com", 4), &HashMap::new()).unwrap();
        assert_eq!(row.cost_center_id, 4);
    }

    #[test]
    fn test_large_cost_center_ids_are_never_rounded() {
        // Read exactly, past the range an f64 can represent.
        assert_eq!(parse_cost_center("9007199254740993"), 9_007_199_254_740_993);
        assert_eq!(parse_cost_center("18446744073709551615"), u64::MAX);

        // Out of range or fractional spellings are rejected, not clamped.
        assert_eq!(parse_cost_center("18446744073709551616"), 0);
        assert_eq!(parse_cost_center("1e19"), 0);
        assert_eq!(parse_cost_center("9007199254740993.0"), 9_007_199_254_740_993);
        assert_eq!(parse_cost_center("9007199254740993.5"), 0);
    }

    #[test]
    fn test_duplicate_email_is_case_insensitive() {
        let mut seen = HashMap::new();
        seen.insert("ana@x.com".to_string(), 2);

        let mut second = draft("Ana B", "ANA@x.com", 1);
        second.line = 5;
        let err = validate_row(second, &seen).unwrap_err();
        assert_eq!(err, RowViolation::DuplicateEmail { first_line: 2 });
        assert_eq!(err.to_string(), "Duplicate email (first seen on line 2)");
    }
}
