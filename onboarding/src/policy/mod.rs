//! Cost-center ride policies.
//!
//! A cost center restricts which ride categories employees may book, how much
//! a single ride may cost, and optionally the hours during which rides are
//! allowed. Windows may cross midnight (`22:00`-`06:00`).

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::PolicyError;

/// Daily window in `HH:MM`, both ends inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHours {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
}

impl BusinessHours {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostCenterPolicy {
    #[serde(default)]
    pub allowed_categories: Vec<String>,
    #[serde(default)]
    pub spending_limit_per_ride: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_hours: Option<BusinessHours>,
}

/// Why a ride is not allowed under a policy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyViolation {
    #[error("Category '{0}' is not allowed for this cost center")]
    CategoryNotAllowed(String),

    #[error("Estimated fare {fare:.2} exceeds the per-ride limit of {limit:.2}")]
    OverSpendingLimit { fare: f64, limit: f64 },

    #[error("Rides are only allowed between {start} and {end}")]
    OutsideBusinessHours { start: String, end: String },
}

/// Parse `H:MM` / `HH:MM` into minutes after midnight.
pub fn parse_minutes(value: &str) -> Option<u32> {
    let (hours, minutes) = value.trim().split_once(':')?;
    let hours: u32 = hours.trim().parse().ok()?;
    let minutes: u32 = minutes.trim().parse().ok()?;
    (hours < 24 && minutes < 60).then_some(hours * 60 + minutes)
}

/// Check a policy before it is saved. Rules run in order; first failure wins.
pub fn validate_cost_center_policy(policy: &CostCenterPolicy) -> Result<(), PolicyError> {
    if policy.allowed_categories.iter().all(|c| c.trim().is_empty()) {
        return Err(PolicyError::NoCategories);
    }

    let limit = policy.spending_limit_per_ride;
    if !limit.is_finite() || limit <= 0.0 {
        return Err(PolicyError::InvalidSpendingLimit);
    }

    if let Some(hours) = &policy.business_hours {
        if hours.start.trim().is_empty() || hours.end.trim().is_empty() {
            return Err(PolicyError::MissingBusinessHours);
        }
        let start =
            parse_minutes(&hours.start).ok_or_else(|| PolicyError::InvalidTime(hours.start.clone()))?;
        let end = parse_minutes(&hours.end).ok_or_else(|| PolicyError::InvalidTime(hours.end.clone()))?;
        if start == end {
            return Err(PolicyError::EmptyBusinessWindow);
        }
    }

    Ok(())
}

/// Whether `at` falls inside the window.
///
/// No window, or a window with unparseable bounds, allows any time.
pub fn is_within_business_hours(at: NaiveTime, hours: Option<&BusinessHours>) -> bool {
    let Some(hours) = hours else { return true };
    let (Some(start), Some(end)) = (parse_minutes(&hours.start), parse_minutes(&hours.end)) else {
        return true;
    };

    let now = at.hour() * 60 + at.minute();
    if start <= end {
        now >= start && now <= end
    } else {
        now >= start || now <= end
    }
}

/// Check one ride request against a policy.
pub fn policy_allows_ride(
    policy: &CostCenterPolicy,
    category: &str,
    estimated_fare: f64,
    at: NaiveTime,
) -> Result<(), PolicyViolation> {
    let allowed = policy
        .allowed_categories
        .iter()
        .any(|c| c.trim().eq_ignore_ascii_case(category.trim()));
    if !allowed {
        return Err(PolicyViolation::CategoryNotAllowed(category.to_string()));
    }

    if estimated_fare > policy.spending_limit_per_ride {
        return Err(PolicyViolation::OverSpendingLimit {
            fare: estimated_fare,
            limit: policy.spending_limit_per_ride,
        });
    }

    if !is_within_business_hours(at, policy.business_hours.as_ref()) {
        // Unparseable bounds never reach here.
        let hours = policy.business_hours.clone().unwrap_or_else(|| BusinessHours::new("", ""));
        return Err(PolicyViolation::OutsideBusinessHours {
            start: hours.start,
            end: hours.end,
        });
    }

    Ok(())
}
