//! Cell coercion under a sentinel policy.
//!
//! Government sheets mix real counts with placeholder tokens: `c` for
//! suppressed small counts in registrations, `-` for no value in charge
//! point tables, and blank cells. [`classify`] keeps those cases apart;
//! [`coerce`] collapses them into an integer using the policy's fill value.

use ev_map_tidy_models::schema::SentinelPolicy;
use ev_map_tidy_models::{Cell, ValueOrigin};

use crate::TidyError;

/// A classified cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reading {
    /// A real number.
    Value(i64),
    /// One of the policy's sentinel tokens.
    Suppressed(String),
    /// A blank cell.
    Missing,
}

impl Reading {
    /// Collapses the reading into a value and its origin.
    #[must_use]
    pub fn resolve(&self, policy: &SentinelPolicy) -> (i64, ValueOrigin) {
        match self {
            Self::Value(v) => (*v, ValueOrigin::Observed),
            Self::Suppressed(_) => (policy.fill_value, ValueOrigin::Suppressed),
            Self::Missing => (policy.fill_value, ValueOrigin::Missing),
        }
    }
}

/// Classifies a cell without substituting anything.
///
/// Text is trimmed and `,` thousands separators are dropped before
/// parsing. Decimal text and numeric cells are truncated toward zero
/// (per-100k averages are published with decimals).
///
/// # Errors
///
/// Returns [`TidyError::InvalidValue`] (with `row` 0 and an empty column;
/// callers that know the position use [`coerce_at`]) when the cell is not
/// a number, not a sentinel, and not an allowed blank.
pub fn classify(cell: &Cell, policy: &SentinelPolicy) -> Result<Reading, TidyError> {
    classify_at(cell, policy, 0, "")
}

/// Coerces a cell to an integer, mapping sentinels and blanks to the
/// policy's fill value.
///
/// # Errors
///
/// Returns [`TidyError::InvalidValue`] when the cell cannot be coerced.
pub fn coerce(cell: &Cell, policy: &SentinelPolicy) -> Result<i64, TidyError> {
    Ok(classify(cell, policy)?.resolve(policy).0)
}

/// Like [`coerce`], but reports the cell position on failure and returns
/// the value origin alongside the value.
///
/// # Errors
///
/// Returns [`TidyError::InvalidValue`] naming `row` and `column`.
pub fn coerce_at(
    cell: &Cell,
    policy: &SentinelPolicy,
    row: usize,
    column: &str,
) -> Result<(i64, ValueOrigin), TidyError> {
    Ok(classify_at(cell, policy, row, column)?.resolve(policy))
}

fn classify_at(
    cell: &Cell,
    policy: &SentinelPolicy,
    row: usize,
    column: &str,
) -> Result<Reading, TidyError> {
    let invalid = || TidyError::InvalidValue {
        row,
        column: column.to_string(),
        raw: cell.to_text(),
    };

    match cell {
        Cell::Empty => {
            if policy.missing_is_sentinel {
                Ok(Reading::Missing)
            } else {
                Err(invalid())
            }
        }
        Cell::Number(n) => truncate(*n).map(Reading::Value).ok_or_else(invalid),
        Cell::Text(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return if policy.missing_is_sentinel {
                    Ok(Reading::Missing)
                } else {
                    Err(invalid())
                };
            }
            if let Some(token) = policy.tokens.iter().find(|t| t.trim() == trimmed) {
                return Ok(Reading::Suppressed(token.clone()));
            }
            parse_integer(trimmed)
                .map(Reading::Value)
                .ok_or_else(invalid)
        }
    }
}

fn parse_integer(s: &str) -> Option<i64> {
    let cleaned = s.replace(',', "");
    if let Ok(v) = cleaned.parse::<i64>() {
        return Some(v);
    }
    truncate(cleaned.parse::<f64>().ok()?)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn truncate(n: f64) -> Option<i64> {
    if !n.is_finite() || n >= i64::MAX as f64 || n <= i64::MIN as f64 {
        return None;
    }
    Some(n.trunc() as i64)
}
