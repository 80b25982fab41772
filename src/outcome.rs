//! ═══════════════════════════════════════════════════════════════════════════════
//! OUTCOME — Tagged Analysis Results
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Every analysis routine returns an [`Analysis`]: either the success payload or
//! a structured reason why no number was computed. Consumers match exhaustively.
//!
//! Serialized form (for the report JSON):
//!   Success(T)              → T as-is
//!   InsufficientData{..}    → {"error": reason, "kind": "insufficient_data", ...}
//!   DegenerateVariance{..}  → {"error": reason, "kind": "degenerate_variance"}
//!   Invalid{..}             → {"error": reason, "kind": "invalid"}
//! ═══════════════════════════════════════════════════════════════════════════════

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::MythosError;

/// Minimum number of pair observations for any correlation-based routine
pub const MIN_PAIRS: usize = 10;

/// Reason string used whenever a pair set is below [`MIN_PAIRS`]
pub const INSUFFICIENT_PAIRS: &str = "Insufficient pairs";

/// Result of one analysis routine
#[derive(Debug, Clone, PartialEq)]
pub enum Analysis<T> {
    /// Computed payload
    Success(T),
    /// Below the routine's minimum sample count
    InsufficientData {
        reason: String,
        required: usize,
        found: usize,
    },
    /// Compared arrays lack variance, correlation undefined
    DegenerateVariance { reason: String },
    /// Arguments outside their domain (k < 2, p-value > 1, ...)
    Invalid { reason: String },
}

impl<T> Analysis<T> {
    pub fn insufficient(reason: impl Into<String>, required: usize, found: usize) -> Self {
        Analysis::InsufficientData {
            reason: reason.into(),
            required,
            found,
        }
    }

    /// The standard "too few pairs" outcome
    pub fn insufficient_pairs(found: usize) -> Self {
        Self::insufficient(INSUFFICIENT_PAIRS, MIN_PAIRS, found)
    }

    pub fn degenerate(reason: impl Into<String>) -> Self {
        Analysis::DegenerateVariance {
            reason: reason.into(),
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Analysis::Invalid {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Analysis::Success(_))
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            Analysis::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_success(self) -> Option<T> {
        match self {
            Analysis::Success(value) => Some(value),
            _ => None,
        }
    }

    /// Failure reason, `None` on success
    pub fn reason(&self) -> Option<&str> {
        match self {
            Analysis::Success(_) => None,
            Analysis::InsufficientData { reason, .. }
            | Analysis::DegenerateVariance { reason }
            | Analysis::Invalid { reason } => Some(reason),
        }
    }

    /// Stable tag for the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            Analysis::Success(_) => "success",
            Analysis::InsufficientData { .. } => "insufficient_data",
            Analysis::DegenerateVariance { .. } => "degenerate_variance",
            Analysis::Invalid { .. } => "invalid",
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Analysis<U> {
        self.and_then(|value| Analysis::Success(f(value)))
    }

    pub fn and_then<U, F: FnOnce(T) -> Analysis<U>>(self, f: F) -> Analysis<U> {
        match self {
            Analysis::Success(value) => f(value),
            Analysis::InsufficientData {
                reason,
                required,
                found,
            } => Analysis::InsufficientData {
                reason,
                required,
                found,
            },
            Analysis::DegenerateVariance { reason } => Analysis::DegenerateVariance { reason },
            Analysis::Invalid { reason } => Analysis::Invalid { reason },
        }
    }

    pub fn as_ref(&self) -> Analysis<&T> {
        match self {
            Analysis::Success(value) => Analysis::Success(value),
            Analysis::InsufficientData {
                reason,
                required,
                found,
            } => Analysis::InsufficientData {
                reason: reason.clone(),
                required: *required,
                found: *found,
            },
            Analysis::DegenerateVariance { reason } => Analysis::DegenerateVariance {
                reason: reason.clone(),
            },
            Analysis::Invalid { reason } => Analysis::Invalid {
                reason: reason.clone(),
            },
        }
    }

    /// Convert into an operational error for callers that require the payload
    pub fn into_result(self) -> Result<T, MythosError> {
        match self {
            Analysis::Success(value) => Ok(value),
            other => Err(MythosError::Analysis(format!(
                "{} ({})",
                other.reason().unwrap_or_default(),
                other.kind()
            ))),
        }
    }
}

/// Unwrap a successful [`Analysis`] or return its failure from the enclosing
/// function, re-typed for that function's payload.
macro_rules! try_analysis {
    ($outcome:expr) => {
        match $outcome {
            $crate::outcome::Analysis::Success(value) => value,
            $crate::outcome::Analysis::InsufficientData {
                reason,
                required,
                found,
            } => {
                return $crate::outcome::Analysis::InsufficientData {
                    reason,
                    required,
                    found,
                }
            }
            $crate::outcome::Analysis::DegenerateVariance { reason } => {
                return $crate::outcome::Analysis::DegenerateVariance { reason }
            }
            $crate::outcome::Analysis::Invalid { reason } => {
                return $crate::outcome::Analysis::Invalid { reason }
            }
        }
    };
}

pub(crate) use try_analysis;

impl<T: Serialize> Serialize for Analysis<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Analysis::Success(value) => value.serialize(serializer),
            Analysis::InsufficientData {
                reason,
                required,
                found,
            } => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("error", reason)?;
                map.serialize_entry("kind", "insufficient_data")?;
                map.serialize_entry("required", required)?;
                map.serialize_entry("found", found)?;
                map.end()
            }
            Analysis::DegenerateVariance { reason } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("error", reason)?;
                map.serialize_entry("kind", "degenerate_variance")?;
                map.end()
            }
            Analysis::Invalid { reason } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("error", reason)?;
                map.serialize_entry("kind", "invalid")?;
                map.end()
            }
        }
    }
}
