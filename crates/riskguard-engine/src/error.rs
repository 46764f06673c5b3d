//! Error types for the breach engine
//!
//! Mirrors the engine's error taxonomy:
//! - configuration gaps (recovered locally by the evaluator)
//! - invariant violations (duplicate open breach)
//! - invalid lifecycle transitions
//! - unknown record ids
//!
//! Nothing here is fatal to the process; every error is per-operation.

use crate::types::{BreachId, ResolutionStatus};
use riskguard_catalog::MetricKey;

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No threshold definition configured for the metric
    ///
    /// The evaluator recovers from this locally (skip, log, count); it is
    /// surfaced only when a caller asks for a definition directly.
    #[error("no threshold definition for metric {0}")]
    MissingThreshold(MetricKey),

    /// A second open breach was attempted for a metric
    #[error("open breach already exists for metric {metric} (id {existing})")]
    DuplicateOpenBreach {
        /// Metric with the existing open record
        metric: MetricKey,
        /// The record already open
        existing: BreachId,
    },

    /// Transition not permitted from the record's current status
    #[error("invalid transition: cannot {action} a {from} breach")]
    InvalidTransition {
        /// Current status of the record
        from: ResolutionStatus,
        /// Attempted action name
        action: &'static str,
    },

    /// Resolve called on an already-resolved record
    ///
    /// Distinct from [`EngineError::InvalidTransition`] so callers can
    /// tell "notes would be overwritten" apart from ordinary misuse.
    #[error("breach {0} already resolved")]
    AlreadyResolved(BreachId),

    /// Unknown breach id
    #[error("breach not found: {0}")]
    BreachNotFound(BreachId),
}

impl EngineError {
    /// Whether the operation was rejected without mutating any record
    #[inline]
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::DuplicateOpenBreach { .. }
                | Self::InvalidTransition { .. }
                | Self::AlreadyResolved(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskguard_catalog::CategoryId;

    #[test]
    fn display_messages() {
        let err = EngineError::InvalidTransition {
            from: ResolutionStatus::Resolved,
            action: "acknowledge",
        };
        assert_eq!(
            err.to_string(),
            "invalid transition: cannot acknowledge a resolved breach"
        );

        let id = BreachId::new();
        assert!(EngineError::AlreadyResolved(id)
            .to_string()
            .contains("already resolved"));
        assert!(EngineError::MissingThreshold(MetricKey::new(CategoryId::new(), "m"))
            .to_string()
            .contains("no threshold definition"));
    }

    #[test]
    fn rejections_are_flagged() {
        assert!(EngineError::AlreadyResolved(BreachId::new()).is_rejection());
        assert!(!EngineError::BreachNotFound(BreachId::new()).is_rejection());
    }
}
