//! Error types for report generation and approval

use crate::report::{ReportId, ReportStatus};
use chrono::{DateTime, Utc};

/// Report errors
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Unknown report id
    #[error("report not found: {0}")]
    NotFound(ReportId),

    /// Period start after end
    #[error("invalid report period: start {start} after end {end}")]
    InvalidPeriod {
        /// Requested start
        start: DateTime<Utc>,
        /// Requested end
        end: DateTime<Utc>,
    },

    /// Score weights failed validation
    #[error("invalid score weights: {0}")]
    InvalidWeights(String),

    /// Operation not permitted in the report's current status
    #[error("report is {status}; cannot {action}")]
    WrongStatus {
        /// Current status
        status: ReportStatus,
        /// Attempted action name
        action: &'static str,
    },
}
