//! Breach change events
//!
//! Every successful ledger mutation emits a [`BreachEvent`] on a broadcast
//! channel. External observers (audit UI refresh, notification delivery)
//! subscribe instead of polling; the engine never delivers notifications
//! itself, it only emits the target identity and payload.

use crate::types::{BreachId, EscalationLevel, Severity};
use riskguard_catalog::MetricKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What caused an escalation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationTrigger {
    /// Explicit operator action
    Manual,
    /// Scheduler sweep over an expired SLA budget
    Auto,
}

impl fmt::Display for EscalationTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Manual => "manual",
            Self::Auto => "auto",
        };
        write!(f, "{s}")
    }
}

/// Ledger change notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BreachEvent {
    /// A new breach record was opened
    Opened {
        /// New record
        breach_id: BreachId,
        /// Breaching metric
        metric: MetricKey,
        /// Persisted severity
        severity: Severity,
        /// Signed variance percentage
        variance: f64,
    },
    /// An open record absorbed a newer breaching measurement
    Updated {
        /// Affected record
        breach_id: BreachId,
        /// Breaching metric
        metric: MetricKey,
        /// Persisted severity after the update
        severity: Severity,
        /// Signed variance percentage after the update
        variance: f64,
    },
    /// A record was acknowledged
    Acknowledged {
        /// Affected record
        breach_id: BreachId,
    },
    /// A record was escalated (or re-notified at board level)
    Escalated {
        /// Affected record
        breach_id: BreachId,
        /// Level after the escalation
        level: EscalationLevel,
        /// Manual or scheduler-driven
        trigger: EscalationTrigger,
        /// Identity the escalation is addressed to
        target: Option<String>,
    },
    /// A record reached its terminal state
    Resolved {
        /// Affected record
        breach_id: BreachId,
    },
}

impl BreachEvent {
    /// Record the event refers to
    #[must_use]
    pub fn breach_id(&self) -> BreachId {
        match self {
            Self::Opened { breach_id, .. }
            | Self::Updated { breach_id, .. }
            | Self::Acknowledged { breach_id }
            | Self::Escalated { breach_id, .. }
            | Self::Resolved { breach_id } => *breach_id,
        }
    }
}
