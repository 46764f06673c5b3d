//! Core engine types
//!
//! - [`Measurement`] - one metric reading from the measurement source
//! - [`Severity`] - tagged severity carried end-to-end
//! - [`ResolutionStatus`] / [`EscalationLevel`] - breach lifecycle state
//! - [`BreachRecord`] - the append-only audit record of one excursion
//! - [`BreachQuery`] - filter for the query surface

use chrono::{DateTime, Utc};
use riskguard_catalog::{CategoryId, MetricKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique breach record identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BreachId(Uuid);

impl BreachId {
    /// Generate a new random breach ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID
    #[inline]
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for BreachId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BreachId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One metric reading supplied by the measurement source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Metric the reading belongs to
    pub metric: MetricKey,
    /// Measured value
    pub actual_value: f64,
    /// When the value was measured
    pub measured_at: DateTime<Utc>,
}

impl Measurement {
    /// Create a measurement taken now
    #[must_use]
    pub fn new(metric: MetricKey, actual_value: f64) -> Self {
        Self {
            metric,
            actual_value,
            measured_at: Utc::now(),
        }
    }

    /// Create a measurement with an explicit timestamp
    #[must_use]
    pub fn at(metric: MetricKey, actual_value: f64, measured_at: DateTime<Utc>) -> Self {
        Self {
            metric,
            actual_value,
            measured_at,
        }
    }
}

/// Breach severity, carried end-to-end
///
/// `Warning` is the advisory classification band; once persisted on a
/// record a warning-band excursion is stored as `Breach`, distinguishing
/// it from a pre-breach advisory. Ordering reflects seriousness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Advisory: within the warning band, not yet persisted
    Warning,
    /// Persisted warning-band excursion
    Breach,
    /// Critical-band excursion
    Critical,
}

impl Severity {
    /// Severity stored on a record for this classification
    #[inline]
    #[must_use]
    pub fn persisted(self) -> Self {
        match self {
            Self::Warning => Self::Breach,
            other => other,
        }
    }

    /// Whether this is a warning-band severity (advisory or persisted)
    #[inline]
    #[must_use]
    pub fn is_warning_band(self) -> bool {
        matches!(self, Self::Warning | Self::Breach)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Warning => "warning",
            Self::Breach => "breach",
            Self::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

/// Breach resolution lifecycle state
///
/// `Open → Acknowledged → InProgress → Resolved`, with direct
/// `Open → InProgress` (escalation) and `Open → Resolved` paths.
/// `Resolved` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    /// Newly created, awaiting triage
    Open,
    /// Seen by an operator, no remediation yet
    Acknowledged,
    /// Escalated, remediation underway
    InProgress,
    /// Terminal: remediated and closed
    Resolved,
}

impl ResolutionStatus {
    /// Whether further transitions are permitted
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved)
    }
}

impl fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Acknowledged => "acknowledged",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
        };
        write!(f, "{s}")
    }
}

/// Ordinal escalation stage, 0–3
///
/// Monotonically non-decreasing over a record's lifetime; saturates at
/// board level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EscalationLevel(u8);

impl EscalationLevel {
    /// Level 0: not yet escalated
    pub const INITIAL: Self = Self(0);
    /// Level 1: management
    pub const MANAGEMENT: Self = Self(1);
    /// Level 2: senior management
    pub const SENIOR_MANAGEMENT: Self = Self(2);
    /// Level 3: board (maximum)
    pub const BOARD: Self = Self(3);

    /// Numeric level
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }

    /// Next level, saturating at board
    #[inline]
    #[must_use]
    pub fn bumped(self) -> Self {
        Self(self.0.saturating_add(1).min(3))
    }

    /// Whether the board level has been reached
    #[inline]
    #[must_use]
    pub const fn is_board(self) -> bool {
        self.0 == 3
    }
}

impl Default for EscalationLevel {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl fmt::Display for EscalationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Signed variance of an actual value from appetite, in percent
///
/// The caller guarantees a non-zero appetite (catalog validation rejects
/// zero before a definition can exist).
#[inline]
#[must_use]
pub fn variance_percentage(actual_value: f64, appetite_value: f64) -> f64 {
    (actual_value - appetite_value) / appetite_value * 100.0
}

/// Append-only record of one appetite excursion
///
/// Created by the evaluator, mutated only through the ledger's named
/// transitions, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreachRecord {
    /// Record identity
    pub id: BreachId,
    /// Metric that breached
    pub metric: MetricKey,
    /// Timestamp of the measurement that triggered the record
    pub breach_date: DateTime<Utc>,
    /// Most recent breaching measurement
    pub actual_value: f64,
    /// Appetite at evaluation time
    pub appetite_value: f64,
    /// Signed percentage deviation, always derived from actual/appetite
    pub variance_percentage: f64,
    /// Persisted severity
    pub severity: Severity,
    /// Lifecycle state
    pub resolution_status: ResolutionStatus,
    /// Escalation stage
    pub escalation_level: EscalationLevel,
    /// When the record was last escalated
    pub escalated_at: Option<DateTime<Utc>>,
    /// Identity the breach was escalated to
    pub escalated_to: Option<String>,
    /// Operator-captured business impact
    pub business_impact: Option<String>,
    /// Notes captured at resolution
    pub resolution_notes: Option<String>,
    /// Set iff `resolution_status == Resolved`
    pub resolution_date: Option<DateTime<Utc>>,
}

impl BreachRecord {
    /// Create a fresh open record for a breaching measurement
    #[must_use]
    pub fn open(
        metric: MetricKey,
        actual_value: f64,
        appetite_value: f64,
        severity: Severity,
        breach_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: BreachId::new(),
            metric,
            breach_date,
            actual_value,
            appetite_value,
            variance_percentage: variance_percentage(actual_value, appetite_value),
            severity: severity.persisted(),
            resolution_status: ResolutionStatus::Open,
            escalation_level: EscalationLevel::INITIAL,
            escalated_at: None,
            escalated_to: None,
            business_impact: None,
            resolution_notes: None,
            resolution_date: None,
        }
    }

    /// Apply a newer breaching measurement to an open record
    ///
    /// Recomputes the variance from the new actual/appetite pair; the
    /// variance is never patched independently.
    pub(crate) fn apply_measurement(
        &mut self,
        actual_value: f64,
        appetite_value: f64,
        severity: Severity,
    ) {
        self.actual_value = actual_value;
        self.appetite_value = appetite_value;
        self.variance_percentage = variance_percentage(actual_value, appetite_value);
        self.severity = severity.persisted();
    }

    /// Reference timestamp for the escalation SLA clock
    #[inline]
    #[must_use]
    pub fn sla_clock_start(&self) -> DateTime<Utc> {
        self.escalated_at.unwrap_or(self.breach_date)
    }
}

/// Filter for the breach query surface
///
/// Unset fields match everything. Built with `with_*` setters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BreachQuery {
    /// Match a single resolution status
    pub status: Option<ResolutionStatus>,
    /// Match a single category
    pub category: Option<CategoryId>,
    /// Match a single severity
    pub severity: Option<Severity>,
    /// Breach date lower bound (inclusive)
    pub from: Option<DateTime<Utc>>,
    /// Breach date upper bound (inclusive)
    pub to: Option<DateTime<Utc>>,
    /// Only records that are not yet resolved
    pub unresolved_only: bool,
}

impl BreachQuery {
    /// Empty query matching all records
    #[inline]
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to one resolution status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: ResolutionStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restrict to one category
    #[inline]
    #[must_use]
    pub fn with_category(mut self, category: CategoryId) -> Self {
        self.category = Some(category);
        self
    }

    /// Restrict to one severity
    #[inline]
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Restrict the breach date to `[from, to]`
    #[inline]
    #[must_use]
    pub fn with_period(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    /// Drop resolved records from the result
    #[inline]
    #[must_use]
    pub fn unresolved(mut self) -> Self {
        self.unresolved_only = true;
        self
    }

    /// Whether a record passes the filter
    #[must_use]
    pub fn matches(&self, record: &BreachRecord) -> bool {
        if let Some(status) = self.status {
            if record.resolution_status != status {
                return false;
            }
        }
        if let Some(category) = self.category {
            if record.metric.category_id != category {
                return false;
            }
        }
        if let Some(severity) = self.severity {
            if record.severity != severity {
                return false;
            }
        }
        if let Some(from) = self.from {
            if record.breach_date < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if record.breach_date > to {
                return false;
            }
        }
        if self.unresolved_only && record.resolution_status.is_terminal() {
            return false;
        }
        true
    }
}
