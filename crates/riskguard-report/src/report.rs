//! Board report types
//!
//! A [`BoardReport`] is a plain data artifact: the rendering/printing
//! collaborator lays it out, the engine only aggregates. Once a report
//! leaves `Draft` everything but the approval metadata is immutable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique report identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportId(Uuid);

impl ReportId {
    /// Generate a new random report ID
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

impl Default for ReportId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reporting cadence the period corresponds to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    /// One calendar week
    Weekly,
    /// One calendar month
    Monthly,
    /// One quarter
    Quarterly,
    /// One year
    Annual,
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Annual => "annual",
        };
        write!(f, "{s}")
    }
}

/// Report approval lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Freshly generated, still editable
    Draft,
    /// Submitted, awaiting sign-off
    PendingApproval,
    /// Signed off
    Approved,
    /// Distributed
    Published,
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "draft",
            Self::PendingApproval => "pending_approval",
            Self::Approved => "approved",
            Self::Published => "published",
        };
        write!(f, "{s}")
    }
}

/// Breach counts aggregated over a report period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreachCounts {
    /// All breaches dated in the period
    pub total: usize,
    /// Critical-band breaches
    pub critical: usize,
    /// Warning-band breaches
    pub warning: usize,
    /// Breaches resolved (whenever the resolution happened)
    pub resolved: usize,
}

/// Aggregated risk-posture report for one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardReport {
    /// Report identity
    pub id: ReportId,
    /// Period start (inclusive)
    pub report_period_start: DateTime<Utc>,
    /// Period end (inclusive)
    pub report_period_end: DateTime<Utc>,
    /// Reporting cadence
    pub report_type: ReportType,
    /// 0–100 aggregate health score; 100 is fully within appetite
    pub risk_posture_score: f64,
    /// Breach counts backing the score
    pub counts: BreachCounts,
    /// Share of the period's breaches that were resolved, in percent
    pub resolution_rate: f64,
    /// Narrative findings derived from the aggregates
    pub key_findings: Vec<String>,
    /// Suggested actions derived from the aggregates
    pub recommendations: Vec<String>,
    /// Approval lifecycle state
    pub status: ReportStatus,
    /// When the report was generated
    pub generated_at: DateTime<Utc>,
    /// Who approved it (approval metadata, mutable past draft)
    pub approved_by: Option<String>,
    /// When it was approved
    pub approved_at: Option<DateTime<Utc>>,
}

impl BoardReport {
    /// Whether the report can still be regenerated or edited
    #[inline]
    #[must_use]
    pub fn is_draft(&self) -> bool {
        matches!(self.status, ReportStatus::Draft)
    }
}
