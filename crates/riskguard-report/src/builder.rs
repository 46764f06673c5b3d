//! Posture report generation
//!
//! [`PostureReportBuilder`] aggregates a consistent ledger snapshot into a
//! draft [`BoardReport`]. One canonical scoring formula lives here:
//!
//! ```text
//! score = 100 - critical * W_critical - warning * W_warning, clamped to [0, 100]
//! ```
//!
//! Generation is read-only against the ledger (no per-key locks held) and
//! deterministic for a given snapshot; it can be cancelled at any point
//! without side effects because nothing is written until the report is
//! assembled.

use crate::error::ReportError;
use crate::report::{BoardReport, BreachCounts, ReportId, ReportStatus, ReportType};
use chrono::{DateTime, Utc};
use riskguard_engine::{BreachLedger, BreachRecord, ResolutionStatus, Severity};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Score penalties per breach, by band
///
/// Every instance satisfies `critical > warning > 0`: [`ScoreWeights::new`]
/// and deserialization both reject anything else, so holders never need to
/// re-validate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawScoreWeights")]
pub struct ScoreWeights {
    critical: f64,
    warning: f64,
}

impl ScoreWeights {
    /// Create weights, enforcing `critical > warning > 0`
    ///
    /// # Errors
    /// [`ReportError::InvalidWeights`] when the ordering does not hold.
    pub fn new(critical: f64, warning: f64) -> Result<Self, ReportError> {
        if !(critical.is_finite() && warning.is_finite()) || warning <= 0.0 || critical <= warning {
            return Err(ReportError::InvalidWeights(format!(
                "require critical > warning > 0, got critical={critical}, warning={warning}"
            )));
        }
        Ok(Self { critical, warning })
    }

    /// Penalty per critical breach
    #[inline]
    #[must_use]
    pub fn critical(&self) -> f64 {
        self.critical
    }

    /// Penalty per warning-band breach
    #[inline]
    #[must_use]
    pub fn warning(&self) -> f64 {
        self.warning
    }
}

/// Wire shape for [`ScoreWeights`]; missing fields fall back to the defaults
/// before the ordering check runs.
#[derive(Deserialize)]
#[serde(default)]
struct RawScoreWeights {
    critical: f64,
    warning: f64,
}

impl Default for RawScoreWeights {
    fn default() -> Self {
        let defaults = ScoreWeights::default();
        Self {
            critical: defaults.critical,
            warning: defaults.warning,
        }
    }
}

impl TryFrom<RawScoreWeights> for ScoreWeights {
    type Error = ReportError;

    fn try_from(raw: RawScoreWeights) -> Result<Self, Self::Error> {
        Self::new(raw.critical, raw.warning)
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            critical: 15.0,
            warning: 5.0,
        }
    }
}

/// Builds draft board reports from ledger snapshots
#[derive(Debug, Clone, Default)]
pub struct PostureReportBuilder {
    weights: ScoreWeights,
}

impl PostureReportBuilder {
    /// Builder with the default weights
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder with custom weights
    ///
    /// [`ScoreWeights`] can only be obtained validated, so no further check
    /// is needed here.
    #[inline]
    #[must_use]
    pub fn with_weights(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    /// The active weights
    #[inline]
    #[must_use]
    pub fn weights(&self) -> ScoreWeights {
        self.weights
    }

    /// Generate a draft report for `[start, end]`
    ///
    /// # Errors
    /// [`ReportError::InvalidPeriod`] when `start > end`. An empty period
    /// is not an error: it yields zero counts and a score of 100.
    pub fn build(
        &self,
        ledger: &BreachLedger,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        report_type: ReportType,
    ) -> Result<BoardReport, ReportError> {
        if start > end {
            return Err(ReportError::InvalidPeriod { start, end });
        }

        let snapshot = ledger.snapshot_in_period(start, end);
        let counts = Self::count(&snapshot);
        let score = self.score(&counts);
        let resolution_rate = Self::resolution_rate(&counts);

        let report = BoardReport {
            id: ReportId::new(),
            report_period_start: start,
            report_period_end: end,
            report_type,
            risk_posture_score: score,
            counts,
            resolution_rate,
            key_findings: Self::findings(&counts, resolution_rate),
            recommendations: Self::recommendations(&counts, score),
            status: ReportStatus::Draft,
            generated_at: Utc::now(),
            approved_by: None,
            approved_at: None,
        };

        info!(
            report = %report.id,
            period_start = %start,
            period_end = %end,
            total = counts.total,
            critical = counts.critical,
            warning = counts.warning,
            score,
            "board report generated"
        );
        Ok(report)
    }

    fn count(snapshot: &[BreachRecord]) -> BreachCounts {
        let mut counts = BreachCounts {
            total: snapshot.len(),
            ..BreachCounts::default()
        };
        for record in snapshot {
            match record.severity {
                Severity::Critical => counts.critical += 1,
                Severity::Breach | Severity::Warning => counts.warning += 1,
            }
            if record.resolution_status == ResolutionStatus::Resolved {
                counts.resolved += 1;
            }
        }
        counts
    }

    fn score(&self, counts: &BreachCounts) -> f64 {
        let raw = 100.0
            - counts.critical as f64 * self.weights.critical
            - counts.warning as f64 * self.weights.warning;
        raw.clamp(0.0, 100.0)
    }

    /// An empty period is fully compliant by definition, not an error.
    fn resolution_rate(counts: &BreachCounts) -> f64 {
        if counts.total == 0 {
            100.0
        } else {
            counts.resolved as f64 / counts.total as f64 * 100.0
        }
    }

    fn findings(counts: &BreachCounts, resolution_rate: f64) -> Vec<String> {
        if counts.total == 0 {
            return vec!["no appetite breaches recorded in the period".to_string()];
        }
        let mut findings = vec![format!(
            "{} appetite breach(es) recorded: {} critical, {} warning-band",
            counts.total, counts.critical, counts.warning
        )];
        findings.push(format!(
            "{} of {} breach(es) resolved ({resolution_rate:.1}% resolution rate)",
            counts.resolved, counts.total
        ));
        findings
    }

    fn recommendations(counts: &BreachCounts, score: f64) -> Vec<String> {
        let mut recs = Vec::new();
        if counts.critical > 0 {
            recs.push(
                "review critical breaches with the risk committee and confirm escalation ownership"
                    .to_string(),
            );
        }
        if counts.resolved < counts.total {
            recs.push(format!(
                "{} breach(es) remain unresolved; agree remediation plans and target dates",
                counts.total - counts.resolved
            ));
        }
        if score < 60.0 {
            recs.push(
                "posture score below tolerance; reassess appetite thresholds with the board"
                    .to_string(),
            );
        }
        if recs.is_empty() {
            recs.push("maintain current monitoring cadence".to_string());
        }
        recs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use riskguard_catalog::{CategoryId, MetricKey};

    fn period() -> (DateTime<Utc>, DateTime<Utc>) {
        let end = Utc::now();
        (end - Duration::days(7), end)
    }

    fn seed_ledger() -> BreachLedger {
        // 2 critical and 3 warning-band breaches, 2 of the 5 resolved.
        let ledger = BreachLedger::default();
        let category = CategoryId::new();
        let when = Utc::now() - Duration::days(1);

        for (i, severity) in [Severity::Critical, Severity::Critical].iter().enumerate() {
            ledger
                .open_breach(
                    MetricKey::new(category, format!("critical-{i}")),
                    130.0,
                    100.0,
                    *severity,
                    when,
                )
                .unwrap();
        }
        let mut warning_ids = Vec::new();
        for i in 0..3 {
            let id = ledger
                .open_breach(
                    MetricKey::new(category, format!("warning-{i}")),
                    112.0,
                    100.0,
                    Severity::Warning,
                    when,
                )
                .unwrap();
            warning_ids.push(id);
        }
        ledger.resolve(warning_ids[0], "restored").unwrap();
        ledger.resolve(warning_ids[1], "restored").unwrap();
        ledger
    }

    #[test]
    fn scenario_two_critical_three_warning_two_resolved() {
        let ledger = seed_ledger();
        let (start, end) = period();
        let report = PostureReportBuilder::new()
            .build(&ledger, start, end, ReportType::Weekly)
            .unwrap();

        // score = 100 - 2*15 - 3*5 = 55; rate = 2/5 = 40%
        assert_eq!(report.counts.total, 5);
        assert_eq!(report.counts.critical, 2);
        assert_eq!(report.counts.warning, 3);
        assert_eq!(report.counts.resolved, 2);
        assert_eq!(report.risk_posture_score, 55.0);
        assert_eq!(report.resolution_rate, 40.0);
        assert_eq!(report.status, ReportStatus::Draft);
    }

    #[test]
    fn empty_period_scores_one_hundred() {
        let ledger = BreachLedger::default();
        let (start, end) = period();
        let report = PostureReportBuilder::new()
            .build(&ledger, start, end, ReportType::Monthly)
            .unwrap();

        assert_eq!(report.counts, BreachCounts::default());
        assert_eq!(report.risk_posture_score, 100.0);
        assert_eq!(report.resolution_rate, 100.0);
        assert_eq!(
            report.key_findings,
            vec!["no appetite breaches recorded in the period".to_string()]
        );
    }

    #[test]
    fn score_clamps_at_zero() {
        let ledger = BreachLedger::default();
        let category = CategoryId::new();
        let when = Utc::now() - Duration::hours(1);
        for i in 0..10 {
            ledger
                .open_breach(
                    MetricKey::new(category, format!("m-{i}")),
                    150.0,
                    100.0,
                    Severity::Critical,
                    when,
                )
                .unwrap();
        }

        let (start, end) = period();
        let report = PostureReportBuilder::new()
            .build(&ledger, start, end, ReportType::Weekly)
            .unwrap();
        assert_eq!(report.risk_posture_score, 0.0);
    }

    #[test]
    fn generation_is_deterministic_for_a_snapshot() {
        let ledger = seed_ledger();
        let (start, end) = period();
        let builder = PostureReportBuilder::new();

        let a = builder.build(&ledger, start, end, ReportType::Weekly).unwrap();
        let b = builder.build(&ledger, start, end, ReportType::Weekly).unwrap();
        assert_eq!(a.counts, b.counts);
        assert_eq!(a.risk_posture_score, b.risk_posture_score);
        assert_eq!(a.resolution_rate, b.resolution_rate);
        assert_eq!(a.key_findings, b.key_findings);
        assert_eq!(a.recommendations, b.recommendations);
    }

    #[test]
    fn breaches_outside_the_period_are_excluded() {
        let ledger = BreachLedger::default();
        let category = CategoryId::new();
        ledger
            .open_breach(
                MetricKey::new(category, "stale"),
                130.0,
                100.0,
                Severity::Critical,
                Utc::now() - Duration::days(30),
            )
            .unwrap();

        let (start, end) = period();
        let report = PostureReportBuilder::new()
            .build(&ledger, start, end, ReportType::Weekly)
            .unwrap();
        assert_eq!(report.counts.total, 0);
        assert_eq!(report.risk_posture_score, 100.0);
    }

    #[test]
    fn inverted_period_is_rejected() {
        let ledger = BreachLedger::default();
        let (start, end) = period();
        let err = PostureReportBuilder::new()
            .build(&ledger, end, start, ReportType::Weekly)
            .unwrap_err();
        assert!(matches!(err, ReportError::InvalidPeriod { .. }));
    }

    #[test]
    fn weights_must_order_critical_above_warning() {
        assert!(ScoreWeights::new(15.0, 5.0).is_ok());
        assert!(ScoreWeights::new(5.0, 15.0).is_err());
        assert!(ScoreWeights::new(5.0, 5.0).is_err());
        assert!(ScoreWeights::new(5.0, 0.0).is_err());
    }

    #[test]
    fn deserialized_weights_are_validated() {
        let inverted = serde_json::from_str::<ScoreWeights>(r#"{"critical": 1.0, "warning": 50.0}"#);
        assert!(inverted.is_err());

        let ok: ScoreWeights = serde_json::from_str(r#"{"critical": 20.0, "warning": 2.5}"#).unwrap();
        assert_eq!(ok.critical(), 20.0);
        assert_eq!(ok.warning(), 2.5);
    }

    #[test]
    fn missing_weight_fields_fall_back_to_defaults() {
        let weights: ScoreWeights = serde_json::from_str("{}").unwrap();
        assert_eq!(weights, ScoreWeights::default());

        // A partial override still has to respect the ordering against the
        // defaulted field.
        let partial = serde_json::from_str::<ScoreWeights>(r#"{"critical": 3.0}"#);
        assert!(partial.is_err());
    }
}
