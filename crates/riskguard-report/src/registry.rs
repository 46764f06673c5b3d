//! Report registry and approval lifecycle
//!
//! Holds generated reports and walks them through
//! `Draft → PendingApproval → Approved → Published`. Everything but the
//! approval metadata becomes immutable the moment a report leaves draft.

use crate::error::ReportError;
use crate::report::{BoardReport, ReportId, ReportStatus};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::info;

/// In-process store of board reports
#[derive(Debug, Default)]
pub struct ReportRegistry {
    reports: RwLock<HashMap<ReportId, BoardReport>>,
}

impl ReportRegistry {
    /// Create an empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a generated report and return its id
    pub fn insert(&self, report: BoardReport) -> ReportId {
        let id = report.id;
        self.reports.write().insert(id, report);
        id
    }

    /// Fetch a report by id
    #[must_use]
    pub fn get(&self, id: ReportId) -> Option<BoardReport> {
        self.reports.read().get(&id).cloned()
    }

    /// Number of stored reports
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.reports.read().len()
    }

    /// Whether the registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reports.read().is_empty()
    }

    /// Replace the findings/recommendations of a draft
    ///
    /// # Errors
    /// - [`ReportError::NotFound`] for an unknown id
    /// - [`ReportError::WrongStatus`] once the report has left draft
    pub fn amend_draft(
        &self,
        id: ReportId,
        key_findings: Vec<String>,
        recommendations: Vec<String>,
    ) -> Result<(), ReportError> {
        let mut reports = self.reports.write();
        let report = reports.get_mut(&id).ok_or(ReportError::NotFound(id))?;
        if !report.is_draft() {
            return Err(ReportError::WrongStatus {
                status: report.status,
                action: "amend",
            });
        }
        report.key_findings = key_findings;
        report.recommendations = recommendations;
        Ok(())
    }

    /// Submit a draft for approval
    ///
    /// # Errors
    /// - [`ReportError::NotFound`] for an unknown id
    /// - [`ReportError::WrongStatus`] unless the report is a draft
    pub fn submit_for_approval(&self, id: ReportId) -> Result<(), ReportError> {
        self.transition(id, ReportStatus::Draft, ReportStatus::PendingApproval, "submit")
    }

    /// Approve a submitted report
    ///
    /// # Errors
    /// - [`ReportError::NotFound`] for an unknown id
    /// - [`ReportError::WrongStatus`] unless pending approval
    pub fn approve(&self, id: ReportId, approver: impl Into<String>) -> Result<(), ReportError> {
        let mut reports = self.reports.write();
        let report = reports.get_mut(&id).ok_or(ReportError::NotFound(id))?;
        if report.status != ReportStatus::PendingApproval {
            return Err(ReportError::WrongStatus {
                status: report.status,
                action: "approve",
            });
        }
        report.status = ReportStatus::Approved;
        report.approved_by = Some(approver.into());
        report.approved_at = Some(Utc::now());
        info!(report = %id, approver = report.approved_by.as_deref().unwrap_or("-"),
              "board report approved");
        Ok(())
    }

    /// Publish an approved report
    ///
    /// # Errors
    /// - [`ReportError::NotFound`] for an unknown id
    /// - [`ReportError::WrongStatus`] unless approved
    pub fn publish(&self, id: ReportId) -> Result<(), ReportError> {
        self.transition(id, ReportStatus::Approved, ReportStatus::Published, "publish")
    }

    fn transition(
        &self,
        id: ReportId,
        from: ReportStatus,
        to: ReportStatus,
        action: &'static str,
    ) -> Result<(), ReportError> {
        let mut reports = self.reports.write();
        let report = reports.get_mut(&id).ok_or(ReportError::NotFound(id))?;
        if report.status != from {
            return Err(ReportError::WrongStatus {
                status: report.status,
                action,
            });
        }
        report.status = to;
        info!(report = %id, status = %to, "board report status changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::PostureReportBuilder;
    use crate::report::ReportType;
    use chrono::Duration;
    use riskguard_engine::BreachLedger;

    fn draft_report() -> BoardReport {
        let ledger = BreachLedger::default();
        let end = Utc::now();
        PostureReportBuilder::new()
            .build(&ledger, end - Duration::days(7), end, ReportType::Weekly)
            .unwrap()
    }

    #[test]
    fn approval_lifecycle() {
        let registry = ReportRegistry::new();
        let id = registry.insert(draft_report());

        registry.submit_for_approval(id).unwrap();
        registry.approve(id, "chief-risk-officer").unwrap();
        registry.publish(id).unwrap();

        let report = registry.get(id).unwrap();
        assert_eq!(report.status, ReportStatus::Published);
        assert_eq!(report.approved_by.as_deref(), Some("chief-risk-officer"));
        assert!(report.approved_at.is_some());
    }

    #[test]
    fn non_draft_reports_are_immutable() {
        let registry = ReportRegistry::new();
        let id = registry.insert(draft_report());

        registry
            .amend_draft(id, vec!["manual note".to_string()], vec![])
            .unwrap();
        registry.submit_for_approval(id).unwrap();

        let err = registry
            .amend_draft(id, vec!["too late".to_string()], vec![])
            .unwrap_err();
        assert!(matches!(
            err,
            ReportError::WrongStatus {
                status: ReportStatus::PendingApproval,
                ..
            }
        ));
        assert_eq!(
            registry.get(id).unwrap().key_findings,
            vec!["manual note".to_string()]
        );
    }

    #[test]
    fn transitions_must_follow_the_ladder() {
        let registry = ReportRegistry::new();
        let id = registry.insert(draft_report());

        // Cannot approve or publish straight from draft.
        assert!(registry.approve(id, "cro").is_err());
        assert!(registry.publish(id).is_err());

        registry.submit_for_approval(id).unwrap();
        // Cannot resubmit or publish before approval.
        assert!(registry.submit_for_approval(id).is_err());
        assert!(registry.publish(id).is_err());
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let registry = ReportRegistry::new();
        let err = registry.submit_for_approval(ReportId::new()).unwrap_err();
        assert!(matches!(err, ReportError::NotFound(_)));
    }
}
