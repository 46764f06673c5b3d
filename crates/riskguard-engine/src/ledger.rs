//! The breach ledger
//!
//! [`BreachLedger`] owns every [`BreachRecord`] and is the only place
//! records are mutated. Two maps back it:
//!
//! - `records`: all records ever created (append-only audit trail)
//! - `open_index`: metric key → the one record that is not yet resolved
//!
//! The single-open-breach-per-metric invariant is enforced by routing
//! every create and resolve through the `open_index` entry lock for the
//! key, which serializes writers on the same metric while leaving other
//! metrics fully parallel. Acknowledge/escalate mutate one record under
//! its shard lock, so each transition is a single atomic update.

use crate::config::EscalationRoute;
use crate::error::EngineError;
use crate::events::{BreachEvent, EscalationTrigger};
use crate::types::{
    BreachId, BreachQuery, BreachRecord, EscalationLevel, ResolutionStatus, Severity,
};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use riskguard_catalog::MetricKey;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// How a breaching measurement landed in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreachDisposition {
    /// A new record was created
    Opened(BreachId),
    /// An existing open record absorbed the measurement
    Updated(BreachId),
}

impl BreachDisposition {
    /// The affected record
    #[inline]
    #[must_use]
    pub fn breach_id(self) -> BreachId {
        match self {
            Self::Opened(id) | Self::Updated(id) => id,
        }
    }
}

/// Result of one escalation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationOutcome {
    /// Affected record
    pub breach_id: BreachId,
    /// Level after the escalation
    pub level: EscalationLevel,
    /// True when the record was already at board level and was re-notified
    pub re_notified: bool,
    /// Identity the escalation is addressed to
    pub target: Option<String>,
}

/// The set of breach records and their lifecycle transitions
#[derive(Debug)]
pub struct BreachLedger {
    records: DashMap<BreachId, BreachRecord>,
    open_index: DashMap<MetricKey, BreachId>,
    route: EscalationRoute,
    events: broadcast::Sender<BreachEvent>,
}

impl BreachLedger {
    /// Create a ledger with the given escalation route and event capacity
    #[must_use]
    pub fn new(route: EscalationRoute, event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            records: DashMap::new(),
            open_index: DashMap::new(),
            route,
            events,
        }
    }

    /// Subscribe to breach change events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BreachEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: BreachEvent) {
        // No subscribers is fine; events are advisory.
        let _ = self.events.send(event);
    }

    /// Record a breaching measurement, creating or updating the open record
    ///
    /// This is the evaluator's write path. If the metric already has an
    /// open record, the measurement is folded into it (variance and
    /// severity recomputed); a second open record is never created.
    ///
    /// # Errors
    /// [`EngineError::BreachNotFound`] if the open index points at a
    /// record that no longer exists (cannot happen through this API).
    pub fn record_breach(
        &self,
        metric: MetricKey,
        actual_value: f64,
        appetite_value: f64,
        severity: Severity,
        measured_at: DateTime<Utc>,
    ) -> Result<BreachDisposition, EngineError> {
        match self.open_index.entry(metric) {
            Entry::Occupied(slot) => {
                let id = *slot.get();
                let mut record = self
                    .records
                    .get_mut(&id)
                    .ok_or(EngineError::BreachNotFound(id))?;
                record.apply_measurement(actual_value, appetite_value, severity);
                let event = BreachEvent::Updated {
                    breach_id: id,
                    metric: record.metric.clone(),
                    severity: record.severity,
                    variance: record.variance_percentage,
                };
                debug!(breach = %id, metric = %record.metric, severity = %record.severity,
                       variance = record.variance_percentage, "open breach updated");
                drop(record);
                self.emit(event);
                Ok(BreachDisposition::Updated(id))
            }
            Entry::Vacant(slot) => {
                let record = BreachRecord::open(
                    slot.key().clone(),
                    actual_value,
                    appetite_value,
                    severity,
                    measured_at,
                );
                let id = record.id;
                let event = BreachEvent::Opened {
                    breach_id: id,
                    metric: record.metric.clone(),
                    severity: record.severity,
                    variance: record.variance_percentage,
                };
                info!(breach = %id, metric = %record.metric, severity = %record.severity,
                      variance = record.variance_percentage, "breach opened");
                self.records.insert(id, record);
                slot.insert(id);
                self.emit(event);
                Ok(BreachDisposition::Opened(id))
            }
        }
    }

    /// Open a breach record directly, rejecting duplicates
    ///
    /// Unlike [`BreachLedger::record_breach`] this is the strict surface:
    /// an existing open record for the metric is an invariant violation,
    /// surfaced to the caller rather than folded in.
    ///
    /// # Errors
    /// [`EngineError::DuplicateOpenBreach`] if the metric already has an
    /// unresolved record.
    pub fn open_breach(
        &self,
        metric: MetricKey,
        actual_value: f64,
        appetite_value: f64,
        severity: Severity,
        measured_at: DateTime<Utc>,
    ) -> Result<BreachId, EngineError> {
        match self.open_index.entry(metric) {
            Entry::Occupied(slot) => Err(EngineError::DuplicateOpenBreach {
                metric: slot.key().clone(),
                existing: *slot.get(),
            }),
            Entry::Vacant(slot) => {
                let record = BreachRecord::open(
                    slot.key().clone(),
                    actual_value,
                    appetite_value,
                    severity,
                    measured_at,
                );
                let id = record.id;
                let event = BreachEvent::Opened {
                    breach_id: id,
                    metric: record.metric.clone(),
                    severity: record.severity,
                    variance: record.variance_percentage,
                };
                info!(breach = %id, metric = %record.metric, severity = %record.severity,
                      variance = record.variance_percentage, "breach opened");
                self.records.insert(id, record);
                slot.insert(id);
                self.emit(event);
                Ok(id)
            }
        }
    }

    /// Acknowledge an open breach
    ///
    /// Valid only from `Open`. Repeating the acknowledgment is a no-op;
    /// any other state is rejected.
    ///
    /// # Errors
    /// - [`EngineError::BreachNotFound`] for an unknown id
    /// - [`EngineError::InvalidTransition`] from `InProgress` or `Resolved`
    pub fn acknowledge(&self, breach_id: BreachId) -> Result<(), EngineError> {
        let mut record = self
            .records
            .get_mut(&breach_id)
            .ok_or(EngineError::BreachNotFound(breach_id))?;
        match record.resolution_status {
            ResolutionStatus::Open => {
                record.resolution_status = ResolutionStatus::Acknowledged;
                drop(record);
                info!(breach = %breach_id, "breach acknowledged");
                self.emit(BreachEvent::Acknowledged { breach_id });
                Ok(())
            }
            // Already applied: idempotent no-op.
            ResolutionStatus::Acknowledged => Ok(()),
            from @ (ResolutionStatus::InProgress | ResolutionStatus::Resolved) => {
                Err(EngineError::InvalidTransition {
                    from,
                    action: "acknowledge",
                })
            }
        }
    }

    /// Escalate a breach one level
    ///
    /// Valid from any non-resolved status; acknowledgment is not a
    /// prerequisite. The level saturates at board; escalating a record
    /// already at board re-stamps `escalated_at` so persistent critical
    /// breaches keep re-alerting the board.
    ///
    /// # Errors
    /// - [`EngineError::BreachNotFound`] for an unknown id
    /// - [`EngineError::InvalidTransition`] from `Resolved`
    pub fn escalate(
        &self,
        breach_id: BreachId,
        trigger: EscalationTrigger,
    ) -> Result<EscalationOutcome, EngineError> {
        let mut record = self
            .records
            .get_mut(&breach_id)
            .ok_or(EngineError::BreachNotFound(breach_id))?;
        if record.resolution_status.is_terminal() {
            return Err(EngineError::InvalidTransition {
                from: record.resolution_status,
                action: "escalate",
            });
        }

        let re_notified = record.escalation_level.is_board();
        record.escalation_level = record.escalation_level.bumped();
        record.resolution_status = ResolutionStatus::InProgress;
        record.escalated_at = Some(Utc::now());
        let target = self
            .route
            .target(record.escalation_level)
            .map(ToOwned::to_owned);
        record.escalated_to = target.clone();
        let level = record.escalation_level;
        drop(record);

        info!(breach = %breach_id, level = %level, trigger = %trigger,
              target = target.as_deref().unwrap_or("-"), re_notified,
              "breach escalated");
        self.emit(BreachEvent::Escalated {
            breach_id,
            level,
            trigger,
            target: target.clone(),
        });

        Ok(EscalationOutcome {
            breach_id,
            level,
            re_notified,
            target,
        })
    }

    /// Resolve a breach, terminally
    ///
    /// Stamps the resolution date and notes and releases the metric's
    /// open slot. A second resolve is rejected (not a silent no-op):
    /// resolution notes must never be silently overwritten.
    ///
    /// # Errors
    /// - [`EngineError::BreachNotFound`] for an unknown id
    /// - [`EngineError::AlreadyResolved`] if already terminal
    pub fn resolve(&self, breach_id: BreachId, notes: impl Into<String>) -> Result<(), EngineError> {
        let metric = {
            let record = self
                .records
                .get(&breach_id)
                .ok_or(EngineError::BreachNotFound(breach_id))?;
            if record.resolution_status.is_terminal() {
                return Err(EngineError::AlreadyResolved(breach_id));
            }
            record.metric.clone()
        };

        // Serialize with evaluation/creation through the open-index entry
        // for the key, then re-check under that lock.
        match self.open_index.entry(metric) {
            Entry::Occupied(slot) if *slot.get() == breach_id => {
                let mut record = self
                    .records
                    .get_mut(&breach_id)
                    .ok_or(EngineError::BreachNotFound(breach_id))?;
                if record.resolution_status.is_terminal() {
                    return Err(EngineError::AlreadyResolved(breach_id));
                }
                record.resolution_status = ResolutionStatus::Resolved;
                record.resolution_date = Some(Utc::now());
                record.resolution_notes = Some(notes.into());
                drop(record);
                slot.remove();
            }
            // The index no longer points at this record: it was resolved
            // by a racing caller.
            _ => return Err(EngineError::AlreadyResolved(breach_id)),
        }

        info!(breach = %breach_id, "breach resolved");
        self.emit(BreachEvent::Resolved { breach_id });
        Ok(())
    }

    /// Attach a business-impact note to a non-resolved breach
    ///
    /// # Errors
    /// - [`EngineError::BreachNotFound`] for an unknown id
    /// - [`EngineError::InvalidTransition`] on a resolved record
    pub fn annotate_impact(
        &self,
        breach_id: BreachId,
        impact: impl Into<String>,
    ) -> Result<(), EngineError> {
        let mut record = self
            .records
            .get_mut(&breach_id)
            .ok_or(EngineError::BreachNotFound(breach_id))?;
        if record.resolution_status.is_terminal() {
            return Err(EngineError::InvalidTransition {
                from: record.resolution_status,
                action: "annotate",
            });
        }
        record.business_impact = Some(impact.into());
        Ok(())
    }

    /// Fetch a record by id
    #[must_use]
    pub fn get(&self, breach_id: BreachId) -> Option<BreachRecord> {
        self.records.get(&breach_id).map(|r| r.clone())
    }

    /// The unresolved record for a metric, if any
    #[must_use]
    pub fn open_breach_for(&self, metric: &MetricKey) -> Option<BreachId> {
        self.open_index.get(metric).map(|id| *id)
    }

    /// Filtered view of the ledger, ordered by breach date
    #[must_use]
    pub fn query(&self, query: &BreachQuery) -> Vec<BreachRecord> {
        let mut out: Vec<BreachRecord> = self
            .records
            .iter()
            .filter(|r| query.matches(r))
            .map(|r| r.clone())
            .collect();
        out.sort_by_key(|r| (r.breach_date, r.id.as_uuid()));
        out
    }

    /// Consistent clone-out of all records with a breach date in
    /// `[start, end]`, for report generation
    ///
    /// Holds no per-key lock across the scan; reporting never blocks
    /// evaluation or escalation.
    #[must_use]
    pub fn snapshot_in_period(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<BreachRecord> {
        self.query(&BreachQuery::all().with_period(start, end))
    }

    /// Number of unresolved records
    #[inline]
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.open_index.len()
    }

    /// Total records ever created
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the ledger has no records
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for BreachLedger {
    fn default() -> Self {
        Self::new(EscalationRoute::default(), 256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskguard_catalog::CategoryId;

    fn key() -> MetricKey {
        MetricKey::new(CategoryId::new(), "loss-ratio")
    }

    fn ledger() -> BreachLedger {
        BreachLedger::default()
    }

    #[test]
    fn record_breach_opens_then_updates() {
        let ledger = ledger();
        let metric = key();

        let first = ledger
            .record_breach(metric.clone(), 125.0, 100.0, Severity::Critical, Utc::now())
            .unwrap();
        let BreachDisposition::Opened(id) = first else {
            panic!("expected a new record");
        };

        let second = ledger
            .record_breach(metric.clone(), 140.0, 100.0, Severity::Critical, Utc::now())
            .unwrap();
        assert_eq!(second, BreachDisposition::Updated(id));

        let record = ledger.get(id).unwrap();
        assert_eq!(record.actual_value, 140.0);
        assert_eq!(record.variance_percentage, 40.0);
        assert_eq!(ledger.open_count(), 1);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn open_breach_rejects_duplicate() {
        let ledger = ledger();
        let metric = key();

        let id = ledger
            .open_breach(metric.clone(), 125.0, 100.0, Severity::Critical, Utc::now())
            .unwrap();
        let err = ledger
            .open_breach(metric.clone(), 130.0, 100.0, Severity::Critical, Utc::now())
            .unwrap_err();
        assert!(
            matches!(err, EngineError::DuplicateOpenBreach { existing, .. } if existing == id)
        );
        assert_eq!(ledger.open_count(), 1);
    }

    #[test]
    fn acknowledge_only_from_open() {
        let ledger = ledger();
        let id = ledger
            .open_breach(key(), 125.0, 100.0, Severity::Critical, Utc::now())
            .unwrap();

        ledger.acknowledge(id).unwrap();
        // Repeat is a no-op, not an error.
        ledger.acknowledge(id).unwrap();
        assert_eq!(
            ledger.get(id).unwrap().resolution_status,
            ResolutionStatus::Acknowledged
        );

        ledger.escalate(id, EscalationTrigger::Manual).unwrap();
        let err = ledger.acknowledge(id).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidTransition {
                from: ResolutionStatus::InProgress,
                ..
            }
        ));
    }

    #[test]
    fn escalation_progresses_and_saturates() {
        let ledger = ledger();
        let id = ledger
            .open_breach(key(), 125.0, 100.0, Severity::Critical, Utc::now())
            .unwrap();

        for expected in 1..=3u8 {
            let outcome = ledger.escalate(id, EscalationTrigger::Manual).unwrap();
            assert_eq!(outcome.level.as_u8(), expected);
            assert!(!outcome.re_notified);
        }

        let before = ledger.get(id).unwrap().escalated_at.unwrap();
        let fourth = ledger.escalate(id, EscalationTrigger::Manual).unwrap();
        assert_eq!(fourth.level, EscalationLevel::BOARD);
        assert!(fourth.re_notified);
        assert_eq!(fourth.target.as_deref(), Some("board"));
        // Board re-notification re-stamps escalated_at.
        let after = ledger.get(id).unwrap().escalated_at.unwrap();
        assert!(after >= before);
    }

    #[test]
    fn escalation_does_not_require_acknowledgment() {
        let ledger = ledger();
        let id = ledger
            .open_breach(key(), 125.0, 100.0, Severity::Critical, Utc::now())
            .unwrap();

        let outcome = ledger.escalate(id, EscalationTrigger::Manual).unwrap();
        assert_eq!(outcome.level, EscalationLevel::MANAGEMENT);
        assert_eq!(outcome.target.as_deref(), Some("management"));

        let record = ledger.get(id).unwrap();
        assert_eq!(record.resolution_status, ResolutionStatus::InProgress);
        assert_eq!(record.escalated_to.as_deref(), Some("management"));
        assert!(record.escalated_at.is_some());
    }

    #[test]
    fn resolve_is_terminal() {
        let ledger = ledger();
        let metric = key();
        let id = ledger
            .open_breach(metric.clone(), 125.0, 100.0, Severity::Critical, Utc::now())
            .unwrap();

        ledger.resolve(id, "limits re-hedged").unwrap();

        let record = ledger.get(id).unwrap();
        assert_eq!(record.resolution_status, ResolutionStatus::Resolved);
        assert_eq!(record.resolution_notes.as_deref(), Some("limits re-hedged"));
        assert!(record.resolution_date.is_some());
        assert_eq!(ledger.open_count(), 0);

        // Second resolve is rejected and the record unchanged.
        let err = ledger.resolve(id, "other notes").unwrap_err();
        assert!(matches!(err, EngineError::AlreadyResolved(_)));
        assert_eq!(
            ledger.get(id).unwrap().resolution_notes.as_deref(),
            Some("limits re-hedged")
        );

        // All other transitions rejected after resolution.
        assert!(ledger.acknowledge(id).is_err());
        assert!(ledger.escalate(id, EscalationTrigger::Manual).is_err());
        assert!(ledger.annotate_impact(id, "late note").is_err());
    }

    #[test]
    fn resolve_frees_slot_for_new_breach() {
        let ledger = ledger();
        let metric = key();
        let first = ledger
            .open_breach(metric.clone(), 125.0, 100.0, Severity::Critical, Utc::now())
            .unwrap();
        ledger.resolve(first, "done").unwrap();

        let second = ledger
            .open_breach(metric.clone(), 130.0, 100.0, Severity::Critical, Utc::now())
            .unwrap();
        assert_ne!(first, second);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.open_count(), 1);
    }

    #[test]
    fn query_filters_and_orders() {
        let ledger = ledger();
        let metric_a = key();
        let metric_b = MetricKey::new(metric_a.category_id, "var-95");

        let a = ledger
            .open_breach(metric_a, 125.0, 100.0, Severity::Critical, Utc::now())
            .unwrap();
        let b = ledger
            .open_breach(metric_b, 112.0, 100.0, Severity::Warning, Utc::now())
            .unwrap();
        ledger.resolve(b, "recovered").unwrap();

        let critical = ledger.query(&BreachQuery::all().with_severity(Severity::Critical));
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].id, a);

        let resolved = ledger.query(&BreachQuery::all().with_status(ResolutionStatus::Resolved));
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id, b);

        let unresolved = ledger.query(&BreachQuery::all().unresolved());
        assert_eq!(unresolved.len(), 1);
    }

    #[tokio::test]
    async fn events_are_broadcast() {
        let ledger = ledger();
        let mut rx = ledger.subscribe();

        let id = ledger
            .open_breach(key(), 125.0, 100.0, Severity::Critical, Utc::now())
            .unwrap();
        ledger.escalate(id, EscalationTrigger::Auto).unwrap();
        ledger.resolve(id, "done").unwrap();

        assert!(matches!(rx.recv().await.unwrap(), BreachEvent::Opened { breach_id, .. } if breach_id == id));
        match rx.recv().await.unwrap() {
            BreachEvent::Escalated {
                breach_id,
                level,
                trigger,
                target,
            } => {
                assert_eq!(breach_id, id);
                assert_eq!(level, EscalationLevel::MANAGEMENT);
                assert_eq!(trigger, EscalationTrigger::Auto);
                assert_eq!(target.as_deref(), Some("management"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(matches!(rx.recv().await.unwrap(), BreachEvent::Resolved { breach_id } if breach_id == id));
    }
}
