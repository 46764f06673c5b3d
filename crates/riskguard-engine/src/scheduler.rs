//! SLA-driven auto-escalation
//!
//! [`EscalationScheduler`] sweeps the ledger on a fixed interval and
//! escalates critical breaches that have sat in `Open` or `Acknowledged`
//! past the SLA budget without action. It is the only component allowed
//! to escalate without an explicit operator action, and it logs those
//! escalations with `trigger = "auto"` so audit can tell them apart.

use crate::config::EngineConfig;
use crate::events::EscalationTrigger;
use crate::ledger::BreachLedger;
use crate::notify::{EscalationNotice, LogNotifier, Notifier};
use crate::types::{BreachQuery, ResolutionStatus, Severity};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Outcome of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Records inspected
    pub examined: usize,
    /// Records auto-escalated
    pub escalated: usize,
    /// Records whose escalation failed (logged, sweep continued)
    pub failed: usize,
}

/// Periodic sweeper over unactioned critical breaches
pub struct EscalationScheduler {
    ledger: Arc<BreachLedger>,
    interval: Duration,
    sla_budget: chrono::Duration,
    notifier: Arc<dyn Notifier>,
}

impl EscalationScheduler {
    /// Create a scheduler from engine configuration
    #[must_use]
    pub fn new(ledger: Arc<BreachLedger>, config: &EngineConfig) -> Self {
        Self {
            ledger,
            interval: config.sweep_interval(),
            sla_budget: config.sla_budget(),
            notifier: Arc::new(LogNotifier),
        }
    }

    /// Replace the notification collaborator
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Sweep once at the given instant
    ///
    /// A failure on one record never aborts the sweep for the rest; it is
    /// logged, counted, and the sweep moves on.
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> SweepReport {
        let candidates = self
            .ledger
            .query(&BreachQuery::all().with_severity(Severity::Critical).unresolved());

        let mut report = SweepReport::default();
        for record in candidates {
            // In-progress records already have an owner; only unactioned
            // states are swept.
            if !matches!(
                record.resolution_status,
                ResolutionStatus::Open | ResolutionStatus::Acknowledged
            ) {
                continue;
            }
            report.examined += 1;

            if now - record.sla_clock_start() < self.sla_budget {
                continue;
            }

            match self.ledger.escalate(record.id, EscalationTrigger::Auto) {
                Ok(outcome) => {
                    report.escalated += 1;
                    info!(breach = %record.id, metric = %record.metric,
                          level = %outcome.level, trigger = "auto",
                          "sla budget exceeded, breach auto-escalated");
                    if let Some(target) = outcome.target {
                        self.notifier
                            .notify(EscalationNotice {
                                breach_id: record.id,
                                metric: record.metric.clone(),
                                level: outcome.level,
                                target,
                                message: format!(
                                    "critical breach of {} unactioned past SLA (variance {:+.1}%)",
                                    record.metric, record.variance_percentage
                                ),
                            })
                            .await;
                    }
                }
                Err(err) => {
                    // A racing resolve can land between the snapshot and
                    // the escalation; isolate and keep sweeping.
                    report.failed += 1;
                    warn!(breach = %record.id, error = %err, "auto-escalation skipped");
                }
            }
        }
        report
    }

    /// Run the sweep loop until the shutdown signal flips to `true`
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(interval_secs = self.interval.as_secs(), "escalation scheduler started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.sweep_once(Utc::now()).await;
                    if report.examined > 0 {
                        info!(
                            examined = report.examined,
                            escalated = report.escalated,
                            failed = report.failed,
                            "escalation sweep complete"
                        );
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("escalation scheduler stopping");
                        break;
                    }
                }
            }
        }
    }
}
