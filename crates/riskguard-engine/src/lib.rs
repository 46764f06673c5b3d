//! riskguard-engine - Risk Appetite Breach & Escalation Engine
//!
//! The core of the riskguard workspace:
//! - Compares measured risk metrics against organizational appetite
//! - Classifies the severity of any excursion in one place
//! - Tracks each excursion through an escalation lifecycle
//! - Auto-escalates unactioned critical breaches past their SLA budget
//!
//! # Example
//!
//! ```rust,ignore
//! use riskguard_engine::{EngineConfig, Measurement, RiskEngine};
//! use std::sync::Arc;
//!
//! let engine = RiskEngine::new(EngineConfig::new(), Arc::clone(&catalog));
//! match engine.evaluate(&Measurement::new(metric, 125.0))? {
//!     Evaluation::Breached { disposition, .. } => {
//!         engine.acknowledge(disposition.breach_id())?;
//!     }
//!     _ => {}
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod events;
pub mod ledger;
pub mod notify;
pub mod scheduler;
pub mod types;

// Re-exports for convenience
pub use config::{EngineConfig, EscalationRoute};
pub use engine::RiskEngine;
pub use error::EngineError;
pub use evaluator::{classify, BreachEvaluator, Evaluation};
pub use events::{BreachEvent, EscalationTrigger};
pub use ledger::{BreachDisposition, BreachLedger, EscalationOutcome};
pub use notify::{EscalationNotice, LogNotifier, Notifier};
pub use scheduler::{EscalationScheduler, SweepReport};
pub use types::{
    variance_percentage, BreachId, BreachQuery, BreachRecord, EscalationLevel, Measurement,
    ResolutionStatus, Severity,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the breach engine
    pub use crate::{
        BreachEvent, BreachId, BreachLedger, BreachQuery, BreachRecord, EngineConfig, EngineError,
        EscalationLevel, EscalationScheduler, Evaluation, Measurement, ResolutionStatus,
        RiskEngine, Severity,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
