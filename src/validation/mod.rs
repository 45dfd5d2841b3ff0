//! Validation: per-entity reports and the chunked scheduler producing them

pub mod report;
pub mod scheduler;

pub use report::{EntityReport, RuleState};
pub use scheduler::{SchedulerState, Tick, ValidationScheduler};
