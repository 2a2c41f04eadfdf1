//! Collection orchestration.
//!
//! Drives the platform × country matrix: one collection run per unit,
//! bounded platform concurrency, failure isolation per unit and per item,
//! and a per-unit report for both trigger paths.

mod orchestrator;
mod report;

pub use orchestrator::Orchestrator;
pub use report::{UnitResult, UnitStatus};
