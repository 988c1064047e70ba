//! Read-only diagnostics and weighted embedding-health scoring
//! (spec §4.M). Generalizes the teacher's `SubsystemChecker` /
//! `HealthReporter` split (fixed subsystem list, `derive_overall`
//! worst-of-N) to the spec's 7 named embedding-health checks, each
//! weighted and summed into a single score instead of worst-of-N.

pub mod checks;
pub mod report;

pub use checks::{CheckResult, CheckStatus};
pub use report::{HealthReport, HealthReporter, OverallStatus};
