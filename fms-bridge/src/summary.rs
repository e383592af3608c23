//! Per-pass reporting
//!
//! A pass never aborts on a single vehicle's failure. Instead every vehicle gets
//! a [`VehicleReport`] and the pass returns them together in a [`PassSummary`].

use crate::types::{SyncError, Timestamp};
use std::fmt;

/// Which kind of pass produced a summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// First pass after startup: push everything and seed the cache
    Initial,
    /// Scheduled pass: push only what changed
    Recurring,
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncMode::Initial => write!(f, "initial"),
            SyncMode::Recurring => write!(f, "recurring"),
        }
    }
}

/// Result of processing one vehicle
#[derive(Debug, Clone, PartialEq)]
pub enum VehicleOutcome {
    /// Pushed without a prior cache entry; the cache is now seeded
    Seeded { status: i32 },
    /// Pushed because the status changed since the last delivery
    Pushed { status: i32, previous: i32 },
    /// Nothing pushed, the cached status is still current
    Unchanged { status: i32 },
    /// Fetch, translation, push or cache update failed
    Failed { error: SyncError },
}

impl VehicleOutcome {
    /// True if a status was delivered to the Target
    pub fn is_push(&self) -> bool {
        matches!(
            self,
            VehicleOutcome::Seeded { .. } | VehicleOutcome::Pushed { .. }
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, VehicleOutcome::Failed { .. })
    }
}

/// Outcome for one mapped vehicle
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleReport {
    pub source_id: String,
    pub target_id: String,
    pub outcome: VehicleOutcome,
}

/// Everything that happened during one pass
#[derive(Debug, Clone)]
pub struct PassSummary {
    pub mode: SyncMode,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
    /// One report per mapped vehicle, in mapping order
    pub reports: Vec<VehicleReport>,
}

impl PassSummary {
    /// Number of vehicles whose status was delivered
    pub fn pushed(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.is_push()).count()
    }

    pub fn unchanged(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, VehicleOutcome::Unchanged { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.is_failure()).count()
    }

    /// True if no vehicle failed
    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }

    /// Failed vehicles with their errors
    pub fn failures(&self) -> impl Iterator<Item = (&VehicleReport, &SyncError)> {
        self.reports.iter().filter_map(|report| match &report.outcome {
            VehicleOutcome::Failed { error } => Some((report, error)),
            _ => None,
        })
    }

    /// Report for a given Source id
    pub fn report_for(&self, source_id: &str) -> Option<&VehicleReport> {
        self.reports.iter().find(|r| r.source_id == source_id)
    }
}

impl fmt::Display for PassSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let elapsed = self.finished_at - self.started_at;
        write!(
            f,
            "{} sync of {} vehicle(s): {} pushed, {} unchanged, {} failed ({} ms)",
            self.mode,
            self.reports.len(),
            self.pushed(),
            self.unchanged(),
            self.failed(),
            elapsed.num_milliseconds()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    fn report(source_id: &str, outcome: VehicleOutcome) -> VehicleReport {
        VehicleReport {
            source_id: source_id.to_string(),
            target_id: format!("t-{}", source_id),
            outcome,
        }
    }

    #[test]
    fn test_summary_counters() {
        let now = Local::now();
        let summary = PassSummary {
            mode: SyncMode::Recurring,
            started_at: now,
            finished_at: now,
            reports: vec![
                report("a", VehicleOutcome::Seeded { status: 1 }),
                report("b", VehicleOutcome::Pushed { status: 3, previous: 2 }),
                report("c", VehicleOutcome::Unchanged { status: 2 }),
                report(
                    "d",
                    VehicleOutcome::Failed {
                        error: SyncError::Transport("refused".into()),
                    },
                ),
            ],
        };

        assert_eq!(summary.pushed(), 2);
        assert_eq!(summary.unchanged(), 1);
        assert_eq!(summary.failed(), 1);
        assert!(!summary.is_clean());

        let failures: Vec<&str> = summary.failures().map(|(r, _)| r.source_id.as_str()).collect();
        assert_eq!(failures, vec!["d"]);
        assert_eq!(summary.report_for("c").unwrap().target_id, "t-c");
    }

    #[test]
    fn test_summary_display() {
        let now = Local::now();
        let summary = PassSummary {
            mode: SyncMode::Initial,
            started_at: now,
            finished_at: now,
            reports: vec![report("a", VehicleOutcome::Seeded { status: 1 })],
        };

        let text = summary.to_string();
        assert!(text.starts_with("initial sync of 1 vehicle(s): 1 pushed, 0 unchanged, 0 failed"));
    }
}
