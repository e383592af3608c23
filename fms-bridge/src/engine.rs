//! Sync engine
//!
//! Drives one pass over all mapped vehicles: fetch from the Source, consult the
//! change-detection cache, translate and push to the Target. Vehicles are
//! processed sequentially in mapping order, and a failure for one vehicle is
//! recorded in the pass summary without affecting the others.
//!
//! The cache is only written after the Target confirmed a push. A vehicle whose
//! push failed is therefore retried on the next pass.

use crate::cache::{ChangePolicy, StatusCache, StatusSnapshot};
use crate::client::{StatusSink, StatusSource};
use crate::mapping::{VehicleMapping, VehiclePair};
use crate::summary::{PassSummary, SyncMode, VehicleOutcome, VehicleReport};
use crate::translate::translate;
use crate::types::{Result, SourceStatus, SyncError};
use chrono::Local;
use std::sync::atomic::{AtomicBool, Ordering};

/// Synchronizes vehicle status from a [`StatusSource`] to a [`StatusSink`]
pub struct SyncEngine<S, T> {
    source: S,
    target: T,
    mapping: VehicleMapping,
    cache: StatusCache,
    policy: ChangePolicy,
    pass_active: AtomicBool,
}

impl<S, T> SyncEngine<S, T>
where
    S: StatusSource,
    T: StatusSink,
{
    /// Create an engine with an empty cache and the default change policy
    pub fn new(source: S, target: T, mapping: VehicleMapping) -> Self {
        Self {
            source,
            target,
            mapping,
            cache: StatusCache::new(),
            policy: ChangePolicy::default(),
            pass_active: AtomicBool::new(false),
        }
    }

    /// Builder method: set the change policy
    pub fn with_change_policy(mut self, policy: ChangePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn mapping(&self) -> &VehicleMapping {
        &self.mapping
    }

    pub fn cache(&self) -> &StatusCache {
        &self.cache
    }

    pub fn change_policy(&self) -> ChangePolicy {
        self.policy
    }

    /// Push every vehicle's current status and seed the cache
    ///
    /// No change detection is applied. A vehicle that is already seeded fails
    /// with `AlreadySeeded` instead of being overwritten.
    ///
    /// # Errors
    /// Only `PassInProgress`; per-vehicle errors are part of the summary.
    pub fn initial_sync(&self) -> Result<PassSummary> {
        log::info!(
            "Initial sync, vehicles: {}",
            self.mapping.source_ids().join(", ")
        );
        self.run_pass(SyncMode::Initial, |pair| self.initial_vehicle(pair))
    }

    /// Push only the vehicles whose status changed since the last delivery
    ///
    /// A vehicle without a cache entry (its initial sync failed) is pushed
    /// unconditionally and seeded, as the initial sync would have done.
    ///
    /// # Errors
    /// Only `PassInProgress`; per-vehicle errors are part of the summary.
    pub fn sync(&self) -> Result<PassSummary> {
        self.run_pass(SyncMode::Recurring, |pair| self.recurring_vehicle(pair))
    }

    fn run_pass<F>(&self, mode: SyncMode, mut step: F) -> Result<PassSummary>
    where
        F: FnMut(&VehiclePair) -> Result<VehicleOutcome>,
    {
        let _guard = PassGuard::acquire(&self.pass_active)?;
        let started_at = Local::now();
        let mut reports = Vec::with_capacity(self.mapping.len());

        for pair in &self.mapping {
            log::debug!("{} sync started for vehicle '{}'", mode, pair.source_id);

            let outcome = step(pair).unwrap_or_else(|error| {
                log::error!(
                    "{} sync failed for vehicle '{}' (target '{}'): {}",
                    mode,
                    pair.source_id,
                    pair.target_id,
                    error
                );
                VehicleOutcome::Failed { error }
            });

            reports.push(VehicleReport {
                source_id: pair.source_id.clone(),
                target_id: pair.target_id.clone(),
                outcome,
            });
        }

        let summary = PassSummary {
            mode,
            started_at,
            finished_at: Local::now(),
            reports,
        };

        if summary.is_clean() {
            log::info!("{}", summary);
        } else {
            log::warn!("{}", summary);
        }
        Ok(summary)
    }

    fn initial_vehicle(&self, pair: &VehiclePair) -> Result<VehicleOutcome> {
        if self.cache.contains(&pair.source_id) {
            return Err(SyncError::AlreadySeeded(pair.source_id.clone()));
        }

        let fetched = self.source.fetch_status(&pair.source_id)?;
        self.seed_vehicle(pair, &fetched)
    }

    fn recurring_vehicle(&self, pair: &VehiclePair) -> Result<VehicleOutcome> {
        let fetched = self.source.fetch_status(&pair.source_id)?;
        let current = StatusSnapshot::from(&fetched);

        let cached = match self.cache.get(&pair.source_id) {
            Some(cached) => cached,
            None => {
                log::warn!(
                    "Vehicle '{}' has no cached status, seeding it now",
                    pair.source_id
                );
                return self.seed_vehicle(pair, &fetched);
            }
        };

        if !self.policy.has_changed(&cached, &current) {
            log::debug!(
                "Vehicle '{}' not updated, status is still {}",
                pair.source_id,
                cached.status
            );
            return Ok(VehicleOutcome::Unchanged {
                status: current.status,
            });
        }

        self.deliver(pair, &fetched)?;
        self.cache
            .compare_and_swap(&pair.source_id, &cached, current)?;

        log::info!(
            "Vehicle '{}' synced, status {} -> {} sent to '{}'",
            pair.source_id,
            cached.status,
            current.status,
            pair.target_id
        );
        Ok(VehicleOutcome::Pushed {
            status: current.status,
            previous: cached.status,
        })
    }

    fn seed_vehicle(&self, pair: &VehiclePair, fetched: &SourceStatus) -> Result<VehicleOutcome> {
        self.deliver(pair, fetched)?;
        self.cache
            .seed(&pair.source_id, StatusSnapshot::from(fetched))?;

        log::info!(
            "Vehicle '{}' seeded, status {} sent to '{}'",
            pair.source_id,
            fetched.status,
            pair.target_id
        );
        Ok(VehicleOutcome::Seeded {
            status: fetched.status,
        })
    }

    fn deliver(&self, pair: &VehiclePair, fetched: &SourceStatus) -> Result<()> {
        let translated = translate(fetched)?;
        self.target.push_status(&pair.target_id, &translated)
    }
}

/// Marks a pass as running for as long as it is alive
struct PassGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> PassGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SyncError::PassInProgress)?;
        Ok(Self { flag })
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TargetStatus;
    use rust_decimal::Decimal;
    use std::cell::{Cell, RefCell};

    struct FixedSource {
        status: Cell<i32>,
    }

    impl StatusSource for FixedSource {
        fn fetch_status(&self, _source_id: &str) -> Result<SourceStatus> {
            Ok(SourceStatus {
                status: self.status.get(),
                status_id: None,
                status_timestamp: 0,
                status_note: None,
                latitude: Decimal::ONE,
                longitude: Decimal::ONE,
            })
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        pushed: RefCell<Vec<(String, i32)>>,
    }

    impl StatusSink for RecordingSink {
        fn push_status(&self, target_id: &str, status: &TargetStatus) -> Result<()> {
            self.pushed
                .borrow_mut()
                .push((target_id.to_string(), status.status));
            Ok(())
        }
    }

    fn engine(status: i32) -> SyncEngine<FixedSource, RecordingSink> {
        let mapping = VehicleMapping::new(["v1"], ["c1"]).unwrap();
        SyncEngine::new(
            FixedSource {
                status: Cell::new(status),
            },
            RecordingSink::default(),
            mapping,
        )
    }

    #[test]
    fn test_initial_then_unchanged() {
        let engine = engine(2);

        let initial = engine.initial_sync().unwrap();
        assert_eq!(initial.pushed(), 1);
        assert_eq!(engine.cache().status("v1"), Some(2));

        let recurring = engine.sync().unwrap();
        assert_eq!(recurring.unchanged(), 1);
        assert_eq!(engine.target.pushed.borrow().len(), 1);
    }

    #[test]
    fn test_changed_status_is_pushed() {
        let engine = engine(2);
        engine.initial_sync().unwrap();

        engine.source.status.set(5);
        let summary = engine.sync().unwrap();

        assert_eq!(
            summary.reports[0].outcome,
            VehicleOutcome::Pushed { status: 5, previous: 2 }
        );
        assert_eq!(engine.cache().status("v1"), Some(5));
        assert_eq!(
            *engine.target.pushed.borrow(),
            vec![("c1".to_string(), 2), ("c1".to_string(), 5)]
        );
    }

    #[test]
    fn test_pass_guard_rejects_overlap() {
        let flag = AtomicBool::new(false);
        let guard = PassGuard::acquire(&flag).unwrap();
        assert!(matches!(
            PassGuard::acquire(&flag),
            Err(SyncError::PassInProgress)
        ));
        drop(guard);
        assert!(PassGuard::acquire(&flag).is_ok());
    }
}
