//! FMS Bridge Library
//!
//! Mirrors vehicle status records from a status-tracking service (the Source)
//! into a dispatch service (the Target), translating between their data
//! representations and skipping writes when nothing changed.
//!
//! # Architecture
//!
//! - [`VehicleMapping`] pairs Source ids with Target ids, fixed at startup
//! - [`StatusCache`] remembers the last status delivered per Source id
//! - [`translate`](translate::translate) converts a Source record into the Target form
//! - [`StatusSource`] / [`StatusSink`] are the seams to the remote systems,
//!   implemented over HTTP by [`SourceClient`] and [`TargetClient`]
//! - [`SyncEngine`] runs initial and recurring passes and reports a [`PassSummary`]
//!
//! The library does NOT schedule passes, load configuration files or set up
//! logging output. That is the job of the application layer (fms-bridge-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use fms_bridge::{ClientConfig, SourceClient, SyncEngine, TargetClient, VehicleMapping};
//!
//! let source = SourceClient::new(&ClientConfig::new("https://source.example.com", "access-key")).unwrap();
//! let target = TargetClient::new(&ClientConfig::new("https://target.example.com", "token")).unwrap();
//! let mapping = VehicleMapping::new(["v1", "v2"], ["c1", "c2"]).unwrap();
//!
//! let engine = SyncEngine::new(source, target, mapping);
//! let summary = engine.initial_sync().unwrap();
//! println!("{}", summary);
//!
//! // Once per scheduling tick
//! let summary = engine.sync().unwrap();
//! for (report, error) in summary.failures() {
//!     eprintln!("{} failed: {}", report.source_id, error);
//! }
//! ```

// Public modules
pub mod cache;
pub mod client;
pub mod engine;
pub mod mapping;
pub mod summary;
pub mod translate;
pub mod types;

// Re-export main types for convenience
pub use cache::{ChangePolicy, StatusCache, StatusSnapshot};
pub use client::{ClientConfig, SourceClient, StatusSink, StatusSource, TargetClient};
pub use engine::SyncEngine;
pub use mapping::{VehicleMapping, VehiclePair};
pub use summary::{PassSummary, SyncMode, VehicleOutcome, VehicleReport};
pub use types::{Position, Result, SourceStatus, SyncError, TargetStatus, Timestamp};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: ensure the public API wires together
        let mapping = VehicleMapping::new(["v1"], ["c1"]).unwrap();
        assert_eq!(mapping.len(), 1);
        assert!(StatusCache::new().is_empty());
        assert!(!VERSION.is_empty());
    }
}
