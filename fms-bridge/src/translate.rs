//! Source → Target status translation
//!
//! Pure conversion with a single time input: the status code and position are
//! copied verbatim, the Source epoch seconds become a local timestamp, and the
//! position timestamp is the instant of translation.

use crate::types::{Result, SourceStatus, SyncError, TargetStatus, Timestamp};
use chrono::{DateTime, Local};

/// Translate a Source status, stamping the position with the current time
pub fn translate(source: &SourceStatus) -> Result<TargetStatus> {
    translate_at(source, Local::now())
}

/// Translate a Source status, stamping the position with `observed_at`
pub fn translate_at(source: &SourceStatus, observed_at: Timestamp) -> Result<TargetStatus> {
    Ok(TargetStatus {
        status: source.status,
        position: source.position(),
        status_timestamp: status_time(source.status_timestamp)?,
        position_timestamp: observed_at,
    })
}

/// Convert Unix epoch seconds into a local timestamp
pub fn status_time(epoch_seconds: i64) -> Result<Timestamp> {
    DateTime::from_timestamp(epoch_seconds, 0)
        .map(|utc| utc.with_timezone(&Local))
        .ok_or(SyncError::TimestampOutOfRange(epoch_seconds))
}
