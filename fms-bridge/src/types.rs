//! Core types for the FMS bridge library
//!
//! This module defines the two status representations the bridge moves between
//! (the Source form as fetched, the Target form as pushed), the shared position
//! type, and the error type used across the library.

use chrono::{DateTime, Local};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type used throughout the bridge (local timezone of the process)
pub type Timestamp = DateTime<Local>;

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Geographic position of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Latitude in decimal degrees
    #[serde(rename = "Latitude", with = "rust_decimal::serde::float")]
    pub latitude: Decimal,
    /// Longitude in decimal degrees
    #[serde(rename = "Longitude", with = "rust_decimal::serde::float")]
    pub longitude: Decimal,
}

impl Position {
    /// Create a new position
    pub fn new(latitude: Decimal, longitude: Decimal) -> Self {
        Self { latitude, longitude }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Vehicle status as reported by the Source system
///
/// Has no identity of its own; it is always scoped to the vehicle id it was
/// fetched for.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceStatus {
    /// Status code (passed through to the Target unchanged)
    pub status: i32,
    /// Source-internal id of the status definition
    #[serde(default)]
    pub status_id: Option<i64>,
    /// Seconds since the Unix epoch
    #[serde(rename = "status_ts")]
    pub status_timestamp: i64,
    /// Free text note attached to the status
    #[serde(default)]
    pub status_note: Option<String>,
    #[serde(rename = "lat", with = "rust_decimal::serde::float")]
    pub latitude: Decimal,
    #[serde(rename = "lng", with = "rust_decimal::serde::float")]
    pub longitude: Decimal,
}

impl SourceStatus {
    /// Position of the vehicle at fetch time
    pub fn position(&self) -> Position {
        Position::new(self.latitude, self.longitude)
    }
}

/// Vehicle status in the form the Target system accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TargetStatus {
    /// Status code, identical to the Source code
    pub status: i32,
    /// Position copied from the Source record
    pub position: Position,
    /// Source status timestamp converted to local time
    pub status_timestamp: Timestamp,
    /// Instant the record was translated locally
    pub position_timestamp: Timestamp,
}

/// Errors that can occur while synchronizing
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyncError {
    #[error("Identifier list is empty: {0}")]
    EmptyIdentifiers(&'static str),

    #[error("Identifier lists differ in length: {sources} source ids, {targets} target ids")]
    LengthMismatch { sources: usize, targets: usize },

    #[error("Duplicate source identifier: {0}")]
    DuplicateSourceId(String),

    #[error("Duplicate target identifier: {0}")]
    DuplicateTargetId(String),

    #[error("Invalid base address '{address}': {reason}")]
    InvalidBaseAddress { address: String, reason: String },

    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP status {status} from {endpoint}: {detail}")]
    HttpStatus {
        status: u16,
        endpoint: String,
        detail: String,
    },

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Status timestamp out of range: {0}")]
    TimestampOutOfRange(i64),

    #[error("Vehicle '{0}' is already seeded in the status cache")]
    AlreadySeeded(String),

    #[error("Cached status of vehicle '{0}' changed concurrently")]
    CacheConflict(String),

    #[error("A sync pass is already in progress")]
    PassInProgress,
}

impl SyncError {
    /// True for errors that make the bridge impossible to construct
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SyncError::EmptyIdentifiers(_)
                | SyncError::LengthMismatch { .. }
                | SyncError::DuplicateSourceId(_)
                | SyncError::DuplicateTargetId(_)
                | SyncError::InvalidBaseAddress { .. }
                | SyncError::MissingCredential(_)
        )
    }
}
