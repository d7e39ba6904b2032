// crates/depotgate-core/src/core/time.rs
// ============================================================================
// Module: DepotGate Time Model
// Description: Canonical timestamp representation for pointers, manifests, and receipts.
// Purpose: Provide a single explicit time value so the core never reads wall-clock time.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! DepotGate records explicit timestamps on every durable record. The core
//! itself never reads wall-clock time directly; callers (the composition
//! root's injected [`Clock`]) supply it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// A UTC timestamp expressed as milliseconds since the Unix epoch.
///
/// # Invariants
/// - Values are explicitly provided by callers; the core never reads wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from raw Unix milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as Unix milliseconds.
    #[must_use]
    pub const fn unix_millis(self) -> i64 {
        self.0
    }
}

/// Supplies the current time to the core without the core reading it directly.
///
/// # Invariants
/// - Implementations must be monotonic-enough for append-only log ordering within a process.
pub trait Clock: Send + Sync {
    /// Returns the current timestamp.
    fn now(&self) -> Timestamp;
}

/// A [`Clock`] backed by [`std::time::SystemTime`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |duration| i64::try_from(duration.as_millis()).unwrap_or(i64::MAX));
        Timestamp::from_unix_millis(millis)
    }
}
