// crates/depotgate-core/src/core/error.rs
// ============================================================================
// Module: DepotGate Error Taxonomy
// Description: Stable error kinds surfaced across every DepotGate component.
// Purpose: Give callers a stable error kind and human-readable detail, never a stack trace.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! `spec.md` §7. Every failure DepotGate can produce is represented here so
//! that the CLI and HTTP façades can map errors to stable wire strings
//! without re-deriving taxonomy per crate.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::sanitize::SanitizeError;

// ============================================================================
// SECTION: Error Kind
// ============================================================================

/// Stable, fieldless error classification.
///
/// # Invariants
/// - One variant per row of `spec.md` §7's error taxonomy table.
/// - Variants are stable wire identifiers; do not rename without a migration note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A tenant/task id failed sanitizer validation.
    InvalidIdentifier,
    /// A URI or destination escaped its base, or had an unknown scheme.
    InvalidLocation,
    /// A URI or destination escaped its configured base.
    PathViolation,
    /// A deliverable spec was malformed.
    InvalidSpec,
    /// No such artifact, deliverable, or manifest.
    NotFound,
    /// Exceeded configured max size, possibly mid-stream.
    ArtifactTooLarge,
    /// Pointer exists but bytes cannot be retrieved.
    ArtifactMissing,
    /// Ship attempted with unmet requirements.
    ClosureNotSatisfied,
    /// Deliverable already shipped.
    AlreadyShipped,
    /// Deliverable already rejected.
    AlreadyRejected,
    /// Concurrent ship won the CAS.
    RaceLost,
    /// External sink rejected or timed out.
    SinkTransportFailure,
    /// Destination scheme has no registered sink.
    UnknownSink,
    /// Byte persistence failed.
    StorageFailure,
    /// Sink succeeded but metadata did not.
    ManifestPersistFailed,
    /// Terminal receipt could not be appended.
    ReceiptWriteFailed,
    /// Deadline propagated from caller was exceeded.
    DeadlineExceeded,
}

impl ErrorKind {
    /// Returns the stable wire label for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidIdentifier => "invalid_identifier",
            Self::InvalidLocation => "invalid_location",
            Self::PathViolation => "path_violation",
            Self::InvalidSpec => "invalid_spec",
            Self::NotFound => "not_found",
            Self::ArtifactTooLarge => "artifact_too_large",
            Self::ArtifactMissing => "artifact_missing",
            Self::ClosureNotSatisfied => "closure_not_satisfied",
            Self::AlreadyShipped => "already_shipped",
            Self::AlreadyRejected => "already_rejected",
            Self::RaceLost => "race_lost",
            Self::SinkTransportFailure => "sink_transport_failure",
            Self::UnknownSink => "unknown_sink",
            Self::StorageFailure => "storage_failure",
            Self::ManifestPersistFailed => "manifest_persist_failed",
            Self::ReceiptWriteFailed => "receipt_write_failed",
            Self::DeadlineExceeded => "deadline_exceeded",
        }
    }
}

// ============================================================================
// SECTION: Depot Error
// ============================================================================

/// The unified error type returned by DepotGate core operations.
///
/// # Invariants
/// - `kind()` is a pure function of the active variant.
#[derive(Debug, Error)]
pub enum DepotError {
    /// A tenant/task id failed sanitizer validation.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
    /// A URI used an unknown or unparsable scheme.
    #[error("invalid location: {0}")]
    InvalidLocation(String),
    /// A URI or destination escaped its configured base.
    #[error("path violation: {0}")]
    PathViolation(String),
    /// A deliverable spec was malformed.
    #[error("invalid spec: {0}")]
    InvalidSpec(String),
    /// No such artifact, deliverable, or manifest.
    #[error("not found: {0}")]
    NotFound(String),
    /// Exceeded configured max size, possibly mid-stream.
    #[error("artifact too large: {actual_bytes} > {max_bytes}")]
    ArtifactTooLarge {
        /// Maximum allowed bytes.
        max_bytes: u64,
        /// Actual bytes observed before the limit was enforced.
        actual_bytes: u64,
    },
    /// Pointer exists but bytes cannot be retrieved.
    #[error("artifact missing: {0}")]
    ArtifactMissing(String),
    /// Ship attempted with unmet requirements; deliverable transitioned to `rejected`.
    #[error("closure not satisfied for deliverable {0}")]
    ClosureNotSatisfied(String),
    /// Deliverable already shipped.
    #[error("deliverable {0} already shipped")]
    AlreadyShipped(String),
    /// Deliverable already rejected.
    #[error("deliverable {0} already rejected")]
    AlreadyRejected(String),
    /// Concurrent ship won the CAS.
    #[error("race lost transitioning deliverable {0}")]
    RaceLost(String),
    /// External sink rejected or timed out; no state change.
    #[error("sink transport failure: {0}")]
    SinkTransportFailure(String),
    /// Destination scheme has no registered sink.
    #[error("unknown sink scheme: {0}")]
    UnknownSink(String),
    /// Byte persistence failed.
    #[error("storage failure: {0}")]
    StorageFailure(String),
    /// Sink succeeded but metadata did not; orphan bytes possible.
    #[error("manifest persist failed after sink success: {0}")]
    ManifestPersistFailed(String),
    /// Terminal receipt could not be appended.
    #[error("receipt write failed: {0}")]
    ReceiptWriteFailed(String),
    /// Deadline propagated from caller was exceeded.
    #[error("deadline exceeded: {0}")]
    DeadlineExceeded(String),
}

impl DepotError {
    /// Returns the stable error kind for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidIdentifier(_) => ErrorKind::InvalidIdentifier,
            Self::InvalidLocation(_) => ErrorKind::InvalidLocation,
            Self::PathViolation(_) => ErrorKind::PathViolation,
            Self::InvalidSpec(_) => ErrorKind::InvalidSpec,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::ArtifactTooLarge { .. } => ErrorKind::ArtifactTooLarge,
            Self::ArtifactMissing(_) => ErrorKind::ArtifactMissing,
            Self::ClosureNotSatisfied(_) => ErrorKind::ClosureNotSatisfied,
            Self::AlreadyShipped(_) => ErrorKind::AlreadyShipped,
            Self::AlreadyRejected(_) => ErrorKind::AlreadyRejected,
            Self::RaceLost(_) => ErrorKind::RaceLost,
            Self::SinkTransportFailure(_) => ErrorKind::SinkTransportFailure,
            Self::UnknownSink(_) => ErrorKind::UnknownSink,
            Self::StorageFailure(_) => ErrorKind::StorageFailure,
            Self::ManifestPersistFailed(_) => ErrorKind::ManifestPersistFailed,
            Self::ReceiptWriteFailed(_) => ErrorKind::ReceiptWriteFailed,
            Self::DeadlineExceeded(_) => ErrorKind::DeadlineExceeded,
        }
    }
}

impl From<SanitizeError> for DepotError {
    fn from(err: SanitizeError) -> Self {
        match err {
            SanitizeError::InvalidIdentifier(detail) => Self::InvalidIdentifier(detail),
            SanitizeError::PathViolation(detail) => Self::PathViolation(detail),
            SanitizeError::InvalidLocation(detail) => Self::InvalidLocation(detail),
        }
    }
}
