// crates/depotgate-core/src/interfaces.rs
// ============================================================================
// Module: DepotGate Backend Interfaces
// Description: Trait boundaries for storage, sink, metadata, and receipt backends.
// Purpose: Let the service layer compose concrete backends without depending on them directly.
// Dependencies: (none beyond core model/error types)
// ============================================================================

//! ## Overview
//! `spec.md` §4.1–§4.4. These traits are synchronous: the core itself has no
//! suspension points of its own (`spec.md` §5). Implementations that need to
//! block on I/O do so behind `Arc<dyn Trait>` handles held by the
//! composition root; an async façade offloads calls via
//! `tokio::task::spawn_blocking`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::hashing::ContentHash;
use crate::core::ids::ArtifactId;
use crate::core::ids::ReceiptId;
use crate::core::ids::RootTaskId;
use crate::core::ids::TenantId;
use crate::core::model::ArtifactPointer;
use crate::core::model::ArtifactRole;
use crate::core::model::DeliverableContract;
use crate::core::model::Receipt;
use crate::core::model::ReceiptKind;
use crate::core::model::ShipmentManifest;
use crate::error::DepotError;

// ============================================================================
// SECTION: Storage Backend (C1)
// ============================================================================

/// The result of a successful store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    /// The location URI the bytes were written to.
    pub location: String,
    /// Size of the stored bytes.
    pub size_bytes: u64,
    /// Content digest computed while streaming.
    pub content_hash: ContentHash,
}

/// Persists and retrieves artifact bytes under a tenant/task namespace.
///
/// # Invariants
/// - Implementations must reject any `rel` path that would escape their configured base,
///   using [`crate::sanitize::resolve_under_base`] or an equivalent capability-scoped open.
pub trait StorageBackend: Send + Sync {
    /// Streams bytes read from `reader` into storage under
    /// `tenant_id`/`root_task_id`, enforcing `max_bytes` mid-stream. On
    /// overflow, any partially written bytes are removed before returning.
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::ArtifactTooLarge`] if the stream exceeds `max_bytes`,
    /// or [`DepotError::StorageFailure`] on any underlying I/O failure.
    fn store(
        &self,
        tenant_id: &TenantId,
        root_task_id: &RootTaskId,
        artifact_id: ArtifactId,
        reader: &mut dyn std::io::Read,
        max_bytes: u64,
    ) -> Result<StoredArtifact, DepotError>;

    /// Retrieves the full bytes of a previously stored artifact.
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::ArtifactMissing`] if the location cannot be read, or
    /// [`DepotError::PathViolation`] if the location fails containment checks.
    fn retrieve(&self, location: &str) -> Result<Vec<u8>, DepotError>;

    /// Deletes previously stored bytes. Idempotent: deleting an already-absent
    /// location is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::StorageFailure`] on an underlying I/O failure other
    /// than not-found, or [`DepotError::PathViolation`] if the location fails
    /// containment checks.
    fn delete(&self, location: &str) -> Result<(), DepotError>;

    /// Returns whether bytes exist at `location`.
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::PathViolation`] if the location fails containment checks.
    fn exists(&self, location: &str) -> Result<bool, DepotError>;
}

// ============================================================================
// SECTION: Outbound Sink (C2)
// ============================================================================

/// Supplies artifact bytes to a sink on demand, by location, without the sink
/// needing to know which storage backend produced them.
pub trait ContentGetter: Send + Sync {
    /// Returns the bytes stored at `location`.
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::ArtifactMissing`] if the bytes cannot be read.
    fn get(&self, location: &str) -> Result<Vec<u8>, DepotError>;
}

/// Transfers a shipment's artifacts to an external destination.
///
/// # Invariants
/// - `ship` either fully succeeds (all artifacts transferred) or fully fails;
///   it never partially transfers a shipment and reports success.
pub trait OutboundSink: Send + Sync {
    /// Ships `artifacts` to `destination`, reading bytes on demand via `content`.
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::SinkTransportFailure`] if the transfer cannot be
    /// completed, or [`DepotError::PathViolation`] if `destination` fails
    /// containment checks.
    fn ship(
        &self,
        artifacts: &[ArtifactPointer],
        destination: &str,
        manifest: &ShipmentManifest,
        content: &dyn ContentGetter,
    ) -> Result<(), DepotError>;
}

// ============================================================================
// SECTION: Metadata Store (C3)
// ============================================================================

/// Persists artifact pointers, deliverable contracts, and shipment manifests.
///
/// # Invariants
/// - `cas_mark_shipped`/`cas_mark_rejected` are atomic compare-and-swap transitions
///   guarding the ship/purge race described in `spec.md` §4.7.
pub trait MetadataStore: Send + Sync {
    /// Inserts a newly staged artifact pointer.
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::StorageFailure`] on an underlying persistence failure.
    fn put_artifact(&self, pointer: &ArtifactPointer) -> Result<(), DepotError>;

    /// Fetches a single live artifact pointer by id.
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::NotFound`] if no such live artifact exists for the tenant.
    fn get_artifact(&self, tenant_id: &TenantId, artifact_id: ArtifactId)
    -> Result<ArtifactPointer, DepotError>;

    /// Lists live (non-purged) artifact pointers under a tenant/task,
    /// optionally filtered by role.
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::StorageFailure`] on an underlying persistence failure.
    fn list_artifacts(
        &self,
        tenant_id: &TenantId,
        root_task_id: &RootTaskId,
        role: Option<&ArtifactRole>,
    ) -> Result<Vec<ArtifactPointer>, DepotError>;

    /// Soft-deletes an artifact pointer (used by purge): the pointer stops
    /// appearing in [`MetadataStore::list_artifacts`]/`get_artifact` but its
    /// row is retained for audit. `purge_after` is set for retention
    /// policies that defer byte deletion to an external janitor; `None`
    /// means bytes were (or are about to be) deleted immediately.
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::NotFound`] if no such live artifact exists.
    fn mark_purged(
        &self,
        tenant_id: &TenantId,
        artifact_id: ArtifactId,
        purged_at: crate::core::time::Timestamp,
        purge_after: Option<crate::core::time::Timestamp>,
    ) -> Result<(), DepotError>;

    /// Inserts a newly declared deliverable contract. A spec naming no
    /// artifacts, roles, or requirements is accepted (closure is then
    /// trivially satisfied, per `spec.md` §4.6).
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::StorageFailure`] on an underlying persistence failure.
    fn put_deliverable(&self, contract: &DeliverableContract) -> Result<(), DepotError>;

    /// Fetches a deliverable contract by id.
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::NotFound`] if no such deliverable exists for the tenant.
    fn get_deliverable(
        &self,
        tenant_id: &TenantId,
        deliverable_id: crate::core::ids::DeliverableId,
    ) -> Result<DeliverableContract, DepotError>;

    /// Replaces the stored deliverable contract wholesale (used by `mark_requirement`).
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::NotFound`] if no such deliverable exists.
    fn update_deliverable(&self, contract: &DeliverableContract) -> Result<(), DepotError>;

    /// Atomically transitions a pending deliverable to `shipped` and persists
    /// its manifest in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::AlreadyShipped`] or [`DepotError::AlreadyRejected`]
    /// if the deliverable is no longer pending, or [`DepotError::RaceLost`] if a
    /// concurrent transition won first.
    fn cas_mark_shipped(
        &self,
        contract: &DeliverableContract,
        manifest: &ShipmentManifest,
    ) -> Result<(), DepotError>;

    /// Atomically transitions a pending deliverable to `rejected`.
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::AlreadyShipped`] or [`DepotError::AlreadyRejected`]
    /// if the deliverable is no longer pending, or [`DepotError::RaceLost`] if a
    /// concurrent transition won first.
    fn cas_mark_rejected(&self, contract: &DeliverableContract) -> Result<(), DepotError>;
}

// ============================================================================
// SECTION: Receipt Store (C4)
// ============================================================================

/// Appends and queries the durable receipt trail.
///
/// # Invariants
/// - Receipts are append-only: no update or delete operation is exposed.
pub trait ReceiptStore: Send + Sync {
    /// Appends a receipt.
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::ReceiptWriteFailed`] on an underlying persistence failure.
    fn append(&self, receipt: &Receipt) -> Result<(), DepotError>;

    /// Lists receipts for a tenant/task, ordered by `emitted_at` ascending,
    /// optionally filtered by kind.
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::StorageFailure`] on an underlying persistence failure.
    fn list(
        &self,
        tenant_id: &TenantId,
        root_task_id: &RootTaskId,
        kind: Option<ReceiptKind>,
    ) -> Result<Vec<Receipt>, DepotError>;

    /// Fetches a single receipt by id.
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::NotFound`] if no such receipt exists for the tenant.
    fn get(&self, tenant_id: &TenantId, receipt_id: ReceiptId) -> Result<Receipt, DepotError>;
}
