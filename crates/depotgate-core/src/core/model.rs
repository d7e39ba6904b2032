// crates/depotgate-core/src/core/model.rs
// ============================================================================
// Module: DepotGate Data Model
// Description: Artifact pointers, deliverable contracts, shipment manifests, and receipts.
// Purpose: Shared record types passed between staging, deliverable, and shipping components.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! `spec.md` §3. These types are plain records; none of them perform I/O or
//! hold live connections. Storage and transport are the concern of the
//! trait interfaces in [`crate::interfaces`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::hashing::ContentHash;
use crate::core::ids::ArtifactId;
use crate::core::ids::DeliverableId;
use crate::core::ids::ManifestId;
use crate::core::ids::ReceiptId;
use crate::core::ids::RootTaskId;
use crate::core::ids::TenantId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Artifact Pointer
// ============================================================================

/// The role a producer declares for an artifact within its task's output.
///
/// `spec.md` §3 fixes this to a closed vocabulary; DepotGate rejects any
/// other tag rather than accepting caller-defined roles.
///
/// # Invariants
/// - Caller-declared; DepotGate never infers a role from content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactRole {
    /// The deliverable's primary output.
    FinalOutput,
    /// A supporting artifact (intermediate data, attachments).
    Supporting,
    /// A planning or reasoning artifact.
    Plan,
    /// A log artifact.
    Log,
    /// Any role outside the other four tags.
    Other,
}

/// A record describing staged bytes: where they live, how large they are,
/// and what produced them.
///
/// # Invariants
/// - `content_hash` is computed once at ingest and never recomputed or mutated.
/// - `location` is a fully-qualified `scheme://body` URI understood by exactly one storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPointer {
    /// Unique identifier for this artifact.
    pub artifact_id: ArtifactId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Owning root task.
    pub root_task_id: RootTaskId,
    /// Storage location URI (e.g. `fs://tenant/task/artifact-id`).
    pub location: String,
    /// Size of the stored bytes.
    pub size_bytes: u64,
    /// Caller-declared MIME type.
    pub mime_type: String,
    /// SHA-256 content digest computed at ingest.
    pub content_hash: ContentHash,
    /// Caller-declared role within the task's output.
    pub artifact_role: ArtifactRole,
    /// The receipt that recorded this artifact's ingest, if the receipt write succeeded.
    pub produced_by_receipt_id: Option<ReceiptId>,
    /// When this pointer was created.
    pub created_at: Timestamp,
}

// ============================================================================
// SECTION: Deliverable Contract
// ============================================================================

/// Lifecycle state of a deliverable contract.
///
/// # Invariants
/// - `Shipped` and `Rejected` are terminal; no further transition is permitted from either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliverableStatus {
    /// Declared but not yet shipped or rejected.
    Declared,
    /// Closure was satisfied and the artifacts were handed to a sink.
    Shipped,
    /// A ship attempt found closure unsatisfied and the deliverable was rejected.
    Rejected,
}

/// The caller-declared contract a deliverable must satisfy before shipping.
///
/// # Invariants
/// - `artifact_ids` lists the artifacts that must be present; `requirements` lists
///   tagged markers a caller can satisfy out of band via `mark_requirement`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverableSpec {
    /// Artifacts that must exist (as live pointers) for closure.
    pub artifact_ids: Vec<ArtifactId>,
    /// Roles that must be represented among `artifact_ids` for closure.
    pub artifact_roles: Vec<ArtifactRole>,
    /// Named requirements that must be explicitly marked satisfied (see §4.6).
    pub requirements: Vec<String>,
    /// The destination URI artifacts are shipped to on success.
    pub shipping_destination: String,
}

/// A deliverable contract: a declared bundle plus its lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverableContract {
    /// Unique identifier for this deliverable.
    pub deliverable_id: DeliverableId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Owning root task.
    pub root_task_id: RootTaskId,
    /// When this deliverable was declared.
    pub created_at: Timestamp,
    /// The contract this deliverable must satisfy.
    pub spec: DeliverableSpec,
    /// Requirements marked satisfied so far, by name.
    pub satisfied_requirements: Vec<String>,
    /// Current lifecycle state.
    pub status: DeliverableStatus,
}

// ============================================================================
// SECTION: Shipment Manifest
// ============================================================================

/// A durable record of a completed shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentManifest {
    /// Unique identifier for this manifest.
    pub manifest_id: ManifestId,
    /// The deliverable this manifest ships.
    pub deliverable_id: DeliverableId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Owning root task.
    pub root_task_id: RootTaskId,
    /// The artifact pointers handed to the sink.
    pub artifact_pointers: Vec<ArtifactPointer>,
    /// The destination URI the sink shipped to.
    pub destination: String,
    /// When the shipment completed.
    pub shipped_at: Timestamp,
}

// ============================================================================
// SECTION: Purge Policy
// ============================================================================

/// The retention policy a purge call applies to the selected pointers.
///
/// # Invariants
/// - `Immediate` deletes bytes synchronously; the other three defer to an
///   external janitor or record intent only (`spec.md` §4.7, §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurgePolicy {
    /// Mark pointers purged and delete bytes in the same call.
    Immediate,
    /// Mark pointers purged with a 24-hour `purge_after`; bytes untouched here.
    Retain24h,
    /// Mark pointers purged with a 7-day `purge_after`; bytes untouched here.
    Retain7d,
    /// Record intent only; no pointer state change.
    Manual,
}

// ============================================================================
// SECTION: Receipt
// ============================================================================

/// The kind of event a receipt records.
///
/// # Invariants
/// - Receipts are append-only; a kind is never rewritten after emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptKind {
    /// An artifact was staged successfully.
    ArtifactStaged,
    /// A deliverable contract was declared.
    DeliverableDeclared,
    /// A named requirement was marked satisfied.
    RequirementMarked,
    /// A shipment completed successfully.
    ShipmentComplete,
    /// A ship attempt was rejected for unmet closure.
    ShipmentRejected,
    /// Staged artifacts were purged.
    ArtifactsPurged,
}

/// An append-only audit record of a single event.
///
/// # Invariants
/// - Once emitted, a receipt is never mutated or deleted (`spec.md` §4.4).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Unique identifier for this receipt.
    pub receipt_id: ReceiptId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Owning root task.
    pub root_task_id: RootTaskId,
    /// The kind of event this receipt records.
    pub kind: ReceiptKind,
    /// When this receipt was emitted.
    pub emitted_at: Timestamp,
    /// Event-specific payload, opaque to the receipt store itself.
    pub payload: BTreeMap<String, serde_json::Value>,
    /// The receipt that logically preceded this one, if any (e.g. a staging
    /// receipt preceding the shipment receipt that consumed it).
    pub caused_by_receipt_id: Option<ReceiptId>,
}
