// crates/depotgate-core/src/lib.rs
// ============================================================================
// Crate: depotgate-core
// Description: Identifiers, data model, error taxonomy, sanitizer, closure engine,
//              and backend-agnostic trait interfaces for DepotGate.
// Purpose: Give every other DepotGate crate a single, dependency-light domain crate
//          to build against, with no knowledge of concrete storage/sink/database backends.
// Dependencies: rand, serde, serde_json, sha2, thiserror
// ============================================================================

//! # depotgate-core
//!
//! DepotGate is an artifact staging and outbound logistics primitive for
//! asynchronous, multi-agent workflows. This crate holds the parts of the
//! system that do not depend on any concrete backend: identifiers, the data
//! model (artifact pointers, deliverable contracts, shipment manifests,
//! receipts), the stable error taxonomy, the path/input sanitizer, and the
//! closure engine that decides whether a deliverable's contract is met.
//!
//! Concrete storage, sink, and database implementations live in sibling
//! crates (`depotgate-storage-fs`, `depotgate-sink`, `depotgate-store-sqlite`)
//! and are composed behind the traits in [`interfaces`] by
//! `depotgate-service`.

/// Pure domain building blocks: identifiers, time, hashing, model, closure.
pub mod core;
/// Stable error taxonomy, re-exported at the crate root.
pub mod error;
/// Backend-agnostic trait interfaces for storage, sink, metadata, and receipts.
pub mod interfaces;
/// Path and input sanitization primitives.
pub mod sanitize;

pub use crate::core::closure::ClosureGap;
pub use crate::core::closure::ClosureReport;
pub use crate::core::closure::compute_closure;
pub use crate::core::hashing::ContentHash;
pub use crate::core::hashing::StreamingHasher;
pub use crate::core::hashing::hash_bytes;
pub use crate::core::ids::ArtifactId;
pub use crate::core::ids::DeliverableId;
pub use crate::core::ids::ManifestId;
pub use crate::core::ids::ReceiptId;
pub use crate::core::ids::RootTaskId;
pub use crate::core::ids::TenantId;
pub use crate::core::model::ArtifactPointer;
pub use crate::core::model::ArtifactRole;
pub use crate::core::model::DeliverableContract;
pub use crate::core::model::DeliverableSpec;
pub use crate::core::model::DeliverableStatus;
pub use crate::core::model::PurgePolicy;
pub use crate::core::model::Receipt;
pub use crate::core::model::ReceiptKind;
pub use crate::core::model::ShipmentManifest;
pub use crate::core::time::Clock;
pub use crate::core::time::SystemClock;
pub use crate::core::time::Timestamp;
pub use crate::error::DepotError;
pub use crate::error::ErrorKind;
