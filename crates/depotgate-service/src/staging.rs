// crates/depotgate-service/src/staging.rs
// ============================================================================
// Module: Staging Area (C5)
// Description: Accepts artifact uploads and binds pointer metadata to stored bytes.
// Purpose: Implement spec.md §4.5's stage/list algorithm over the injected backends.
// Dependencies: depotgate-core, serde_json
// ============================================================================

//! ## Overview
//! `spec.md` §4.5. [`StagingArea`] owns no state of its own; it orchestrates
//! the storage backend, metadata store, and receipt store it was built with.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use depotgate_core::ArtifactId;
use depotgate_core::ArtifactPointer;
use depotgate_core::ArtifactRole;
use depotgate_core::Clock;
use depotgate_core::DepotError;
use depotgate_core::Receipt;
use depotgate_core::ReceiptId;
use depotgate_core::ReceiptKind;
use depotgate_core::RootTaskId;
use depotgate_core::TenantId;
use depotgate_core::interfaces::MetadataStore;
use depotgate_core::interfaces::ReceiptStore;
use depotgate_core::interfaces::StorageBackend;

/// A value of `0` for `max_artifact_bytes` means unlimited, matching
/// `spec.md` §6's configuration note. Internally this is realized as the
/// largest representable stream size.
const UNLIMITED_BYTES: u64 = u64::MAX;

// ============================================================================
// SECTION: Staging Area
// ============================================================================

/// Implements C5: binds uploaded bytes to durable pointer and receipt rows.
///
/// # Invariants
/// - A pointer row exists iff step 2's store call has already succeeded
///   (`spec.md` §4.5 step 3's conflict handling only ever runs after storage
///   has already accepted the bytes).
pub struct StagingArea {
    /// Byte storage backend (C1).
    storage: Arc<dyn StorageBackend>,
    /// Metadata store (C3).
    metadata: Arc<dyn MetadataStore>,
    /// Receipt store (C4).
    receipts: Arc<dyn ReceiptStore>,
    /// Clock supplying `created_at`/`emitted_at` values.
    clock: Arc<dyn Clock>,
    /// Maximum accepted artifact size in bytes; `0` means unlimited.
    max_artifact_bytes: u64,
}

impl StagingArea {
    /// Builds a staging area over the given backends.
    #[must_use]
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        metadata: Arc<dyn MetadataStore>,
        receipts: Arc<dyn ReceiptStore>,
        clock: Arc<dyn Clock>,
        max_artifact_bytes: u64,
    ) -> Self {
        Self {
            storage,
            metadata,
            receipts,
            clock,
            max_artifact_bytes,
        }
    }

    /// Stages `content` under `tenant_id`/`root_task_id`, implementing the
    /// five-step algorithm of `spec.md` §4.5.
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::ArtifactTooLarge`] or [`DepotError::StorageFailure`]
    /// if step 2 fails, the underlying metadata error if step 3's insert
    /// fails (after a best-effort delete of the just-written bytes), or
    /// [`DepotError::ReceiptWriteFailed`] if step 4 fails — in which case the
    /// pointer remains live per the intentional asymmetry documented in
    /// `spec.md` §7/§9.
    pub fn stage(
        &self,
        tenant_id: &TenantId,
        root_task_id: &RootTaskId,
        content: &mut dyn std::io::Read,
        mime_type: String,
        role: ArtifactRole,
        produced_by_receipt_id: Option<ReceiptId>,
    ) -> Result<ArtifactPointer, DepotError> {
        let artifact_id = ArtifactId::generate();
        let max_bytes = if self.max_artifact_bytes == 0 {
            UNLIMITED_BYTES
        } else {
            self.max_artifact_bytes
        };
        let stored = self.storage.store(tenant_id, root_task_id, artifact_id, content, max_bytes)?;

        let mut pointer = ArtifactPointer {
            artifact_id,
            tenant_id: tenant_id.clone(),
            root_task_id: root_task_id.clone(),
            location: stored.location,
            size_bytes: stored.size_bytes,
            mime_type,
            content_hash: stored.content_hash,
            artifact_role: role,
            produced_by_receipt_id,
            created_at: self.clock.now(),
        };

        if let Err(err) = self.metadata.put_artifact(&pointer) {
            let _ = self.storage.delete(&pointer.location);
            return Err(err);
        }

        let receipt_id = ReceiptId::generate();
        let mut payload = std::collections::BTreeMap::new();
        payload.insert(
            "pointer".to_string(),
            serde_json::to_value(&pointer).map_err(|err| DepotError::ReceiptWriteFailed(err.to_string()))?,
        );
        let receipt = Receipt {
            receipt_id,
            tenant_id: tenant_id.clone(),
            root_task_id: root_task_id.clone(),
            kind: ReceiptKind::ArtifactStaged,
            emitted_at: self.clock.now(),
            payload,
            caused_by_receipt_id: produced_by_receipt_id,
        };
        self.receipts.append(&receipt)?;
        pointer.produced_by_receipt_id = produced_by_receipt_id;

        Ok(pointer)
    }

    /// Lists live pointers for `tenant_id`/`root_task_id`, newest first,
    /// optionally filtered by `role`.
    ///
    /// # Errors
    ///
    /// Returns the underlying metadata error on a persistence failure.
    pub fn list(
        &self,
        tenant_id: &TenantId,
        root_task_id: &RootTaskId,
        role: Option<&ArtifactRole>,
    ) -> Result<Vec<ArtifactPointer>, DepotError> {
        let mut pointers = self.metadata.list_artifacts(tenant_id, root_task_id, role)?;
        pointers.reverse();
        Ok(pointers)
    }
}
