// crates/depotgate-service/src/test_support.rs
// ============================================================================
// Module: In-Memory Test Doubles
// Description: Minimal in-process StorageBackend/MetadataStore/ReceiptStore/OutboundSink fakes.
// Purpose: Exercise staging/deliverable/shipping orchestration without a filesystem or database.
// Dependencies: depotgate-core
// ============================================================================

//! ## Overview
//! Test-only doubles for the four backend traits. These are intentionally
//! simplistic (global mutex, no indexes) — they exist to make the
//! orchestration logic in this crate testable in isolation from
//! `depotgate-storage-fs`, `depotgate-sink`, and `depotgate-store-sqlite`.

#![allow(clippy::missing_errors_doc, reason = "test-only doubles, not a public contract")]
#![allow(clippy::unwrap_used, reason = "test-only doubles may assume lock acquisition succeeds")]
#![allow(clippy::expect_used, reason = "test-only doubles may assume lock acquisition succeeds")]

use std::collections::BTreeMap;
use std::io::Read;
use std::sync::Arc;
use std::sync::Mutex;

use depotgate_core::ArtifactId;
use depotgate_core::ArtifactPointer;
use depotgate_core::ArtifactRole;
use depotgate_core::DeliverableContract;
use depotgate_core::DeliverableId;
use depotgate_core::DeliverableStatus;
use depotgate_core::DepotError;
use depotgate_core::Receipt;
use depotgate_core::ReceiptId;
use depotgate_core::ReceiptKind;
use depotgate_core::RootTaskId;
use depotgate_core::ShipmentManifest;
use depotgate_core::StreamingHasher;
use depotgate_core::TenantId;
use depotgate_core::Timestamp;
use depotgate_core::interfaces::ContentGetter;
use depotgate_core::interfaces::MetadataStore;
use depotgate_core::interfaces::OutboundSink;
use depotgate_core::interfaces::ReceiptStore;
use depotgate_core::interfaces::StorageBackend;
use depotgate_core::interfaces::StoredArtifact;

/// An in-memory [`StorageBackend`] keyed by `mem://tenant/task/artifact_id`.
#[derive(Default)]
pub(crate) struct InMemoryStorageBackend {
    /// Stored bytes keyed by location.
    bytes: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryStorageBackend {
    /// Builds a shared handle suitable for injection into [`crate::staging::StagingArea`].
    pub(crate) fn new_arc() -> Arc<dyn StorageBackend> {
        Arc::new(Self::default())
    }
}

impl StorageBackend for InMemoryStorageBackend {
    fn store(
        &self,
        tenant_id: &TenantId,
        root_task_id: &RootTaskId,
        artifact_id: ArtifactId,
        reader: &mut dyn Read,
        max_bytes: u64,
    ) -> Result<StoredArtifact, DepotError> {
        let mut buf = Vec::new();
        let mut hasher = StreamingHasher::new();
        let mut chunk = [0_u8; 4096];
        loop {
            let read = reader.read(&mut chunk).map_err(|err| DepotError::StorageFailure(err.to_string()))?;
            if read == 0 {
                break;
            }
            if buf.len() as u64 + read as u64 > max_bytes {
                return Err(DepotError::ArtifactTooLarge {
                    max_bytes,
                    actual_bytes: buf.len() as u64 + read as u64,
                });
            }
            hasher.update(&chunk[..read]);
            buf.extend_from_slice(&chunk[..read]);
        }
        let location = format!("mem://{tenant_id}/{root_task_id}/{artifact_id}");
        let size_bytes = buf.len() as u64;
        self.bytes.lock().expect("test mutex poisoned").insert(location.clone(), buf);
        Ok(StoredArtifact {
            location,
            size_bytes,
            content_hash: hasher.finalize(),
        })
    }

    fn retrieve(&self, location: &str) -> Result<Vec<u8>, DepotError> {
        self.bytes
            .lock()
            .expect("test mutex poisoned")
            .get(location)
            .cloned()
            .ok_or_else(|| DepotError::ArtifactMissing(location.to_string()))
    }

    fn delete(&self, location: &str) -> Result<(), DepotError> {
        self.bytes.lock().expect("test mutex poisoned").remove(location);
        Ok(())
    }

    fn exists(&self, location: &str) -> Result<bool, DepotError> {
        Ok(self.bytes.lock().expect("test mutex poisoned").contains_key(location))
    }
}

/// In-memory record of a declared deliverable, paired with its contract.
struct DeliverableRow {
    /// The current contract, including lifecycle status.
    contract: DeliverableContract,
}

/// An in-memory [`MetadataStore`].
#[derive(Default)]
pub(crate) struct InMemoryMetadataStore {
    /// Live artifact pointers keyed by `(tenant_id, artifact_id)`.
    artifacts: Mutex<BTreeMap<(String, ArtifactId), ArtifactPointer>>,
    /// Deliverable rows keyed by `(tenant_id, deliverable_id)`.
    deliverables: Mutex<BTreeMap<(String, DeliverableId), DeliverableRow>>,
    /// Persisted shipment manifests, for test assertions.
    manifests: Mutex<Vec<ShipmentManifest>>,
}

impl InMemoryMetadataStore {
    /// Builds a shared handle.
    pub(crate) fn new_arc() -> Arc<dyn MetadataStore> {
        Arc::new(Self::default())
    }

    /// Returns the number of manifests persisted via `cas_mark_shipped`, for
    /// tests that hold the concrete type rather than the trait object.
    pub(crate) fn manifest_count(&self) -> usize {
        self.manifests.lock().expect("test mutex poisoned").len()
    }
}

impl MetadataStore for InMemoryMetadataStore {
    fn put_artifact(&self, pointer: &ArtifactPointer) -> Result<(), DepotError> {
        let mut artifacts = self.artifacts.lock().expect("test mutex poisoned");
        let key = (pointer.tenant_id.as_str().to_string(), pointer.artifact_id);
        if artifacts.contains_key(&key) {
            return Err(DepotError::StorageFailure(format!("duplicate artifact {}", pointer.artifact_id)));
        }
        artifacts.insert(key, pointer.clone());
        Ok(())
    }

    fn get_artifact(&self, tenant_id: &TenantId, artifact_id: ArtifactId) -> Result<ArtifactPointer, DepotError> {
        self.artifacts
            .lock()
            .expect("test mutex poisoned")
            .get(&(tenant_id.as_str().to_string(), artifact_id))
            .cloned()
            .ok_or_else(|| DepotError::NotFound(format!("artifact {artifact_id}")))
    }

    fn list_artifacts(
        &self,
        tenant_id: &TenantId,
        root_task_id: &RootTaskId,
        role: Option<&ArtifactRole>,
    ) -> Result<Vec<ArtifactPointer>, DepotError> {
        let artifacts = self.artifacts.lock().expect("test mutex poisoned");
        Ok(artifacts
            .values()
            .filter(|pointer| pointer.tenant_id == *tenant_id && pointer.root_task_id == *root_task_id)
            .filter(|pointer| role.is_none_or(|wanted| &pointer.artifact_role == wanted))
            .cloned()
            .collect())
    }

    fn mark_purged(
        &self,
        tenant_id: &TenantId,
        artifact_id: ArtifactId,
        _purged_at: Timestamp,
        _purge_after: Option<Timestamp>,
    ) -> Result<(), DepotError> {
        let mut artifacts = self.artifacts.lock().expect("test mutex poisoned");
        let key = (tenant_id.as_str().to_string(), artifact_id);
        if artifacts.remove(&key).is_none() {
            return Err(DepotError::NotFound(format!("live artifact {artifact_id}")));
        }
        Ok(())
    }

    fn put_deliverable(&self, contract: &DeliverableContract) -> Result<(), DepotError> {
        let mut deliverables = self.deliverables.lock().expect("test mutex poisoned");
        let key = (contract.tenant_id.as_str().to_string(), contract.deliverable_id);
        deliverables.insert(
            key,
            DeliverableRow {
                contract: contract.clone(),
            },
        );
        Ok(())
    }

    fn get_deliverable(&self, tenant_id: &TenantId, deliverable_id: DeliverableId) -> Result<DeliverableContract, DepotError> {
        self.deliverables
            .lock()
            .expect("test mutex poisoned")
            .get(&(tenant_id.as_str().to_string(), deliverable_id))
            .map(|row| row.contract.clone())
            .ok_or_else(|| DepotError::NotFound(format!("deliverable {deliverable_id}")))
    }

    fn update_deliverable(&self, contract: &DeliverableContract) -> Result<(), DepotError> {
        let mut deliverables = self.deliverables.lock().expect("test mutex poisoned");
        let key = (contract.tenant_id.as_str().to_string(), contract.deliverable_id);
        let Some(row) = deliverables.get_mut(&key) else {
            return Err(DepotError::NotFound(format!("deliverable {}", contract.deliverable_id)));
        };
        row.contract = contract.clone();
        Ok(())
    }

    fn cas_mark_shipped(&self, contract: &DeliverableContract, manifest: &ShipmentManifest) -> Result<(), DepotError> {
        let mut deliverables = self.deliverables.lock().expect("test mutex poisoned");
        let key = (contract.tenant_id.as_str().to_string(), contract.deliverable_id);
        let Some(row) = deliverables.get_mut(&key) else {
            return Err(DepotError::NotFound(format!("deliverable {}", contract.deliverable_id)));
        };
        match row.contract.status {
            DeliverableStatus::Shipped => return Err(DepotError::AlreadyShipped(contract.deliverable_id.to_string())),
            DeliverableStatus::Rejected => return Err(DepotError::AlreadyRejected(contract.deliverable_id.to_string())),
            DeliverableStatus::Declared => {}
        }
        row.contract.status = DeliverableStatus::Shipped;
        drop(deliverables);
        self.manifests.lock().expect("test mutex poisoned").push(manifest.clone());
        Ok(())
    }

    fn cas_mark_rejected(&self, contract: &DeliverableContract) -> Result<(), DepotError> {
        let mut deliverables = self.deliverables.lock().expect("test mutex poisoned");
        let key = (contract.tenant_id.as_str().to_string(), contract.deliverable_id);
        let Some(row) = deliverables.get_mut(&key) else {
            return Err(DepotError::NotFound(format!("deliverable {}", contract.deliverable_id)));
        };
        match row.contract.status {
            DeliverableStatus::Shipped => return Err(DepotError::AlreadyShipped(contract.deliverable_id.to_string())),
            DeliverableStatus::Rejected => return Err(DepotError::AlreadyRejected(contract.deliverable_id.to_string())),
            DeliverableStatus::Declared => {}
        }
        row.contract.status = DeliverableStatus::Rejected;
        Ok(())
    }
}

/// An in-memory [`ReceiptStore`].
#[derive(Default)]
pub(crate) struct InMemoryReceiptStore {
    /// Append-only receipt log.
    receipts: Mutex<Vec<Receipt>>,
}

impl InMemoryReceiptStore {
    /// Builds a shared handle.
    pub(crate) fn new_arc() -> Arc<dyn ReceiptStore> {
        Arc::new(Self::default())
    }
}

impl ReceiptStore for InMemoryReceiptStore {
    fn append(&self, receipt: &Receipt) -> Result<(), DepotError> {
        self.receipts.lock().expect("test mutex poisoned").push(receipt.clone());
        Ok(())
    }

    fn list(&self, tenant_id: &TenantId, root_task_id: &RootTaskId, kind: Option<ReceiptKind>) -> Result<Vec<Receipt>, DepotError> {
        Ok(self
            .receipts
            .lock()
            .expect("test mutex poisoned")
            .iter()
            .filter(|receipt| receipt.tenant_id == *tenant_id && receipt.root_task_id == *root_task_id)
            .filter(|receipt| kind.is_none_or(|wanted| receipt.kind == wanted))
            .cloned()
            .collect())
    }

    fn get(&self, tenant_id: &TenantId, receipt_id: ReceiptId) -> Result<Receipt, DepotError> {
        self.receipts
            .lock()
            .expect("test mutex poisoned")
            .iter()
            .find(|receipt| receipt.tenant_id == *tenant_id && receipt.receipt_id == receipt_id)
            .cloned()
            .ok_or_else(|| DepotError::NotFound(format!("receipt {receipt_id}")))
    }
}

/// A fixed-content [`ContentGetter`] for sink tests.
pub(crate) struct FixedContentGetter {
    /// Bytes returned for every request.
    bytes: Vec<u8>,
}

impl FixedContentGetter {
    /// Builds a getter returning `bytes` regardless of requested location.
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl ContentGetter for FixedContentGetter {
    fn get(&self, _location: &str) -> Result<Vec<u8>, DepotError> {
        Ok(self.bytes.clone())
    }
}

/// An [`OutboundSink`] double that records every call and can be made to fail.
#[derive(Default)]
pub(crate) struct RecordingSink {
    /// Calls recorded so far: `(destination, artifact count)`.
    calls: Mutex<Vec<(String, usize)>>,
    /// When `true`, `ship` always fails with [`DepotError::SinkTransportFailure`].
    fail: bool,
}

impl RecordingSink {
    /// Builds a sink that always succeeds.
    pub(crate) fn new_arc() -> Arc<dyn OutboundSink> {
        Arc::new(Self::default())
    }

    /// Builds a sink that always fails, for failure-path tests.
    pub(crate) fn new_failing_arc() -> Arc<dyn OutboundSink> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        })
    }
}

impl OutboundSink for RecordingSink {
    fn ship(
        &self,
        artifacts: &[ArtifactPointer],
        destination: &str,
        _manifest: &ShipmentManifest,
        _content: &dyn ContentGetter,
    ) -> Result<(), DepotError> {
        self.calls.lock().expect("test mutex poisoned").push((destination.to_string(), artifacts.len()));
        if self.fail {
            return Err(DepotError::SinkTransportFailure("injected test failure".to_string()));
        }
        Ok(())
    }
}
