// crates/depotgate-service/src/shipping.rs
// ============================================================================
// Module: Shipping Service (C7)
// Description: Ships closed deliverables to their destination sink and purges staged bytes.
// Purpose: Implement spec.md §4.7's ship/purge algorithms with their exact failure ordering.
// Dependencies: depotgate-core, serde_json
// ============================================================================

//! ## Overview
//! `spec.md` §4.7. [`ShippingService::ship`] is the one operation in this
//! crate with a transactional handoff across two backends (the sink and the
//! metadata store); the CAS in [`crate::interfaces::MetadataStore::cas_mark_shipped`]
//! is what keeps a concurrent `ship`/`purge` race from double-shipping or
//! shipping purged bytes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use depotgate_core::ArtifactId;
use depotgate_core::ArtifactPointer;
use depotgate_core::Clock;
use depotgate_core::ClosureGap;
use depotgate_core::ClosureReport;
use depotgate_core::DeliverableId;
use depotgate_core::DeliverableStatus;
use depotgate_core::DepotError;
use depotgate_core::ManifestId;
use depotgate_core::PurgePolicy;
use depotgate_core::Receipt;
use depotgate_core::ReceiptId;
use depotgate_core::ReceiptKind;
use depotgate_core::RootTaskId;
use depotgate_core::ShipmentManifest;
use depotgate_core::TenantId;
use depotgate_core::compute_closure;
use depotgate_core::interfaces::ContentGetter;
use depotgate_core::interfaces::MetadataStore;
use depotgate_core::interfaces::OutboundSink;
use depotgate_core::interfaces::ReceiptStore;
use depotgate_core::interfaces::StorageBackend;

/// Milliseconds in 24 hours, used to compute `Retain24h` purge deadlines.
const RETAIN_24H_MILLIS: i64 = 24 * 60 * 60 * 1000;
/// Milliseconds in 7 days, used to compute `Retain7d` purge deadlines.
const RETAIN_7D_MILLIS: i64 = 7 * 24 * 60 * 60 * 1000;
/// Schema version of the purge policy vocabulary recorded on every `purged` receipt.
const PURGE_POLICY_VERSION: &str = "v1";

// ============================================================================
// SECTION: Rejection Payload
// ============================================================================

/// Builds a `shipment_rejected` receipt payload from an unsatisfied closure
/// report, splitting `report.gaps` into `missing_artifact_ids`,
/// `missing_roles`, and `unmet_requirements` arrays so a caller can diagnose
/// the rejection without re-running `check_closure`.
fn rejection_payload(deliverable_id: DeliverableId, report: &ClosureReport) -> std::collections::BTreeMap<String, serde_json::Value> {
    let mut missing_artifact_ids = Vec::new();
    let mut missing_roles = Vec::new();
    let mut unmet_requirements = Vec::new();
    for gap in &report.gaps {
        match gap {
            ClosureGap::MissingArtifact(artifact_id) => {
                missing_artifact_ids.push(serde_json::Value::String(artifact_id.to_string()));
            }
            ClosureGap::MissingRole(role) => {
                if let Ok(value) = serde_json::to_value(role) {
                    missing_roles.push(value);
                }
            }
            ClosureGap::UnmetRequirement(requirement) => {
                unmet_requirements.push(serde_json::Value::String(requirement.clone()));
            }
        }
    }
    let mut payload = std::collections::BTreeMap::new();
    payload.insert("deliverable_id".to_string(), serde_json::Value::String(deliverable_id.to_string()));
    payload.insert("missing_artifact_ids".to_string(), serde_json::Value::Array(missing_artifact_ids));
    payload.insert("missing_roles".to_string(), serde_json::Value::Array(missing_roles));
    payload.insert("unmet_requirements".to_string(), serde_json::Value::Array(unmet_requirements));
    payload
}

// ============================================================================
// SECTION: Storage-Backed Content Getter
// ============================================================================

/// Adapts a [`StorageBackend`] into the [`ContentGetter`] a sink reads
/// bytes through, so sinks never depend on the storage crate directly.
struct StorageContentGetter {
    /// The storage backend bytes are read from.
    storage: Arc<dyn StorageBackend>,
}

impl ContentGetter for StorageContentGetter {
    fn get(&self, location: &str) -> Result<Vec<u8>, DepotError> {
        self.storage.retrieve(location)
    }
}

// ============================================================================
// SECTION: Shipping Service
// ============================================================================

/// Implements C7: ships closed deliverables and purges staged bytes.
pub struct ShippingService {
    /// Byte storage backend (C1), read on ship via [`StorageContentGetter`].
    storage: Arc<dyn StorageBackend>,
    /// Destination sink (C2), dispatched by the composition root per scheme.
    sink: Arc<dyn OutboundSink>,
    /// Metadata store (C3).
    metadata: Arc<dyn MetadataStore>,
    /// Receipt store (C4).
    receipts: Arc<dyn ReceiptStore>,
    /// Clock supplying `shipped_at`/`emitted_at`/`purged_at` values.
    clock: Arc<dyn Clock>,
}

impl ShippingService {
    /// Builds a shipping service over the given backends.
    #[must_use]
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        sink: Arc<dyn OutboundSink>,
        metadata: Arc<dyn MetadataStore>,
        receipts: Arc<dyn ReceiptStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            storage,
            sink,
            metadata,
            receipts,
            clock,
        }
    }

    /// Ships `deliverable_id`, implementing the nine-step algorithm of
    /// `spec.md` §4.7.
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::AlreadyShipped`]/[`DepotError::AlreadyRejected`]
    /// if the deliverable already reached a terminal state, propagates the
    /// underlying metadata error from loading the contract or live
    /// artifacts, returns [`DepotError::ClosureNotSatisfied`] after
    /// transitioning the deliverable to `rejected` if closure fails,
    /// propagates [`DepotError::SinkTransportFailure`] from the sink with no
    /// state change, and propagates [`DepotError::ManifestPersistFailed`] /
    /// [`DepotError::RaceLost`] if the final CAS loses a race after the sink
    /// already succeeded.
    pub fn ship(&self, tenant_id: &TenantId, deliverable_id: DeliverableId) -> Result<ShipmentManifest, DepotError> {
        let contract = self.metadata.get_deliverable(tenant_id, deliverable_id)?;
        match contract.status {
            DeliverableStatus::Shipped => return Err(DepotError::AlreadyShipped(deliverable_id.to_string())),
            DeliverableStatus::Rejected => return Err(DepotError::AlreadyRejected(deliverable_id.to_string())),
            DeliverableStatus::Declared => {}
        }

        let live = self.metadata.list_artifacts(tenant_id, &contract.root_task_id, None)?;
        let report = compute_closure(&contract, &live);
        if !report.satisfied {
            self.metadata.cas_mark_rejected(&contract)?;
            let rejection = Receipt {
                receipt_id: ReceiptId::generate(),
                tenant_id: tenant_id.clone(),
                root_task_id: contract.root_task_id.clone(),
                kind: ReceiptKind::ShipmentRejected,
                emitted_at: self.clock.now(),
                payload: rejection_payload(deliverable_id, &report),
                caused_by_receipt_id: None,
            };
            self.receipts.append(&rejection)?;
            return Err(DepotError::ClosureNotSatisfied(deliverable_id.to_string()));
        }

        let matched: Vec<ArtifactPointer> = if contract.spec.artifact_ids.is_empty() {
            live
        } else {
            live.into_iter().filter(|pointer| contract.spec.artifact_ids.contains(&pointer.artifact_id)).collect()
        };

        let manifest = ShipmentManifest {
            manifest_id: ManifestId::generate(),
            deliverable_id,
            tenant_id: tenant_id.clone(),
            root_task_id: contract.root_task_id.clone(),
            artifact_pointers: matched,
            destination: contract.spec.shipping_destination.clone(),
            shipped_at: self.clock.now(),
        };

        let content = StorageContentGetter { storage: self.storage.clone() };
        self.sink.ship(&manifest.artifact_pointers, &manifest.destination, &manifest, &content)?;

        self.metadata.cas_mark_shipped(&contract, &manifest)?;

        let mut payload = std::collections::BTreeMap::new();
        payload.insert(
            "manifest_id".to_string(),
            serde_json::Value::String(manifest.manifest_id.to_string()),
        );
        payload.insert(
            "deliverable_id".to_string(),
            serde_json::Value::String(deliverable_id.to_string()),
        );
        payload.insert(
            "artifact_ids".to_string(),
            serde_json::Value::Array(
                manifest.artifact_pointers.iter().map(|pointer| serde_json::Value::String(pointer.artifact_id.to_string())).collect(),
            ),
        );
        let complete = Receipt {
            receipt_id: ReceiptId::generate(),
            tenant_id: tenant_id.clone(),
            root_task_id: contract.root_task_id.clone(),
            kind: ReceiptKind::ShipmentComplete,
            emitted_at: self.clock.now(),
            payload,
            caused_by_receipt_id: None,
        };
        self.receipts.append(&complete)?;

        Ok(manifest)
    }

    /// Purges artifacts under `tenant_id`/`root_task_id`, implementing the
    /// four retention policies of `spec.md` §4.7. When `artifact_ids` is
    /// `None`, every live artifact under the task is selected.
    ///
    /// # Errors
    ///
    /// Returns the underlying metadata error if listing live artifacts or
    /// marking a pointer purged fails, or [`DepotError::ReceiptWriteFailed`]
    /// if the terminal receipt cannot be appended.
    pub fn purge(
        &self,
        tenant_id: &TenantId,
        root_task_id: &RootTaskId,
        policy: PurgePolicy,
        artifact_ids: Option<Vec<ArtifactId>>,
    ) -> Result<Receipt, DepotError> {
        let selected: Vec<ArtifactId> = match artifact_ids {
            Some(ids) => ids,
            None => self
                .metadata
                .list_artifacts(tenant_id, root_task_id, None)?
                .into_iter()
                .map(|pointer| pointer.artifact_id)
                .collect(),
        };

        let now = self.clock.now();
        let purge_after = match policy {
            PurgePolicy::Immediate | PurgePolicy::Manual => None,
            PurgePolicy::Retain24h => Some(depotgate_core::Timestamp::from_unix_millis(now.unix_millis() + RETAIN_24H_MILLIS)),
            PurgePolicy::Retain7d => Some(depotgate_core::Timestamp::from_unix_millis(now.unix_millis() + RETAIN_7D_MILLIS)),
        };
        if !matches!(policy, PurgePolicy::Manual) {
            for artifact_id in &selected {
                let pointer = self.metadata.get_artifact(tenant_id, *artifact_id)?;
                self.metadata.mark_purged(tenant_id, *artifact_id, now, purge_after)?;
                if matches!(policy, PurgePolicy::Immediate) {
                    let _ = self.storage.delete(&pointer.location);
                }
            }
        }

        let mut payload = std::collections::BTreeMap::new();
        payload.insert("policy".to_string(), serde_json::to_value(policy).unwrap_or(serde_json::Value::Null));
        payload.insert("policy_version".to_string(), serde_json::Value::String(PURGE_POLICY_VERSION.to_string()));
        payload.insert(
            "artifact_ids".to_string(),
            serde_json::Value::Array(selected.iter().map(|id| serde_json::Value::String(id.to_string())).collect()),
        );
        let receipt = Receipt {
            receipt_id: ReceiptId::generate(),
            tenant_id: tenant_id.clone(),
            root_task_id: root_task_id.clone(),
            kind: ReceiptKind::ArtifactsPurged,
            emitted_at: self.clock.now(),
            payload,
            caused_by_receipt_id: None,
        };
        self.receipts.append(&receipt)?;
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "Test assertions use expect for clarity.")]

    use std::io::Cursor;
    use std::sync::Arc;

    use depotgate_core::ArtifactRole;
    use depotgate_core::Clock;
    use depotgate_core::DeliverableSpec;
    use depotgate_core::PurgePolicy;
    use depotgate_core::RootTaskId;
    use depotgate_core::SystemClock;
    use depotgate_core::TenantId;
    use depotgate_core::interfaces::MetadataStore;
    use depotgate_core::interfaces::ReceiptStore;
    use depotgate_core::interfaces::StorageBackend;

    use super::ShippingService;
    use crate::deliverable::DeliverableManager;
    use crate::staging::StagingArea;
    use crate::test_support::InMemoryMetadataStore;
    use crate::test_support::InMemoryReceiptStore;
    use crate::test_support::InMemoryStorageBackend;
    use crate::test_support::RecordingSink;

    fn system_clock() -> Arc<dyn Clock> {
        Arc::new(SystemClock)
    }

    #[test]
    fn ship_succeeds_when_closure_is_satisfied() -> Result<(), Box<dyn std::error::Error>> {
        let storage = InMemoryStorageBackend::new_arc();
        let metadata: Arc<InMemoryMetadataStore> = Arc::new(InMemoryMetadataStore::default());
        let receipts = InMemoryReceiptStore::new_arc();
        let sink = RecordingSink::new_arc();

        let staging = StagingArea::new(storage.clone(), metadata.clone(), receipts.clone(), system_clock(), 0);
        let declarer = DeliverableManager::new(metadata.clone(), system_clock());
        let shipper = ShippingService::new(storage, sink, metadata.clone(), receipts, system_clock());

        let tenant = TenantId::new("tenant-a");
        let task = RootTaskId::new("task-a");
        let mut content = Cursor::new(b"hello".to_vec());
        staging.stage(&tenant, &task, &mut content, "text/plain".to_string(), ArtifactRole::FinalOutput, None)?;

        let deliverable_id = declarer.declare(
            &tenant,
            &task,
            DeliverableSpec {
                artifact_ids: Vec::new(),
                artifact_roles: vec![ArtifactRole::FinalOutput],
                requirements: Vec::new(),
                shipping_destination: "fs://out/run-1".to_string(),
            },
        )?;

        let manifest = shipper.ship(&tenant, deliverable_id)?;
        assert_eq!(manifest.artifact_pointers.len(), 1);
        assert_eq!(metadata.manifest_count(), 1);

        let again = shipper.ship(&tenant, deliverable_id);
        assert!(again.is_err());
        Ok(())
    }

    #[test]
    fn ship_rejects_and_marks_deliverable_when_closure_unsatisfied() -> Result<(), Box<dyn std::error::Error>> {
        let storage = InMemoryStorageBackend::new_arc();
        let metadata: Arc<InMemoryMetadataStore> = Arc::new(InMemoryMetadataStore::default());
        let receipts = InMemoryReceiptStore::new_arc();
        let sink = RecordingSink::new_arc();

        let declarer = DeliverableManager::new(metadata.clone(), system_clock());
        let shipper = ShippingService::new(storage, sink, metadata, receipts.clone(), system_clock());

        let tenant = TenantId::new("tenant-a");
        let task = RootTaskId::new("task-a");
        let deliverable_id = declarer.declare(
            &tenant,
            &task,
            DeliverableSpec {
                artifact_ids: Vec::new(),
                artifact_roles: vec![ArtifactRole::FinalOutput],
                requirements: Vec::new(),
                shipping_destination: "fs://out/run-1".to_string(),
            },
        )?;

        let result = shipper.ship(&tenant, deliverable_id);
        assert!(result.is_err());

        let rejections = receipts.list(&tenant, &task, Some(depotgate_core::ReceiptKind::ShipmentRejected))?;
        assert_eq!(rejections.len(), 1);
        let missing_roles = rejections[0].payload.get("missing_roles").expect("missing_roles present");
        assert_eq!(missing_roles, &serde_json::json!(["final_output"]));

        let again = shipper.ship(&tenant, deliverable_id);
        assert!(again.is_err());
        Ok(())
    }

    #[test]
    fn ship_propagates_sink_failure_without_transitioning_deliverable() -> Result<(), Box<dyn std::error::Error>> {
        let storage = InMemoryStorageBackend::new_arc();
        let metadata: Arc<InMemoryMetadataStore> = Arc::new(InMemoryMetadataStore::default());
        let receipts = InMemoryReceiptStore::new_arc();
        let sink = RecordingSink::new_failing_arc();

        let staging = StagingArea::new(storage.clone(), metadata.clone(), receipts.clone(), system_clock(), 0);
        let declarer = DeliverableManager::new(metadata.clone(), system_clock());
        let shipper = ShippingService::new(storage, sink, metadata.clone(), receipts, system_clock());

        let tenant = TenantId::new("tenant-a");
        let task = RootTaskId::new("task-a");
        let mut content = Cursor::new(b"hello".to_vec());
        staging.stage(&tenant, &task, &mut content, "text/plain".to_string(), ArtifactRole::FinalOutput, None)?;

        let deliverable_id = declarer.declare(
            &tenant,
            &task,
            DeliverableSpec {
                artifact_ids: Vec::new(),
                artifact_roles: vec![ArtifactRole::FinalOutput],
                requirements: Vec::new(),
                shipping_destination: "fs://out/run-1".to_string(),
            },
        )?;

        let result = shipper.ship(&tenant, deliverable_id);
        assert!(result.is_err());
        assert_eq!(metadata.manifest_count(), 0);

        let contract = metadata.get_deliverable(&tenant, deliverable_id)?;
        assert_eq!(contract.status, depotgate_core::DeliverableStatus::Declared);
        Ok(())
    }

    #[test]
    fn purge_immediate_deletes_bytes_and_drops_pointer() -> Result<(), Box<dyn std::error::Error>> {
        let storage = InMemoryStorageBackend::new_arc();
        let metadata: Arc<InMemoryMetadataStore> = Arc::new(InMemoryMetadataStore::default());
        let receipts = InMemoryReceiptStore::new_arc();
        let sink = RecordingSink::new_arc();

        let staging = StagingArea::new(storage.clone(), metadata.clone(), receipts.clone(), system_clock(), 0);
        let shipper = ShippingService::new(storage.clone(), sink, metadata.clone(), receipts.clone(), system_clock());

        let tenant = TenantId::new("tenant-a");
        let task = RootTaskId::new("task-a");
        let mut content = Cursor::new(b"hello".to_vec());
        let pointer = staging.stage(&tenant, &task, &mut content, "text/plain".to_string(), ArtifactRole::FinalOutput, None)?;

        shipper.purge(&tenant, &task, PurgePolicy::Immediate, None)?;

        assert!(!storage.exists(&pointer.location)?);
        assert!(metadata.list_artifacts(&tenant, &task, None)?.is_empty());
        let logged = receipts.list(&tenant, &task, None)?;
        assert_eq!(logged.len(), 2);
        Ok(())
    }

    #[test]
    fn purge_manual_leaves_pointers_untouched() -> Result<(), Box<dyn std::error::Error>> {
        let storage = InMemoryStorageBackend::new_arc();
        let metadata: Arc<InMemoryMetadataStore> = Arc::new(InMemoryMetadataStore::default());
        let receipts = InMemoryReceiptStore::new_arc();
        let sink = RecordingSink::new_arc();

        let staging = StagingArea::new(storage.clone(), metadata.clone(), receipts.clone(), system_clock(), 0);
        let shipper = ShippingService::new(storage, sink, metadata.clone(), receipts, system_clock());

        let tenant = TenantId::new("tenant-a");
        let task = RootTaskId::new("task-a");
        let mut content = Cursor::new(b"hello".to_vec());
        staging.stage(&tenant, &task, &mut content, "text/plain".to_string(), ArtifactRole::FinalOutput, None)?;

        shipper.purge(&tenant, &task, PurgePolicy::Manual, None)?;
        assert_eq!(metadata.list_artifacts(&tenant, &task, None)?.len(), 1);
        Ok(())
    }
}
