// crates/depotgate-store-sqlite/src/lib.rs
// ============================================================================
// Crate: depotgate-store-sqlite
// Description: SQLite-backed MetadataStore and ReceiptStore implementations.
// Purpose: Durably persist artifact pointers, deliverable contracts, shipment manifests, and receipts.
// Dependencies: depotgate-core, rusqlite, serde_json
// ============================================================================

//! # depotgate-store-sqlite
//!
//! Implements C3 (`MetadataStore`) and C4 (`ReceiptStore`) over three plus
//! one tables (`artifacts`, `deliverables`, `manifests`, `receipts`) in a
//! single `SQLite` database, following the connection-acquisition pattern
//! of the teacher workspace's run-state store: a `Mutex<Connection>` guard
//! acquired per call, WAL journal mode and a busy timeout set at open, and
//! an explicit `connection.transaction()` around the grouped shipping
//! write (deliverable CAS plus manifest insert), relying on `rusqlite`'s
//! `Drop` to roll back on any early return.
//!
//! This store carries none of the teacher's writer-thread batching or
//! perf-histogram instrumentation: DepotGate's write volume does not
//! warrant it, and the grouped-write transaction already gives the
//! atomicity the ship path needs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use depotgate_core::ArtifactId;
use depotgate_core::ArtifactPointer;
use depotgate_core::ArtifactRole;
use depotgate_core::DeliverableContract;
use depotgate_core::DeliverableId;
use depotgate_core::DepotError;
use depotgate_core::Receipt;
use depotgate_core::ReceiptId;
use depotgate_core::ReceiptKind;
use depotgate_core::RootTaskId;
use depotgate_core::ShipmentManifest;
use depotgate_core::TenantId;
use depotgate_core::interfaces::MetadataStore;
use depotgate_core::interfaces::ReceiptStore;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default `SQLite` busy timeout in milliseconds.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed implementation of [`MetadataStore`] and [`ReceiptStore`].
///
/// # Invariants
/// - All access to `connection` is serialized through its mutex.
pub struct SqliteStore {
    /// Shared connection guarded by a mutex.
    connection: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) a store at `path`, initializing its schema.
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::StorageFailure`] if the database cannot be
    /// opened or its schema initialized.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DepotError> {
        let path = path.into();
        ensure_parent_dir(&path)?;
        let mut connection = open_connection(&path)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, DepotError> {
        self.connection.lock().map_err(|_| DepotError::StorageFailure("sqlite mutex poisoned".to_string()))
    }
}

/// Creates the parent directory of `path` if it does not already exist.
fn ensure_parent_dir(path: &Path) -> Result<(), DepotError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .map_err(|err| DepotError::StorageFailure(format!("creating store directory: {err}")))?;
    }
    Ok(())
}

/// Opens an `SQLite` connection with WAL journaling and a busy timeout.
fn open_connection(path: &Path) -> Result<Connection, DepotError> {
    let connection =
        Connection::open(path).map_err(|err| DepotError::StorageFailure(format!("opening sqlite store: {err}")))?;
    connection
        .execute_batch("PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")
        .map_err(|err| DepotError::StorageFailure(format!("configuring sqlite store: {err}")))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))
        .map_err(|err| DepotError::StorageFailure(format!("setting busy timeout: {err}")))?;
    Ok(connection)
}

/// Creates the store's tables if they do not already exist.
fn initialize_schema(connection: &mut Connection) -> Result<(), DepotError> {
    connection
        .execute_batch(
            "CREATE TABLE IF NOT EXISTS artifacts (
                tenant_id TEXT NOT NULL,
                artifact_id TEXT NOT NULL,
                root_task_id TEXT NOT NULL,
                location TEXT NOT NULL,
                size_bytes INTEGER NOT NULL,
                mime_type TEXT NOT NULL,
                content_hash TEXT NOT NULL,
                artifact_role TEXT NOT NULL,
                produced_by_receipt_id TEXT,
                created_at INTEGER NOT NULL,
                purged_at INTEGER,
                purge_after INTEGER,
                PRIMARY KEY (tenant_id, artifact_id)
            );
            CREATE INDEX IF NOT EXISTS idx_artifacts_task
                ON artifacts (tenant_id, root_task_id);
            CREATE TABLE IF NOT EXISTS deliverables (
                tenant_id TEXT NOT NULL,
                deliverable_id TEXT NOT NULL,
                root_task_id TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                spec_json TEXT NOT NULL,
                satisfied_requirements_json TEXT NOT NULL,
                status TEXT NOT NULL,
                PRIMARY KEY (tenant_id, deliverable_id)
            );
            CREATE TABLE IF NOT EXISTS manifests (
                tenant_id TEXT NOT NULL,
                manifest_id TEXT NOT NULL,
                deliverable_id TEXT NOT NULL,
                root_task_id TEXT NOT NULL,
                artifact_pointers_json TEXT NOT NULL,
                destination TEXT NOT NULL,
                shipped_at INTEGER NOT NULL,
                PRIMARY KEY (tenant_id, manifest_id)
            );
            CREATE INDEX IF NOT EXISTS idx_manifests_deliverable
                ON manifests (tenant_id, deliverable_id);
            CREATE TABLE IF NOT EXISTS receipts (
                tenant_id TEXT NOT NULL,
                receipt_id TEXT NOT NULL,
                root_task_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                emitted_at INTEGER NOT NULL,
                payload_json TEXT NOT NULL,
                caused_by_receipt_id TEXT,
                PRIMARY KEY (tenant_id, receipt_id)
            );
            CREATE INDEX IF NOT EXISTS idx_receipts_task_time
                ON receipts (tenant_id, root_task_id, emitted_at);",
        )
        .map_err(|err| DepotError::StorageFailure(format!("initializing sqlite schema: {err}")))?;
    Ok(())
}

// ============================================================================
// SECTION: Row (De)serialization
// ============================================================================

/// Serializes an [`ArtifactRole`] to its stable wire string.
fn role_to_string(role: &ArtifactRole) -> Result<String, DepotError> {
    serde_json::to_string(role).map_err(|err| DepotError::StorageFailure(format!("serializing role: {err}")))
}

/// Parses an [`ArtifactRole`] from its stable wire string.
fn role_from_string(raw: &str) -> Result<ArtifactRole, DepotError> {
    serde_json::from_str(raw).map_err(|err| DepotError::StorageFailure(format!("parsing role: {err}")))
}

/// Builds an [`ArtifactPointer`] from a queried row.
#[allow(clippy::too_many_arguments, reason = "Mirrors the artifacts table's column layout one-to-one.")]
fn artifact_from_row(
    artifact_id: &str,
    tenant_id: &str,
    root_task_id: &str,
    location: String,
    size_bytes: i64,
    mime_type: String,
    content_hash: String,
    artifact_role: &str,
    produced_by_receipt_id: Option<String>,
    created_at: i64,
) -> Result<ArtifactPointer, DepotError> {
    let artifact_id = ArtifactId::parse(artifact_id)
        .ok_or_else(|| DepotError::StorageFailure("corrupt artifact_id in store".to_string()))?;
    let produced_by_receipt_id = produced_by_receipt_id
        .map(|raw| {
            ReceiptId::parse(&raw).ok_or_else(|| DepotError::StorageFailure("corrupt receipt_id in store".to_string()))
        })
        .transpose()?;
    let content_hash = serde_json::from_value(serde_json::Value::String(content_hash))
        .map_err(|err| DepotError::StorageFailure(format!("parsing content hash: {err}")))?;
    Ok(ArtifactPointer {
        artifact_id,
        tenant_id: TenantId::new(tenant_id),
        root_task_id: RootTaskId::new(root_task_id),
        location,
        size_bytes: u64::try_from(size_bytes)
            .map_err(|_| DepotError::StorageFailure("negative size_bytes in store".to_string()))?,
        mime_type,
        content_hash,
        artifact_role: role_from_string(artifact_role)?,
        produced_by_receipt_id,
        created_at: depotgate_core::Timestamp::from_unix_millis(created_at),
    })
}

impl MetadataStore for SqliteStore {
    fn put_artifact(&self, pointer: &ArtifactPointer) -> Result<(), DepotError> {
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO artifacts (tenant_id, artifact_id, root_task_id, location, size_bytes, mime_type, \
                 content_hash, artifact_role, produced_by_receipt_id, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    pointer.tenant_id.as_str(),
                    pointer.artifact_id.to_string(),
                    pointer.root_task_id.as_str(),
                    pointer.location,
                    i64::try_from(pointer.size_bytes).unwrap_or(i64::MAX),
                    pointer.mime_type,
                    pointer.content_hash.as_str(),
                    role_to_string(&pointer.artifact_role)?,
                    pointer.produced_by_receipt_id.map(|id| id.to_string()),
                    pointer.created_at.unix_millis(),
                ],
            )
            .map_err(|err| DepotError::StorageFailure(format!("inserting artifact: {err}")))?;
        Ok(())
    }

    fn get_artifact(&self, tenant_id: &TenantId, artifact_id: ArtifactId) -> Result<ArtifactPointer, DepotError> {
        let guard = self.lock()?;
        let row = guard
            .query_row(
                "SELECT artifact_id, tenant_id, root_task_id, location, size_bytes, mime_type, content_hash, \
                 artifact_role, produced_by_receipt_id, created_at FROM artifacts \
                 WHERE tenant_id = ?1 AND artifact_id = ?2 AND purged_at IS NULL",
                params![tenant_id.as_str(), artifact_id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, String>(7)?,
                        row.get::<_, Option<String>>(8)?,
                        row.get::<_, i64>(9)?,
                    ))
                },
            )
            .optional()
            .map_err(|err| DepotError::StorageFailure(format!("querying artifact: {err}")))?;
        let Some((aid, tid, rtid, location, size_bytes, mime_type, content_hash, role, receipt, created_at)) = row
        else {
            return Err(DepotError::NotFound(format!("artifact {artifact_id}")));
        };
        artifact_from_row(&aid, &tid, &rtid, location, size_bytes, mime_type, content_hash, &role, receipt, created_at)
    }

    fn list_artifacts(
        &self,
        tenant_id: &TenantId,
        root_task_id: &RootTaskId,
        role: Option<&ArtifactRole>,
    ) -> Result<Vec<ArtifactPointer>, DepotError> {
        let guard = self.lock()?;
        let mut stmt = guard
            .prepare(
                "SELECT artifact_id, tenant_id, root_task_id, location, size_bytes, mime_type, content_hash, \
                 artifact_role, produced_by_receipt_id, created_at FROM artifacts \
                 WHERE tenant_id = ?1 AND root_task_id = ?2 AND purged_at IS NULL ORDER BY created_at ASC",
            )
            .map_err(|err| DepotError::StorageFailure(format!("preparing artifact list: {err}")))?;
        let rows = stmt
            .query_map(params![tenant_id.as_str(), root_task_id.as_str()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, Option<String>>(8)?,
                    row.get::<_, i64>(9)?,
                ))
            })
            .map_err(|err| DepotError::StorageFailure(format!("listing artifacts: {err}")))?;
        let mut results = Vec::new();
        for row in rows {
            let (aid, tid, rtid, location, size_bytes, mime_type, content_hash, role_raw, receipt, created_at) =
                row.map_err(|err| DepotError::StorageFailure(format!("reading artifact row: {err}")))?;
            let pointer = artifact_from_row(
                &aid,
                &tid,
                &rtid,
                location,
                size_bytes,
                mime_type,
                content_hash,
                &role_raw,
                receipt,
                created_at,
            )?;
            if let Some(wanted) = role
                && &pointer.artifact_role != wanted
            {
                continue;
            }
            results.push(pointer);
        }
        Ok(results)
    }

    fn mark_purged(
        &self,
        tenant_id: &TenantId,
        artifact_id: ArtifactId,
        purged_at: depotgate_core::Timestamp,
        purge_after: Option<depotgate_core::Timestamp>,
    ) -> Result<(), DepotError> {
        let guard = self.lock()?;
        let affected = guard
            .execute(
                "UPDATE artifacts SET purged_at = ?1, purge_after = ?2 \
                 WHERE tenant_id = ?3 AND artifact_id = ?4 AND purged_at IS NULL",
                params![
                    purged_at.unix_millis(),
                    purge_after.map(depotgate_core::Timestamp::unix_millis),
                    tenant_id.as_str(),
                    artifact_id.to_string(),
                ],
            )
            .map_err(|err| DepotError::StorageFailure(format!("marking artifact purged: {err}")))?;
        if affected == 0 {
            return Err(DepotError::NotFound(format!("live artifact {artifact_id}")));
        }
        Ok(())
    }

    fn put_deliverable(&self, contract: &DeliverableContract) -> Result<(), DepotError> {
        let spec_json = serde_json::to_string(&contract.spec)
            .map_err(|err| DepotError::StorageFailure(format!("serializing spec: {err}")))?;
        let satisfied_json = serde_json::to_string(&contract.satisfied_requirements)
            .map_err(|err| DepotError::StorageFailure(format!("serializing requirements: {err}")))?;
        let status_json = serde_json::to_string(&contract.status)
            .map_err(|err| DepotError::StorageFailure(format!("serializing status: {err}")))?;
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO deliverables (tenant_id, deliverable_id, root_task_id, created_at, spec_json, \
                 satisfied_requirements_json, status) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    contract.tenant_id.as_str(),
                    contract.deliverable_id.to_string(),
                    contract.root_task_id.as_str(),
                    contract.created_at.unix_millis(),
                    spec_json,
                    satisfied_json,
                    status_json,
                ],
            )
            .map_err(|err| DepotError::StorageFailure(format!("inserting deliverable: {err}")))?;
        Ok(())
    }

    fn get_deliverable(&self, tenant_id: &TenantId, deliverable_id: DeliverableId) -> Result<DeliverableContract, DepotError> {
        let guard = self.lock()?;
        fetch_deliverable(&guard, tenant_id, deliverable_id)
    }

    fn update_deliverable(&self, contract: &DeliverableContract) -> Result<(), DepotError> {
        let satisfied_json = serde_json::to_string(&contract.satisfied_requirements)
            .map_err(|err| DepotError::StorageFailure(format!("serializing requirements: {err}")))?;
        let status_json = serde_json::to_string(&contract.status)
            .map_err(|err| DepotError::StorageFailure(format!("serializing status: {err}")))?;
        let guard = self.lock()?;
        let affected = guard
            .execute(
                "UPDATE deliverables SET satisfied_requirements_json = ?1, status = ?2 \
                 WHERE tenant_id = ?3 AND deliverable_id = ?4",
                params![
                    satisfied_json,
                    status_json,
                    contract.tenant_id.as_str(),
                    contract.deliverable_id.to_string(),
                ],
            )
            .map_err(|err| DepotError::StorageFailure(format!("updating deliverable: {err}")))?;
        if affected == 0 {
            return Err(DepotError::NotFound(format!("deliverable {}", contract.deliverable_id)));
        }
        Ok(())
    }

    fn cas_mark_shipped(&self, contract: &DeliverableContract, manifest: &ShipmentManifest) -> Result<(), DepotError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| DepotError::StorageFailure(format!("opening transaction: {err}")))?;
        let current_status: Option<String> = tx
            .query_row(
                "SELECT status FROM deliverables WHERE tenant_id = ?1 AND deliverable_id = ?2",
                params![contract.tenant_id.as_str(), contract.deliverable_id.to_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| DepotError::StorageFailure(format!("reading deliverable status: {err}")))?;
        let Some(current_status) = current_status else {
            return Err(DepotError::NotFound(format!("deliverable {}", contract.deliverable_id)));
        };
        match current_status.as_str() {
            "\"shipped\"" => return Err(DepotError::AlreadyShipped(contract.deliverable_id.to_string())),
            "\"rejected\"" => return Err(DepotError::AlreadyRejected(contract.deliverable_id.to_string())),
            "\"declared\"" => {}
            _ => return Err(DepotError::RaceLost(contract.deliverable_id.to_string())),
        }
        let affected = tx
            .execute(
                "UPDATE deliverables SET status = '\"shipped\"' \
                 WHERE tenant_id = ?1 AND deliverable_id = ?2 AND status = '\"declared\"'",
                params![contract.tenant_id.as_str(), contract.deliverable_id.to_string()],
            )
            .map_err(|err| DepotError::StorageFailure(format!("marking shipped: {err}")))?;
        if affected == 0 {
            return Err(DepotError::RaceLost(contract.deliverable_id.to_string()));
        }
        let artifact_pointers_json = serde_json::to_string(&manifest.artifact_pointers)
            .map_err(|err| DepotError::ManifestPersistFailed(format!("serializing manifest artifacts: {err}")))?;
        tx.execute(
            "INSERT INTO manifests (tenant_id, manifest_id, deliverable_id, root_task_id, artifact_pointers_json, \
             destination, shipped_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                manifest.tenant_id.as_str(),
                manifest.manifest_id.to_string(),
                manifest.deliverable_id.to_string(),
                manifest.root_task_id.as_str(),
                artifact_pointers_json,
                manifest.destination,
                manifest.shipped_at.unix_millis(),
            ],
        )
        .map_err(|err| DepotError::ManifestPersistFailed(format!("inserting manifest: {err}")))?;
        tx.commit().map_err(|err| DepotError::ManifestPersistFailed(format!("committing shipment: {err}")))?;
        Ok(())
    }

    fn cas_mark_rejected(&self, contract: &DeliverableContract) -> Result<(), DepotError> {
        let guard = self.lock()?;
        let affected = guard
            .execute(
                "UPDATE deliverables SET status = '\"rejected\"' \
                 WHERE tenant_id = ?1 AND deliverable_id = ?2 AND status = '\"declared\"'",
                params![contract.tenant_id.as_str(), contract.deliverable_id.to_string()],
            )
            .map_err(|err| DepotError::StorageFailure(format!("marking rejected: {err}")))?;
        if affected > 0 {
            return Ok(());
        }
        let current = fetch_deliverable(&guard, &contract.tenant_id, contract.deliverable_id)?;
        match current.status {
            depotgate_core::DeliverableStatus::Shipped => {
                Err(DepotError::AlreadyShipped(contract.deliverable_id.to_string()))
            }
            depotgate_core::DeliverableStatus::Rejected => {
                Err(DepotError::AlreadyRejected(contract.deliverable_id.to_string()))
            }
            depotgate_core::DeliverableStatus::Declared => Err(DepotError::RaceLost(contract.deliverable_id.to_string())),
        }
    }
}

/// Fetches a deliverable contract by id, reusing the same connection handle
/// for both read-only lookups and the post-CAS status checks above.
fn fetch_deliverable(
    connection: &Connection,
    tenant_id: &TenantId,
    deliverable_id: DeliverableId,
) -> Result<DeliverableContract, DepotError> {
    let row = connection
        .query_row(
            "SELECT root_task_id, created_at, spec_json, satisfied_requirements_json, status FROM deliverables \
             WHERE tenant_id = ?1 AND deliverable_id = ?2",
            params![tenant_id.as_str(), deliverable_id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            },
        )
        .optional()
        .map_err(|err| DepotError::StorageFailure(format!("querying deliverable: {err}")))?;
    let Some((root_task_id, created_at, spec_json, satisfied_json, status_json)) = row else {
        return Err(DepotError::NotFound(format!("deliverable {deliverable_id}")));
    };
    let spec = serde_json::from_str(&spec_json).map_err(|err| DepotError::StorageFailure(format!("parsing spec: {err}")))?;
    let satisfied_requirements = serde_json::from_str(&satisfied_json)
        .map_err(|err| DepotError::StorageFailure(format!("parsing requirements: {err}")))?;
    let status = serde_json::from_str(&status_json)
        .map_err(|err| DepotError::StorageFailure(format!("parsing status: {err}")))?;
    Ok(DeliverableContract {
        deliverable_id,
        tenant_id: tenant_id.clone(),
        root_task_id: RootTaskId::new(root_task_id),
        created_at: depotgate_core::Timestamp::from_unix_millis(created_at),
        spec,
        satisfied_requirements,
        status,
    })
}

impl ReceiptStore for SqliteStore {
    fn append(&self, receipt: &Receipt) -> Result<(), DepotError> {
        let payload_json = serde_json::to_string(&receipt.payload)
            .map_err(|err| DepotError::ReceiptWriteFailed(format!("serializing payload: {err}")))?;
        let kind_json = serde_json::to_string(&receipt.kind)
            .map_err(|err| DepotError::ReceiptWriteFailed(format!("serializing kind: {err}")))?;
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO receipts (tenant_id, receipt_id, root_task_id, kind, emitted_at, payload_json, \
                 caused_by_receipt_id) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    receipt.tenant_id.as_str(),
                    receipt.receipt_id.to_string(),
                    receipt.root_task_id.as_str(),
                    kind_json,
                    receipt.emitted_at.unix_millis(),
                    payload_json,
                    receipt.caused_by_receipt_id.map(|id| id.to_string()),
                ],
            )
            .map_err(|err| DepotError::ReceiptWriteFailed(format!("inserting receipt: {err}")))?;
        Ok(())
    }

    fn list(
        &self,
        tenant_id: &TenantId,
        root_task_id: &RootTaskId,
        kind: Option<ReceiptKind>,
    ) -> Result<Vec<Receipt>, DepotError> {
        let guard = self.lock()?;
        let mut stmt = guard
            .prepare(
                "SELECT receipt_id, kind, emitted_at, payload_json, caused_by_receipt_id FROM receipts \
                 WHERE tenant_id = ?1 AND root_task_id = ?2 ORDER BY emitted_at ASC",
            )
            .map_err(|err| DepotError::StorageFailure(format!("preparing receipt list: {err}")))?;
        let rows = stmt
            .query_map(params![tenant_id.as_str(), root_task_id.as_str()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })
            .map_err(|err| DepotError::StorageFailure(format!("listing receipts: {err}")))?;
        let mut results = Vec::new();
        for row in rows {
            let (receipt_id, kind_json, emitted_at, payload_json, caused_by) =
                row.map_err(|err| DepotError::StorageFailure(format!("reading receipt row: {err}")))?;
            let parsed_kind: ReceiptKind = serde_json::from_str(&kind_json)
                .map_err(|err| DepotError::StorageFailure(format!("parsing receipt kind: {err}")))?;
            if let Some(wanted) = kind
                && parsed_kind != wanted
            {
                continue;
            }
            results.push(build_receipt(
                tenant_id,
                root_task_id,
                &receipt_id,
                parsed_kind,
                emitted_at,
                &payload_json,
                caused_by,
            )?);
        }
        Ok(results)
    }

    fn get(&self, tenant_id: &TenantId, receipt_id: ReceiptId) -> Result<Receipt, DepotError> {
        let guard = self.lock()?;
        let row = guard
            .query_row(
                "SELECT root_task_id, kind, emitted_at, payload_json, caused_by_receipt_id FROM receipts \
                 WHERE tenant_id = ?1 AND receipt_id = ?2",
                params![tenant_id.as_str(), receipt_id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Option<String>>(4)?,
                    ))
                },
            )
            .optional()
            .map_err(|err| DepotError::StorageFailure(format!("querying receipt: {err}")))?;
        let Some((root_task_id, kind_json, emitted_at, payload_json, caused_by)) = row else {
            return Err(DepotError::NotFound(format!("receipt {receipt_id}")));
        };
        let root_task_id = RootTaskId::new(root_task_id);
        let parsed_kind: ReceiptKind = serde_json::from_str(&kind_json)
            .map_err(|err| DepotError::StorageFailure(format!("parsing receipt kind: {err}")))?;
        build_receipt(tenant_id, &root_task_id, &receipt_id.to_string(), parsed_kind, emitted_at, &payload_json, caused_by)
    }
}

/// Assembles a [`Receipt`] from its parsed row components.
fn build_receipt(
    tenant_id: &TenantId,
    root_task_id: &RootTaskId,
    receipt_id: &str,
    kind: ReceiptKind,
    emitted_at: i64,
    payload_json: &str,
    caused_by_receipt_id: Option<String>,
) -> Result<Receipt, DepotError> {
    let receipt_id = ReceiptId::parse(receipt_id)
        .ok_or_else(|| DepotError::StorageFailure("corrupt receipt_id in store".to_string()))?;
    let payload: BTreeMap<String, serde_json::Value> =
        serde_json::from_str(payload_json).map_err(|err| DepotError::StorageFailure(format!("parsing payload: {err}")))?;
    let caused_by_receipt_id = caused_by_receipt_id
        .map(|raw| {
            ReceiptId::parse(&raw).ok_or_else(|| DepotError::StorageFailure("corrupt receipt_id in store".to_string()))
        })
        .transpose()?;
    Ok(Receipt {
        receipt_id,
        tenant_id: tenant_id.clone(),
        root_task_id: root_task_id.clone(),
        kind,
        emitted_at: depotgate_core::Timestamp::from_unix_millis(emitted_at),
        payload,
        caused_by_receipt_id,
    })
}
