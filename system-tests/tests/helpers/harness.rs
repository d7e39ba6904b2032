// system-tests/tests/helpers/harness.rs
// ============================================================================
// Module: DepotGate Server Harness
// Description: Spawns a real DepotGate HTTP server, backed by real crates, for system tests.
// Purpose: Exercise the composition root end-to-end the same way `depotgate serve` does.
// Dependencies: depotgate-core, depotgate-http, depotgate-service, depotgate-sink,
//               depotgate-storage-fs, depotgate-store-sqlite, tokio
// ============================================================================

//! ## Overview
//! Mirrors the teacher workspace's `McpServerHandle`: the harness owns a
//! tempdir, builds the same backend stack `depotgate-cli`'s `build_backends`
//! builds, binds a loopback port, and hands back a base URL plus a join
//! handle the test can abort on teardown. No mocks: every backend here is
//! the real crate a production deployment would use, just rooted under a
//! tempdir instead of a configured path.

#![allow(dead_code, reason = "Not every scenario test exercises every helper.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Harness setup treats failure as a hard test failure, not a skip."
)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::net::TcpListener;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::OnceLock;

use depotgate_core::Clock;
use depotgate_core::SystemClock;
use depotgate_core::TenantId;
use depotgate_core::interfaces::MetadataStore;
use depotgate_core::interfaces::OutboundSink;
use depotgate_core::interfaces::ReceiptStore;
use depotgate_core::interfaces::StorageBackend;
use depotgate_http::AppState;
use depotgate_http::telemetry::NoopMetrics;
use depotgate_service::DeliverableManager;
use depotgate_service::ShippingService;
use depotgate_service::StagingArea;
use depotgate_sink::CompositeSink;
use depotgate_sink::FsSink;
use depotgate_storage_fs::FsStorageBackend;
use depotgate_store_sqlite::SqliteStore;
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// Default max artifact size for servers spawned without an explicit override.
pub const DEFAULT_MAX_ARTIFACT_BYTES: u64 = 10 * 1024 * 1024;

/// A running DepotGate HTTP server plus the tempdir it is rooted under.
pub struct ServerHandle {
    /// Keeps the backing tempdir alive for the handle's lifetime.
    _tempdir: TempDir,
    /// Base URL the server is listening on, e.g. `http://127.0.0.1:41234`.
    base_url: String,
    /// The single tenant this server instance serves.
    tenant_id: String,
    /// Join handle for the server's accept loop task.
    join: JoinHandle<Result<(), depotgate_http::ServeError>>,
}

impl ServerHandle {
    /// Returns the server's base URL (no trailing slash).
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the single tenant id this server serves.
    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Returns the filesystem sink's base directory (`<tempdir>/sink`), for
    /// assertions that read shipped bytes directly off disk.
    #[must_use]
    pub fn sink_base(&self) -> std::path::PathBuf {
        self._tempdir.path().join("sink")
    }

    /// Aborts the server's accept loop.
    pub async fn shutdown(self) {
        self.join.abort();
        let _ = self.join.await;
    }
}

/// Reserves loopback ports bound during [`allocate_bind_addr`] until they are
/// handed to a real listener, avoiding a second test racing the same port
/// before the server binds it.
fn port_reservations() -> &'static Mutex<HashMap<u16, TcpListener>> {
    static PORT_RESERVATIONS: OnceLock<Mutex<HashMap<u16, TcpListener>>> = OnceLock::new();
    PORT_RESERVATIONS.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Binds an ephemeral loopback port and reserves it until [`release_bind_addr`] is called.
fn allocate_bind_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("binding loopback listener");
    let addr = listener.local_addr().expect("reading listener address");
    port_reservations().lock().expect("port reservation mutex poisoned").insert(addr.port(), listener);
    addr
}

/// Releases a port reserved by [`allocate_bind_addr`] immediately before the
/// real server binds the same address.
fn release_bind_addr(addr: SocketAddr) {
    if let Ok(mut guard) = port_reservations().lock() {
        guard.remove(&addr.port());
    }
}

/// Spawns a DepotGate HTTP server rooted under a fresh tempdir, serving
/// `tenant_id` with the `fs` sink registered at `<tempdir>/sink`.
///
/// # Panics
///
/// Panics if any backend fails to open or the server fails to bind; system
/// tests treat harness setup failure as a hard test failure, not a skip.
pub async fn spawn_server(tenant_id: &str, max_artifact_bytes: u64) -> ServerHandle {
    let tempdir = tempfile::tempdir().expect("creating harness tempdir");
    let storage: Arc<dyn StorageBackend> =
        Arc::new(FsStorageBackend::new(tempdir.path().join("storage")).expect("opening storage backend"));
    let metadata: Arc<dyn MetadataStore> =
        Arc::new(SqliteStore::open(tempdir.path().join("metadata.sqlite3")).expect("opening metadata store"));
    let receipts: Arc<dyn ReceiptStore> =
        Arc::new(SqliteStore::open(tempdir.path().join("receipts.sqlite3")).expect("opening receipt store"));
    let fs_sink = FsSink::new(tempdir.path().join("sink")).expect("opening fs sink base");
    let sink: Arc<dyn OutboundSink> = Arc::new(CompositeSink::builder().sink("fs", fs_sink).build());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let staging = Arc::new(StagingArea::new(storage.clone(), metadata.clone(), receipts.clone(), clock.clone(), max_artifact_bytes));
    let deliverables = Arc::new(DeliverableManager::new(metadata.clone(), clock.clone()));
    let shipping = Arc::new(ShippingService::new(storage.clone(), sink, metadata.clone(), receipts.clone(), clock));

    let state = AppState {
        tenant_id: TenantId::new(tenant_id),
        staging,
        deliverables,
        shipping,
        metadata,
        storage,
        receipts,
        metrics: Arc::new(NoopMetrics),
    };

    let addr = allocate_bind_addr();
    release_bind_addr(addr);
    let join = tokio::spawn(depotgate_http::serve(state, addr));
    wait_until_ready(addr).await;

    ServerHandle {
        _tempdir: tempdir,
        base_url: format!("http://{addr}"),
        tenant_id: tenant_id.to_string(),
        join,
    }
}

/// Polls the server's bind address until a TCP connection succeeds, bounding
/// the wait so a harness bug fails fast rather than hanging the test suite.
async fn wait_until_ready(addr: SocketAddr) {
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(5);
    loop {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            return;
        }
        assert!(tokio::time::Instant::now() < deadline, "server at {addr} did not become ready in time");
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
}
