// crates/depotgate-http/src/lib.rs
// ============================================================================
// Crate: depotgate-http
// Description: Axum HTTP facade binding spec.md §6's verb table to depotgate-service.
// Purpose: Give DepotGate an HTTP binding without teaching depotgate-service about transport.
// Dependencies: axum, depotgate-core, depotgate-service, serde, serde_json, thiserror, tokio
// ============================================================================

//! # depotgate-http
//!
//! One HTTP binding of the verb table in `spec.md` §6; an agent-tool façade
//! could offer the same verbs over a different transport without touching
//! `depotgate-service`. Every handler offloads its blocking core call via
//! `tokio::task::spawn_blocking`, since `depotgate-service`'s traits are
//! synchronous by design (`spec.md` §5).

/// Stable JSON error mapping shared by every handler.
pub mod error;
/// Route table and application state.
pub mod routes;
/// Bind/accept lifecycle for the route table.
pub mod server;
/// Request/latency metrics hooks.
pub mod telemetry;

pub use crate::error::ApiError;
pub use crate::routes::AppState;
pub use crate::routes::build_router;
pub use crate::server::ServeError;
pub use crate::server::serve;
