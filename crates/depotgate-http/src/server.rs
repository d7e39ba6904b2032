// crates/depotgate-http/src/server.rs
// ============================================================================
// Module: HTTP Server Lifecycle
// Description: Binds the route table to a TCP listener and serves it.
// Purpose: Give the CLI composition root a single call to start serving.
// Dependencies: axum, tokio
// ============================================================================

//! ## Overview
//! Mirrors the teacher workspace's `McpServer::serve`: the façade owns its
//! own bind/accept loop so the CLI only has to hand over an [`AppState`] and
//! an address.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;

use thiserror::Error;

use crate::routes::AppState;
use crate::routes::build_router;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while binding or serving the HTTP façade.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The listener could not be bound to `addr`.
    #[error("binding {addr}: {source}")]
    Bind {
        /// The address that failed to bind.
        addr: SocketAddr,
        /// The underlying I/O error.
        source: std::io::Error,
    },
    /// The accept loop exited with an I/O error.
    #[error("serving: {0}")]
    Serve(std::io::Error),
}

// ============================================================================
// SECTION: Serve
// ============================================================================

/// Binds `addr` and serves `state`'s route table until the process is
/// terminated or the accept loop errors.
///
/// # Errors
///
/// Returns [`ServeError::Bind`] if `addr` cannot be bound, or
/// [`ServeError::Serve`] if the accept loop itself fails.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<(), ServeError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })?;
    let router = build_router(state);
    axum::serve(listener, router).await.map_err(ServeError::Serve)
}
