// crates/depotgate-http/src/error.rs
// ============================================================================
// Module: HTTP Error Mapping
// Description: Maps DepotError onto HTTP status codes and a stable JSON error body.
// Purpose: Give every DepotGate verb the same wire-level failure shape.
// Dependencies: axum, depotgate-core, serde, serde_json
// ============================================================================

//! ## Overview
//! `spec.md` §7. Every failure reaches the client as
//! `{"error": {"kind": "...", "detail": "..."}}` with a status code chosen
//! from [`ErrorKind`], never a stack trace.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use depotgate_core::DepotError;
use depotgate_core::ErrorKind;
use serde::Serialize;

// ============================================================================
// SECTION: Wire Error Body
// ============================================================================

/// The stable JSON shape of an error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    /// The error envelope.
    error: ErrorDetail,
}

/// The `kind`/`detail` pair carried by every error response.
#[derive(Debug, Serialize)]
struct ErrorDetail {
    /// Stable wire identifier, per [`ErrorKind::as_str`].
    kind: &'static str,
    /// Human-readable detail; not guaranteed stable across versions.
    detail: String,
}

/// Wraps a [`DepotError`] so it can be returned directly from an Axum handler.
#[derive(Debug)]
pub struct ApiError(pub DepotError);

impl From<DepotError> for ApiError {
    fn from(err: DepotError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = status_for_kind(kind);
        let body = ErrorBody {
            error: ErrorDetail {
                kind: kind.as_str(),
                detail: self.0.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Chooses the HTTP status code for a given [`ErrorKind`], per `spec.md` §7.
#[must_use]
pub const fn status_for_kind(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidIdentifier
        | ErrorKind::InvalidLocation
        | ErrorKind::InvalidSpec
        | ErrorKind::PathViolation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound | ErrorKind::ArtifactMissing | ErrorKind::UnknownSink => StatusCode::NOT_FOUND,
        ErrorKind::ArtifactTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorKind::ClosureNotSatisfied => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::AlreadyShipped | ErrorKind::AlreadyRejected | ErrorKind::RaceLost => StatusCode::CONFLICT,
        ErrorKind::SinkTransportFailure | ErrorKind::StorageFailure | ErrorKind::ManifestPersistFailed | ErrorKind::ReceiptWriteFailed => {
            StatusCode::BAD_GATEWAY
        }
        ErrorKind::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
    }
}
