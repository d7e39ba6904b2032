// crates/depotgate-http/src/routes.rs
// ============================================================================
// Module: HTTP Routes
// Description: Axum handlers implementing spec.md §6's verb table over depotgate-service.
// Purpose: Bind each DepotGate verb to a JSON HTTP endpoint, offloading blocking core calls.
// Dependencies: axum, depotgate-core, depotgate-service, serde, serde_json, tokio
// ============================================================================

//! ## Overview
//! `spec.md` §6. Single-tenant mode: the tenant id comes from configuration,
//! not from the request, so every handler closes over [`AppState::tenant_id`]
//! rather than accepting it as a path parameter. Every handler offloads its
//! blocking `depotgate-service`/`depotgate-core` call via
//! `tokio::task::spawn_blocking`, per `spec.md` §5's synchronous-core note.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use depotgate_core::ArtifactId;
use depotgate_core::ArtifactRole;
use depotgate_core::ClosureReport;
use depotgate_core::DeliverableContract;
use depotgate_core::DeliverableId;
use depotgate_core::DeliverableSpec;
use depotgate_core::DepotError;
use depotgate_core::PurgePolicy;
use depotgate_core::Receipt;
use depotgate_core::ReceiptId;
use depotgate_core::RootTaskId;
use depotgate_core::ShipmentManifest;
use depotgate_core::TenantId;
use depotgate_core::interfaces::MetadataStore;
use depotgate_core::interfaces::ReceiptStore;
use depotgate_core::interfaces::StorageBackend;
use depotgate_service::DeliverableManager;
use depotgate_service::ShippingService;
use depotgate_service::StagingArea;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ApiError;
use crate::telemetry::HttpMetrics;
use crate::telemetry::MetricEvent;
use crate::telemetry::Outcome;
use crate::telemetry::Verb;

// ============================================================================
// SECTION: Application State
// ============================================================================

/// Shared state every handler closes over.
#[derive(Clone)]
pub struct AppState {
    /// The single tenant this server instance serves.
    pub tenant_id: TenantId,
    /// C5: stages artifacts and lists live pointers.
    pub staging: Arc<StagingArea>,
    /// C6: declares deliverables and answers closure queries.
    pub deliverables: Arc<DeliverableManager>,
    /// C7: ships deliverables and purges staged bytes.
    pub shipping: Arc<ShippingService>,
    /// C3: backs `get_artifact`.
    pub metadata: Arc<dyn MetadataStore>,
    /// C1: backs `get_content`.
    pub storage: Arc<dyn StorageBackend>,
    /// C4: backs `list_receipts`.
    pub receipts: Arc<dyn ReceiptStore>,
    /// Request/latency metrics sink.
    pub metrics: Arc<dyn HttpMetrics>,
}

/// Builds the Axum router for every verb in `spec.md` §6's table.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/tasks/{task_id}/artifacts", post(stage).get(stage_list))
        .route("/v1/artifacts/{artifact_id}", get(get_artifact))
        .route("/v1/artifacts/{artifact_id}/content", get(get_content))
        .route("/v1/tasks/{task_id}/deliverables", post(declare_deliverable))
        .route("/v1/deliverables/{deliverable_id}/requirements", post(mark_requirement))
        .route("/v1/deliverables/{deliverable_id}/closure", get(check_closure))
        .route("/v1/tasks/{task_id}/deliverables/{deliverable_id}/ship", post(ship))
        .route("/v1/tasks/{task_id}/purge", post(purge))
        .route("/v1/tasks/{task_id}/receipts", get(list_receipts))
        .with_state(state)
}

/// Records a request/latency pair for `verb`, deriving [`Outcome`] from `result`.
fn observe<T>(state: &AppState, verb: Verb, started_at: Instant, result: &Result<T, DepotError>) {
    let outcome = if result.is_ok() { Outcome::Ok } else { Outcome::Error };
    let event = MetricEvent {
        verb,
        outcome,
        error_kind: result.as_ref().err().map(DepotError::kind),
    };
    state.metrics.record_request(&event);
    state.metrics.record_latency(&event, started_at.elapsed());
}

/// Parses a caller-declared role string into [`ArtifactRole`] against the
/// closed vocabulary fixed by `spec.md` §3.
fn parse_role(raw: &str) -> Result<ArtifactRole, DepotError> {
    match raw {
        "final_output" => Ok(ArtifactRole::FinalOutput),
        "supporting" => Ok(ArtifactRole::Supporting),
        "plan" => Ok(ArtifactRole::Plan),
        "log" => Ok(ArtifactRole::Log),
        "other" => Ok(ArtifactRole::Other),
        other => Err(DepotError::InvalidSpec(format!("unknown artifact role: {other}"))),
    }
}

// ============================================================================
// SECTION: stage / stage_list
// ============================================================================

/// Query parameters for `POST /v1/tasks/{task_id}/artifacts`.
#[derive(Debug, Deserialize)]
struct StageQuery {
    /// Caller-declared MIME type.
    mime_type: String,
    /// Caller-declared role; defaults to `final_output`.
    #[serde(default = "default_role")]
    role: String,
    /// The receipt that produced this artifact, if any.
    produced_by_receipt_id: Option<String>,
}

/// The default role assumed when a `stage` request omits `role`.
fn default_role() -> String {
    "final_output".to_string()
}

/// Handles `POST /v1/tasks/{task_id}/artifacts`: stages uploaded bytes.
async fn stage(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Query(query): Query<StageQuery>,
    body: axum::body::Bytes,
) -> Result<Json<depotgate_core::ArtifactPointer>, ApiError> {
    let started_at = Instant::now();
    let produced_by = match query.produced_by_receipt_id.as_deref() {
        Some(raw) => Some(ReceiptId::parse(raw).ok_or_else(|| ApiError(DepotError::InvalidIdentifier("produced_by_receipt_id".to_string())))?),
        None => None,
    };
    let role = parse_role(&query.role).map_err(ApiError)?;
    let state_for_blocking = state.clone();
    let result = tokio::task::spawn_blocking(move || {
        let task = RootTaskId::new(task_id);
        let mut reader = Cursor::new(body.to_vec());
        state_for_blocking
            .staging
            .stage(&state_for_blocking.tenant_id, &task, &mut reader, query.mime_type, role, produced_by)
    })
    .await
    .map_err(|err| ApiError(DepotError::StorageFailure(err.to_string())))?;
    observe(&state, Verb::Stage, started_at, &result);
    Ok(Json(result?))
}

/// Handles `GET /v1/tasks/{task_id}/artifacts`: lists live pointers.
async fn stage_list(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<Vec<depotgate_core::ArtifactPointer>>, ApiError> {
    let started_at = Instant::now();
    let state_for_blocking = state.clone();
    let result = tokio::task::spawn_blocking(move || {
        let task = RootTaskId::new(task_id);
        state_for_blocking.staging.list(&state_for_blocking.tenant_id, &task, None)
    })
    .await
    .map_err(|err| ApiError(DepotError::StorageFailure(err.to_string())))?;
    observe(&state, Verb::StageList, started_at, &result);
    Ok(Json(result?))
}

// ============================================================================
// SECTION: get_artifact / get_content
// ============================================================================

/// Handles `GET /v1/artifacts/{artifact_id}`.
async fn get_artifact(
    State(state): State<AppState>,
    Path(artifact_id): Path<String>,
) -> Result<Json<depotgate_core::ArtifactPointer>, ApiError> {
    let started_at = Instant::now();
    let artifact_id = ArtifactId::parse(&artifact_id).ok_or_else(|| ApiError(DepotError::NotFound(artifact_id.clone())))?;
    let state_for_blocking = state.clone();
    let result = tokio::task::spawn_blocking(move || state_for_blocking.metadata.get_artifact(&state_for_blocking.tenant_id, artifact_id))
        .await
        .map_err(|err| ApiError(DepotError::StorageFailure(err.to_string())))?;
    observe(&state, Verb::GetArtifact, started_at, &result);
    Ok(Json(result?))
}

/// Handles `GET /v1/artifacts/{artifact_id}/content`: streams raw bytes.
async fn get_content(State(state): State<AppState>, Path(artifact_id): Path<String>) -> Result<Response, ApiError> {
    let started_at = Instant::now();
    let parsed = ArtifactId::parse(&artifact_id).ok_or_else(|| ApiError(DepotError::NotFound(artifact_id.clone())))?;
    let state_for_blocking = state.clone();
    let result = tokio::task::spawn_blocking(move || {
        let pointer = state_for_blocking.metadata.get_artifact(&state_for_blocking.tenant_id, parsed)?;
        state_for_blocking.storage.retrieve(&pointer.location)
    })
    .await
    .map_err(|err| ApiError(DepotError::StorageFailure(err.to_string())))?;
    observe(&state, Verb::GetContent, started_at, &result);
    Ok((StatusCode::OK, result?).into_response())
}

// ============================================================================
// SECTION: declare_deliverable / mark_requirement / check_closure
// ============================================================================

/// Request body for `POST /v1/tasks/{task_id}/deliverables`.
#[derive(Debug, Deserialize)]
struct DeclareDeliverableRequest {
    /// The contract the declared deliverable must satisfy.
    spec: DeliverableSpec,
}

/// Response body for `POST /v1/tasks/{task_id}/deliverables`.
#[derive(Debug, Serialize)]
struct DeclareDeliverableResponse {
    /// The newly declared deliverable's identifier.
    deliverable_id: String,
}

/// Handles `POST /v1/tasks/{task_id}/deliverables`.
async fn declare_deliverable(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(request): Json<DeclareDeliverableRequest>,
) -> Result<Json<DeclareDeliverableResponse>, ApiError> {
    let started_at = Instant::now();
    let state_for_blocking = state.clone();
    let result = tokio::task::spawn_blocking(move || {
        let task = RootTaskId::new(task_id);
        state_for_blocking.deliverables.declare(&state_for_blocking.tenant_id, &task, request.spec)
    })
    .await
    .map_err(|err| ApiError(DepotError::StorageFailure(err.to_string())))?;
    observe(&state, Verb::DeclareDeliverable, started_at, &result);
    Ok(Json(DeclareDeliverableResponse {
        deliverable_id: result?.to_string(),
    }))
}

/// Request body for `POST /v1/deliverables/{deliverable_id}/requirements`.
#[derive(Debug, Deserialize)]
struct MarkRequirementRequest {
    /// The requirement name to mark satisfied.
    requirement: String,
}

/// Handles `POST /v1/deliverables/{deliverable_id}/requirements`.
async fn mark_requirement(
    State(state): State<AppState>,
    Path(deliverable_id): Path<String>,
    Json(request): Json<MarkRequirementRequest>,
) -> Result<Json<DeliverableContract>, ApiError> {
    let started_at = Instant::now();
    let deliverable_id = parse_deliverable_id(&deliverable_id)?;
    let state_for_blocking = state.clone();
    let result = tokio::task::spawn_blocking(move || {
        state_for_blocking
            .deliverables
            .mark_requirement(&state_for_blocking.tenant_id, deliverable_id, request.requirement)
    })
    .await
    .map_err(|err| ApiError(DepotError::StorageFailure(err.to_string())))?;
    observe(&state, Verb::MarkRequirement, started_at, &result);
    Ok(Json(result?))
}

/// Handles `GET /v1/deliverables/{deliverable_id}/closure`.
async fn check_closure(State(state): State<AppState>, Path(deliverable_id): Path<String>) -> Result<Json<ClosureReport>, ApiError> {
    let started_at = Instant::now();
    let deliverable_id = parse_deliverable_id(&deliverable_id)?;
    let state_for_blocking = state.clone();
    let result = tokio::task::spawn_blocking(move || state_for_blocking.deliverables.check_closure(&state_for_blocking.tenant_id, deliverable_id))
        .await
        .map_err(|err| ApiError(DepotError::StorageFailure(err.to_string())))?;
    observe(&state, Verb::CheckClosure, started_at, &result);
    Ok(Json(result?))
}

/// Parses a path segment as a [`DeliverableId`], mapping a bad parse to `not_found`.
fn parse_deliverable_id(raw: &str) -> Result<DeliverableId, ApiError> {
    DeliverableId::parse(raw).ok_or_else(|| ApiError(DepotError::NotFound(raw.to_string())))
}

// ============================================================================
// SECTION: ship / purge
// ============================================================================

/// Handles `POST /v1/tasks/{task_id}/deliverables/{deliverable_id}/ship`.
async fn ship(
    State(state): State<AppState>,
    Path((_task_id, deliverable_id)): Path<(String, String)>,
) -> Result<Json<ShipmentManifest>, ApiError> {
    let started_at = Instant::now();
    let deliverable_id = parse_deliverable_id(&deliverable_id)?;
    let state_for_blocking = state.clone();
    let result = tokio::task::spawn_blocking(move || state_for_blocking.shipping.ship(&state_for_blocking.tenant_id, deliverable_id))
        .await
        .map_err(|err| ApiError(DepotError::StorageFailure(err.to_string())))?;
    observe(&state, Verb::Ship, started_at, &result);
    Ok(Json(result?))
}

/// Request body for `POST /v1/tasks/{task_id}/purge`.
#[derive(Debug, Deserialize)]
struct PurgeRequest {
    /// The retention policy to apply.
    policy: PurgePolicy,
    /// Artifact ids to purge; `None` selects every live artifact under the task.
    artifact_ids: Option<Vec<String>>,
}

/// Handles `POST /v1/tasks/{task_id}/purge`.
async fn purge(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(request): Json<PurgeRequest>,
) -> Result<Json<Receipt>, ApiError> {
    let started_at = Instant::now();
    let artifact_ids = request
        .artifact_ids
        .map(|ids| {
            ids.iter()
                .map(|raw| ArtifactId::parse(raw).ok_or_else(|| DepotError::InvalidIdentifier(raw.clone())))
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()
        .map_err(ApiError)?;
    let state_for_blocking = state.clone();
    let result = tokio::task::spawn_blocking(move || {
        let task = RootTaskId::new(task_id);
        state_for_blocking
            .shipping
            .purge(&state_for_blocking.tenant_id, &task, request.policy, artifact_ids)
    })
    .await
    .map_err(|err| ApiError(DepotError::StorageFailure(err.to_string())))?;
    observe(&state, Verb::Purge, started_at, &result);
    Ok(Json(result?))
}

// ============================================================================
// SECTION: list_receipts
// ============================================================================

/// Handles `GET /v1/tasks/{task_id}/receipts`.
async fn list_receipts(State(state): State<AppState>, Path(task_id): Path<String>) -> Result<Json<Vec<Receipt>>, ApiError> {
    let started_at = Instant::now();
    let state_for_blocking = state.clone();
    let result = tokio::task::spawn_blocking(move || {
        let task = RootTaskId::new(task_id);
        state_for_blocking.receipts.list(&state_for_blocking.tenant_id, &task, None)
    })
    .await
    .map_err(|err| ApiError(DepotError::StorageFailure(err.to_string())))?;
    observe(&state, Verb::ListReceipts, started_at, &result);
    Ok(Json(result?))
}
