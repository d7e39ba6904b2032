// crates/depotgate-core/src/core/mod.rs
// ============================================================================
// Module: DepotGate Core
// Description: Identifiers, time, hashing, the data model, and the closure engine.
// Purpose: Group the pure, backend-agnostic building blocks of the domain.
// Dependencies: (see child modules)
// ============================================================================

//! Pure domain building blocks: identifiers, time, content hashing, the data
//! model, and closure computation. Nothing in this module performs I/O.

/// Closure computation over a deliverable's declared contract.
pub mod closure;
/// Stable error taxonomy shared across every component.
pub mod error;
/// SHA-256 content hashing.
pub mod hashing;
/// Opaque identifiers for tenants, tasks, artifacts, and receipts.
pub mod ids;
/// The artifact/deliverable/shipment/receipt data model.
pub mod model;
/// Explicit timestamp representation and the injected clock.
pub mod time;
