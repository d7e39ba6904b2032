// crates/depotgate-service/src/lib.rs
// ============================================================================
// Crate: depotgate-service
// Description: Orchestrates the staging, deliverable, and shipping workflows over injected backends.
// Purpose: Compose depotgate-core's traits into the three stateful components spec.md §4.5-§4.7 name.
// Dependencies: depotgate-core, serde_json
// ============================================================================

//! # depotgate-service
//!
//! This crate holds C5 ([`staging::StagingArea`]), C6
//! ([`deliverable::DeliverableManager`]), and C7
//! ([`shipping::ShippingService`]) — the three components that turn
//! `depotgate-core`'s traits and pure closure engine into the stateful
//! workflow `spec.md` §4.5-§4.7 describes.
//!
//! Concrete storage, sink, and database backends are never named here; they
//! are supplied by the composition root (`depotgate-cli`/`depotgate-http`)
//! as `Arc<dyn Trait>` handles, mirroring the teacher's `CompositeBroker`
//! being generic over injected sources and sinks.

/// C6: declares deliverable contracts and answers closure queries.
pub mod deliverable;
/// C7: ships closed deliverables and purges staged bytes.
pub mod shipping;
/// C5: accepts artifact uploads and lists live pointers.
pub mod staging;

#[cfg(test)]
mod test_support;

pub use crate::deliverable::DeliverableManager;
pub use crate::shipping::ShippingService;
pub use crate::staging::StagingArea;
