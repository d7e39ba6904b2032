// crates/depotgate-service/src/deliverable.rs
// ============================================================================
// Module: Deliverable Manager (C6)
// Description: Declares deliverable contracts and computes closure against live artifacts.
// Purpose: Implement spec.md §4.6's declare/check_closure/mark_requirement algorithm.
// Dependencies: depotgate-core
// ============================================================================

//! ## Overview
//! `spec.md` §4.6. Closure computation itself is pure
//! ([`depotgate_core::compute_closure`]); [`DeliverableManager`] is the thin
//! orchestration layer that loads the deliverable and its task's live
//! pointer set before handing them to the closure engine.
//!
//! The "separate `mark_requirement` op" named in §4.6 point 3 is
//! [`DeliverableManager::mark_requirement`], resolved per §9's open
//! question as explicit marking rather than inference from a receipt.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use depotgate_core::ClosureReport;
use depotgate_core::Clock;
use depotgate_core::DeliverableContract;
use depotgate_core::DeliverableId;
use depotgate_core::DeliverableSpec;
use depotgate_core::DeliverableStatus;
use depotgate_core::DepotError;
use depotgate_core::RootTaskId;
use depotgate_core::TenantId;
use depotgate_core::compute_closure;
use depotgate_core::interfaces::MetadataStore;

// ============================================================================
// SECTION: Deliverable Manager
// ============================================================================

/// Implements C6: declares deliverable contracts and answers closure queries.
pub struct DeliverableManager {
    /// Metadata store (C3) holding deliverable and artifact rows.
    metadata: Arc<dyn MetadataStore>,
    /// Clock supplying `created_at` values.
    clock: Arc<dyn Clock>,
}

impl DeliverableManager {
    /// Builds a deliverable manager over the given metadata store.
    #[must_use]
    pub fn new(metadata: Arc<dyn MetadataStore>, clock: Arc<dyn Clock>) -> Self {
        Self { metadata, clock }
    }

    /// Declares a new deliverable contract, implementing `spec.md` §4.6's
    /// `declare` operation. A spec naming no artifact ids, roles, or
    /// requirements is accepted as trivially satisfied, per the boundary
    /// behavior in `spec.md` §8.
    ///
    /// # Errors
    ///
    /// Returns the underlying metadata error on a persistence failure.
    pub fn declare(&self, tenant_id: &TenantId, root_task_id: &RootTaskId, spec: DeliverableSpec) -> Result<DeliverableId, DepotError> {
        let deliverable_id = DeliverableId::generate();
        let contract = DeliverableContract {
            deliverable_id,
            tenant_id: tenant_id.clone(),
            root_task_id: root_task_id.clone(),
            created_at: self.clock.now(),
            spec,
            satisfied_requirements: Vec::new(),
            status: DeliverableStatus::Declared,
        };
        self.metadata.put_deliverable(&contract)?;
        Ok(deliverable_id)
    }

    /// Computes closure for `deliverable_id`, implementing the four steps of
    /// `spec.md` §4.6's `check_closure`.
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::NotFound`] if no such deliverable exists for `tenant_id`.
    pub fn check_closure(&self, tenant_id: &TenantId, deliverable_id: DeliverableId) -> Result<ClosureReport, DepotError> {
        let contract = self.metadata.get_deliverable(tenant_id, deliverable_id)?;
        let live = self.metadata.list_artifacts(tenant_id, &contract.root_task_id, None)?;
        Ok(compute_closure(&contract, &live))
    }

    /// Marks `requirement` satisfied on `deliverable_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::NotFound`] if no such deliverable exists, or
    /// [`DepotError::AlreadyShipped`]/[`DepotError::AlreadyRejected`] if the
    /// deliverable has already reached a terminal state.
    pub fn mark_requirement(
        &self,
        tenant_id: &TenantId,
        deliverable_id: DeliverableId,
        requirement: String,
    ) -> Result<DeliverableContract, DepotError> {
        let mut contract = self.metadata.get_deliverable(tenant_id, deliverable_id)?;
        match contract.status {
            DeliverableStatus::Shipped => return Err(DepotError::AlreadyShipped(deliverable_id.to_string())),
            DeliverableStatus::Rejected => return Err(DepotError::AlreadyRejected(deliverable_id.to_string())),
            DeliverableStatus::Declared => {}
        }
        if !contract.satisfied_requirements.iter().any(|marked| marked == &requirement) {
            contract.satisfied_requirements.push(requirement);
        }
        self.metadata.update_deliverable(&contract)?;
        Ok(contract)
    }
}
