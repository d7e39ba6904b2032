// crates/depotgate-core/src/core/closure.rs
// ============================================================================
// Module: DepotGate Closure Engine
// Description: Pure, read-only computation of whether a deliverable's contract is satisfied.
// Purpose: Give the shipping service a single, testable answer to "is this deliverable ready".
// Dependencies: (none; pure data in, pure data out)
// ============================================================================

//! ## Overview
//! `spec.md` §4.6, steps 1-4. Closure computation touches no storage or sink
//! backend; it is given the deliverable's live artifact set and answers
//! a yes/no question plus, on "no", the specific gaps.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::ids::ArtifactId;
use crate::core::model::ArtifactPointer;
use crate::core::model::ArtifactRole;
use crate::core::model::DeliverableContract;

// ============================================================================
// SECTION: Closure Report
// ============================================================================

/// A specific reason closure is not yet satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ClosureGap {
    /// A declared artifact id has no corresponding live pointer.
    MissingArtifact(ArtifactId),
    /// A declared role has no live artifact carrying it.
    MissingRole(ArtifactRole),
    /// A named requirement has not been marked satisfied.
    UnmetRequirement(String),
}

/// The outcome of a closure computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureReport {
    /// Whether every declared requirement is met.
    pub satisfied: bool,
    /// The specific gaps found, empty when `satisfied` is true.
    pub gaps: Vec<ClosureGap>,
}

// ============================================================================
// SECTION: Computation
// ============================================================================

/// Computes whether `contract`'s spec is satisfied by `live_artifacts`.
///
/// Steps (mirroring `spec.md` §4.6):
/// 1. Every `artifact_ids` entry must have a corresponding live pointer.
/// 2. Every `artifact_roles` entry must be carried by at least one live artifact.
/// 3. Every `requirements` entry must appear in `contract.satisfied_requirements`.
/// 4. Closure is satisfied iff no gap was found in steps 1-3.
#[must_use]
pub fn compute_closure(contract: &DeliverableContract, live_artifacts: &[ArtifactPointer]) -> ClosureReport {
    let mut gaps = Vec::new();

    let live_ids: BTreeSet<ArtifactId> = live_artifacts.iter().map(|a| a.artifact_id).collect();
    for artifact_id in &contract.spec.artifact_ids {
        if !live_ids.contains(artifact_id) {
            gaps.push(ClosureGap::MissingArtifact(*artifact_id));
        }
    }

    let live_roles: BTreeSet<&ArtifactRole> = live_artifacts.iter().map(|a| &a.artifact_role).collect();
    for role in &contract.spec.artifact_roles {
        if !live_roles.contains(role) {
            gaps.push(ClosureGap::MissingRole(role.clone()));
        }
    }

    for requirement in &contract.spec.requirements {
        if !contract.satisfied_requirements.iter().any(|r| r == requirement) {
            gaps.push(ClosureGap::UnmetRequirement(requirement.clone()));
        }
    }

    ClosureReport {
        satisfied: gaps.is_empty(),
        gaps,
    }
}
