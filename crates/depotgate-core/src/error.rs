// crates/depotgate-core/src/error.rs
// ============================================================================
// Module: DepotGate Error Facade
// Description: Re-exports the error taxonomy from `core::error` at the crate root.
// Purpose: Give downstream crates a stable `depotgate_core::error::DepotError` path.
// Dependencies: (none)
// ============================================================================

//! ## Overview
//! The error types themselves live in [`crate::core::error`]; this module
//! re-exports them so callers reach for `depotgate_core::error::DepotError`
//! rather than reaching into `core`.

pub use crate::core::error::DepotError;
pub use crate::core::error::ErrorKind;
