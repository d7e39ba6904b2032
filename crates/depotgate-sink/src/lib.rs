// crates/depotgate-sink/src/lib.rs
// ============================================================================
// Crate: depotgate-sink
// Description: Outbound sink implementations and scheme-keyed composite dispatch.
// Purpose: Transfer shipped artifacts to an external destination.
// Dependencies: depotgate-core, cap-std, cap-primitives, reqwest, serde_json, thiserror
// ============================================================================

//! # depotgate-sink
//!
//! Implements C2 (`spec.md` §4.2): [`FsSink`] and [`HttpSink`] each resolve
//! one destination scheme, and [`CompositeSink`] resolves by scheme exactly
//! like the teacher workspace's composite broker resolves sources, failing
//! with [`depotgate_core::DepotError::UnknownSink`] for unregistered schemes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use depotgate_core::DepotError;
use depotgate_core::ShipmentManifest;
use depotgate_core::core::model::ArtifactPointer;
use depotgate_core::interfaces::ContentGetter;
use depotgate_core::interfaces::OutboundSink;
use depotgate_core::sanitize::parse_location;

/// Filesystem-backed sink delivering to a local directory tree.
pub mod fs_sink;
/// HTTP-backed sink delivering via multipart POST.
pub mod http_sink;

pub use fs_sink::FsSink;
pub use http_sink::HttpSink;

// ============================================================================
// SECTION: Composite Sink
// ============================================================================

/// Builder for a [`CompositeSink`].
///
/// # Invariants
/// - Scheme registrations are keyed by destination scheme; later registrations overwrite earlier ones.
#[derive(Default)]
pub struct CompositeSinkBuilder {
    /// Sink registry keyed by destination scheme.
    sinks: BTreeMap<String, Arc<dyn OutboundSink>>,
}

impl CompositeSinkBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a sink for the provided destination scheme.
    #[must_use]
    pub fn sink(mut self, scheme: impl Into<String>, sink: impl OutboundSink + 'static) -> Self {
        self.sinks.insert(scheme.into(), Arc::new(sink));
        self
    }

    /// Builds the composite sink.
    #[must_use]
    pub fn build(self) -> CompositeSink {
        CompositeSink { sinks: self.sinks }
    }
}

/// Dispatches shipments to the sink registered for the destination's scheme.
///
/// # Invariants
/// - Destination schemes are unique within the registry.
pub struct CompositeSink {
    /// Sink registry keyed by destination scheme.
    sinks: BTreeMap<String, Arc<dyn OutboundSink>>,
}

impl CompositeSink {
    /// Returns a builder for the composite sink.
    #[must_use]
    pub fn builder() -> CompositeSinkBuilder {
        CompositeSinkBuilder::new()
    }

    /// Resolves the configured sink for a destination URI.
    fn resolve_sink(&self, destination: &str) -> Result<Arc<dyn OutboundSink>, DepotError> {
        let parsed = parse_location(destination)?;
        self.sinks
            .get(&parsed.scheme)
            .map(Arc::clone)
            .ok_or_else(|| DepotError::UnknownSink(parsed.scheme))
    }
}

impl OutboundSink for CompositeSink {
    fn ship(
        &self,
        artifacts: &[ArtifactPointer],
        destination: &str,
        manifest: &ShipmentManifest,
        content: &dyn ContentGetter,
    ) -> Result<(), DepotError> {
        let sink = self.resolve_sink(destination)?;
        sink.ship(artifacts, destination, manifest, content)
    }
}
