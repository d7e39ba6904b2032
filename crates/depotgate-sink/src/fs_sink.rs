// crates/depotgate-sink/src/fs_sink.rs
// ============================================================================
// Module: Filesystem Outbound Sink
// Description: Delivers shipments to a local directory.
// Purpose: Provide a default, dependency-light sink for local/dev deployments.
// Dependencies: depotgate-core, cap-std, cap-primitives, serde_json
// ============================================================================

//! ## Overview
//! [`FsSink`] resolves `fs://` destinations into a per-shipment directory
//! under a capability-scoped base: `<base>/<destination body>/<manifest_id>/`,
//! containing one file per artifact (named `<artifact_id>[.ext]`, where the
//! extension is inferred from the pointer's declared MIME type) and a
//! sibling `manifest.json` describing the shipment, per `spec.md` §4.2/§6.
//!
//! Security posture: treats `destination` as untrusted input; fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use cap_primitives::fs::FollowSymlinks;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use cap_std::fs::OpenOptions;
use depotgate_core::DepotError;
use depotgate_core::ShipmentManifest;
use depotgate_core::core::model::ArtifactPointer;
use depotgate_core::interfaces::ContentGetter;
use depotgate_core::interfaces::OutboundSink;
use depotgate_core::sanitize::parse_location;
use depotgate_core::sanitize::resolve_under_base;

// ============================================================================
// SECTION: Filesystem Sink
// ============================================================================

/// An [`OutboundSink`] that writes shipments to a local directory tree.
///
/// # Invariants
/// - `base` is created (if absent) at construction time and never reassigned.
#[derive(Debug, Clone)]
pub struct FsSink {
    /// Root directory shipments are written under.
    base: std::path::PathBuf,
}

impl FsSink {
    /// Creates a sink rooted at `base`, creating the directory if absent.
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::StorageFailure`] if `base` cannot be created.
    pub fn new(base: impl Into<std::path::PathBuf>) -> Result<Self, DepotError> {
        let base = base.into();
        std::fs::create_dir_all(&base)
            .map_err(|err| DepotError::StorageFailure(format!("creating sink base: {err}")))?;
        Ok(Self { base })
    }
}

/// Maps a caller-declared MIME type to a filename extension, best-effort.
///
/// Returns `None` for types with no well-known extension; the artifact is
/// then written bare (`<artifact_id>` with no suffix).
fn extension_for_mime(mime_type: &str) -> Option<&'static str> {
    match mime_type.split(';').next().unwrap_or(mime_type).trim() {
        "application/json" => Some("json"),
        "text/plain" => Some("txt"),
        "text/csv" => Some("csv"),
        "text/html" => Some("html"),
        "text/markdown" => Some("md"),
        "application/pdf" => Some("pdf"),
        "application/xml" | "text/xml" => Some("xml"),
        "application/zip" => Some("zip"),
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "application/x-ndjson" => Some("ndjson"),
        _ => None,
    }
}

impl OutboundSink for FsSink {
    fn ship(
        &self,
        artifacts: &[ArtifactPointer],
        destination: &str,
        manifest: &ShipmentManifest,
        content: &dyn ContentGetter,
    ) -> Result<(), DepotError> {
        let parsed = parse_location(destination)?;
        if parsed.scheme != "fs" {
            return Err(DepotError::InvalidLocation(format!(
                "fs sink cannot resolve scheme {:?}",
                parsed.scheme
            )));
        }
        let relative = resolve_under_base(&self.base, &parsed.body)?;
        let relative = relative.strip_prefix(&self.base).map_err(|_| {
            DepotError::PathViolation(format!("destination escapes base: {destination}"))
        })?;
        let relative = relative.join(manifest.manifest_id.to_string());

        let dir = Dir::open_ambient_dir(&self.base, ambient_authority())
            .map_err(|err| DepotError::SinkTransportFailure(format!("opening sink base: {err}")))?;
        dir.create_dir_all(&relative)
            .map_err(|err| DepotError::SinkTransportFailure(format!("creating shipment directory: {err}")))?;
        let shipment_dir = dir
            .open_dir(&relative)
            .map_err(|err| DepotError::SinkTransportFailure(format!("opening shipment directory: {err}")))?;

        for artifact in artifacts {
            let bytes = content.get(&artifact.location)?;
            let file_name = match extension_for_mime(&artifact.mime_type) {
                Some(ext) => format!("{}.{ext}", artifact.artifact_id),
                None => artifact.artifact_id.to_string(),
            };
            let mut options = OpenOptions::new();
            options.write(true).create(true).truncate(true);
            options._cap_fs_ext_follow(FollowSymlinks::No);
            let mut file = shipment_dir
                .open_with(&file_name, &options)
                .map_err(|err| DepotError::SinkTransportFailure(format!("writing artifact: {err}")))?;
            std::io::Write::write_all(&mut file, &bytes)
                .map_err(|err| DepotError::SinkTransportFailure(format!("writing artifact: {err}")))?;
        }

        let manifest_json = serde_json::to_vec_pretty(manifest)
            .map_err(|err| DepotError::SinkTransportFailure(format!("serializing manifest: {err}")))?;
        let mut manifest_options = OpenOptions::new();
        manifest_options.write(true).create(true).truncate(true);
        manifest_options._cap_fs_ext_follow(FollowSymlinks::No);
        let mut manifest_file = shipment_dir
            .open_with("manifest.json", &manifest_options)
            .map_err(|err| DepotError::SinkTransportFailure(format!("writing manifest: {err}")))?;
        std::io::Write::write_all(&mut manifest_file, &manifest_json)
            .map_err(|err| DepotError::SinkTransportFailure(format!("writing manifest: {err}")))?;

        Ok(())
    }
}
