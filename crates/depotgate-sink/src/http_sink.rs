// crates/depotgate-sink/src/http_sink.rs
// ============================================================================
// Module: HTTP Outbound Sink
// Description: Delivers shipments to an external HTTP endpoint via multipart POST.
// Purpose: Let deliverables be shipped to an agent-facing service outside the process.
// Dependencies: depotgate-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! [`HttpSink`] resolves `http://`/`https://` destinations into a single
//! multipart POST carrying the manifest (as a `manifest` JSON part) and one
//! part per artifact (named by artifact id). No retry is attempted; a
//! non-success response or transport error surfaces as
//! [`DepotError::SinkTransportFailure`] with no partial state change on the
//! caller's side.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use depotgate_core::DepotError;
use depotgate_core::ShipmentManifest;
use depotgate_core::core::model::ArtifactPointer;
use depotgate_core::interfaces::ContentGetter;
use depotgate_core::interfaces::OutboundSink;
use reqwest::blocking::Client;
use reqwest::blocking::multipart::Form;
use reqwest::blocking::multipart::Part;

// ============================================================================
// SECTION: HTTP Sink
// ============================================================================

/// An [`OutboundSink`] that delivers shipments via HTTP multipart POST.
///
/// # Invariants
/// - Never follows redirects: a redirect response is treated as a transport failure.
#[derive(Debug, Clone)]
pub struct HttpSink {
    /// Blocking HTTP client used for delivery.
    client: Client,
}

impl HttpSink {
    /// Creates an HTTP sink with a bounded request timeout and no redirects.
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::SinkTransportFailure`] if the underlying client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, DepotError> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|err| DepotError::SinkTransportFailure(format!("building http client: {err}")))?;
        Ok(Self { client })
    }
}

impl OutboundSink for HttpSink {
    fn ship(
        &self,
        artifacts: &[ArtifactPointer],
        destination: &str,
        manifest: &ShipmentManifest,
        content: &dyn ContentGetter,
    ) -> Result<(), DepotError> {
        if !destination.starts_with("http://") && !destination.starts_with("https://") {
            return Err(DepotError::InvalidLocation(format!(
                "http sink cannot resolve destination {destination:?}"
            )));
        }

        let manifest_json = serde_json::to_vec(manifest)
            .map_err(|err| DepotError::SinkTransportFailure(format!("serializing manifest: {err}")))?;
        let mut form = Form::new().part("manifest", Part::bytes(manifest_json).mime_str("application/json").map_err(
            |err| DepotError::SinkTransportFailure(format!("building manifest part: {err}")),
        )?);

        for artifact in artifacts {
            let bytes = content.get(&artifact.location)?;
            let part = Part::bytes(bytes)
                .file_name(artifact.artifact_id.to_string())
                .mime_str(&artifact.mime_type)
                .map_err(|err| DepotError::SinkTransportFailure(format!("building artifact part: {err}")))?;
            form = form.part(artifact.artifact_id.to_string(), part);
        }

        let response = self
            .client
            .post(destination)
            .multipart(form)
            .send()
            .map_err(|err| DepotError::SinkTransportFailure(format!("posting shipment: {err}")))?;

        if !response.status().is_success() {
            return Err(DepotError::SinkTransportFailure(format!(
                "sink returned status {}",
                response.status()
            )));
        }
        Ok(())
    }
}
