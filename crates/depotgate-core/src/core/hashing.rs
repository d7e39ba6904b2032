// crates/depotgate-core/src/core/hashing.rs
// ============================================================================
// Module: DepotGate Content Hashing
// Description: SHA-256 content hashing for artifact bytes.
// Purpose: Provide the canonical, immutable content digest recorded on artifact pointers.
// Dependencies: sha2, serde
// ============================================================================

//! ## Overview
//! `content_hash` is computed once, at ingest, and is immutable thereafter
//! (`spec.md` §3). This module centralizes the hex-SHA-256 computation so
//! every component records digests in the same form.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

// ============================================================================
// SECTION: Content Digest
// ============================================================================

/// Hex-encoded SHA-256 content digest.
///
/// # Invariants
/// - `value` is exactly 64 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash {
    /// Lowercase hex digest.
    value: String,
}

impl ContentHash {
    /// Returns the digest as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value.fmt(f)
    }
}

/// Incremental SHA-256 hasher for streamed artifact ingest.
///
/// # Invariants
/// - `finalize` may be called at most once per instance's useful lifetime.
#[derive(Debug, Default)]
pub struct StreamingHasher {
    /// Underlying incremental digest state.
    inner: Sha256,
}

impl StreamingHasher {
    /// Creates a new streaming hasher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk of bytes into the digest.
    pub fn update(&mut self, chunk: &[u8]) {
        self.inner.update(chunk);
    }

    /// Finalizes the digest into a [`ContentHash`].
    #[must_use]
    pub fn finalize(self) -> ContentHash {
        let digest = self.inner.finalize();
        ContentHash {
            value: hex_encode(&digest),
        }
    }
}

/// Computes the content hash of a single, fully materialized byte slice.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> ContentHash {
    let mut hasher = StreamingHasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

/// Encodes bytes as lowercase hex.
fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        // `write!` into a `String` cannot fail.
        let _ = write!(out, "{byte:02x}");
    }
    out
}
