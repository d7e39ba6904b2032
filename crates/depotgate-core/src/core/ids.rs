// crates/depotgate-core/src/core/ids.rs
// ============================================================================
// Module: DepotGate Identifiers
// Description: Canonical opaque identifiers for tenants, tasks, artifacts, and receipts.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: rand, serde
// ============================================================================

//! ## Overview
//! Identifiers used throughout DepotGate. Namespace coordinates (`TenantId`,
//! `RootTaskId`) are caller-supplied opaque strings; this module applies no
//! validation to them (see [`crate::sanitize`] for that). Entity identifiers
//! (`ArtifactId`, `DeliverableId`, `ManifestId`, `ReceiptId`) are
//! DepotGate-generated 128-bit values with a stable lowercase hex wire form.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Namespace Identifiers
// ============================================================================

/// Tenant namespace coordinate.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Creates a new tenant identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TenantId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TenantId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Root task namespace coordinate, scoped within a tenant.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RootTaskId(String);

impl RootTaskId {
    /// Creates a new root task identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RootTaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for RootTaskId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RootTaskId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Opaque 128-bit Entity Identifiers
// ============================================================================

/// Generates a hex-formatted macro for a 128-bit opaque identifier newtype.
macro_rules! opaque_id_128 {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        ///
        /// # Invariants
        /// - Globally unique for practical purposes (128 bits of randomness).
        /// - Wire form is 32 lowercase hex characters.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u128);

        impl $name {
            /// Generates a new random identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(rand::random::<u128>())
            }

            /// Wraps a raw 128-bit value.
            #[must_use]
            pub const fn from_raw(raw: u128) -> Self {
                Self(raw)
            }

            /// Returns the raw 128-bit value.
            #[must_use]
            pub const fn raw(self) -> u128 {
                self.0
            }

            /// Parses a 32-character lowercase hex string.
            #[must_use]
            pub fn parse(text: &str) -> Option<Self> {
                if text.len() != 32 || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return None;
                }
                u128::from_str_radix(text, 16).ok().map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:032x}", self.0)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let text = String::deserialize(deserializer)?;
                Self::parse(&text).ok_or_else(|| {
                    serde::de::Error::custom(format!("invalid {} hex string", stringify!($name)))
                })
            }
        }
    };
}

opaque_id_128!(ArtifactId, "Globally unique artifact identifier.");
opaque_id_128!(DeliverableId, "Globally unique deliverable contract identifier.");
opaque_id_128!(ManifestId, "Globally unique shipment manifest identifier.");
opaque_id_128!(ReceiptId, "Globally unique receipt identifier.");
