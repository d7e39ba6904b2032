// crates/depotgate-core/src/sanitize.rs
// ============================================================================
// Module: DepotGate Path/Input Sanitizer
// Description: Shared primitives validating tenant ids, task ids, locations, and destinations.
// Purpose: Every externally-sourced identifier or URI flows through this module
//          before touching storage or sink backends.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! C8 in `spec.md` §4.8. Every caller-supplied string that could influence a
//! filesystem path or be parsed as a URI must pass through this module
//! first. Nothing here performs I/O; it is pure string/path validation.
//!
//! Security posture: every externally-supplied string may be weaponized
//! against the filesystem namespace (`spec.md` §1); fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum length of a sanitized path component.
const MAX_COMPONENT_LENGTH: usize = 200;
/// Maximum length of a tenant or task identifier.
const MAX_IDENTIFIER_LENGTH: usize = 256;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by sanitizer primitives.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SanitizeError {
    /// A tenant/task identifier failed validation.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
    /// A location or destination URI escaped its configured base.
    #[error("path violation: {0}")]
    PathViolation(String),
    /// A location URI could not be parsed or used an unknown scheme.
    #[error("invalid location: {0}")]
    InvalidLocation(String),
}

// ============================================================================
// SECTION: Component Sanitization
// ============================================================================

/// Replaces `/`, `\`, and `.` runs with `_`, truncates to
/// [`MAX_COMPONENT_LENGTH`] chars, and substitutes `invalid` for an empty
/// result.
///
/// This is a best-effort normalization used to build filesystem path
/// components from untrusted strings; it never fails.
#[must_use]
pub fn sanitize_component(raw: &str) -> String {
    let replaced: String =
        raw.chars().map(|c| if matches!(c, '/' | '\\' | '.') { '_' } else { c }).collect();
    let truncated: String = replaced.chars().take(MAX_COMPONENT_LENGTH).collect();
    if truncated.is_empty() {
        "invalid".to_string()
    } else {
        truncated
    }
}

// ============================================================================
// SECTION: Identifier Validation
// ============================================================================

/// Validates a tenant or task identifier: ASCII alphanumerics, `_`, `-`,
/// length <= 256.
///
/// # Errors
///
/// Returns [`SanitizeError::InvalidIdentifier`] when the identifier is empty,
/// too long, or contains disallowed characters.
pub fn validate_task_id(raw: &str) -> Result<(), SanitizeError> {
    if raw.is_empty() || raw.len() > MAX_IDENTIFIER_LENGTH {
        return Err(SanitizeError::InvalidIdentifier(format!(
            "identifier length {} outside 1..={MAX_IDENTIFIER_LENGTH}",
            raw.len()
        )));
    }
    if !raw.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-') {
        return Err(SanitizeError::InvalidIdentifier(format!(
            "identifier {raw:?} contains characters outside [A-Za-z0-9_-]"
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Path Containment
// ============================================================================

/// Resolves `rel` under `base`, rejecting absolute paths, rejecting any
/// resolved path that escapes `base`, and neutralizing `..` segments before
/// resolution (so `a/../../etc` collapses harmlessly rather than climbing
/// out of `base`).
///
/// # Errors
///
/// Returns [`SanitizeError::PathViolation`] when `rel` is absolute or the
/// resolved path is not a descendant of `base`.
pub fn resolve_under_base(base: &Path, rel: &str) -> Result<PathBuf, SanitizeError> {
    let rel_path = Path::new(rel);
    if rel_path.is_absolute() {
        return Err(SanitizeError::PathViolation(format!("absolute path rejected: {rel}")));
    }

    let mut resolved = PathBuf::new();
    for component in rel_path.components() {
        match component {
            std::path::Component::Normal(part) => resolved.push(part),
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                resolved.pop();
            }
            std::path::Component::RootDir | std::path::Component::Prefix(_) => {
                return Err(SanitizeError::PathViolation(format!(
                    "absolute path component rejected: {rel}"
                )));
            }
        }
    }

    let candidate = base.join(&resolved);
    let base_components: Vec<_> = base.components().collect();
    let candidate_components: Vec<_> = candidate.components().collect();
    if candidate_components.len() < base_components.len()
        || candidate_components[..base_components.len()] != base_components[..]
    {
        return Err(SanitizeError::PathViolation(format!(
            "resolved path escapes base: {}",
            candidate.display()
        )));
    }
    Ok(candidate)
}

// ============================================================================
// SECTION: Location Parsing
// ============================================================================

/// A parsed opaque location/destination URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLocation {
    /// URI scheme (e.g. `fs`, `http`, `https`).
    pub scheme: String,
    /// Scheme-specific body (everything after `scheme://`).
    pub body: String,
}

/// Parses a location/destination URI into a scheme and body.
///
/// # Errors
///
/// Returns [`SanitizeError::InvalidLocation`] when the URI has no recognizable
/// scheme separator.
pub fn parse_location(uri: &str) -> Result<ParsedLocation, SanitizeError> {
    let Some((scheme, rest)) = uri.split_once("://") else {
        return Err(SanitizeError::InvalidLocation(format!("missing scheme in {uri:?}")));
    };
    if scheme.is_empty() {
        return Err(SanitizeError::InvalidLocation(format!("empty scheme in {uri:?}")));
    }
    Ok(ParsedLocation {
        scheme: scheme.to_string(),
        body: rest.to_string(),
    })
}
