// crates/depotgate-config/src/lib.rs
// ============================================================================
// Crate: depotgate-config
// Description: Configuration model, TOML loading, and validation for DepotGate binaries.
// Purpose: Give the CLI and HTTP façades a single validated configuration struct to consume.
// Dependencies: depotgate-core, serde, thiserror, toml
// ============================================================================

//! # depotgate-config
//!
//! `spec.md` §6 names the recognized configuration fields as external
//! collaborator concerns; this crate is that collaborator. It follows the
//! teacher workspace's `decision-gate-config` shape at a much smaller
//! scale: an environment-variable path override, a maximum file size
//! enforced before parsing, and an explicit `validate()` pass after
//! `toml::from_str` rather than trusting deserialization alone.
//!
//! DepotGate is single-tenant per process (`spec.md` §6); the composition
//! root consumes this struct once at startup and never re-reads it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use depotgate_core::sanitize::validate_task_id;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable consulted for a config path override when `load` is
/// called with `None`.
pub const CONFIG_ENV_VAR: &str = "DEPOTGATE_CONFIG";
/// Config path used when neither an explicit path nor the environment
/// variable is set.
pub const DEFAULT_CONFIG_PATH: &str = "depotgate.toml";
/// Maximum accepted size of a config file, enforced before parsing to bound
/// memory use against a misdirected or hostile path.
const MAX_CONFIG_FILE_BYTES: u64 = 1024 * 1024;
/// Default bind host when the TOML omits `host`.
const DEFAULT_HOST: &str = "127.0.0.1";
/// Default bind port when the TOML omits `port`.
const DEFAULT_PORT: u16 = 8080;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while loading or validating a [`DepotGateConfig`].
///
/// # Invariants
/// - Variants carry a human-readable detail only; no stack traces.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("config io error: {0}")]
    Io(String),
    /// The config file could not be parsed as TOML.
    #[error("config parse error: {0}")]
    Parse(String),
    /// The parsed config failed field-level validation.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Configuration Model
// ============================================================================

/// The validated configuration consumed by the composition root.
///
/// Field names and meanings match `spec.md` §6 exactly:
/// `{ host, port, tenant_id, max_artifact_bytes, storage_base_path,
/// sink_bases_by_scheme, enabled_sinks, metadata_db_url, receipts_db_url }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DepotGateConfig {
    /// Bind host for the HTTP façade.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port for the HTTP façade.
    #[serde(default = "default_port")]
    pub port: u16,
    /// The single tenant this process serves.
    pub tenant_id: String,
    /// Maximum accepted artifact size in bytes; `0` means unlimited.
    #[serde(default)]
    pub max_artifact_bytes: u64,
    /// Base directory the filesystem storage backend stores bytes under.
    pub storage_base_path: PathBuf,
    /// Base directory per sink scheme, for sinks that resolve against a local directory.
    #[serde(default)]
    pub sink_bases_by_scheme: BTreeMap<String, PathBuf>,
    /// Destination schemes this process constructs sinks for.
    #[serde(default)]
    pub enabled_sinks: Vec<String>,
    /// Path (or connection string) for the metadata `SQLite` database.
    pub metadata_db_url: String,
    /// Path (or connection string) for the receipts `SQLite` database.
    pub receipts_db_url: String,
}

/// Returns [`DEFAULT_HOST`] as an owned `String` for `serde(default = ...)`.
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

/// Returns [`DEFAULT_PORT`] for `serde(default = ...)`.
const fn default_port() -> u16 {
    DEFAULT_PORT
}

impl DepotGateConfig {
    /// Loads and validates a config file.
    ///
    /// Resolution order for the path: `path`, then [`CONFIG_ENV_VAR`], then
    /// [`DEFAULT_CONFIG_PATH`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read or exceeds
    /// [`MAX_CONFIG_FILE_BYTES`], [`ConfigError::Parse`] if it is not valid
    /// TOML, or [`ConfigError::Invalid`] if validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path);
        let raw = read_bounded(&resolved)?;
        let mut config: Self = toml::from_str(&raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every field, matching the teacher's per-config
    /// `validate()` cascade (scaled to this crate's flat field set).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first failing field.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be nonzero".to_string()));
        }
        validate_task_id(&self.tenant_id).map_err(|err| ConfigError::Invalid(format!("tenant_id: {err}")))?;
        if self.storage_base_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("storage_base_path must not be empty".to_string()));
        }
        if self.metadata_db_url.trim().is_empty() {
            return Err(ConfigError::Invalid("metadata_db_url must not be empty".to_string()));
        }
        if self.receipts_db_url.trim().is_empty() {
            return Err(ConfigError::Invalid("receipts_db_url must not be empty".to_string()));
        }
        for scheme in &self.enabled_sinks {
            if scheme == "fs" && !self.sink_bases_by_scheme.contains_key("fs") {
                return Err(ConfigError::Invalid(
                    "enabled_sinks includes \"fs\" but sink_bases_by_scheme has no \"fs\" entry".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Resolves the config file path per [`DepotGateConfig::load`]'s documented order.
fn resolve_path(path: Option<&Path>) -> PathBuf {
    if let Some(path) = path {
        return path.to_path_buf();
    }
    if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
        return PathBuf::from(env_path);
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}

/// Reads `path` as UTF-8, rejecting files larger than [`MAX_CONFIG_FILE_BYTES`].
fn read_bounded(path: &Path) -> Result<String, ConfigError> {
    let metadata = std::fs::metadata(path).map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
    if metadata.len() > MAX_CONFIG_FILE_BYTES {
        return Err(ConfigError::Io(format!(
            "{}: {} bytes exceeds max config size {MAX_CONFIG_FILE_BYTES}",
            path.display(),
            metadata.len()
        )));
    }
    std::fs::read_to_string(path).map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))
}
