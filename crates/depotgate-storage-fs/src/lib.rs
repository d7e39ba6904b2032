// crates/depotgate-storage-fs/src/lib.rs
// ============================================================================
// Crate: depotgate-storage-fs
// Description: Filesystem-backed implementation of depotgate_core::interfaces::StorageBackend.
// Purpose: Persist staged artifact bytes under a capability-scoped base directory.
// Dependencies: depotgate-core, cap-std, cap-primitives, std
// ============================================================================

//! # depotgate-storage-fs
//!
//! Implements C1 (`spec.md` §4.1): artifact bytes are written under
//! `<base>/<tenant>/<task>/<artifact_id>`, with every path component
//! sanitized by [`depotgate_core::sanitize`] and every open performed
//! through a [`cap_std::fs::Dir`] rooted at `<base>` so a TOCTOU symlink
//! swap cannot escape the sandbox even if string-level validation is
//! bypassed.
//!
//! Security posture: treats `tenant_id`, `root_task_id`, and `location`
//! strings as untrusted input; fails closed on any ambiguity.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use cap_primitives::fs::FollowSymlinks;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use cap_std::fs::OpenOptions;
use depotgate_core::ArtifactId;
use depotgate_core::DepotError;
use depotgate_core::RootTaskId;
use depotgate_core::StreamingHasher;
use depotgate_core::TenantId;
use depotgate_core::interfaces::StorageBackend;
use depotgate_core::interfaces::StoredArtifact;
use depotgate_core::sanitize::parse_location;
use depotgate_core::sanitize::resolve_under_base;
use depotgate_core::sanitize::sanitize_component;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Read buffer size used while streaming artifact bytes to disk.
const COPY_BUFFER_BYTES: usize = 64 * 1024;

// ============================================================================
// SECTION: Filesystem Storage Backend
// ============================================================================

/// A [`StorageBackend`] that persists artifact bytes under a local directory.
///
/// # Invariants
/// - `base` is created (if absent) at construction time and never reassigned.
#[derive(Debug, Clone)]
pub struct FsStorageBackend {
    /// Root directory all artifacts are stored under.
    base: PathBuf,
}

impl FsStorageBackend {
    /// Creates a backend rooted at `base`, creating the directory if it does
    /// not already exist.
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::StorageFailure`] if `base` cannot be created.
    pub fn new(base: impl Into<PathBuf>) -> Result<Self, DepotError> {
        let base = base.into();
        std::fs::create_dir_all(&base)
            .map_err(|err| DepotError::StorageFailure(format!("creating storage base: {err}")))?;
        Ok(Self { base })
    }

    /// Builds the sanitized relative path for a given artifact.
    fn relative_path(tenant_id: &TenantId, root_task_id: &RootTaskId, artifact_id: ArtifactId) -> PathBuf {
        PathBuf::from(sanitize_component(tenant_id.as_str()))
            .join(sanitize_component(root_task_id.as_str()))
            .join(artifact_id.to_string())
    }

    /// Parses a `fs://` location into a relative path, verifying containment
    /// both at the string level and by resolving it under `base`.
    fn relative_from_location(&self, location: &str) -> Result<PathBuf, DepotError> {
        let parsed = parse_location(location)?;
        if parsed.scheme != "fs" {
            return Err(DepotError::InvalidLocation(format!(
                "fs storage backend cannot resolve scheme {:?}",
                parsed.scheme
            )));
        }
        let resolved = resolve_under_base(&self.base, &parsed.body)?;
        resolved
            .strip_prefix(&self.base)
            .map(Path::to_path_buf)
            .map_err(|_| DepotError::PathViolation(format!("location escapes base: {location}")))
    }

    /// Opens a capability-scoped handle to `base`.
    fn open_base_dir(&self) -> Result<Dir, DepotError> {
        Dir::open_ambient_dir(&self.base, ambient_authority())
            .map_err(|err| DepotError::StorageFailure(format!("opening storage base: {err}")))
    }
}

impl StorageBackend for FsStorageBackend {
    fn store(
        &self,
        tenant_id: &TenantId,
        root_task_id: &RootTaskId,
        artifact_id: ArtifactId,
        reader: &mut dyn Read,
        max_bytes: u64,
    ) -> Result<StoredArtifact, DepotError> {
        let relative = Self::relative_path(tenant_id, root_task_id, artifact_id);
        let dir = self.open_base_dir()?;
        if let Some(parent) = relative.parent() {
            dir.create_dir_all(parent)
                .map_err(|err| DepotError::StorageFailure(format!("creating artifact directory: {err}")))?;
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        options._cap_fs_ext_follow(FollowSymlinks::No);
        let mut file = dir
            .open_with(&relative, &options)
            .map_err(|err| DepotError::StorageFailure(format!("opening artifact file: {err}")))?;

        let mut hasher = StreamingHasher::new();
        let mut total_bytes: u64 = 0;
        let mut buffer = vec![0_u8; COPY_BUFFER_BYTES];
        loop {
            let read = reader
                .read(&mut buffer)
                .map_err(|err| DepotError::StorageFailure(format!("reading artifact stream: {err}")))?;
            if read == 0 {
                break;
            }
            total_bytes += read as u64;
            if total_bytes > max_bytes {
                drop(file);
                let _ = dir.remove_file(&relative);
                return Err(DepotError::ArtifactTooLarge {
                    max_bytes,
                    actual_bytes: total_bytes,
                });
            }
            hasher.update(&buffer[..read]);
            std::io::Write::write_all(&mut file, &buffer[..read])
                .map_err(|err| DepotError::StorageFailure(format!("writing artifact stream: {err}")))?;
        }

        Ok(StoredArtifact {
            location: format!("fs://{}", relative.display()),
            size_bytes: total_bytes,
            content_hash: hasher.finalize(),
        })
    }

    fn retrieve(&self, location: &str) -> Result<Vec<u8>, DepotError> {
        let relative = self.relative_from_location(location)?;
        let dir = self.open_base_dir()?;
        let mut options = OpenOptions::new();
        options.read(true);
        options._cap_fs_ext_follow(FollowSymlinks::No);
        let mut file = dir
            .open_with(&relative, &options)
            .map_err(|err| DepotError::ArtifactMissing(format!("{location}: {err}")))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|err| DepotError::StorageFailure(format!("reading artifact: {err}")))?;
        Ok(bytes)
    }

    fn delete(&self, location: &str) -> Result<(), DepotError> {
        let relative = self.relative_from_location(location)?;
        let dir = self.open_base_dir()?;
        match dir.remove_file(&relative) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(DepotError::StorageFailure(format!("deleting artifact: {err}"))),
        }
    }

    fn exists(&self, location: &str) -> Result<bool, DepotError> {
        let relative = self.relative_from_location(location)?;
        let dir = self.open_base_dir()?;
        Ok(dir.metadata(&relative).is_ok())
    }
}
