//! Path-safety helpers for the artifact store.
//!
//! The artifact store derives blob and ledger paths from a run id and a
//! content hash; neither is ever interpolated into a path without first
//! passing through a [`SandboxRoot`], so a crafted run id cannot write
//! outside the store root.

use camino::Utf8PathBuf;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Thread-local override used only in tests to avoid process-global env races.
thread_local! {
    static THREAD_HOME: RefCell<Option<Utf8PathBuf>> = const { RefCell::new(None) };
}

/// Get the link count for a file.
///
/// Returns the number of hard links pointing to the file. If the count
/// cannot be determined, callers should treat the file as a potential
/// hardlink and fail closed.
#[cfg(unix)]
pub fn link_count(path: &Path) -> Result<u32, std::io::Error> {
    use std::os::unix::fs::MetadataExt;
    let metadata = path.metadata()?;
    Ok(metadata.nlink() as u32)
}

#[cfg(windows)]
pub fn link_count(path: &Path) -> Result<u32, std::io::Error> {
    use std::fs::File;
    use std::os::windows::io::AsRawHandle;
    use windows::Win32::Foundation::HANDLE;
    use windows::Win32::Storage::FileSystem::{
        BY_HANDLE_FILE_INFORMATION, GetFileInformationByHandle,
    };

    let file = File::open(path)?;
    let handle = HANDLE(file.as_raw_handle());
    let mut file_info = BY_HANDLE_FILE_INFORMATION::default();

    let result = unsafe { GetFileInformationByHandle(handle, &mut file_info) };

    match result {
        Ok(()) => Ok(file_info.nNumberOfLinks),
        Err(e) => Err(std::io::Error::other(format!(
            "GetFileInformationByHandle failed: {e}"
        ))),
    }
}

/// Errors that can occur during sandboxed path resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SandboxError {
    #[error("Sandbox root does not exist: {path}")]
    RootNotFound { path: String },

    #[error("Sandbox root is not a directory: {path}")]
    RootNotDirectory { path: String },

    #[error("Failed to canonicalize sandbox root '{path}': {reason}")]
    RootCanonicalizationFailed { path: String, reason: String },

    #[error("Path contains parent directory traversal: {path}")]
    ParentTraversal { path: String },

    #[error("Absolute path not allowed: {path}")]
    AbsolutePath { path: String },

    #[error("Path escapes sandbox root: {path} resolves outside {root}")]
    EscapeAttempt { path: String, root: String },

    #[error("Symlink not allowed: {path}")]
    SymlinkNotAllowed { path: String },

    #[error("Hardlink not allowed: {path}")]
    HardlinkNotAllowed { path: String },

    #[error("Failed to canonicalize path '{path}': {reason}")]
    PathCanonicalizationFailed { path: String, reason: String },
}

/// Configuration for sandbox path validation behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SandboxConfig {
    pub allow_symlinks: bool,
    pub allow_hardlinks: bool,
}

impl SandboxConfig {
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            allow_symlinks: true,
            allow_hardlinks: true,
        }
    }
}

/// A validated root directory for sandboxed operations, used to anchor the
/// artifact store so paths derived from run ids and content hashes can
/// never resolve outside it.
#[derive(Debug, Clone)]
pub struct SandboxRoot {
    root: PathBuf,
    config: SandboxConfig,
}

impl SandboxRoot {
    pub fn new(root: impl AsRef<Path>, config: SandboxConfig) -> Result<Self, SandboxError> {
        let root_path = root.as_ref();

        if !root_path.exists() {
            return Err(SandboxError::RootNotFound {
                path: root_path.display().to_string(),
            });
        }

        if !root_path.is_dir() {
            return Err(SandboxError::RootNotDirectory {
                path: root_path.display().to_string(),
            });
        }

        let canonical =
            root_path
                .canonicalize()
                .map_err(|e| SandboxError::RootCanonicalizationFailed {
                    path: root_path.display().to_string(),
                    reason: e.to_string(),
                })?;

        Ok(Self {
            root: canonical,
            config,
        })
    }

    pub fn new_default(root: impl AsRef<Path>) -> Result<Self, SandboxError> {
        Self::new(root, SandboxConfig::default())
    }

    /// Join a relative path, validating it stays within the sandbox.
    pub fn join(&self, rel: impl AsRef<Path>) -> Result<SandboxPath, SandboxError> {
        let rel_path = rel.as_ref();

        if rel_path.is_absolute() {
            return Err(SandboxError::AbsolutePath {
                path: rel_path.display().to_string(),
            });
        }

        if rel_path
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(SandboxError::ParentTraversal {
                path: rel_path.display().to_string(),
            });
        }

        let full_path = self.root.join(rel_path);

        if !self.config.allow_symlinks {
            self.check_symlinks_in_path(&full_path)?;
        }

        if full_path.exists() {
            let canonical =
                full_path
                    .canonicalize()
                    .map_err(|e| SandboxError::PathCanonicalizationFailed {
                        path: full_path.display().to_string(),
                        reason: e.to_string(),
                    })?;

            if !canonical.starts_with(&self.root) {
                return Err(SandboxError::EscapeAttempt {
                    path: rel_path.display().to_string(),
                    root: self.root.display().to_string(),
                });
            }

            if !self.config.allow_hardlinks {
                self.check_hardlink(&canonical)?;
            }

            Ok(SandboxPath {
                full: canonical,
                rel: rel_path.to_path_buf(),
            })
        } else {
            if self.config.allow_symlinks {
                self.validate_ancestor_within_sandbox(&full_path, rel_path)?;
            }

            Ok(SandboxPath {
                full: full_path,
                rel: rel_path.to_path_buf(),
            })
        }
    }

    fn check_symlinks_in_path(&self, path: &Path) -> Result<(), SandboxError> {
        let mut current = PathBuf::new();

        for component in path.components() {
            current.push(component);

            if current.exists()
                && current
                    .symlink_metadata()
                    .map(|m| m.is_symlink())
                    .unwrap_or(false)
            {
                return Err(SandboxError::SymlinkNotAllowed {
                    path: current.display().to_string(),
                });
            }
        }

        Ok(())
    }

    fn check_hardlink(&self, path: &Path) -> Result<(), SandboxError> {
        if path.is_file() {
            match link_count(path) {
                Ok(count) if count > 1 => {
                    return Err(SandboxError::HardlinkNotAllowed {
                        path: path.display().to_string(),
                    });
                }
                Ok(_) => {}
                Err(_) => {
                    return Err(SandboxError::HardlinkNotAllowed {
                        path: path.display().to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Validate that the nearest existing ancestor of a non-existent path
    /// stays within the sandbox when canonicalized, so a symlinked directory
    /// on the path can't redirect a not-yet-created file outside the root.
    fn validate_ancestor_within_sandbox(
        &self,
        full_path: &Path,
        rel_path: &Path,
    ) -> Result<(), SandboxError> {
        let mut ancestor = full_path.to_path_buf();
        while !ancestor.exists() {
            if !ancestor.pop() {
                return Ok(());
            }
        }

        let canonical_ancestor =
            ancestor
                .canonicalize()
                .map_err(|e| SandboxError::PathCanonicalizationFailed {
                    path: ancestor.display().to_string(),
                    reason: e.to_string(),
                })?;

        if !canonical_ancestor.starts_with(&self.root) {
            return Err(SandboxError::EscapeAttempt {
                path: rel_path.display().to_string(),
                root: self.root.display().to_string(),
            });
        }

        Ok(())
    }

    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }
}

/// A path that has been validated to be within a [`SandboxRoot`]. Cannot be
/// constructed directly; must come from [`SandboxRoot::join`].
#[derive(Debug, Clone)]
pub struct SandboxPath {
    full: PathBuf,
    rel: PathBuf,
}

impl SandboxPath {
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.full
    }

    #[must_use]
    pub fn relative(&self) -> &Path {
        &self.rel
    }

    #[must_use]
    pub fn to_path_buf(&self) -> PathBuf {
        self.full.clone()
    }

    #[must_use]
    pub fn relative_to_path_buf(&self) -> PathBuf {
        self.rel.clone()
    }
}

impl AsRef<Path> for SandboxPath {
    fn as_ref(&self) -> &Path {
        &self.full
    }
}

/// Resolve the council home directory:
/// 1) thread-local override (tests use this)
/// 2) env `COUNCIL_HOME` (opt-in for users/CI)
/// 3) default ".council"
#[must_use]
pub fn council_home() -> Utf8PathBuf {
    if let Some(tl) = THREAD_HOME.with(|tl| tl.borrow().clone()) {
        return tl;
    }
    if let Ok(p) = std::env::var("COUNCIL_HOME") {
        return Utf8PathBuf::from(p);
    }
    Utf8PathBuf::from(".council")
}

/// Returns `<COUNCIL_HOME>/runs`, the artifact store's default root.
#[must_use]
pub fn default_store_root() -> Utf8PathBuf {
    council_home().join("runs")
}

/// Returns `<COUNCIL_HOME>/schemas`, the default directory the facade
/// looks in for one canonical JSON Schema file per role.
#[must_use]
pub fn default_schema_dir() -> Utf8PathBuf {
    council_home().join("schemas")
}

/// mkdir -p; treats `AlreadyExists` as success, removing a TOCTTOU race.
pub fn ensure_dir_all<P: AsRef<std::path::Path>>(p: P) -> std::io::Result<()> {
    match std::fs::create_dir_all(&p) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}

/// RAII guard for an isolated home directory that clears thread-local state on drop.
#[cfg(any(test, feature = "test-utils"))]
pub struct HomeGuard {
    inner: tempfile::TempDir,
}

#[cfg(any(test, feature = "test-utils"))]
impl Drop for HomeGuard {
    fn drop(&mut self) {
        THREAD_HOME.with(|tl| *tl.borrow_mut() = None);
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl std::ops::Deref for HomeGuard {
    type Target = tempfile::TempDir;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Test helper: gives a test a unique, isolated home under the system temp
/// dir. Hold the `HomeGuard` for the test's duration so the directory stays
/// alive and the thread-local override is cleaned up afterward.
#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(not(test), allow(dead_code))]
#[must_use]
pub fn with_isolated_home() -> HomeGuard {
    let td = tempfile::TempDir::new().expect("create temp home");
    let p = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
    THREAD_HOME.with(|tl| *tl.borrow_mut() = Some(p));
    HomeGuard { inner: td }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        TempDir::new().expect("Failed to create temp dir")
    }

    #[test]
    fn test_sandbox_root_new_valid_directory() {
        let temp = create_test_dir();
        let root = SandboxRoot::new(temp.path(), SandboxConfig::default()).unwrap();
        assert!(root.as_path().is_absolute());
    }

    #[test]
    fn test_sandbox_root_new_nonexistent_path() {
        let result = SandboxRoot::new(
            "/nonexistent/path/that/does/not/exist",
            SandboxConfig::default(),
        );
        assert!(matches!(
            result.unwrap_err(),
            SandboxError::RootNotFound { .. }
        ));
    }

    #[test]
    fn test_sandbox_join_simple_relative_path() {
        let temp = create_test_dir();
        let subdir = temp.path().join("subdir");
        std::fs::create_dir(&subdir).unwrap();
        std::fs::write(subdir.join("file.txt"), "content").unwrap();

        let root = SandboxRoot::new_default(temp.path()).unwrap();
        let sandbox_path = root.join("subdir/file.txt").unwrap();
        assert_eq!(sandbox_path.relative(), Path::new("subdir/file.txt"));
    }

    #[test]
    fn test_sandbox_join_nonexistent_path_allowed() {
        let temp = create_test_dir();
        let root = SandboxRoot::new_default(temp.path()).unwrap();
        assert!(root.join("new/path/to/file.txt").is_ok());
    }

    #[test]
    fn test_sandbox_join_rejects_parent_traversal() {
        let temp = create_test_dir();
        let root = SandboxRoot::new_default(temp.path()).unwrap();
        let result = root.join("../escape");
        assert!(matches!(
            result.unwrap_err(),
            SandboxError::ParentTraversal { .. }
        ));
    }

    #[test]
    fn test_sandbox_join_rejects_hidden_parent_traversal() {
        let temp = create_test_dir();
        let root = SandboxRoot::new_default(temp.path()).unwrap();
        let result = root.join("subdir/../../../escape");
        assert!(matches!(
            result.unwrap_err(),
            SandboxError::ParentTraversal { .. }
        ));
    }

    #[test]
    fn test_sandbox_join_rejects_absolute_path() {
        let temp = create_test_dir();
        let root = SandboxRoot::new_default(temp.path()).unwrap();

        #[cfg(unix)]
        let result = root.join("/etc/passwd");
        #[cfg(windows)]
        let result = root.join("C:\\Windows\\System32");

        assert!(matches!(
            result.unwrap_err(),
            SandboxError::AbsolutePath { .. }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_sandbox_join_rejects_symlink_by_default() {
        let temp = create_test_dir();
        let target = temp.path().join("target.txt");
        std::fs::write(&target, "content").unwrap();

        let link = temp.path().join("link.txt");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let root = SandboxRoot::new_default(temp.path()).unwrap();
        let result = root.join("link.txt");
        assert!(matches!(
            result.unwrap_err(),
            SandboxError::SymlinkNotAllowed { .. }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_sandbox_join_rejects_symlink_escape() {
        let temp = create_test_dir();
        let outside = TempDir::new().unwrap();
        let outside_file = outside.path().join("secret.txt");
        std::fs::write(&outside_file, "secret").unwrap();

        let link = temp.path().join("escape_link");
        std::os::unix::fs::symlink(&outside_file, &link).unwrap();

        let config = SandboxConfig::permissive();
        let root = SandboxRoot::new(temp.path(), config).unwrap();
        let result = root.join("escape_link");
        assert!(matches!(
            result.unwrap_err(),
            SandboxError::EscapeAttempt { .. }
        ));
    }

    /// Regression test: a symlinked directory inside the sandbox that points
    /// outside it must be rejected even when the final path segment doesn't
    /// exist yet (the write path the artifact store takes for new blobs).
    #[cfg(unix)]
    #[test]
    fn test_sandbox_join_rejects_symlink_dir_escape_via_nonexistent_path() {
        let temp = create_test_dir();
        let outside = TempDir::new().unwrap();

        let outside_dir = outside.path().join("attacker_controlled");
        std::fs::create_dir(&outside_dir).unwrap();

        let escape_link = temp.path().join("escape_dir");
        std::os::unix::fs::symlink(&outside_dir, &escape_link).unwrap();

        let config = SandboxConfig::permissive();
        let root = SandboxRoot::new(temp.path(), config).unwrap();

        let result = root.join("escape_dir/nonexistent_malicious_file.txt");
        assert!(matches!(
            result.unwrap_err(),
            SandboxError::EscapeAttempt { .. }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_sandbox_join_rejects_hardlink_by_default() {
        let temp = create_test_dir();
        let original = temp.path().join("original.txt");
        std::fs::write(&original, "content").unwrap();

        let hardlink = temp.path().join("hardlink.txt");
        std::fs::hard_link(&original, &hardlink).unwrap();

        let root = SandboxRoot::new_default(temp.path()).unwrap();
        let result = root.join("hardlink.txt");
        assert!(matches!(
            result.unwrap_err(),
            SandboxError::HardlinkNotAllowed { .. }
        ));
    }

    #[test]
    fn test_sandbox_config_default() {
        let config = SandboxConfig::default();
        assert!(!config.allow_symlinks);
        assert!(!config.allow_hardlinks);
    }

    #[test]
    fn test_sandbox_config_permissive() {
        let config = SandboxConfig::permissive();
        assert!(config.allow_symlinks);
        assert!(config.allow_hardlinks);
    }
}
