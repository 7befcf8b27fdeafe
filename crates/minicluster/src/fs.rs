//! Filesystem handles the workspace is provisioned on.

use std::fmt;
use std::io;
use std::path::{Component, Path};

/// Filesystem a workspace root lives on.
///
/// Paths are absolute paths within the filesystem; [`FileSystem::qualify`]
/// turns them into URIs that other services can be configured with.
pub trait FileSystem: Send + Sync + fmt::Debug {
    /// Scheme and authority, e.g. `file://` or `simfs://127.0.0.1:4242`.
    fn uri(&self) -> &str;

    fn is_local(&self) -> bool;

    /// Create a directory and its parents; `mode`, when given, is applied to
    /// the leaf directory regardless of the process umask.
    fn mkdirs(&self, path: &Path, mode: Option<u32>) -> io::Result<()>;

    /// Recursively delete. Returns false when nothing existed.
    fn delete(&self, path: &Path) -> io::Result<bool>;

    fn exists(&self, path: &Path) -> bool;

    /// Permission bits of an existing path.
    fn mode(&self, path: &Path) -> io::Result<u32>;

    fn qualify(&self, path: &Path) -> String {
        format!("{}{}", self.uri(), path.display())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn uri(&self) -> &str {
        "file://"
    }

    fn is_local(&self) -> bool {
        true
    }

    fn mkdirs(&self, path: &Path, mode: Option<u32>) -> io::Result<()> {
        create_dir_with_mode(path, mode)
    }

    fn delete(&self, path: &Path) -> io::Result<bool> {
        remove_tree(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn mode(&self, path: &Path) -> io::Result<u32> {
        permission_bits(path)
    }
}

/// Number of named components below the filesystem root.
pub fn depth(path: &Path) -> usize {
    path.components()
        .filter(|component| matches!(component, Component::Normal(_)))
        .count()
}

pub(crate) fn create_dir_with_mode(path: &Path, mode: Option<u32>) -> io::Result<()> {
    std::fs::create_dir_all(path)?;
    if let Some(mode) = mode {
        set_mode(path, mode)?;
    }
    Ok(())
}

pub(crate) fn remove_tree(path: &Path) -> io::Result<bool> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        // A plain file where a directory was expected.
        Err(e) if path.is_file() => std::fs::remove_file(path).map(|_| true).or(Err(e)),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
pub(crate) fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
pub(crate) fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
pub(crate) fn permission_bits(path: &Path) -> io::Result<u32> {
    use std::os::unix::fs::PermissionsExt;
    Ok(std::fs::metadata(path)?.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
pub(crate) fn permission_bits(path: &Path) -> io::Result<u32> {
    let readonly = std::fs::metadata(path)?.permissions().readonly();
    Ok(if readonly { 0o555 } else { 0o777 })
}
