use fs4::fs_std::FileExt;
use log::warn;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use sysinfo::{ProcessesToUpdate, System};

use crate::error::MiniClusterError;

/// Exclusive advisory lock over one workspace path.
///
/// The lock file records the owning PID; it is removed when the lock drops.
#[derive(Debug)]
pub struct WorkspaceLock {
    path: PathBuf,
    _file: File,
}

impl WorkspaceLock {
    pub fn acquire(lock_path: impl Into<PathBuf>) -> Result<Self, MiniClusterError> {
        let path = lock_path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| MiniClusterError::from_io_error(e, "workspace lock directory"))?;
        }
        let file = acquire_lock_file(&path)?;
        Ok(Self { path, _file: file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkspaceLock {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!("Failed to remove lock file {:?}: {e}", self.path);
            }
        }
    }
}

fn acquire_lock_file(lock_path: &Path) -> Result<File, MiniClusterError> {
    let lock_file = open_lock_file(lock_path)?;

    if try_lock(&lock_file) {
        write_lock_metadata(&lock_file)?;
        return Ok(lock_file);
    }
    handle_lock_conflict(lock_path)
}

fn open_lock_file(lock_path: &Path) -> Result<File, MiniClusterError> {
    OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path)
        .map_err(|e| MiniClusterError::from_io_error(e, "workspace lock file"))
}

fn try_lock(lock_file: &File) -> bool {
    matches!(lock_file.try_lock_exclusive(), Ok(true))
}

fn write_lock_metadata(lock_file: &File) -> Result<(), MiniClusterError> {
    let pid = std::process::id();
    let timestamp = chrono::Utc::now().to_rfc3339();
    let lock_info = format!("PID: {pid}\nTimestamp: {timestamp}\n");

    let _ = lock_file.set_len(0);
    (&*lock_file)
        .write_all(lock_info.as_bytes())
        .map_err(|e| MiniClusterError::from_io_error(e, "workspace lock metadata"))
}

fn handle_lock_conflict(lock_path: &Path) -> Result<File, MiniClusterError> {
    let locked = |pid| MiniClusterError::WorkspaceLocked {
        path: lock_path.display().to_string(),
        pid,
    };

    match extract_pid_from_lock_file(lock_path) {
        Some(pid) if is_process_alive(pid) => Err(locked(Some(pid))),
        _ => {
            // Stale: the recorded owner is gone.
            if std::fs::remove_file(lock_path).is_err() {
                return Err(locked(None));
            }
            let lock_file = open_lock_file(lock_path)?;
            if !try_lock(&lock_file) {
                return Err(locked(None));
            }
            write_lock_metadata(&lock_file)?;
            Ok(lock_file)
        }
    }
}

fn extract_pid_from_lock_file(lock_path: &Path) -> Option<u32> {
    std::fs::read_to_string(lock_path).ok().and_then(|content| {
        content
            .lines()
            .find(|line| line.starts_with("PID:"))
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|pid_str| pid_str.parse::<u32>().ok())
    })
}

fn is_process_alive(pid: u32) -> bool {
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::All, false);
    system
        .processes()
        .get(&sysinfo::Pid::from(pid as usize))
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_second_lock_in_same_process_conflicts() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join(".local_base.lock");

        let first = WorkspaceLock::acquire(&lock_path).unwrap();
        let content = std::fs::read_to_string(first.path()).unwrap();
        assert!(content.contains(&format!("PID: {}", std::process::id())));

        match WorkspaceLock::acquire(&lock_path) {
            Err(MiniClusterError::WorkspaceLocked { pid, .. }) => {
                assert_eq!(pid, Some(std::process::id()));
            }
            other => panic!("Expected WorkspaceLocked, got {other:?}"),
        }

        drop(first);
        assert!(!lock_path.exists());
        WorkspaceLock::acquire(&lock_path).unwrap();
    }

    #[test]
    fn test_stale_lock_file_is_reclaimed() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join(".local_base.lock");
        // Nobody holds the flock; metadata points at a PID that cannot exist.
        std::fs::write(&lock_path, "PID: 4294967294\nTimestamp: then\n").unwrap();

        let lock = WorkspaceLock::acquire(&lock_path).unwrap();
        let content = std::fs::read_to_string(lock.path()).unwrap();
        assert!(content.contains(&format!("PID: {}", std::process::id())));
    }
}
