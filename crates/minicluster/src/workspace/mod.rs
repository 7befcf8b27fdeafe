//! On-disk layout for one topology.

pub mod lock;

use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::conf::{Conf, keys};
use crate::config::TopologyConfig;
use crate::error::MiniClusterError;
use crate::fs::{self, FileSystem};

pub use lock::WorkspaceLock;

/// Minimum number of named components a base directory needs before it may be
/// recursively deleted.
pub const MIN_CLEANUP_DEPTH: usize = 3;

pub const WAREHOUSE_MODE: u32 = 0o777;
pub const SCRATCH_MODE: u32 = 0o733;

/// Workspace root on a simulated filesystem.
pub const SIMULATED_ROOT: &str = "/base";

const WORKSPACE_DIR: &str = "minicluster";
const BASE_DIR_NAME: &str = "local_base";
const LOCK_FILE_NAME: &str = ".local_base.lock";

/// Local base directory for a temp root: `<temp_root>/minicluster/local_base`.
pub fn base_dir_for(temp_root: &Path) -> Result<PathBuf, MiniClusterError> {
    let base_dir = temp_root.join(WORKSPACE_DIR).join(BASE_DIR_NAME);
    std::path::absolute(&base_dir).map_err(|e| MiniClusterError::from_io_error(e, "base directory"))
}

pub fn lock_path_for(base_dir: &Path) -> PathBuf {
    base_dir.with_file_name(LOCK_FILE_NAME)
}

/// Recursively delete a base directory. A missing directory is not an error.
pub fn remove_base_dir(base_dir: &Path) -> Result<bool, MiniClusterError> {
    fs::remove_tree(base_dir).map_err(|e| MiniClusterError::from_io_error(e, "base directory cleanup"))
}

fn ensure_safe_to_delete(base_dir: &Path) -> Result<(), MiniClusterError> {
    let depth = fs::depth(base_dir);
    if depth < MIN_CLEANUP_DEPTH {
        return Err(MiniClusterError::UnsafeWorkspacePath {
            path: base_dir.display().to_string(),
            depth,
            min_depth: MIN_CLEANUP_DEPTH,
        });
    }
    Ok(())
}

/// Provisioned directories plus the lock that makes them ours.
#[derive(Debug)]
pub struct Workspace {
    base_dir: PathBuf,
    root: PathBuf,
    warehouse_dir: PathBuf,
    scratch_dir: PathBuf,
    local_scratch_dir: PathBuf,
    file_system: Arc<dyn FileSystem>,
    lock: WorkspaceLock,
}

impl Workspace {
    /// Lock, optionally clean, and create the workspace, recording its paths
    /// into `conf`.
    ///
    /// Cleanup applies only to a local root; with a simulated file system the
    /// local base keeps its contents. The depth guard runs before anything on
    /// disk is touched.
    pub fn provision(
        topology: &TopologyConfig,
        conf: &mut Conf,
        file_system: Arc<dyn FileSystem>,
    ) -> Result<Self, MiniClusterError> {
        let base_dir = base_dir_for(topology.temp_root())?;
        let cleanup = topology.cleanup_workspace_on_startup() && file_system.is_local();
        if cleanup {
            ensure_safe_to_delete(&base_dir)?;
        }

        let lock = WorkspaceLock::acquire(lock_path_for(&base_dir))?;

        if cleanup && remove_base_dir(&base_dir)? {
            info!("Removed previous workspace at {}", base_dir.display());
        }
        fs::create_dir_with_mode(&base_dir, None)
            .map_err(|e| MiniClusterError::from_io_error(e, "base directory"))?;

        let root = if file_system.is_local() {
            base_dir.clone()
        } else {
            PathBuf::from(SIMULATED_ROOT)
        };
        let warehouse_dir = root.join("warehouse");
        let scratch_dir = root.join("scratch");
        let local_scratch_dir = base_dir.join("scratch").join("local");

        file_system
            .mkdirs(&root, None)
            .map_err(|e| MiniClusterError::from_io_error(e, "workspace root"))?;
        file_system
            .mkdirs(&warehouse_dir, Some(WAREHOUSE_MODE))
            .map_err(|e| MiniClusterError::from_io_error(e, "warehouse directory"))?;
        file_system
            .mkdirs(&scratch_dir, Some(SCRATCH_MODE))
            .map_err(|e| MiniClusterError::from_io_error(e, "scratch directory"))?;
        fs::create_dir_with_mode(&local_scratch_dir, Some(SCRATCH_MODE))
            .map_err(|e| MiniClusterError::from_io_error(e, "local scratch directory"))?;

        let workspace = Self {
            base_dir,
            root,
            warehouse_dir,
            scratch_dir,
            local_scratch_dir,
            file_system,
            lock,
        };
        workspace.record_into(conf);
        debug!(
            "Provisioned workspace at {} (root {})",
            workspace.base_dir.display(),
            workspace.file_system.qualify(&workspace.root)
        );
        Ok(workspace)
    }

    fn record_into(&self, conf: &mut Conf) {
        conf.set(
            keys::METASTORE_WAREHOUSE_DIR,
            self.recorded(&self.warehouse_dir),
        );
        conf.set(keys::SCRATCH_DIR, self.recorded(&self.scratch_dir));
        conf.set(
            keys::LOCAL_SCRATCH_DIR,
            self.local_scratch_dir.display().to_string(),
        );
        conf.set(
            keys::METASTORE_CONNECT_URL,
            format!(
                "embedded:{}/test_metastore;create=true",
                self.base_dir.display()
            ),
        );
    }

    /// Local paths are recorded as-is; simulated ones carry the filesystem URI.
    fn recorded(&self, path: &Path) -> String {
        if self.file_system.is_local() {
            path.display().to_string()
        } else {
            self.file_system.qualify(path)
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn warehouse_dir(&self) -> &Path {
        &self.warehouse_dir
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    pub fn local_scratch_dir(&self) -> &Path {
        &self.local_scratch_dir
    }

    pub fn file_system(&self) -> &Arc<dyn FileSystem> {
        &self.file_system
    }

    pub fn lock_path(&self) -> &Path {
        self.lock.path()
    }

    pub fn remove_base_dir(&self) -> Result<bool, MiniClusterError> {
        remove_base_dir(&self.base_dir)
    }
}
