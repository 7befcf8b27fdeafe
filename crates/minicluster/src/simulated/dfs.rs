use async_trait::async_trait;
use log::info;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpStream;
use tokio::time::Instant;

use super::BannerListener;
use crate::error::MiniClusterError;
use crate::fs::{self, FileSystem};
use crate::service::ManagedService;

pub const DEFAULT_DATA_NODES: usize = 4;
pub const URI_SCHEME: &str = "simfs";

const SERVICE_NAME: &str = "simulated filesystem";

/// Simulated distributed filesystem backed by a temporary directory.
#[derive(Debug)]
pub struct SimulatedDfs {
    backing: Option<TempDir>,
    data_dirs: Vec<PathBuf>,
    namenode: Option<BannerListener>,
    file_system: Arc<SimulatedFileSystem>,
}

impl SimulatedDfs {
    pub async fn start(data_nodes: usize) -> Result<Self, MiniClusterError> {
        let startup = |e: io::Error| MiniClusterError::from_startup_error(e, SERVICE_NAME);

        let backing = tempfile::Builder::new()
            .prefix("minicluster-dfs-")
            .tempdir()
            .map_err(startup)?;

        let namespace = backing.path().join("namespace");
        std::fs::create_dir_all(&namespace).map_err(startup)?;
        let data_dirs = (1..=data_nodes)
            .map(|i| backing.path().join("data").join(format!("data{i}")))
            .collect::<Vec<_>>();
        for dir in &data_dirs {
            std::fs::create_dir_all(dir).map_err(startup)?;
        }

        let namenode = BannerListener::bind("NAMENODE".to_string())
            .await
            .map_err(startup)?;
        let uri = format!("{URI_SCHEME}://{}", namenode.local_addr());
        info!("Simulated filesystem at {uri} with {data_nodes} data nodes");

        Ok(Self {
            backing: Some(backing),
            data_dirs,
            namenode: Some(namenode),
            file_system: Arc::new(SimulatedFileSystem::new(uri, namespace)),
        })
    }

    /// Wait until the name-node listener accepts connections.
    pub async fn wait_active(&self, timeout: Duration) -> Result<(), MiniClusterError> {
        let Some(namenode) = &self.namenode else {
            return Err(MiniClusterError::from_startup_error("not running", SERVICE_NAME));
        };
        let addr = namenode.local_addr();
        let deadline = Instant::now() + timeout;
        loop {
            if TcpStream::connect(addr).await.is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(MiniClusterError::from_startup_error(
                    format!("name node at {addr} not active after {timeout:?}"),
                    SERVICE_NAME,
                ));
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    pub fn uri(&self) -> &str {
        self.file_system.uri()
    }

    pub fn num_nodes(&self) -> usize {
        self.data_dirs.len()
    }

    pub fn data_dirs(&self) -> &[PathBuf] {
        &self.data_dirs
    }

    pub fn file_system(&self) -> Arc<dyn FileSystem> {
        self.file_system.clone()
    }
}

#[async_trait]
impl ManagedService for SimulatedDfs {
    fn name(&self) -> &'static str {
        SERVICE_NAME
    }

    fn is_running(&self) -> bool {
        self.namenode.as_ref().is_some_and(BannerListener::is_running)
    }

    async fn shutdown(&mut self) -> Result<(), MiniClusterError> {
        if let Some(namenode) = self.namenode.take() {
            namenode
                .stop()
                .await
                .map_err(|e| MiniClusterError::from_shutdown_error(e, SERVICE_NAME))?;
        }
        if let Some(backing) = self.backing.take() {
            backing
                .close()
                .map_err(|e| MiniClusterError::from_shutdown_error(e, SERVICE_NAME))?;
        }
        Ok(())
    }
}

/// View of a [`SimulatedDfs`] namespace; absolute paths map under its
/// backing directory.
#[derive(Debug)]
pub struct SimulatedFileSystem {
    uri: String,
    namespace: PathBuf,
}

impl SimulatedFileSystem {
    pub fn new(uri: impl Into<String>, namespace: impl Into<PathBuf>) -> Self {
        Self {
            uri: uri.into(),
            namespace: namespace.into(),
        }
    }

    /// Where a filesystem path is stored on local disk.
    pub fn local_path(&self, path: &Path) -> PathBuf {
        let relative = path.strip_prefix("/").unwrap_or(path);
        self.namespace.join(relative)
    }
}

impl FileSystem for SimulatedFileSystem {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn is_local(&self) -> bool {
        false
    }

    fn mkdirs(&self, path: &Path, mode: Option<u32>) -> io::Result<()> {
        fs::create_dir_with_mode(&self.local_path(path), mode)
    }

    fn delete(&self, path: &Path) -> io::Result<bool> {
        fs::remove_tree(&self.local_path(path))
    }

    fn exists(&self, path: &Path) -> bool {
        self.local_path(path).exists()
    }

    fn mode(&self, path: &Path) -> io::Result<u32> {
        fs::permission_bits(&self.local_path(path))
    }
}
