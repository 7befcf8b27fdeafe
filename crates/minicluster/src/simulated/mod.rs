//! Simulated distributed filesystem and compute cluster.
//!
//! Each simulated cluster is a single process-local listener plus whatever
//! on-disk state it needs; there are no real nodes behind them.

pub mod compute;
pub mod dfs;

pub use compute::{DEFAULT_COMPUTE_NODES, SimulatedCompute};
pub use dfs::{DEFAULT_DATA_NODES, SimulatedDfs, SimulatedFileSystem};

use log::{debug, info};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::conf::Conf;
use crate::error::MiniClusterError;
use crate::fs::FileSystem;
use crate::ports::LOCALHOST;
use crate::service::Services;

const ACTIVE_TIMEOUT: Duration = Duration::from_secs(30);

/// Start the simulated filesystem, wait for it, then start compute on top.
///
/// Handles go into `services` as soon as each cluster is up, so a later
/// failure still leaves them for teardown.
pub async fn bootstrap(
    services: &mut Services,
    conf: &mut Conf,
) -> Result<Arc<dyn FileSystem>, MiniClusterError> {
    let dfs = services.dfs.insert(SimulatedDfs::start(DEFAULT_DATA_NODES).await?);
    dfs.wait_active(ACTIVE_TIMEOUT).await?;
    let file_system = dfs.file_system();
    let fs_uri = dfs.uri().to_string();

    let compute = services
        .compute
        .insert(SimulatedCompute::start(DEFAULT_COMPUTE_NODES, &fs_uri).await?);
    compute.setup_configuration(conf);

    info!("Simulated clusters ready: filesystem {fs_uri}, compute {} nodes", compute.num_nodes());
    Ok(file_system)
}

/// Accepts connections and answers each with one banner line.
#[derive(Debug)]
pub(crate) struct BannerListener {
    addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl BannerListener {
    pub(crate) async fn bind(banner: String) -> std::io::Result<Self> {
        let listener = TcpListener::bind((LOCALHOST, 0)).await?;
        let addr = listener.local_addr()?;
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let line = format!("{banner}\n");
            loop {
                tokio::select! {
                    accepted = listener.accept() => {
                        if let Ok((mut stream, _)) = accepted {
                            let _ = stream.write_all(line.as_bytes()).await;
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
            debug!("{banner} listener on {addr} closed");
        });

        Ok(Self {
            addr,
            shutdown,
            task,
        })
    }

    pub(crate) fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub(crate) fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub(crate) async fn stop(self) -> Result<(), tokio::task::JoinError> {
        let _ = self.shutdown.send(true);
        self.task.await
    }
}
