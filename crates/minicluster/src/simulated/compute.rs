use async_trait::async_trait;
use log::info;

use super::BannerListener;
use crate::conf::{Conf, keys};
use crate::error::MiniClusterError;
use crate::service::ManagedService;

pub const DEFAULT_COMPUTE_NODES: usize = 4;
pub const FRAMEWORK_NAME: &str = "simulated";

const SERVICE_NAME: &str = "simulated compute cluster";

/// Simulated compute cluster bound to one filesystem.
#[derive(Debug)]
pub struct SimulatedCompute {
    nodes: usize,
    resource_manager: Option<BannerListener>,
    runtime_conf: Conf,
}

impl SimulatedCompute {
    pub async fn start(nodes: usize, fs_uri: &str) -> Result<Self, MiniClusterError> {
        let resource_manager = BannerListener::bind("RESOURCEMANAGER".to_string())
            .await
            .map_err(|e| MiniClusterError::from_startup_error(e, SERVICE_NAME))?;
        let rm_addr = resource_manager.local_addr().to_string();

        let runtime_conf: Conf = [
            (keys::FS_DEFAULT_NAME, fs_uri.to_string()),
            (keys::COMPUTE_FRAMEWORK, FRAMEWORK_NAME.to_string()),
            (keys::COMPUTE_RESOURCE_MANAGER, rm_addr.clone()),
            (keys::COMPUTE_NODES, nodes.to_string()),
        ]
        .into_iter()
        .collect();

        info!("Simulated compute cluster with {nodes} nodes, resource manager at {rm_addr}");
        Ok(Self {
            nodes,
            resource_manager: Some(resource_manager),
            runtime_conf,
        })
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes
    }

    /// Copy the settings services need to submit work to this cluster.
    pub fn setup_configuration(&self, conf: &mut Conf) {
        conf.extend(self.runtime_conf.iter());
    }
}

#[async_trait]
impl ManagedService for SimulatedCompute {
    fn name(&self) -> &'static str {
        SERVICE_NAME
    }

    fn is_running(&self) -> bool {
        self.resource_manager
            .as_ref()
            .is_some_and(BannerListener::is_running)
    }

    async fn shutdown(&mut self) -> Result<(), MiniClusterError> {
        match self.resource_manager.take() {
            Some(resource_manager) => resource_manager
                .stop()
                .await
                .map_err(|e| MiniClusterError::from_shutdown_error(e, SERVICE_NAME)),
            None => Ok(()),
        }
    }
}
