//! Start/stop boundary shared by every stoppable component of a topology.

use async_trait::async_trait;
use minicluster_metastore::MetastoreHandle;

use crate::MiniClusterError;
use crate::frontend::FrontendServer;
use crate::simulated::{SimulatedCompute, SimulatedDfs};

/// A component the orchestrator can stop.
///
/// The orchestrator only calls these boundary methods; each service manages
/// its own tasks internally.
#[async_trait]
pub trait ManagedService: Send {
    fn name(&self) -> &'static str;

    fn is_running(&self) -> bool;

    /// Stop the service. Calling it on an already stopped service is a no-op.
    async fn shutdown(&mut self) -> Result<(), MiniClusterError>;
}

/// Handles owned by one topology, filled in start order.
#[derive(Debug, Default)]
pub struct Services {
    pub dfs: Option<SimulatedDfs>,
    pub compute: Option<SimulatedCompute>,
    pub metastore: Option<MetastoreHandle>,
    pub frontend: Option<FrontendServer>,
}

impl Services {
    /// Take every stoppable handle out, front end first.
    ///
    /// The metadata service stays behind: it has no stop primitive and keeps
    /// serving until the process exits.
    pub fn drain_in_stop_order(&mut self) -> Vec<Box<dyn ManagedService>> {
        let mut ordered: Vec<Box<dyn ManagedService>> = Vec::new();
        if let Some(frontend) = self.frontend.take() {
            ordered.push(Box::new(frontend));
        }
        if let Some(compute) = self.compute.take() {
            ordered.push(Box::new(compute));
        }
        if let Some(dfs) = self.dfs.take() {
            ordered.push(Box::new(dfs));
        }
        ordered
    }
}
