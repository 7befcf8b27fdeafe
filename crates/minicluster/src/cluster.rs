//! The orchestrator: one topology from provisioning to teardown.

use log::{error, info, warn};
use minicluster_metastore::MetastoreHandle;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::conf::{Conf, keys};
use crate::config::{MetastoreMode, TopologyConfig, TransportMode};
use crate::endpoint::{self, DEFAULT_DATABASE, DEFAULT_HTTP_PATH, EndpointSpec};
use crate::error::MiniClusterError;
use crate::frontend::SessionClient;
use crate::fs::{FileSystem, LocalFileSystem};
use crate::ports::{LOCALHOST, PortAssignment};
use crate::readiness::ReadinessProbe;
use crate::service::Services;
use crate::simulated::{self, SimulatedCompute, SimulatedDfs};
use crate::supervisor::ServiceSupervisor;
use crate::teardown::{self, TeardownReport};
use crate::workspace::{self, Workspace};

/// Embedded test topology.
///
/// ```no_run
/// # async fn run() -> Result<(), minicluster::MiniClusterError> {
/// use minicluster::{Conf, MiniCluster, TopologyConfig};
///
/// let topology = TopologyConfig::builder().with_http_transport().build()?;
/// let mut cluster = MiniCluster::new(topology)?;
/// cluster.start(&Conf::new()).await?;
/// println!("{}", cluster.endpoint_for("db1")?);
/// cluster.stop().await;
/// cluster.cleanup_workspace();
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MiniCluster {
    topology: TopologyConfig,
    base_conf: Conf,
    conf: Conf,
    transport: TransportMode,
    ports: PortAssignment,
    base_dir: PathBuf,
    services: Services,
    workspace: Option<Workspace>,
    started: bool,
}

impl MiniCluster {
    /// Resolve ports and configuration. Nothing is started or written yet.
    pub fn new(topology: TopologyConfig) -> Result<Self, MiniClusterError> {
        let ports = PortAssignment::allocate()?;
        let base_dir = workspace::base_dir_for(topology.temp_root())?;

        let mut conf = topology.base_conf().clone();
        conf.set(keys::BIND_HOST, LOCALHOST);
        conf.set(keys::BINARY_PORT, ports.binary.to_string());
        conf.set(keys::HTTP_PORT, ports.http.to_string());
        if !conf.contains(keys::HTTP_PATH) {
            conf.set(keys::HTTP_PATH, DEFAULT_HTTP_PATH);
        }
        conf.set(keys::MAX_START_ATTEMPTS, "3");
        conf.set(keys::START_ATTEMPT_INTERVAL, "10s");

        if let Some(credentials) = topology.server_credentials() {
            conf.set(keys::KERBEROS_PRINCIPAL, credentials.principal.as_str());
            conf.set(keys::KERBEROS_KEYTAB, credentials.keytab.as_str());
            conf.set(keys::AUTHENTICATION, topology.auth_type());
        }
        if let MetastoreMode::SecureRemote(credentials) = topology.metastore_mode() {
            conf.set(keys::METASTORE_KERBEROS_PRINCIPAL, credentials.principal.as_str());
            conf.set(keys::METASTORE_KERBEROS_KEYTAB, credentials.keytab.as_str());
            conf.set(keys::METASTORE_SASL_ENABLED, "true");
        }

        Ok(Self {
            transport: topology.transport(),
            topology,
            conf: conf.clone(),
            base_conf: conf,
            ports,
            base_dir,
            services: Services::default(),
            workspace: None,
            started: false,
        })
    }

    /// Provision, start every service and wait until the front end accepts a
    /// session. `overrides` win over everything derived.
    ///
    /// On failure, services that did start stay owned by the cluster; call
    /// [`MiniCluster::stop`] to release them.
    pub async fn start(&mut self, overrides: &Conf) -> Result<(), MiniClusterError> {
        if self.started {
            return Err(MiniClusterError::AlreadyStarted);
        }

        let mut conf = self.base_conf.clone();
        let result = self.start_services(&mut conf, overrides).await;
        self.conf = conf;

        match result {
            Ok(attempts) => {
                self.started = true;
                info!(
                    "Topology started at {} after {attempts} readiness attempt(s)",
                    self.probe_endpoint()
                );
                Ok(())
            }
            Err(e) => {
                error!("Topology failed to start: {e}");
                Err(e)
            }
        }
    }

    async fn start_services(
        &mut self,
        conf: &mut Conf,
        overrides: &Conf,
    ) -> Result<u32, MiniClusterError> {
        let file_system: Arc<dyn FileSystem> = if self.topology.use_simulated_compute() {
            simulated::bootstrap(&mut self.services, conf).await?
        } else {
            Arc::new(LocalFileSystem)
        };
        self.workspace = Some(Workspace::provision(&self.topology, conf, file_system)?);

        self.ports.reallocate_binary()?;
        conf.set(keys::BINARY_PORT, self.ports.binary.to_string());
        conf.set(keys::HTTP_PORT, self.ports.http.to_string());

        self.transport = self.topology.transport();
        self.transport = ServiceSupervisor::new(&self.topology, &mut self.services, &mut self.ports)
            .start_all(conf, overrides)
            .await?;

        let client = self.frontend_client()?;
        ReadinessProbe::new(client.as_ref(), self.probe_endpoint(), self.topology.probe())
            .wait()
            .await
    }

    /// Stop the front end, then the simulated clusters. Never fails; problems
    /// come back as warnings. The metadata service keeps running.
    pub async fn stop(&mut self) -> TeardownReport {
        let report = teardown::stop_in_order(self.services.drain_in_stop_order()).await;
        if self.workspace.take().is_some() {
            info!("Released workspace lock for {}", self.base_dir.display());
        }
        self.started = false;
        report
    }

    /// Delete the base directory, logging instead of failing. Returns whether
    /// anything was removed.
    pub fn cleanup_workspace(&self) -> bool {
        match workspace::remove_base_dir(&self.base_dir) {
            Ok(removed) => removed,
            Err(e) => {
                warn!("Failed to clean up workspace: {e}");
                false
            }
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn verify_started(&self) -> Result<(), MiniClusterError> {
        if self.started {
            Ok(())
        } else {
            Err(MiniClusterError::NotStarted)
        }
    }

    /// Connection string for `database` with caller-supplied session and
    /// connection-property extensions.
    pub fn endpoint(
        &self,
        database: &str,
        session_extension: &str,
        connection_extension: &str,
    ) -> Result<String, MiniClusterError> {
        self.verify_started()?;
        Ok(self.build_endpoint(database, session_extension, connection_extension))
    }

    pub fn endpoint_for(&self, database: &str) -> Result<String, MiniClusterError> {
        self.endpoint(database, "", "")
    }

    pub fn default_endpoint(&self) -> Result<String, MiniClusterError> {
        self.endpoint_for(DEFAULT_DATABASE)
    }

    pub fn base_endpoint(&self) -> Result<String, MiniClusterError> {
        self.verify_started()?;
        Ok(endpoint::base_endpoint(
            LOCALHOST,
            self.ports.port_for(self.transport),
        ))
    }

    fn build_endpoint(
        &self,
        database: &str,
        session_extension: &str,
        connection_extension: &str,
    ) -> String {
        endpoint::build_endpoint(&EndpointSpec {
            host: LOCALHOST,
            transport: self.transport,
            binary_port: self.ports.binary,
            http_port: self.ports.http,
            principal: self
                .topology
                .server_credentials()
                .map(|credentials| credentials.principal.as_str()),
            database,
            session_extension,
            connection_extension,
        })
    }

    fn probe_endpoint(&self) -> String {
        self.build_endpoint(DEFAULT_DATABASE, "", "")
    }

    fn frontend_client(&self) -> Result<Box<dyn SessionClient>, MiniClusterError> {
        let frontend = self
            .services
            .frontend
            .as_ref()
            .ok_or(MiniClusterError::NotStarted)?;
        frontend
            .session_client()
            .map_err(|e| MiniClusterError::from_startup_error(e, "front-end server"))
    }

    /// Client for opening sessions against the running front end.
    pub fn session_client(&self) -> Result<Box<dyn SessionClient>, MiniClusterError> {
        self.verify_started()?;
        self.frontend_client()
    }

    /// Configuration the front end was built with.
    pub fn frontend_conf(&self) -> Result<&Conf, MiniClusterError> {
        self.verify_started()?;
        self.services
            .frontend
            .as_ref()
            .map(|frontend| frontend.effective_conf())
            .ok_or(MiniClusterError::NotStarted)
    }

    /// Runtime configuration: derived before start, complete after.
    pub fn conf(&self) -> &Conf {
        &self.conf
    }

    pub fn dfs(&self) -> Option<&SimulatedDfs> {
        self.services.dfs.as_ref()
    }

    pub fn compute(&self) -> Option<&SimulatedCompute> {
        self.services.compute.as_ref()
    }

    pub fn metastore(&self) -> Option<&MetastoreHandle> {
        self.services.metastore.as_ref()
    }

    pub fn ports(&self) -> PortAssignment {
        self.ports
    }

    pub fn workspace(&self) -> Option<&Workspace> {
        self.workspace.as_ref()
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn topology(&self) -> &TopologyConfig {
        &self.topology
    }

    /// Transport the front end serves; follows a start-time override.
    pub fn transport(&self) -> TransportMode {
        self.transport
    }
}
