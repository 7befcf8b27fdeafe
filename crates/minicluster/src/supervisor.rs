//! Dependency-ordered service start.

use log::info;
use minicluster_metastore::{MetastoreSettings, spawn_metastore};
use tokio::net::TcpListener;

use crate::conf::{Conf, keys};
use crate::config::{MetastoreMode, TopologyConfig, TransportMode};
use crate::error::MiniClusterError;
use crate::frontend::FrontendServer;
use crate::ports::{LOCALHOST, PortAssignment};
use crate::service::Services;

const METASTORE: &str = "metadata service";
const FRONTEND: &str = "front-end server";

/// Starts the metadata service (when remote) and then the front end.
///
/// Every started handle lands in `services` immediately, so a failure part
/// way through leaves it there for teardown.
pub struct ServiceSupervisor<'a> {
    topology: &'a TopologyConfig,
    services: &'a mut Services,
    ports: &'a mut PortAssignment,
}

impl<'a> ServiceSupervisor<'a> {
    pub fn new(
        topology: &'a TopologyConfig,
        services: &'a mut Services,
        ports: &'a mut PortAssignment,
    ) -> Self {
        Self {
            topology,
            services,
            ports,
        }
    }

    /// Start everything against `conf`; caller overrides are applied after
    /// the metadata service is configured and before the front end is built.
    ///
    /// Returns the transport the front end serves, which an override may have
    /// changed from the topology's.
    pub async fn start_all(
        &mut self,
        conf: &mut Conf,
        overrides: &Conf,
    ) -> Result<TransportMode, MiniClusterError> {
        if self.topology.is_metastore_remote() {
            self.start_metastore(conf).await?;
        }

        conf.extend(overrides.iter());

        self.start_frontend(conf.clone()).await
    }

    async fn start_metastore(&mut self, conf: &mut Conf) -> Result<(), MiniClusterError> {
        let startup = |e: std::io::Error| MiniClusterError::from_startup_error(e, METASTORE);
        let listener = TcpListener::bind((LOCALHOST, 0)).await.map_err(startup)?;
        let port = listener.local_addr().map_err(startup)?.port();

        let warehouse = conf.get_or(keys::METASTORE_WAREHOUSE_DIR, "").to_string();
        let mut settings = MetastoreSettings::new(warehouse);
        if let MetastoreMode::SecureRemote(credentials) = self.topology.metastore_mode() {
            settings = settings.with_sasl(&credentials.principal, &credentials.keytab);
        }

        let handle = spawn_metastore(listener, settings)
            .map_err(|e| MiniClusterError::from_startup_error(e, METASTORE))?;
        let uri = handle.uri();
        self.services.metastore = Some(handle);
        self.ports.metastore = Some(port);
        conf.set(keys::METASTORE_URIS, uri.clone());
        info!("Metadata service started at {uri}");
        Ok(())
    }

    async fn start_frontend(&mut self, conf: Conf) -> Result<TransportMode, MiniClusterError> {
        let frontend = FrontendServer::new(conf)
            .map_err(|e| MiniClusterError::from_startup_error(e, FRONTEND))?;
        let frontend = self.services.frontend.insert(frontend);

        let addr = frontend
            .start()
            .await
            .map_err(|e| MiniClusterError::from_startup_error(e, FRONTEND))?;
        let transport = frontend.settings().transport;
        if transport != self.topology.transport() {
            info!(
                "Front end serves {transport} transport; topology requested {}",
                self.topology.transport()
            );
        }
        self.ports.record_bound(transport, addr.port());
        Ok(transport)
    }
}
