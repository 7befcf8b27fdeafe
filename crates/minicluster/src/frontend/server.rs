use async_trait::async_trait;
use log::{info, warn};
use minicluster_metastore::MetastoreClient;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::client::{BinarySessionClient, HttpSessionClient, SessionClient};
use super::error::FrontendError;
use super::session::SessionManager;
use super::{binary, http};
use crate::MiniClusterError;
use crate::conf::{Conf, keys};
use crate::config::TransportMode;
use crate::endpoint::DEFAULT_HTTP_PATH;
use crate::ports::LOCALHOST;
use crate::service::ManagedService;

pub const DEFAULT_BINARY_PORT: u16 = 10000;
pub const DEFAULT_HTTP_PORT: u16 = 10001;

const METASTORE_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings a front end reads from its configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontendSettings {
    pub transport: TransportMode,
    pub host: String,
    pub binary_port: u16,
    pub http_port: u16,
    pub http_path: String,
    pub metastore_uri: Option<String>,
}

impl FrontendSettings {
    pub fn from_conf(conf: &Conf) -> Result<Self, FrontendError> {
        let invalid = |e: MiniClusterError| FrontendError::configuration(e.to_string());

        let transport = conf
            .get(keys::TRANSPORT_MODE)
            .map(str::parse::<TransportMode>)
            .transpose()
            .map_err(invalid)?
            .unwrap_or_default();

        Ok(Self {
            transport,
            host: conf.get_or(keys::BIND_HOST, LOCALHOST).to_string(),
            binary_port: conf
                .get_parsed(keys::BINARY_PORT)
                .map_err(invalid)?
                .unwrap_or(DEFAULT_BINARY_PORT),
            http_port: conf
                .get_parsed(keys::HTTP_PORT)
                .map_err(invalid)?
                .unwrap_or(DEFAULT_HTTP_PORT),
            http_path: conf.get_or(keys::HTTP_PATH, DEFAULT_HTTP_PATH).to_string(),
            metastore_uri: conf
                .get(keys::METASTORE_URIS)
                .filter(|uri| !uri.trim().is_empty())
                .map(str::to_string),
        })
    }

    pub fn port(&self) -> u16 {
        match self.transport {
            TransportMode::Binary => self.binary_port,
            TransportMode::Http => self.http_port,
        }
    }
}

#[derive(Debug)]
struct RunningServer {
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// In-process query front end serving sessions on one transport.
#[derive(Debug)]
pub struct FrontendServer {
    conf: Conf,
    settings: FrontendSettings,
    sessions: Arc<SessionManager>,
    running: Option<RunningServer>,
}

impl FrontendServer {
    pub fn new(conf: Conf) -> Result<Self, FrontendError> {
        let settings = FrontendSettings::from_conf(&conf)?;
        Ok(Self {
            conf,
            settings,
            sessions: Arc::new(SessionManager::new()),
            running: None,
        })
    }

    /// Bind the configured listener and serve in the background.
    ///
    /// With a metadata-service URI configured, the service must answer a ping
    /// before the listener is bound.
    pub async fn start(&mut self) -> Result<SocketAddr, FrontendError> {
        if self.running.is_some() {
            return Err(FrontendError::AlreadyRunning);
        }

        if let Some(uri) = &self.settings.metastore_uri {
            let mut client = MetastoreClient::connect_with_timeout(uri.clone(), METASTORE_CONNECT_TIMEOUT)
                .await
                .map_err(|e| FrontendError::Metastore {
                    reason: e.to_string(),
                })?;
            let pong = client.ping().await.map_err(|e| FrontendError::Metastore {
                reason: e.to_string(),
            })?;
            tracing::debug!(uri = %uri, version = %pong.version, "Metastore reachable");
        }

        let addr = format!("{}:{}", self.settings.host, self.settings.port());
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| FrontendError::Bind {
                addr: addr.clone(),
                reason: e.to_string(),
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| FrontendError::from_io_error(e, "listener address"))?;

        let port_key = match self.settings.transport {
            TransportMode::Binary => keys::BINARY_PORT,
            TransportMode::Http => keys::HTTP_PORT,
        };
        self.conf.set(port_key, local_addr.port().to_string());

        let (shutdown, shutdown_rx) = watch::channel(false);
        let sessions = Arc::clone(&self.sessions);
        let task = match self.settings.transport {
            TransportMode::Binary => tokio::spawn(binary::serve(listener, sessions, shutdown_rx)),
            TransportMode::Http => {
                let router = http::create_router(&self.settings.http_path, sessions);
                tokio::spawn(http::serve(listener, router, shutdown_rx))
            }
        };

        info!(
            "Front-end server listening on {local_addr} ({} transport)",
            self.settings.transport
        );
        self.running = Some(RunningServer {
            local_addr,
            shutdown,
            task,
        });
        Ok(local_addr)
    }

    /// Signal shutdown and wait for the serving task. No-op when not running.
    pub async fn stop(&mut self) -> Result<(), FrontendError> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };
        let _ = running.shutdown.send(true);

        let result = tokio::time::timeout(STOP_TIMEOUT, running.task).await;
        self.sessions.clear();
        match result {
            Ok(Ok(())) => {
                info!("Front-end server on {} stopped", running.local_addr);
                Ok(())
            }
            Ok(Err(e)) => Err(FrontendError::Io {
                context: "front-end task".to_string(),
                reason: e.to_string(),
            }),
            Err(_) => {
                warn!(
                    "Front-end server on {} did not stop within {STOP_TIMEOUT:?}",
                    running.local_addr
                );
                Err(FrontendError::Io {
                    context: "front-end shutdown".to_string(),
                    reason: "timed out".to_string(),
                })
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|running| running.local_addr)
    }

    /// Configuration the server was built with, bound port included.
    pub fn effective_conf(&self) -> &Conf {
        &self.conf
    }

    pub fn settings(&self) -> &FrontendSettings {
        &self.settings
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Client for this server's transport, aimed at the bound address once
    /// started, otherwise at the configured one.
    pub fn session_client(&self) -> Result<Box<dyn SessionClient>, FrontendError> {
        let addr = match self.local_addr() {
            Some(addr) => addr,
            None => format!("{}:{}", self.settings.host, self.settings.port())
                .parse()
                .map_err(|e| FrontendError::configuration(format!("invalid address: {e}")))?,
        };
        let client: Box<dyn SessionClient> = match self.settings.transport {
            TransportMode::Binary => Box::new(BinarySessionClient::new(addr)),
            TransportMode::Http => Box::new(HttpSessionClient::new(addr, &self.settings.http_path)?),
        };
        Ok(client)
    }
}

#[async_trait]
impl ManagedService for FrontendServer {
    fn name(&self) -> &'static str {
        "front-end server"
    }

    fn is_running(&self) -> bool {
        FrontendServer::is_running(self)
    }

    async fn shutdown(&mut self) -> Result<(), MiniClusterError> {
        self.stop()
            .await
            .map_err(|e| MiniClusterError::from_shutdown_error(e, "front-end server"))
    }
}
