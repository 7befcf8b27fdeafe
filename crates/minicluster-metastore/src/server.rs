use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

use crate::catalog::Catalog;
use crate::error::MetastoreError;
use crate::proto::{
    CreateDatabaseRequest, Database, GetDatabaseRequest, ListDatabasesRequest,
    ListDatabasesResponse, PingRequest, PingResponse,
    metastore_server::{Metastore, MetastoreServer},
};

/// Kerberos-style identity of a secured metadata service.
#[derive(Debug, Clone, PartialEq)]
pub struct SaslSettings {
    pub principal: String,
    pub keytab: String,
}

/// Settings a metadata service instance is started with.
#[derive(Debug, Clone, PartialEq)]
pub struct MetastoreSettings {
    pub warehouse_dir: String,
    pub sasl: Option<SaslSettings>,
}

impl MetastoreSettings {
    pub fn new(warehouse_dir: impl Into<String>) -> Self {
        Self {
            warehouse_dir: warehouse_dir.into(),
            sasl: None,
        }
    }

    pub fn with_sasl(mut self, principal: impl Into<String>, keytab: impl Into<String>) -> Self {
        self.sasl = Some(SaslSettings {
            principal: principal.into(),
            keytab: keytab.into(),
        });
        self
    }
}

/// gRPC adapter exposing a [`Catalog`] as the `Metastore` service.
#[derive(Debug)]
pub struct CatalogService {
    catalog: Arc<Catalog>,
    settings: MetastoreSettings,
}

impl CatalogService {
    pub fn new(settings: MetastoreSettings) -> Self {
        Self {
            catalog: Arc::new(Catalog::new(settings.warehouse_dir.clone())),
            settings,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

#[tonic::async_trait]
impl Metastore for CatalogService {
    async fn ping(&self, _request: Request<PingRequest>) -> Result<Response<PingResponse>, Status> {
        let sasl = self.settings.sasl.as_ref();
        Ok(Response::new(PingResponse {
            version: env!("CARGO_PKG_VERSION").to_string(),
            sasl_enabled: sasl.is_some(),
            server_principal: sasl.map(|s| s.principal.clone()).unwrap_or_default(),
        }))
    }

    async fn get_database(
        &self,
        request: Request<GetDatabaseRequest>,
    ) -> Result<Response<Database>, Status> {
        let database = self
            .catalog
            .get_database(&request.into_inner().name)
            .map_err(metastore_error_to_status)?;
        Ok(Response::new(database))
    }

    async fn create_database(
        &self,
        request: Request<CreateDatabaseRequest>,
    ) -> Result<Response<Database>, Status> {
        let request = request.into_inner();
        let database = self
            .catalog
            .create_database(&request.name, &request.description)
            .map_err(metastore_error_to_status)?;
        tracing::debug!(database = %database.name, location = %database.location_uri, "Created database");
        Ok(Response::new(database))
    }

    async fn list_databases(
        &self,
        _request: Request<ListDatabasesRequest>,
    ) -> Result<Response<ListDatabasesResponse>, Status> {
        Ok(Response::new(ListDatabasesResponse {
            databases: self.catalog.list_databases(),
        }))
    }
}

/// Handle to a running metadata service.
///
/// There is intentionally no stop method: the service keeps serving until the
/// owning runtime shuts down.
#[derive(Debug)]
pub struct MetastoreHandle {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl MetastoreHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// URI clients pass to [`crate::MetastoreClient::connect`].
    pub fn uri(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

/// Serve the metadata service on an already-bound listener.
///
/// Taking the listener instead of a port means callers can bind port 0 and
/// read the assigned port back, so nothing can grab the port between
/// allocation and bind.
pub fn spawn_metastore(
    listener: TcpListener,
    settings: MetastoreSettings,
) -> Result<MetastoreHandle, MetastoreError> {
    let addr = listener
        .local_addr()
        .map_err(|e| MetastoreError::from_transport_error(e, "metastore listener address"))?;
    let secure = settings.sasl.is_some();
    let service = CatalogService::new(settings);

    let task = tokio::spawn(async move {
        if let Err(e) = Server::builder()
            .add_service(MetastoreServer::new(service))
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
        {
            tracing::error!(%addr, error = %e, "Metastore server terminated");
        }
    });

    tracing::info!(%addr, secure, "Metastore serving");
    Ok(MetastoreHandle { addr, task })
}

/// Convert a MetastoreError to a tonic Status for gRPC responses.
fn metastore_error_to_status(error: MetastoreError) -> Status {
    match error {
        MetastoreError::DatabaseNotFound { .. } => Status::not_found(error.to_string()),
        MetastoreError::DatabaseAlreadyExists { .. } => Status::already_exists(error.to_string()),
        MetastoreError::InvalidRequest { .. } => Status::invalid_argument(error.to_string()),
        MetastoreError::Transport { .. } => Status::internal(error.to_string()),
    }
}
