use std::time::Duration;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Status};

use crate::error::MetastoreError;
use crate::proto::{
    CreateDatabaseRequest, Database, GetDatabaseRequest, ListDatabasesRequest, PingRequest,
    PingResponse, metastore_client::MetastoreClient as TonicMetastoreClient,
};

/// Client for a running metadata service.
///
/// Wraps the generated tonic client, converting transport and status errors
/// into [`MetastoreError`].
#[derive(Debug, Clone)]
pub struct MetastoreClient {
    client: TonicMetastoreClient<Channel>,
}

impl MetastoreClient {
    /// Connect to a metadata service at the given endpoint.
    pub async fn connect<D>(dst: D) -> Result<Self, MetastoreError>
    where
        D: TryInto<Endpoint>,
        D::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::connect_with_endpoint_config(dst, |endpoint| endpoint).await
    }

    /// Connect with both a connect timeout and a per-request timeout.
    pub async fn connect_with_timeout<D>(dst: D, timeout: Duration) -> Result<Self, MetastoreError>
    where
        D: TryInto<Endpoint>,
        D::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::connect_with_endpoint_config(dst, |endpoint| {
            endpoint.connect_timeout(timeout).timeout(timeout)
        })
        .await
    }

    async fn connect_with_endpoint_config<D, F>(dst: D, config_fn: F) -> Result<Self, MetastoreError>
    where
        D: TryInto<Endpoint>,
        D::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
        F: FnOnce(Endpoint) -> Endpoint,
    {
        let endpoint = dst
            .try_into()
            .map_err(|e| MetastoreError::from_transport_error(e.into(), "Invalid endpoint"))?;

        let client = TonicMetastoreClient::connect(config_fn(endpoint))
            .await
            .map_err(|e| MetastoreError::from_transport_error(e, "Failed to connect"))?;

        Ok(Self { client })
    }

    pub async fn ping(&mut self) -> Result<PingResponse, MetastoreError> {
        let response = self
            .client
            .ping(Request::new(PingRequest {}))
            .await
            .map_err(status_to_metastore_error)?;
        Ok(response.into_inner())
    }

    pub async fn get_database(&mut self, name: &str) -> Result<Database, MetastoreError> {
        let response = self
            .client
            .get_database(Request::new(GetDatabaseRequest {
                name: name.to_string(),
            }))
            .await
            .map_err(status_to_metastore_error)?;
        Ok(response.into_inner())
    }

    pub async fn create_database(
        &mut self,
        name: &str,
        description: &str,
    ) -> Result<Database, MetastoreError> {
        let response = self
            .client
            .create_database(Request::new(CreateDatabaseRequest {
                name: name.to_string(),
                description: description.to_string(),
            }))
            .await
            .map_err(status_to_metastore_error)?;
        Ok(response.into_inner())
    }

    pub async fn list_databases(&mut self) -> Result<Vec<Database>, MetastoreError> {
        let response = self
            .client
            .list_databases(Request::new(ListDatabasesRequest {}))
            .await
            .map_err(status_to_metastore_error)?;
        Ok(response.into_inner().databases)
    }
}

/// Convert a tonic Status to a MetastoreError.
fn status_to_metastore_error(status: Status) -> MetastoreError {
    match status.code() {
        tonic::Code::NotFound => MetastoreError::DatabaseNotFound {
            name: extract_identifier_from_message(status.message()),
        },
        tonic::Code::AlreadyExists => MetastoreError::DatabaseAlreadyExists {
            name: extract_identifier_from_message(status.message()),
        },
        tonic::Code::InvalidArgument => MetastoreError::InvalidRequest {
            field: "request".to_string(),
            reason: status.message().to_string(),
        },
        tonic::Code::Unavailable => {
            MetastoreError::from_transport_error(status.message(), "Service unavailable")
        }
        tonic::Code::DeadlineExceeded => {
            MetastoreError::from_transport_error(status.message(), "Request timeout")
        }
        _ => MetastoreError::from_transport_error(status.message(), "RPC error"),
    }
}

/// Extract a quoted identifier from an error message (best effort).
fn extract_identifier_from_message(message: &str) -> String {
    if let Some(start) = message.find('\'') {
        if let Some(end) = message[start + 1..].find('\'') {
            return message[start + 1..start + 1 + end].to_string();
        }
    }
    message.to_string()
}
