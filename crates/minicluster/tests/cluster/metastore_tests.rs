//! Topologies with a remote metadata service.

use std::time::Duration;

use minicluster::{Conf, keys};
use minicluster_metastore::{DEFAULT_DATABASE, MetastoreClient};
use tempfile::TempDir;

use crate::test_utilities::{builder, start_cluster};

#[test_log::test(tokio::test)]
async fn test_remote_metastore_started_before_frontend() {
    let temp_dir = TempDir::new().unwrap();
    let mut cluster = start_cluster(
        builder(&temp_dir).use_remote_metadata_service(),
        &Conf::new(),
    )
    .await;

    let metastore = cluster.metastore().unwrap();
    let uri = metastore.uri();
    assert_eq!(cluster.ports().metastore, Some(metastore.port()));
    assert_eq!(
        cluster.frontend_conf().unwrap().get(keys::METASTORE_URIS),
        Some(uri.as_str())
    );

    let mut client = MetastoreClient::connect_with_timeout(uri.clone(), Duration::from_secs(5))
        .await
        .unwrap();
    let database = client.get_database(DEFAULT_DATABASE).await.unwrap();
    assert_eq!(
        Some(database.location_uri.as_str()),
        cluster.conf().get(keys::METASTORE_WAREHOUSE_DIR)
    );

    // No stop primitive: the metadata service outlives the topology.
    cluster.stop().await;
    assert!(cluster.metastore().is_some_and(|m| m.is_running()));
    assert!(client.ping().await.is_ok());
}

#[test_log::test(tokio::test)]
async fn test_secure_remote_metastore_reports_principal() {
    let temp_dir = TempDir::new().unwrap();
    let mut cluster = start_cluster(
        builder(&temp_dir)
            .use_secure_remote_metadata_service("metastore/localhost@EXAMPLE.COM", "/tmp/ms.keytab"),
        &Conf::new(),
    )
    .await;

    let conf = cluster.frontend_conf().unwrap();
    assert_eq!(conf.get(keys::METASTORE_SASL_ENABLED), Some("true"));

    let uri = cluster.metastore().unwrap().uri();
    let mut client = MetastoreClient::connect(uri).await.unwrap();
    let ping = client.ping().await.unwrap();
    assert!(ping.sasl_enabled);
    assert_eq!(ping.server_principal, "metastore/localhost@EXAMPLE.COM");

    cluster.stop().await;
}
