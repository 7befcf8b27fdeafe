//! Client/server round trips against a metadata service bound to port 0.

use std::time::Duration;

use minicluster_metastore::{
    DEFAULT_DATABASE, MetastoreClient, MetastoreError, MetastoreSettings, spawn_metastore,
};
use tokio::net::TcpListener;

async fn start_metastore(settings: MetastoreSettings) -> minicluster_metastore::MetastoreHandle {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    spawn_metastore(listener, settings).expect("Failed to spawn metastore")
}

#[test_log::test(tokio::test)]
async fn test_ping_and_default_database() {
    let handle = start_metastore(MetastoreSettings::new("file:///tmp/base/warehouse")).await;
    assert!(handle.is_running());
    assert_eq!(handle.uri(), format!("http://127.0.0.1:{}", handle.port()));

    let mut client = MetastoreClient::connect_with_timeout(handle.uri(), Duration::from_secs(5))
        .await
        .unwrap();

    let ping = client.ping().await.unwrap();
    assert!(!ping.sasl_enabled);
    assert!(!ping.version.is_empty());

    let database = client.get_database(DEFAULT_DATABASE).await.unwrap();
    assert_eq!(database.location_uri, "file:///tmp/base/warehouse");
}

#[test_log::test(tokio::test)]
async fn test_create_and_list_databases() {
    let handle = start_metastore(MetastoreSettings::new("/warehouse")).await;
    let mut client = MetastoreClient::connect(handle.uri()).await.unwrap();

    let created = client.create_database("db1", "scratch db").await.unwrap();
    assert_eq!(created.location_uri, "/warehouse/db1.db");

    let names: Vec<String> = client
        .list_databases()
        .await
        .unwrap()
        .into_iter()
        .map(|db| db.name)
        .collect();
    assert_eq!(names, vec!["db1".to_string(), "default".to_string()]);

    let duplicate = client.create_database("db1", "").await.unwrap_err();
    assert!(matches!(duplicate, MetastoreError::DatabaseAlreadyExists { .. }));

    let missing = client.get_database("db2").await.unwrap_err();
    assert!(missing.is_not_found());
}

#[test_log::test(tokio::test)]
async fn test_secure_metastore_reports_principal() {
    let settings = MetastoreSettings::new("/warehouse")
        .with_sasl("metastore/localhost@EXAMPLE.COM", "/etc/metastore.keytab");
    let handle = start_metastore(settings).await;
    let mut client = MetastoreClient::connect(handle.uri()).await.unwrap();

    let ping = client.ping().await.unwrap();
    assert!(ping.sasl_enabled);
    assert_eq!(ping.server_principal, "metastore/localhost@EXAMPLE.COM");
}

#[tokio::test]
async fn test_connect_to_closed_port_fails() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let result =
        MetastoreClient::connect_with_timeout(format!("http://127.0.0.1:{port}"), Duration::from_millis(500))
            .await;
    assert!(matches!(result, Err(MetastoreError::Transport { .. })));
}
