//! Start, probe, use and stop a local topology on both transports.

use minicluster::{Conf, MiniCluster, MiniClusterError, TransportMode, keys};
use tempfile::TempDir;

use crate::test_utilities::{builder, overrides, start_cluster};

#[test_log::test(tokio::test)]
async fn test_binary_topology_lifecycle() {
    let temp_dir = TempDir::new().unwrap();
    let mut cluster = start_cluster(builder(&temp_dir), &Conf::new()).await;

    assert!(cluster.is_started());
    cluster.verify_started().unwrap();

    let binary = cluster.ports().binary;
    assert_eq!(
        cluster.endpoint_for("db1").unwrap(),
        format!("jdbc:minicluster://127.0.0.1:{binary}/db1")
    );
    assert_eq!(
        cluster.default_endpoint().unwrap(),
        format!("jdbc:minicluster://127.0.0.1:{binary}/default")
    );
    assert_eq!(
        cluster.base_endpoint().unwrap(),
        format!("jdbc:minicluster://127.0.0.1:{binary}")
    );
    assert_eq!(
        cluster.frontend_conf().unwrap().get(keys::TRANSPORT_MODE),
        Some("binary")
    );

    // The probe session is closed again once readiness is reached.
    let client = cluster.session_client().unwrap();
    let session = client.open_session("foo", "bar").await.unwrap();
    client.close_session(session).await.unwrap();

    let report = cluster.stop().await;
    assert!(report.is_clean());
    assert_eq!(report.stopped, vec!["front-end server"]);
    assert!(!cluster.is_started());
    assert_eq!(
        cluster.endpoint_for("db1"),
        Err(MiniClusterError::NotStarted)
    );

    let second = cluster.stop().await;
    assert!(second.is_empty());

    assert!(cluster.cleanup_workspace());
    assert!(!cluster.base_dir().exists());
    assert!(!cluster.cleanup_workspace());
}

#[test_log::test(tokio::test)]
async fn test_http_topology_with_override() {
    let temp_dir = TempDir::new().unwrap();
    let mut cluster = start_cluster(
        builder(&temp_dir).with_http_transport(),
        &overrides(&[("p", "v")]),
    )
    .await;

    let frontend_conf = cluster.frontend_conf().unwrap();
    assert_eq!(frontend_conf.get("p"), Some("v"));
    assert_eq!(frontend_conf.get(keys::TRANSPORT_MODE), Some("http"));

    let http = cluster.ports().http;
    assert_eq!(
        cluster.endpoint("db1", "", "p=v").unwrap(),
        format!(
            "jdbc:minicluster://127.0.0.1:{http}/db1?server.transport.mode=http;server.http.path=cliservice;p=v"
        )
    );

    let client = cluster.session_client().unwrap();
    let session = client.open_session("foo", "bar").await.unwrap();
    client.close_session(session).await.unwrap();

    assert!(cluster.stop().await.is_clean());
    cluster.cleanup_workspace();
}

#[test_log::test(tokio::test)]
async fn test_overrides_win_over_derived_configuration() {
    let temp_dir = TempDir::new().unwrap();
    let mut cluster = start_cluster(
        builder(&temp_dir),
        &overrides(&[(keys::METASTORE_WAREHOUSE_DIR, "/elsewhere/warehouse")]),
    )
    .await;

    assert_eq!(
        cluster
            .frontend_conf()
            .unwrap()
            .get(keys::METASTORE_WAREHOUSE_DIR),
        Some("/elsewhere/warehouse")
    );
    cluster.stop().await;
}

#[test_log::test(tokio::test)]
async fn test_transport_override_drives_ports_and_endpoint() {
    let temp_dir = TempDir::new().unwrap();
    let mut cluster = start_cluster(
        builder(&temp_dir),
        &overrides(&[(keys::TRANSPORT_MODE, "http")]),
    )
    .await;

    assert_eq!(cluster.transport(), TransportMode::Http);
    let ports = cluster.ports();
    assert_ne!(ports.binary, ports.http);
    assert_eq!(
        cluster.endpoint_for("db1").unwrap(),
        format!(
            "jdbc:minicluster://127.0.0.1:{}/db1?server.transport.mode=http;server.http.path=cliservice;",
            ports.http
        )
    );
    assert_eq!(
        cluster.base_endpoint().unwrap(),
        format!("jdbc:minicluster://127.0.0.1:{}", ports.http)
    );

    cluster.stop().await;
    cluster.cleanup_workspace();
}

#[test_log::test(tokio::test)]
async fn test_start_twice_rejected_and_restart_after_stop() {
    let temp_dir = TempDir::new().unwrap();
    let topology = builder(&temp_dir).build().unwrap();
    let mut cluster = MiniCluster::new(topology).unwrap();

    cluster.start(&Conf::new()).await.unwrap();
    assert_eq!(
        cluster.start(&Conf::new()).await,
        Err(MiniClusterError::AlreadyStarted)
    );
    cluster.stop().await;

    cluster.start(&Conf::new()).await.unwrap();
    assert!(cluster.is_started());
    assert!(cluster.stop().await.is_clean());
}
