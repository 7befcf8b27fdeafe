//! Simulated compute and simulated authentication topologies.

use std::path::Path;

use minicluster::{Conf, keys};
use tempfile::TempDir;

use crate::test_utilities::{builder, start_cluster};

#[test_log::test(tokio::test)]
async fn test_simulated_compute_topology() {
    let temp_dir = TempDir::new().unwrap();
    let mut cluster = start_cluster(builder(&temp_dir).use_simulated_compute(true), &Conf::new()).await;

    let dfs_uri = cluster.dfs().unwrap().uri().to_string();
    assert_eq!(cluster.dfs().unwrap().num_nodes(), 4);
    assert_eq!(cluster.compute().unwrap().num_nodes(), 4);

    let conf = cluster.frontend_conf().unwrap();
    assert_eq!(conf.get(keys::FS_DEFAULT_NAME), Some(dfs_uri.as_str()));
    assert_eq!(
        conf.get(keys::METASTORE_WAREHOUSE_DIR),
        Some(format!("{dfs_uri}/base/warehouse").as_str())
    );
    assert!(conf.get(keys::COMPUTE_RESOURCE_MANAGER).is_some());

    let workspace = cluster.workspace().unwrap();
    assert_eq!(workspace.root(), Path::new("/base"));
    assert!(workspace.file_system().exists(Path::new("/base/scratch")));
    // Local scratch always stays on local disk.
    assert!(workspace.local_scratch_dir().is_dir());

    let report = cluster.stop().await;
    assert_eq!(
        report.stopped,
        vec![
            "front-end server",
            "simulated compute cluster",
            "simulated filesystem"
        ]
    );
    assert!(cluster.dfs().is_none());
    assert!(cluster.compute().is_none());
    cluster.cleanup_workspace();
}

#[test_log::test(tokio::test)]
async fn test_simulated_compute_leaves_local_base_content() {
    let temp_dir = TempDir::new().unwrap();
    let kept = temp_dir.path().join("minicluster/local_base/keep.txt");
    std::fs::create_dir_all(kept.parent().unwrap()).unwrap();
    std::fs::write(&kept, b"keep").unwrap();

    let mut cluster = start_cluster(
        builder(&temp_dir)
            .use_simulated_compute(true)
            .cleanup_workspace_on_startup(true),
        &Conf::new(),
    )
    .await;
    assert!(kept.exists());

    cluster.stop().await;
}

#[test_log::test(tokio::test)]
async fn test_simulated_auth_endpoint_carries_principal() {
    let temp_dir = TempDir::new().unwrap();
    let mut cluster = start_cluster(
        builder(&temp_dir).use_simulated_auth("hive/localhost@EXAMPLE.COM", "/tmp/hive.keytab"),
        &Conf::new(),
    )
    .await;

    let binary = cluster.ports().binary;
    assert_eq!(
        cluster.endpoint("db1", ";auth=kerberos", "").unwrap(),
        format!(
            "jdbc:minicluster://127.0.0.1:{binary}/db1;principal=hive/localhost@EXAMPLE.COM;auth=kerberos"
        )
    );
    assert_eq!(
        cluster.frontend_conf().unwrap().get(keys::AUTHENTICATION),
        Some("KERBEROS")
    );

    cluster.stop().await;
}
