//! Workspace guard, lock and permission behaviour seen through the cluster.

use minicluster::{Conf, MiniCluster, MiniClusterError};
use tempfile::TempDir;

use crate::test_utilities::{builder, start_cluster};

#[test_log::test(tokio::test)]
async fn test_shallow_temp_root_refused() {
    let topology = minicluster::TopologyConfig::builder()
        .with_temp_root("/")
        .build()
        .unwrap();
    let mut cluster = MiniCluster::new(topology).unwrap();

    match cluster.start(&Conf::new()).await {
        Err(MiniClusterError::UnsafeWorkspacePath { depth, .. }) => assert_eq!(depth, 2),
        other => panic!("Expected UnsafeWorkspacePath, got {other:?}"),
    }
    assert!(!cluster.is_started());
    assert!(cluster.stop().await.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_second_cluster_on_same_workspace_is_locked_out() {
    let temp_dir = TempDir::new().unwrap();
    let mut first = start_cluster(builder(&temp_dir), &Conf::new()).await;

    let mut second = MiniCluster::new(builder(&temp_dir).build().unwrap()).unwrap();
    assert!(matches!(
        second.start(&Conf::new()).await,
        Err(MiniClusterError::WorkspaceLocked { .. })
    ));
    assert!(first.is_started());

    first.stop().await;
    second.start(&Conf::new()).await.unwrap();
    second.stop().await;
}

#[cfg(unix)]
#[test_log::test(tokio::test)]
async fn test_workspace_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let mut cluster = start_cluster(builder(&temp_dir), &Conf::new()).await;
    let workspace = cluster.workspace().unwrap();

    let mode = |path: &std::path::Path| std::fs::metadata(path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode(workspace.warehouse_dir()), 0o777);
    assert_eq!(mode(workspace.scratch_dir()), 0o733);
    assert_eq!(mode(workspace.local_scratch_dir()), 0o733);

    cluster.stop().await;
}
