use std::time::Duration;

use minicluster::{Conf, MiniCluster, ProbeSettings, TopologyBuilder, TopologyConfig};
use tempfile::TempDir;

/// Probe quickly so tests don't sit through the default interval.
pub fn fast_probe() -> ProbeSettings {
    ProbeSettings::new(Duration::from_millis(20), Duration::from_secs(30))
}

/// Builder rooted in `temp_dir` with fast readiness probing.
pub fn builder(temp_dir: &TempDir) -> TopologyBuilder {
    TopologyConfig::builder()
        .with_temp_root(temp_dir.path())
        .with_probe_settings(fast_probe())
}

pub fn overrides(pairs: &[(&str, &str)]) -> Conf {
    pairs.iter().copied().collect()
}

pub async fn start_cluster(builder: TopologyBuilder, overrides: &Conf) -> MiniCluster {
    let topology = builder.build().expect("Failed to build topology");
    let mut cluster = MiniCluster::new(topology).expect("Failed to create cluster");
    cluster
        .start(overrides)
        .await
        .expect("Failed to start cluster");
    cluster
}
