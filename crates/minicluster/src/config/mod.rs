//! Topology configuration: builder, validated config and file loading.

pub mod loader;
pub mod topology;

// Re-exports for ergonomics
pub use loader::{MetastoreSpec, TopologyFile, TopologyLoader};
pub use topology::{
    ClusterMode, Credentials, DEFAULT_AUTH_TYPE, MetastoreMode, TEST_TMP_DIR_ENV, TopologyBuilder,
    TopologyConfig, TransportMode,
};
