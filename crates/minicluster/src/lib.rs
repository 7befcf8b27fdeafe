pub mod cluster;
pub mod conf;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod frontend;
pub mod fs;
pub mod ports;
pub mod readiness;
pub mod service;
pub mod simulated;
pub mod supervisor;
pub mod teardown;
pub mod telemetry;
pub mod workspace;

pub use cluster::MiniCluster;
pub use conf::{Conf, keys};
pub use config::{
    ClusterMode, Credentials, MetastoreMode, TopologyBuilder, TopologyConfig, TopologyLoader,
    TransportMode,
};
pub use endpoint::{EndpointSpec, build_endpoint};
pub use error::MiniClusterError;
pub use ports::PortAssignment;
pub use readiness::{ProbeSettings, ReadinessProbe};
pub use service::ManagedService;
pub use teardown::{TeardownReport, TeardownWarning};
pub use workspace::Workspace;

// Re-export logging macros for consistent usage across the crate
pub use log::{debug, error, info, trace, warn};
