//! Error types for topology orchestration.

use std::fmt;
use std::time::Duration;

/// Main error type for building, starting and using a [`crate::MiniCluster`].
#[derive(Debug, Clone, PartialEq)]
pub enum MiniClusterError {
    /// Invalid or conflicting topology options, reported by the builder.
    Configuration { reason: String },
    /// Filesystem create, permission or delete failure while provisioning.
    Provisioning { context: String, reason: String },
    /// Cleanup-on-startup refused to delete a path too close to the root.
    UnsafeWorkspacePath {
        path: String,
        depth: usize,
        min_depth: usize,
    },
    /// Another live process or instance holds the workspace lock.
    WorkspaceLocked { path: String, pid: Option<u32> },
    /// A service failed to construct or start.
    Startup { service: String, reason: String },
    /// The readiness probe gave up before the front end accepted a session.
    StartupTimeout { endpoint: String, waited: Duration },
    /// A service failed to stop; teardown reports these as warnings.
    Shutdown { service: String, reason: String },
    NotStarted,
    AlreadyStarted,
}

impl fmt::Display for MiniClusterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiniClusterError::Configuration { reason } => {
                write!(f, "Invalid topology configuration: {reason}")
            }
            MiniClusterError::Provisioning { context, reason } => {
                write!(f, "Provisioning failed in {context}: {reason}")
            }
            MiniClusterError::UnsafeWorkspacePath {
                path,
                depth,
                min_depth,
            } => {
                write!(
                    f,
                    "Refusing to clean up workspace '{path}': depth {depth} is below the minimum of {min_depth}"
                )
            }
            MiniClusterError::WorkspaceLocked { path, pid } => match pid {
                Some(pid) => write!(f, "Workspace '{path}' is locked (PID: {pid})"),
                None => write!(f, "Workspace '{path}' is locked"),
            },
            MiniClusterError::Startup { service, reason } => {
                write!(f, "Failed to start {service}: {reason}")
            }
            MiniClusterError::StartupTimeout { endpoint, waited } => {
                write!(
                    f,
                    "Couldn't access new front-end server at {endpoint} after {}ms",
                    waited.as_millis()
                )
            }
            MiniClusterError::Shutdown { service, reason } => {
                write!(f, "Failed to stop {service}: {reason}")
            }
            MiniClusterError::NotStarted => write!(f, "Topology has not been started"),
            MiniClusterError::AlreadyStarted => write!(f, "Topology is already started"),
        }
    }
}

impl std::error::Error for MiniClusterError {}

impl MiniClusterError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        MiniClusterError::Configuration {
            reason: reason.into(),
        }
    }

    pub fn from_io_error(e: std::io::Error, context: &str) -> Self {
        MiniClusterError::Provisioning {
            context: context.to_string(),
            reason: e.to_string(),
        }
    }

    pub fn from_startup_error(e: impl fmt::Display, service: &str) -> Self {
        MiniClusterError::Startup {
            service: service.to_string(),
            reason: e.to_string(),
        }
    }

    pub fn from_shutdown_error(e: impl fmt::Display, service: &str) -> Self {
        MiniClusterError::Shutdown {
            service: service.to_string(),
            reason: e.to_string(),
        }
    }
}
