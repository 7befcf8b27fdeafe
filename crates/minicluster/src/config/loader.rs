//! Topology file loading.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::topology::{Credentials, TopologyBuilder, TransportMode};
use crate::error::MiniClusterError;
use crate::readiness::ProbeSettings;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MetastoreSpec {
    #[default]
    Embedded,
    Remote,
    SecureRemote {
        principal: String,
        keytab: String,
    },
}

/// On-disk description of a topology.
///
/// Every field is optional; omitted fields keep the builder defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TopologyFile {
    pub simulated_compute: bool,
    pub simulated_auth: Option<Credentials>,
    pub authentication_type: Option<String>,
    pub metastore: MetastoreSpec,
    pub transport: TransportMode,
    pub cleanup_workspace_on_startup: Option<bool>,
    pub temp_root: Option<PathBuf>,
    pub probe_interval_ms: Option<u64>,
    pub startup_timeout_secs: Option<u64>,
    pub conf: BTreeMap<String, String>,
}

impl TopologyFile {
    /// Convert into a builder; validation happens in `build()` as usual.
    pub fn into_builder(self) -> TopologyBuilder {
        let mut builder = TopologyBuilder::new()
            .with_configuration(self.conf.into_iter().collect())
            .use_simulated_compute(self.simulated_compute);

        if let Some(credentials) = self.simulated_auth {
            builder = builder.use_simulated_auth(credentials.principal, credentials.keytab);
        }
        if let Some(auth_type) = self.authentication_type {
            builder = builder.authentication_type(auth_type);
        }
        builder = match self.metastore {
            MetastoreSpec::Embedded => builder,
            MetastoreSpec::Remote => builder.use_remote_metadata_service(),
            MetastoreSpec::SecureRemote { principal, keytab } => {
                builder.use_secure_remote_metadata_service(principal, keytab)
            }
        };
        if self.transport == TransportMode::Http {
            builder = builder.with_http_transport();
        }
        if let Some(cleanup) = self.cleanup_workspace_on_startup {
            builder = builder.cleanup_workspace_on_startup(cleanup);
        }
        if let Some(temp_root) = self.temp_root {
            builder = builder.with_temp_root(temp_root);
        }

        let defaults = ProbeSettings::default();
        let probe = ProbeSettings::new(
            self.probe_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.interval),
            self.startup_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        );
        builder.with_probe_settings(probe)
    }
}

/// Topology loader with file I/O operations.
pub struct TopologyLoader;

impl TopologyLoader {
    /// Load a topology file from a path.
    /// Supports both JSON (.json) and YAML (.yaml/.yml) formats based on file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<TopologyFile, MiniClusterError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            MiniClusterError::configuration(format!(
                "failed to read topology file {}: {e}",
                path.display()
            ))
        })?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        match extension.to_lowercase().as_str() {
            "json" => serde_json::from_str(&content).map_err(|e| parse_error(e, "JSON")),
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| parse_error(e, "YAML")),
            _ => serde_json::from_str(&content)
                .or_else(|_| serde_yaml::from_str(&content))
                .map_err(|e| parse_error(e, "topology (tried both JSON and YAML)")),
        }
    }
}

fn parse_error(e: impl std::fmt::Display, format: &str) -> MiniClusterError {
    MiniClusterError::configuration(format!("invalid {format} topology file: {e}"))
}
