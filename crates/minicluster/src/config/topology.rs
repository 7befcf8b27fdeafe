//! Topology options and the builder that validates them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::conf::{Conf, keys};
use crate::error::MiniClusterError;
use crate::readiness::ProbeSettings;

pub const DEFAULT_AUTH_TYPE: &str = "KERBEROS";

/// Environment variable rooting every workspace; falls back to the OS temp dir.
pub const TEST_TMP_DIR_ENV: &str = "MINICLUSTER_TEST_TMP_DIR";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    #[default]
    Binary,
    Http,
}

impl TransportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Binary => "binary",
            TransportMode::Http => "http",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportMode {
    type Err = MiniClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binary" => Ok(TransportMode::Binary),
            "http" => Ok(TransportMode::Http),
            other => Err(MiniClusterError::configuration(format!(
                "unknown transport mode '{other}'"
            ))),
        }
    }
}

/// Principal and keytab pair identifying a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub principal: String,
    pub keytab: String,
}

impl Credentials {
    pub fn new(principal: impl Into<String>, keytab: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            keytab: keytab.into(),
        }
    }
}

/// Which simulated infrastructure the topology runs on.
///
/// Simulated compute and simulated authentication are separate variants, so a
/// built topology can never ask for both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterMode {
    Local,
    SimulatedCompute,
    SimulatedAuth(Credentials),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetastoreMode {
    Embedded,
    Remote,
    SecureRemote(Credentials),
}

/// Immutable, validated description of a topology.
#[derive(Debug, Clone)]
pub struct TopologyConfig {
    cluster_mode: ClusterMode,
    metastore_mode: MetastoreMode,
    transport: TransportMode,
    auth_type: String,
    cleanup_workspace_on_startup: bool,
    base_conf: Conf,
    temp_root: PathBuf,
    probe: ProbeSettings,
}

impl TopologyConfig {
    pub fn builder() -> TopologyBuilder {
        TopologyBuilder::new()
    }

    pub fn cluster_mode(&self) -> &ClusterMode {
        &self.cluster_mode
    }

    pub fn metastore_mode(&self) -> &MetastoreMode {
        &self.metastore_mode
    }

    pub fn transport(&self) -> TransportMode {
        self.transport
    }

    pub fn auth_type(&self) -> &str {
        &self.auth_type
    }

    pub fn cleanup_workspace_on_startup(&self) -> bool {
        self.cleanup_workspace_on_startup
    }

    /// Configuration every service starts from, transport mode included.
    pub fn base_conf(&self) -> &Conf {
        &self.base_conf
    }

    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    pub fn probe(&self) -> ProbeSettings {
        self.probe
    }

    pub fn use_simulated_compute(&self) -> bool {
        matches!(self.cluster_mode, ClusterMode::SimulatedCompute)
    }

    pub fn use_simulated_auth(&self) -> bool {
        matches!(self.cluster_mode, ClusterMode::SimulatedAuth(_))
    }

    /// Server identity when simulated authentication is active.
    pub fn server_credentials(&self) -> Option<&Credentials> {
        match &self.cluster_mode {
            ClusterMode::SimulatedAuth(credentials) => Some(credentials),
            _ => None,
        }
    }

    pub fn is_metastore_remote(&self) -> bool {
        !matches!(self.metastore_mode, MetastoreMode::Embedded)
    }

    pub fn is_metastore_secure(&self) -> bool {
        matches!(self.metastore_mode, MetastoreMode::SecureRemote(_))
    }

    pub fn is_http_transport(&self) -> bool {
        self.transport == TransportMode::Http
    }
}

/// Incremental builder for [`TopologyConfig`].
///
/// Options are recorded as requested; [`TopologyBuilder::build`] rejects
/// illegal combinations before anything is started.
#[derive(Debug, Clone)]
pub struct TopologyBuilder {
    conf: Conf,
    use_simulated_compute: bool,
    simulated_auth: Option<Credentials>,
    auth_type: String,
    remote_metastore: bool,
    secure_metastore: Option<Credentials>,
    http_transport: bool,
    cleanup_workspace_on_startup: bool,
    temp_root: Option<PathBuf>,
    probe: ProbeSettings,
}

impl Default for TopologyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TopologyBuilder {
    pub fn new() -> Self {
        Self {
            conf: Conf::new(),
            use_simulated_compute: false,
            simulated_auth: None,
            auth_type: DEFAULT_AUTH_TYPE.to_string(),
            remote_metastore: false,
            secure_metastore: None,
            http_transport: false,
            cleanup_workspace_on_startup: true,
            temp_root: None,
            probe: ProbeSettings::default(),
        }
    }

    pub fn use_simulated_compute(mut self, enabled: bool) -> Self {
        self.use_simulated_compute = enabled;
        self
    }

    pub fn use_simulated_auth(
        mut self,
        principal: impl Into<String>,
        keytab: impl Into<String>,
    ) -> Self {
        self.simulated_auth = Some(Credentials::new(principal, keytab));
        self
    }

    pub fn authentication_type(mut self, auth_type: impl Into<String>) -> Self {
        self.auth_type = auth_type.into();
        self
    }

    pub fn use_remote_metadata_service(mut self) -> Self {
        self.remote_metastore = true;
        self
    }

    pub fn use_secure_remote_metadata_service(
        mut self,
        principal: impl Into<String>,
        keytab: impl Into<String>,
    ) -> Self {
        self.remote_metastore = true;
        self.secure_metastore = Some(Credentials::new(principal, keytab));
        self
    }

    /// Serve sessions over HTTP instead of the default binary transport.
    pub fn with_http_transport(mut self) -> Self {
        self.http_transport = true;
        self
    }

    pub fn cleanup_workspace_on_startup(mut self, enabled: bool) -> Self {
        self.cleanup_workspace_on_startup = enabled;
        self
    }

    /// Base configuration to extend; replaces anything set so far.
    pub fn with_configuration(mut self, conf: Conf) -> Self {
        self.conf = conf;
        self
    }

    /// Root the workspace here instead of the test temp directory.
    pub fn with_temp_root(mut self, temp_root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(temp_root.into());
        self
    }

    pub fn with_probe_settings(mut self, probe: ProbeSettings) -> Self {
        self.probe = probe;
        self
    }

    pub fn build(self) -> Result<TopologyConfig, MiniClusterError> {
        let cluster_mode = match (self.use_simulated_compute, self.simulated_auth) {
            (true, Some(_)) => {
                return Err(MiniClusterError::configuration(
                    "simulated authentication is not supported together with the simulated compute cluster",
                ));
            }
            (true, None) => ClusterMode::SimulatedCompute,
            (false, Some(credentials)) => {
                if credentials.principal.trim().is_empty() {
                    return Err(MiniClusterError::configuration(
                        "simulated authentication requires a server principal",
                    ));
                }
                ClusterMode::SimulatedAuth(credentials)
            }
            (false, None) => ClusterMode::Local,
        };

        let metastore_mode = match (self.remote_metastore, self.secure_metastore) {
            (_, Some(credentials)) => MetastoreMode::SecureRemote(credentials),
            (true, None) => MetastoreMode::Remote,
            (false, None) => MetastoreMode::Embedded,
        };

        self.probe.validate()?;

        let transport = if self.http_transport {
            TransportMode::Http
        } else {
            TransportMode::Binary
        };

        let mut base_conf = self.conf;
        base_conf.set(keys::TRANSPORT_MODE, transport.as_str());

        let temp_root = self.temp_root.unwrap_or_else(default_temp_root);

        Ok(TopologyConfig {
            cluster_mode,
            metastore_mode,
            transport,
            auth_type: self.auth_type,
            cleanup_workspace_on_startup: self.cleanup_workspace_on_startup,
            base_conf,
            temp_root,
            probe: self.probe,
        })
    }
}

fn default_temp_root() -> PathBuf {
    std::env::var_os(TEST_TMP_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let topology = TopologyBuilder::new().build().unwrap();
        assert_eq!(topology.cluster_mode(), &ClusterMode::Local);
        assert_eq!(topology.metastore_mode(), &MetastoreMode::Embedded);
        assert_eq!(topology.transport(), TransportMode::Binary);
        assert_eq!(topology.auth_type(), "KERBEROS");
        assert!(topology.cleanup_workspace_on_startup());
        assert_eq!(topology.base_conf().get(keys::TRANSPORT_MODE), Some("binary"));
    }

    #[test]
    fn test_simulated_compute_and_auth_rejected_at_build() {
        let result = TopologyBuilder::new()
            .use_simulated_compute(true)
            .use_simulated_auth("hive/localhost@EXAMPLE.COM", "/tmp/hive.keytab")
            .build();
        assert!(matches!(result, Err(MiniClusterError::Configuration { .. })));
    }

    #[test]
    fn test_http_transport_sets_conf_key() {
        let topology = TopologyBuilder::new()
            .with_configuration([("p", "base")].into_iter().collect())
            .with_http_transport()
            .build()
            .unwrap();
        assert!(topology.is_http_transport());
        assert_eq!(topology.base_conf().get(keys::TRANSPORT_MODE), Some("http"));
        assert_eq!(topology.base_conf().get("p"), Some("base"));
    }

    #[test]
    fn test_transport_key_overrides_base_configuration() {
        let topology = TopologyBuilder::new()
            .with_configuration([(keys::TRANSPORT_MODE, "http")].into_iter().collect())
            .build()
            .unwrap();
        assert_eq!(topology.base_conf().get(keys::TRANSPORT_MODE), Some("binary"));
    }

    #[test]
    fn test_metastore_modes() {
        let remote = TopologyBuilder::new()
            .use_remote_metadata_service()
            .build()
            .unwrap();
        assert!(remote.is_metastore_remote());
        assert!(!remote.is_metastore_secure());

        let secure = TopologyBuilder::new()
            .use_secure_remote_metadata_service("metastore/host@REALM", "/k")
            .build()
            .unwrap();
        assert!(secure.is_metastore_remote());
        assert!(secure.is_metastore_secure());
    }

    #[test]
    fn test_simulated_auth_carries_credentials() {
        let topology = TopologyBuilder::new()
            .use_simulated_auth("hive/localhost@EXAMPLE.COM", "/tmp/hive.keytab")
            .authentication_type("NOSASL")
            .build()
            .unwrap();
        assert!(topology.use_simulated_auth());
        assert!(!topology.use_simulated_compute());
        assert_eq!(
            topology.server_credentials().map(|c| c.principal.as_str()),
            Some("hive/localhost@EXAMPLE.COM")
        );
        assert_eq!(topology.auth_type(), "NOSASL");
    }

    #[test]
    fn test_invalid_probe_settings_rejected() {
        let result = TopologyBuilder::new()
            .with_probe_settings(ProbeSettings::new(Duration::ZERO, Duration::from_secs(1)))
            .build();
        assert!(matches!(result, Err(MiniClusterError::Configuration { .. })));
    }

    #[test]
    fn test_transport_mode_parsing() {
        assert_eq!("HTTP".parse::<TransportMode>().unwrap(), TransportMode::Http);
        assert_eq!(" binary ".parse::<TransportMode>().unwrap(), TransportMode::Binary);
        assert!("grpc".parse::<TransportMode>().is_err());
    }
}
