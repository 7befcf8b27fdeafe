//! Instance-scoped key/value configuration shared with every service.
//!
//! A [`Conf`] is owned by one topology and handed to each service it starts,
//! so nothing is published through process-wide state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::MiniClusterError;

/// Well-known configuration keys.
pub mod keys {
    pub const TRANSPORT_MODE: &str = "server.transport.mode";
    pub const BIND_HOST: &str = "server.bind.host";
    pub const BINARY_PORT: &str = "server.binary.port";
    pub const HTTP_PORT: &str = "server.http.port";
    pub const HTTP_PATH: &str = "server.http.path";
    pub const AUTHENTICATION: &str = "server.authentication";
    pub const KERBEROS_PRINCIPAL: &str = "server.kerberos.principal";
    pub const KERBEROS_KEYTAB: &str = "server.kerberos.keytab";
    pub const MAX_START_ATTEMPTS: &str = "server.max.start.attempts";
    pub const START_ATTEMPT_INTERVAL: &str = "server.start.attempt.interval";

    pub const METASTORE_URIS: &str = "metastore.uris";
    pub const METASTORE_CONNECT_URL: &str = "metastore.connect.url";
    pub const METASTORE_WAREHOUSE_DIR: &str = "metastore.warehouse.dir";
    pub const METASTORE_KERBEROS_PRINCIPAL: &str = "metastore.kerberos.principal";
    pub const METASTORE_KERBEROS_KEYTAB: &str = "metastore.kerberos.keytab.file";
    pub const METASTORE_SASL_ENABLED: &str = "metastore.sasl.enabled";

    pub const SCRATCH_DIR: &str = "exec.scratchdir";
    pub const LOCAL_SCRATCH_DIR: &str = "exec.local.scratchdir";

    pub const FS_DEFAULT_NAME: &str = "fs.default.name";
    pub const COMPUTE_FRAMEWORK: &str = "compute.framework.name";
    pub const COMPUTE_RESOURCE_MANAGER: &str = "compute.resourcemanager.address";
    pub const COMPUTE_NODES: &str = "compute.nodes";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conf {
    values: BTreeMap<String, String>,
}

impl Conf {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, returning the one it replaced.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Parse a value, treating an absent key as `None`.
    pub fn get_parsed<T>(&self, key: &str) -> Result<Option<T>, MiniClusterError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
                MiniClusterError::configuration(format!("invalid value '{raw}' for '{key}': {e}"))
            }),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Conf {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Conf {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut conf = Conf::new();
        conf.extend(iter);
        conf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_and_replace() {
        let mut conf = Conf::new();
        assert_eq!(conf.set(keys::HTTP_PATH, "cliservice"), None);
        assert_eq!(
            conf.set(keys::HTTP_PATH, "other"),
            Some("cliservice".to_string())
        );
        assert_eq!(conf.get(keys::HTTP_PATH), Some("other"));
        assert_eq!(conf.get_or("missing", "fallback"), "fallback");
    }

    #[test]
    fn test_typed_getters() {
        let conf: Conf = [
            (keys::BINARY_PORT, "10000"),
            (keys::HTTP_PORT, "not-a-port"),
        ]
        .into_iter()
        .collect();

        assert_eq!(conf.get_parsed::<u16>(keys::BINARY_PORT).unwrap(), Some(10000));
        assert!(matches!(
            conf.get_parsed::<u16>(keys::HTTP_PORT),
            Err(MiniClusterError::Configuration { .. })
        ));
        assert_eq!(conf.get_parsed::<u16>("absent").unwrap(), None);
    }

    #[test]
    fn test_serializes_as_flat_map() {
        let conf: Conf = [("p", "v")].into_iter().collect();
        let json = serde_json::to_string(&conf).unwrap();
        assert_eq!(json, r#"{"p":"v"}"#);
    }
}
