//! In-memory database catalog.

use parking_lot::RwLock;
use std::collections::BTreeMap;

use crate::error::MetastoreError;
use crate::proto::Database;

/// Name of the database every catalog starts with.
pub const DEFAULT_DATABASE: &str = "default";

/// Catalog of databases rooted at a warehouse location.
///
/// Database locations are derived from the warehouse directory the catalog
/// was created with: `default` lives at the warehouse root, every other
/// database under `<warehouse>/<name>.db`.
#[derive(Debug)]
pub struct Catalog {
    warehouse_dir: String,
    databases: RwLock<BTreeMap<String, Database>>,
}

impl Catalog {
    pub fn new(warehouse_dir: impl Into<String>) -> Self {
        let warehouse_dir = warehouse_dir.into();
        let mut databases = BTreeMap::new();
        databases.insert(
            DEFAULT_DATABASE.to_string(),
            Database {
                name: DEFAULT_DATABASE.to_string(),
                location_uri: warehouse_dir.clone(),
                description: "Default database".to_string(),
            },
        );
        Self {
            warehouse_dir,
            databases: RwLock::new(databases),
        }
    }

    pub fn warehouse_dir(&self) -> &str {
        &self.warehouse_dir
    }

    pub fn get_database(&self, name: &str) -> Result<Database, MetastoreError> {
        let key = name.to_lowercase();
        self.databases
            .read()
            .get(&key)
            .cloned()
            .ok_or(MetastoreError::DatabaseNotFound {
                name: name.to_string(),
            })
    }

    pub fn create_database(
        &self,
        name: &str,
        description: &str,
    ) -> Result<Database, MetastoreError> {
        if name.trim().is_empty() {
            return Err(MetastoreError::InvalidRequest {
                field: "name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        let key = name.to_lowercase();
        let mut databases = self.databases.write();
        if databases.contains_key(&key) {
            return Err(MetastoreError::DatabaseAlreadyExists {
                name: name.to_string(),
            });
        }

        let database = Database {
            name: key.clone(),
            location_uri: format!("{}/{key}.db", self.warehouse_dir.trim_end_matches('/')),
            description: description.to_string(),
        };
        databases.insert(key, database.clone());
        Ok(database)
    }

    pub fn list_databases(&self) -> Vec<Database> {
        self.databases.read().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_database_at_warehouse_root() {
        let catalog = Catalog::new("file:///tmp/base/warehouse");
        let database = catalog.get_database(DEFAULT_DATABASE).unwrap();
        assert_eq!(database.location_uri, "file:///tmp/base/warehouse");
        assert_eq!(catalog.list_databases().len(), 1);
    }

    #[test]
    fn test_create_database_location_and_case() {
        let catalog = Catalog::new("file:///tmp/base/warehouse/");
        let created = catalog.create_database("Sales", "quarterly numbers").unwrap();
        assert_eq!(created.name, "sales");
        assert_eq!(created.location_uri, "file:///tmp/base/warehouse/sales.db");

        let fetched = catalog.get_database("SALES").unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn test_create_database_conflicts_and_validation() {
        let catalog = Catalog::new("/warehouse");
        let duplicate = catalog.create_database("default", "");
        assert!(matches!(
            duplicate,
            Err(MetastoreError::DatabaseAlreadyExists { .. })
        ));

        let empty = catalog.create_database("  ", "");
        assert!(matches!(empty, Err(MetastoreError::InvalidRequest { .. })));

        let missing = catalog.get_database("nope");
        assert!(matches!(missing, Err(MetastoreError::DatabaseNotFound { .. })));
    }
}
