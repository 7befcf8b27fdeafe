//! Cluster Integration Tests
//!
//! Full start/stop cycles of embedded topologies, each rooted in its own
//! temporary directory. Individual test modules live in tests/cluster/.

pub mod test_utilities;

mod cluster {
    pub mod lifecycle_tests;
    pub mod metastore_tests;
    pub mod simulated_tests;
    pub mod workspace_tests;
}
