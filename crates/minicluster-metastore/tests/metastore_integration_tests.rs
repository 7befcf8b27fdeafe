//! Metastore Integration Tests
//!
//! End-to-end gRPC tests running the metadata service on a real listener and
//! talking to it through `MetastoreClient`.

mod metastore {
    pub mod client_server_tests;
}
