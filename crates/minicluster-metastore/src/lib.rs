//! Metadata service for minicluster topologies.
//!
//! This crate provides a small catalog service exposed over gRPC. A topology
//! that asks for a remote metadata service runs it on its own port, and the
//! front-end server discovers it through the `metastore.uris` setting.

pub mod catalog;
pub mod client;
pub mod error;
pub mod server;

// Generated protobuf/gRPC modules
pub mod proto {
    tonic::include_proto!("minicluster.metastore");
}

pub use catalog::{Catalog, DEFAULT_DATABASE};
pub use client::MetastoreClient;
pub use error::MetastoreError;
pub use server::{MetastoreHandle, MetastoreSettings, SaslSettings, spawn_metastore};

// Re-export logging macros for consistent usage across the crate
pub use log::{debug, error, info, trace, warn};
