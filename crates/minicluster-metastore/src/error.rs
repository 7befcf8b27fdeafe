//! Error types for metadata service operations.

use std::fmt;

/// Main error type for metadata service operations.
#[derive(Debug, Clone, PartialEq)]
pub enum MetastoreError {
    DatabaseNotFound {
        name: String,
    },
    DatabaseAlreadyExists {
        name: String,
    },
    /// Rejected request payload (empty names and the like).
    InvalidRequest {
        field: String,
        reason: String,
    },
    /// gRPC transport error.
    Transport {
        context: String,
        reason: String,
    },
}

impl fmt::Display for MetastoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetastoreError::DatabaseNotFound { name } => {
                write!(f, "Database '{name}' not found")
            }
            MetastoreError::DatabaseAlreadyExists { name } => {
                write!(f, "Database '{name}' already exists")
            }
            MetastoreError::InvalidRequest { field, reason } => {
                write!(f, "Invalid request field '{field}': {reason}")
            }
            MetastoreError::Transport { context, reason } => {
                write!(f, "Transport error in {context}: {reason}")
            }
        }
    }
}

impl std::error::Error for MetastoreError {}

impl MetastoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, MetastoreError::DatabaseNotFound { .. })
    }

    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            MetastoreError::DatabaseNotFound { .. }
                | MetastoreError::DatabaseAlreadyExists { .. }
                | MetastoreError::InvalidRequest { .. }
        )
    }

    pub fn from_transport_error(e: impl fmt::Display, context: &str) -> Self {
        MetastoreError::Transport {
            context: context.to_string(),
            reason: e.to_string(),
        }
    }
}
