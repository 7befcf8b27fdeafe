//! Port allocation for the services of one topology.
//!
//! Allocation probes for a free port and releases it before the service binds,
//! so another process can win the port in between. Callers narrow that window
//! by re-allocating right before start; the metadata service avoids it by
//! binding port 0 directly.

use std::net::TcpListener;

use crate::config::TransportMode;
use crate::error::MiniClusterError;

pub const LOCALHOST: &str = "127.0.0.1";

/// Ask the OS for a currently unused TCP port on the loopback interface.
pub fn find_free_port() -> Result<u16, MiniClusterError> {
    let listener = TcpListener::bind((LOCALHOST, 0))
        .map_err(|e| MiniClusterError::from_startup_error(e, "port allocation"))?;
    let port = listener
        .local_addr()
        .map_err(|e| MiniClusterError::from_startup_error(e, "port allocation"))?
        .port();
    Ok(port)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortAssignment {
    pub binary: u16,
    pub http: u16,
    pub metastore: Option<u16>,
}

impl PortAssignment {
    /// Allocate distinct binary and HTTP ports.
    pub fn allocate() -> Result<Self, MiniClusterError> {
        let binary = find_free_port()?;
        let http = find_distinct_port(binary)?;
        Ok(Self {
            binary,
            http,
            metastore: None,
        })
    }

    /// Pick a fresh binary port, still distinct from the HTTP port.
    pub fn reallocate_binary(&mut self) -> Result<u16, MiniClusterError> {
        self.binary = find_distinct_port(self.http)?;
        Ok(self.binary)
    }

    /// Port clients connect to for the given transport.
    pub fn port_for(&self, transport: TransportMode) -> u16 {
        match transport {
            TransportMode::Binary => self.binary,
            TransportMode::Http => self.http,
        }
    }

    /// Record the port a listener actually bound.
    pub fn record_bound(&mut self, transport: TransportMode, port: u16) {
        match transport {
            TransportMode::Binary => self.binary = port,
            TransportMode::Http => self.http = port,
        }
    }
}

fn find_distinct_port(taken: u16) -> Result<u16, MiniClusterError> {
    const MAX_ATTEMPTS: usize = 16;
    for _ in 0..MAX_ATTEMPTS {
        let port = find_free_port()?;
        if port != taken {
            return Ok(port);
        }
    }
    Err(MiniClusterError::from_startup_error(
        format!("no free port distinct from {taken}"),
        "port allocation",
    ))
}
