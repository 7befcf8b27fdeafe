//! In-process query front end.
//!
//! Serves sessions over either the binary line protocol or HTTP, and only
//! implements what the orchestrator needs: open a session, close it, stop.

pub mod binary;
pub mod client;
pub mod error;
pub mod http;
pub mod server;
pub mod session;

pub use client::{BinarySessionClient, HttpSessionClient, SessionClient, SessionHandle};
pub use error::FrontendError;
pub use server::{FrontendServer, FrontendSettings};
pub use session::{SessionInfo, SessionManager};
