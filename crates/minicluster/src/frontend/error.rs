use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum FrontendError {
    InvalidConfiguration { reason: String },
    InvalidCredentials { reason: String },
    SessionNotFound { session_id: String },
    /// Malformed request or reply on the binary transport.
    Protocol { reason: String },
    /// Non-success HTTP status with the server's error message.
    Http { status: u16, message: String },
    Io { context: String, reason: String },
    Bind { addr: String, reason: String },
    Metastore { reason: String },
    AlreadyRunning,
}

impl fmt::Display for FrontendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrontendError::InvalidConfiguration { reason } => {
                write!(f, "Invalid front-end configuration: {reason}")
            }
            FrontendError::InvalidCredentials { reason } => {
                write!(f, "Session rejected: {reason}")
            }
            FrontendError::SessionNotFound { session_id } => {
                write!(f, "Session '{session_id}' not found")
            }
            FrontendError::Protocol { reason } => write!(f, "Protocol error: {reason}"),
            FrontendError::Http { status, message } => {
                write!(f, "HTTP {status}: {message}")
            }
            FrontendError::Io { context, reason } => {
                write!(f, "I/O error in {context}: {reason}")
            }
            FrontendError::Bind { addr, reason } => {
                write!(f, "Failed to bind {addr}: {reason}")
            }
            FrontendError::Metastore { reason } => {
                write!(f, "Metadata service unavailable: {reason}")
            }
            FrontendError::AlreadyRunning => write!(f, "Front-end server is already running"),
        }
    }
}

impl std::error::Error for FrontendError {}

impl FrontendError {
    pub fn from_io_error(e: std::io::Error, context: &str) -> Self {
        FrontendError::Io {
            context: context.to_string(),
            reason: e.to_string(),
        }
    }

    pub fn from_http_error(e: reqwest::Error, context: &str) -> Self {
        match e.status() {
            Some(status) => FrontendError::Http {
                status: status.as_u16(),
                message: e.to_string(),
            },
            None => FrontendError::Io {
                context: context.to_string(),
                reason: e.to_string(),
            },
        }
    }

    pub fn configuration(reason: impl Into<String>) -> Self {
        FrontendError::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Failures a readiness probe should simply retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FrontendError::Io { .. } | FrontendError::Protocol { .. } | FrontendError::Http { .. }
        )
    }

    /// Short machine-readable code used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            FrontendError::InvalidConfiguration { .. } => "invalid_configuration",
            FrontendError::InvalidCredentials { .. } => "invalid_credentials",
            FrontendError::SessionNotFound { .. } => "session_not_found",
            FrontendError::Protocol { .. } => "protocol_error",
            FrontendError::Http { .. } => "http_error",
            FrontendError::Io { .. } | FrontendError::Bind { .. } => "io_error",
            FrontendError::Metastore { .. } => "metastore_unavailable",
            FrontendError::AlreadyRunning => "already_running",
        }
    }
}
