// file: src/error.rs
// version: 1.0.0
// guid: 182787df-f15b-431b-b736-5c82f8a16f9a

use thiserror::Error;

/// Result type alias for the resolver
pub type Result<T> = std::result::Result<T, ResolverError>;

/// Error types for inventory and disk option resolution
#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Authentication rejected: {0}")]
    AuthenticationRejected(String),

    #[error("Endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("SOAP fault {code}: {message}")]
    Soap { code: String, message: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("SSH error: {0}")]
    Ssh(String),

    #[error("No active session: {0}")]
    NoSession(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl ResolverError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::AuthenticationRejected(msg.into())
    }

    /// Create a new unreachable-endpoint error
    pub fn unreachable(msg: impl Into<String>) -> Self {
        Self::Unreachable(msg.into())
    }

    /// Create a new SOAP fault error
    pub fn soap(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Soap {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a new protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a new SSH error
    pub fn ssh(msg: impl Into<String>) -> Self {
        Self::Ssh(msg.into())
    }

    /// Create a new missing-session error
    pub fn no_session(msg: impl Into<String>) -> Self {
        Self::NoSession(msg.into())
    }

    /// Create a new other error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Whether this failure is a normal operational condition when opening
    /// a session (rejected login, unreachable endpoint).
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationRejected(_) | Self::Unreachable(_)
        )
    }
}

impl From<reqwest::Error> for ResolverError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            Self::Unreachable(format!("Connection failed: {}", e))
        } else {
            Self::Http(e.to_string())
        }
    }
}

impl From<quick_xml::Error> for ResolverError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Protocol(format!("Malformed XML: {}", e))
    }
}
