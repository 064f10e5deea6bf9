//! Error types for the DDNS reconciliation system
//!
//! Every component reports failures through [`Error`]. The variants double
//! as the failure taxonomy the reconciliation loop acts on:
//!
//! | Variant | Effect on the loop |
//! |---------|--------------------|
//! | `Config` | fatal, prevents startup |
//! | `Auth` | fatal, terminates the running loop |
//! | `Network` / `Format` | transient, retried on the next tick |
//! | `NotFound` | per-domain, the domain becomes inactive |

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS reconciliation system
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credentials rejected by the provider (HTTP 401/403)
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Transport failure, timeout or a transient provider-side failure
    #[error("Network error: {0}")]
    Network(String),

    /// A response that could not be interpreted (e.g. not an IPv4 address)
    #[error("Format error: {0}")]
    Format(String),

    /// Record (or record ID) does not exist on the provider side
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Local I/O errors (secret and domain files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a format error
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Whether this error must stop the process.
    ///
    /// Configuration and authentication failures are systemic: every domain
    /// shares the same credentials, so retrying cannot help.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Auth(_))
    }

    /// Whether the failed operation should simply be retried on the next tick
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Format(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(Error::config("missing zone").is_fatal());
        assert!(Error::auth("401").is_fatal());
        assert!(!Error::network("timeout").is_fatal());
        assert!(!Error::not_found("a.example.com").is_fatal());
    }

    #[test]
    fn test_transient_classification() {
        assert!(Error::network("timeout").is_transient());
        assert!(Error::format("not an ip").is_transient());
        assert!(!Error::auth("403").is_transient());
        assert!(!Error::not_found("gone").is_transient());
    }

    #[test]
    fn test_display_includes_context() {
        let err = Error::not_found("a.example.com");
        assert_eq!(err.to_string(), "Record not found: a.example.com");
    }

    #[test]
    fn test_document_errors_are_neither_fatal_nor_transient() {
        let json: Error = serde_json::from_str::<Vec<String>>("{").unwrap_err().into();
        let toml: Error = toml::from_str::<toml::Table>("domains = [").unwrap_err().into();

        assert!(json.to_string().starts_with("JSON error:"));
        assert!(toml.to_string().starts_with("TOML error:"));
        for err in [json, toml] {
            assert!(!err.is_fatal());
            assert!(!err.is_transient());
        }
    }
}
