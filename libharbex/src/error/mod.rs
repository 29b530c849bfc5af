//! Error types for harbex
//!
//! Every failure in an export run is fatal. The variants below exist so the
//! caller can tell the user *what* failed (configuration, registry, external
//! tool, filesystem), not so anything can recover from it.

use std::path::PathBuf;
use thiserror::Error;


/// Main error type for harbex operations
#[derive(Error, Debug)]
pub enum HarbexError {
    /// Network-related errors (connection, timeout, DNS, TLS)
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Authentication errors (401, 403)
    #[error("Authentication error (status: {status_code:?}): {message}")]
    Authentication {
        message: String,
        status_code: Option<u16>,
    },

    /// Resource not found errors (404)
    #[error("{resource_type} not found: {name}")]
    NotFound { resource_type: String, name: String },

    /// Any other non-success response from the registry
    #[error("Server error (status: {status_code}): {message}")]
    Server { message: String, status_code: u16 },

    /// Malformed responses or values
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors (unreadable file, invalid YAML, missing settings)
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The external image tool could not be started or exited unsuccessfully
    #[error("Tool error: `{command}`: {message}")]
    Tool {
        command: String,
        message: String,
        exit_code: Option<i32>,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Filesystem errors (directory creation, file write)
    #[error("I/O error at {}: {message}", path.display())]
    Io {
        message: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for harbex operations
pub type Result<T> = std::result::Result<T, HarbexError>;

impl HarbexError {
    /// Creates a new network error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libharbex::error::HarbexError;
    ///
    /// let err = HarbexError::network("connection refused");
    /// assert!(matches!(err, HarbexError::Network { .. }));
    /// ```
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new network error with a source error.
    pub fn network_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new authentication error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libharbex::error::HarbexError;
    ///
    /// let err = HarbexError::authentication("invalid credentials", Some(401));
    /// assert!(matches!(err, HarbexError::Authentication { .. }));
    /// ```
    pub fn authentication<S: Into<String>>(message: S, status_code: Option<u16>) -> Self {
        Self::Authentication {
            message: message.into(),
            status_code,
        }
    }

    /// Creates a new not found error.
    pub fn not_found<S: Into<String>>(resource_type: S, name: S) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }

    /// Creates a new server error.
    pub fn server<S: Into<String>>(message: S, status_code: u16) -> Self {
        Self::Server {
            message: message.into(),
            status_code,
        }
    }

    /// Creates a new validation error.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new validation error with a source error.
    pub fn validation_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Validation {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new configuration error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libharbex::error::HarbexError;
    ///
    /// let err = HarbexError::config("registry must not be empty", Some("export.yaml"));
    /// assert!(matches!(err, HarbexError::Config { .. }));
    /// ```
    pub fn config<S: Into<String>>(message: S, path: Option<S>) -> Self {
        Self::Config {
            message: message.into(),
            path: path.map(|p| p.into()),
            source: None,
        }
    }

    /// Creates a new configuration error with a source error.
    pub fn config_with_source<S, E>(message: S, path: Option<S>, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config {
            message: message.into(),
            path: path.map(|p| p.into()),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a tool error for a process that could not be spawned or waited on.
    pub fn tool_spawn<S: Into<String>>(command: S, source: std::io::Error) -> Self {
        Self::Tool {
            command: command.into(),
            message: "failed to run process".to_string(),
            exit_code: None,
            source: Some(source),
        }
    }

    /// Creates a tool error for a process that exited unsuccessfully.
    ///
    /// `exit_code` is `None` when the process was terminated by a signal.
    ///
    /// # Examples
    ///
    /// ```
    /// use libharbex::error::HarbexError;
    ///
    /// let err = HarbexError::tool_exit("docker pull alpine", Some(1));
    /// assert!(err.to_string().contains("exit status 1"));
    /// ```
    pub fn tool_exit<S: Into<String>>(command: S, exit_code: Option<i32>) -> Self {
        let message = match exit_code {
            Some(code) => format!("exited with exit status {}", code),
            None => "terminated by signal".to_string(),
        };
        Self::Tool {
            command: command.into(),
            message,
            exit_code,
            source: None,
        }
    }

    /// Creates a filesystem error.
    pub fn io<S, P>(message: S, path: P, source: std::io::Error) -> Self
    where
        S: Into<String>,
        P: Into<PathBuf>,
    {
        Self::Io {
            message: message.into(),
            path: path.into(),
            source,
        }
    }
}

impl From<config::ConfigError> for HarbexError {
    fn from(err: config::ConfigError) -> Self {
        Self::config_with_source("Failed to build configuration", None::<&str>, err)
    }
}
