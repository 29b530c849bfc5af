//! Application context that holds everything resolved before a run starts
//!
//! The context is built once, in this order:
//! 1. Configuration file (required)
//! 2. Credentials (password prompt when a username is given)
//! 3. CLI flags
//!
//! Once built, it is passed read-only to the export command.

use libharbex::{Config, Credentials, HarbexError, Result};
use std::path::{Path, PathBuf};

/// Application context with resolved configuration and credentials
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: Config,
    pub config_path: PathBuf,
    pub credentials: Credentials,
    /// Skip TLS certificate verification for the registry API
    pub insecure_tls: bool,
}

impl AppContext {
    /// Loads the configuration at `config_path` and, when `username` is set,
    /// prompts for the password.
    pub fn build(config_path: &Path, username: Option<&str>, insecure_tls: bool) -> Result<Self> {
        let config = Config::load(config_path)?;
        let credentials = resolve_credentials(username, prompt_password)?;

        Ok(Self {
            config,
            config_path: config_path.to_path_buf(),
            credentials,
            insecure_tls,
        })
    }
}

/// Anonymous without a username; otherwise basic credentials with the
/// password returned by `read_password`, which must not be empty.
pub fn resolve_credentials<F>(username: Option<&str>, read_password: F) -> Result<Credentials>
where
    F: FnOnce() -> Result<String>,
{
    let Some(username) = username else {
        return Ok(Credentials::anonymous());
    };

    let password = read_password()?;
    if password.is_empty() {
        return Err(HarbexError::validation("Password must not be empty"));
    }

    Ok(Credentials::basic(username, password))
}

fn prompt_password() -> Result<String> {
    rpassword::prompt_password("Password: ")
        .map_err(|e| HarbexError::validation_with_source("Failed to read password", e))
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
