//! Export configuration.
//!
//! The configuration is a YAML file describing the source registry, the
//! external image tool, the projects to export and the runtime limits:
//!
//! ```yaml
//! tool: docker
//! registry: harbor.example.com
//! projects:
//!   - name: library
//!     repository:
//!       fetchAll: true
//!   - name: apps
//!     repository:
//!       items: [frontend, backend]
//! runtime:
//!   pool: 4
//!   exportFile:
//!     maxImageCount: 15
//! ```

use crate::error::{HarbexError, Result};
use crate::pool::PoolSize;
use config::{Config as ConfigRs, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;


/// Number of images bundled into one archive when the configuration leaves it unset.
pub const DEFAULT_MAX_IMAGE_COUNT: usize = 15;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Name or path of the external image tool.
    #[serde(default = "default_tool")]
    pub tool: String,

    /// Source registry host, e.g. `harbor.example.com`.
    #[serde(default)]
    pub registry: String,

    #[serde(default)]
    pub projects: Vec<ProjectSpec>,

    #[serde(default)]
    pub runtime: Runtime,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tool: default_tool(),
            registry: String::new(),
            projects: Vec::new(),
            runtime: Runtime::default(),
        }
    }
}

fn default_tool() -> String {
    "docker".to_string()
}

impl Config {
    /// Parses and validates a `Config` from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let builder = ConfigRs::builder().add_source(File::from_str(s, FileFormat::Yaml));

        let config = Self::from_builder(builder, None)?;
        config.validate(None)?;
        Ok(config)
    }

    /// Loads and validates a `Config` from a YAML file.
    ///
    /// The file is required; a missing or unreadable file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let display = path.display().to_string();
        let builder = ConfigRs::builder()
            .add_source(File::from(path).format(FileFormat::Yaml).required(true));

        let config = Self::from_builder(builder, Some(&display))?;
        config.validate(Some(&display))?;
        Ok(config)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        path: Option<&str>,
    ) -> Result<Self> {
        builder
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| {
                HarbexError::config_with_source(
                    "Failed to deserialize configuration".to_string(),
                    path.map(str::to_string),
                    e,
                )
            })
    }

    /// Checks the settings an export run cannot do without.
    pub fn validate(&self, path: Option<&str>) -> Result<()> {
        let fail = |message: String| {
            Err(HarbexError::config(message, path.map(str::to_string)))
        };

        if self.registry.trim().is_empty() {
            return fail("`registry` must not be empty".to_string());
        }
        if self.tool.trim().is_empty() {
            return fail("`tool` must not be empty".to_string());
        }
        for (i, project) in self.projects.iter().enumerate() {
            if project.name.trim().is_empty() {
                return fail(format!("projects[{}]: `name` must not be empty", i));
            }
        }
        if self.runtime.export_file.max_image_count < 0 {
            return fail(format!(
                "`runtime.exportFile.maxImageCount` must not be negative, got {}",
                self.runtime.export_file.max_image_count
            ));
        }

        Ok(())
    }

    /// The registry host as it appears in image references, without any
    /// scheme or trailing slash.
    ///
    /// # Examples
    ///
    /// ```
    /// use libharbex::Config;
    ///
    /// let mut config = Config::default();
    /// config.registry = "https://harbor.example.com/".to_string();
    /// assert_eq!(config.registry_host(), "harbor.example.com");
    /// ```
    pub fn registry_host(&self) -> &str {
        let registry = self.registry.trim();
        registry
            .strip_prefix("https://")
            .or_else(|| registry.strip_prefix("http://"))
            .unwrap_or(registry)
            .trim_end_matches('/')
    }

    /// Resolved worker pool size for the pull and save stages.
    pub fn pool_size(&self) -> PoolSize {
        PoolSize::from_setting(self.runtime.pool)
    }

    /// Maximum number of images per archive, falling back to
    /// [`DEFAULT_MAX_IMAGE_COUNT`] when unset or zero.
    pub fn max_image_count(&self) -> usize {
        match self.runtime.export_file.max_image_count {
            n if n > 0 => n as usize,
            _ => DEFAULT_MAX_IMAGE_COUNT,
        }
    }
}

/// A project to export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectSpec {
    pub name: String,

    #[serde(default)]
    pub repository: RepositorySelection,
}

/// Which repositories of a project to export.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepositorySelection {
    /// Discover every repository of the project through the registry API.
    #[serde(default, rename = "fetchAll", alias = "fetchall")]
    pub fetch_all: bool,

    /// Explicit repository names, ignored when `fetch_all` is set.
    #[serde(default)]
    pub items: Vec<String>,
}

/// Runtime limits.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Runtime {
    /// Worker pool size: negative for the platform default, zero for serial.
    #[serde(default)]
    pub pool: i64,

    #[serde(default, rename = "exportFile", alias = "exportfile")]
    pub export_file: ExportFile,
}

/// Archive settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportFile {
    #[serde(default, rename = "maxImageCount", alias = "maximagecount")]
    pub max_image_count: i64,
}
