//! Harbex - Harbor Image Exporter Library
//!
//! Harbex copies the images of selected Harbor projects into portable tar
//! archives, together with an `import.sh` script that loads, retags and
//! pushes them into another registry.
//!
//! # Quick Start
//!
//! ```no_run
//! use libharbex::{Client, CommandTool, Config, Credentials, Exporter, RunLayout};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(Path::new("harbex.yaml"))?;
//!     let client = Client::new(&config.registry, Credentials::anonymous())?;
//!
//!     let runtime = tokio::runtime::Runtime::new()?;
//!     let images = runtime.block_on(libharbex::discover(
//!         &client,
//!         config.registry_host(),
//!         &config.projects,
//!     ))?;
//!
//!     let layout = RunLayout::new("output", &chrono::Local::now());
//!     let exporter = Exporter::from_config(&config, CommandTool::new(&config.tool), layout)?;
//!     let summary = exporter.run(&images)?;
//!     println!("wrote {} archives", summary.archives);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Stages
//!
//! - **Discovery** ([`discovery`]) - asks the Harbor API for repositories,
//!   artifacts and tags
//! - **Pull** ([`export::pull_images`]) - one `<tool> pull` per image
//! - **Save** ([`export::save_images`]) - one `<tool> save` per batch of
//!   images, see [`partition`]
//! - **Script** ([`script`]) - the import script for the target side
//!
//! Pull and save run on a bounded [`WorkerPool`]; the first failure in any
//! stage ends the run.

#![warn(clippy::all)]

/// Returns the libharbex crate version.
///
/// # Examples
///
/// ```
/// let version = libharbex::version();
/// assert!(!version.is_empty());
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub use auth::Credentials;
pub use client::{Client, ClientConfig, RegistryApi};
pub use config::Config;
pub use discovery::discover;
pub use error::{HarbexError, Result};
pub use export::{ExportSummary, Exporter, RunLayout};
pub use partition::{IndexRange, partition};
pub use pool::{PoolSize, StageReport, WorkerPool};
pub use reference::ImageReference;
pub use tool::{CommandTool, ImageTool};

pub mod auth;
pub mod client;
pub mod config;
pub mod discovery;
pub mod error;
pub mod export;
pub mod partition;
pub mod pool;
pub mod reference;
pub mod script;
pub mod tool;
