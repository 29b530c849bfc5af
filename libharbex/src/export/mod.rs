//! The export pipeline: pull stage, save stage, import script.
//!
//! Discovery produces the image list (see [`crate::discovery`]); everything
//! after that happens here:
//!
//! 1. every image is pulled, at most `pool` at a time;
//! 2. once all pulls are done, the list is cut into batches of at most
//!    `maxImageCount` images and each batch is saved to
//!    `<output>/<timestamp>/export-<n>.tar`, again at most `pool` at a time;
//! 3. `<output>/<timestamp>/import.sh` is written.
//!
//! The stages never overlap, and any failure ends the run.

use crate::config::Config;
use crate::error::{HarbexError, Result};
use crate::partition::{IndexRange, partition};
use crate::pool::{StageReport, WorkerPool};
use crate::reference::ImageReference;
use crate::script;
use crate::tool::ImageTool;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[cfg(test)]
mod tests;

/// Directory all runs write under.
pub const DEFAULT_OUTPUT_ROOT: &str = "output";

/// File name of the generated import script.
pub const SCRIPT_FILE_NAME: &str = "import.sh";

/// Output locations of one export run, namespaced by its start time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    dir: PathBuf,
}

impl RunLayout {
    /// Layout under `root/<YYYYMMDDhhmmss>` for a run started at `started`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{Local, TimeZone};
    /// use libharbex::export::RunLayout;
    /// use std::path::Path;
    ///
    /// let started = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
    /// let layout = RunLayout::new("output", &started);
    /// assert_eq!(layout.dir(), Path::new("output/20240309140500"));
    /// assert_eq!(layout.archive_path(2), Path::new("output/20240309140500/export-2.tar"));
    /// ```
    pub fn new(root: impl AsRef<Path>, started: &DateTime<Local>) -> Self {
        Self {
            dir: root.as_ref().join(run_timestamp(started)),
        }
    }

    /// Layout rooted at an explicit run directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the `sequence`-th archive.
    pub fn archive_path(&self, sequence: usize) -> PathBuf {
        self.dir.join(format!("export-{}.tar", sequence))
    }

    /// Glob matching every archive of the run, for display.
    pub fn archive_glob(&self) -> PathBuf {
        self.dir.join("export-*.tar")
    }

    pub fn script_path(&self) -> PathBuf {
        self.dir.join(SCRIPT_FILE_NAME)
    }

    /// Creates the run directory if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| HarbexError::io("Failed to create directory", &self.dir, e))
    }
}

/// Formats a run start time as `YYYYMMDDhhmmss`.
pub fn run_timestamp(started: &DateTime<Local>) -> String {
    started.format("%Y%m%d%H%M%S").to_string()
}

/// One batch of images destined for one archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportUnit<'a> {
    /// Position of the batch, starting at 0.
    pub sequence: usize,
    pub range: IndexRange,
    pub images: &'a [ImageReference],
    pub archive: PathBuf,
}

/// Cuts `images` into batches of at most `batch_size`, in order.
///
/// The n-th batch is saved to [`RunLayout::archive_path(n)`](RunLayout::archive_path).
pub fn export_units<'a>(
    images: &'a [ImageReference],
    batch_size: usize,
    layout: &'a RunLayout,
) -> impl Iterator<Item = ExportUnit<'a>> + Send + 'a {
    partition(images.len(), batch_size)
        .enumerate()
        .map(move |(sequence, range)| ExportUnit {
            sequence,
            range,
            images: &images[range.as_range()],
            archive: layout.archive_path(sequence),
        })
}

/// Pulls every image, at most `pool.threads()` at a time.
pub fn pull_images<T: ImageTool>(
    pool: &WorkerPool,
    tool: &T,
    images: &[ImageReference],
) -> Result<StageReport> {
    pool.run(images.iter(), |image| {
        info!(image = %image, "Pulling");
        tool.pull(image)
    })
}

/// Saves `images` into one archive per batch, at most `pool.threads()` at a time.
pub fn save_images<T: ImageTool>(
    pool: &WorkerPool,
    tool: &T,
    images: &[ImageReference],
    batch_size: usize,
    layout: &RunLayout,
) -> Result<StageReport> {
    layout.ensure_dir()?;

    pool.run(export_units(images, batch_size, layout), |unit| {
        info!(
            archive = %unit.archive.display(),
            images = unit.images.len(),
            "Saving"
        );
        tool.save(&unit.archive, unit.images)
    })
}

/// Result of a completed export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Number of images discovered.
    pub images: usize,
    /// Number of successful pulls.
    pub pulled: usize,
    /// Number of archives written.
    pub archives: usize,
    /// Path of the import script.
    pub script: PathBuf,
}

/// Runs the pull stage, the save stage and script emission for one run.
pub struct Exporter<T> {
    tool: T,
    pool: WorkerPool,
    registry_host: String,
    batch_size: usize,
    layout: RunLayout,
}

impl<T: ImageTool> Exporter<T> {
    /// # Arguments
    ///
    /// * `tool` - The image tool invoked by both stages
    /// * `pool` - Worker pool shared by both stages
    /// * `registry_host` - Source registry host, replaced in the import script
    /// * `batch_size` - Maximum number of images per archive
    /// * `layout` - Where this run writes its files
    pub fn new(
        tool: T,
        pool: WorkerPool,
        registry_host: impl Into<String>,
        batch_size: usize,
        layout: RunLayout,
    ) -> Self {
        Self {
            tool,
            pool,
            registry_host: registry_host.into(),
            batch_size,
            layout,
        }
    }

    /// Builds an exporter with the pool size, batch size and registry of `config`.
    pub fn from_config(config: &Config, tool: T, layout: RunLayout) -> Result<Self> {
        let pool = WorkerPool::new(config.pool_size())?;
        Ok(Self::new(
            tool,
            pool,
            config.registry_host(),
            config.max_image_count(),
            layout,
        ))
    }

    pub fn layout(&self) -> &RunLayout {
        &self.layout
    }

    pub fn pool_threads(&self) -> usize {
        self.pool.threads()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Exports `images`: pulls all of them, then saves the batches, then
    /// writes the import script.
    pub fn run(&self, images: &[ImageReference]) -> Result<ExportSummary> {
        info!(images = images.len(), threads = self.pool.threads(), "Pulling images");
        let pulled = pull_images(&self.pool, &self.tool, images)?;
        info!(completed = pulled.completed, "Finished pulling images");

        info!(
            batch_size = self.batch_size,
            dir = %self.layout.dir().display(),
            "Saving images"
        );
        let saved = save_images(
            &self.pool,
            &self.tool,
            images,
            self.batch_size,
            &self.layout,
        )?;
        info!(completed = saved.completed, "Finished saving images");

        let script_path = self.layout.script_path();
        info!(path = %script_path.display(), "Generating import script");
        let text = script::render(self.tool.name(), &self.registry_host, images);
        script::write(&text, &script_path)?;

        Ok(ExportSummary {
            images: images.len(),
            pulled: pulled.completed,
            archives: saved.completed,
            script: script_path,
        })
    }
}
