//! The external image tool (`docker`, `podman`, `nerdctl`, ...).
//!
//! Every operation is one child process. Its stdout and stderr are relayed
//! line by line to our own stdout and stderr while it runs; a process that
//! cannot be started or exits unsuccessfully is an error.

use crate::error::{HarbexError, Result};
use crate::reference::ImageReference;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;


/// Operations the export pipeline needs from an image tool.
pub trait ImageTool: Sync {
    /// Name or path of the tool, as used in the generated import script.
    fn name(&self) -> &str;

    /// Pulls `image` into the local image store.
    fn pull(&self, image: &ImageReference) -> Result<()>;

    /// Writes `images` from the local image store into one archive at `archive`.
    fn save(&self, archive: &Path, images: &[ImageReference]) -> Result<()>;
}

/// [`ImageTool`] backed by a command-line program.
#[derive(Debug, Clone)]
pub struct CommandTool {
    program: String,
}

impl CommandTool {
    /// # Examples
    ///
    /// ```
    /// use libharbex::tool::{CommandTool, ImageTool};
    ///
    /// let tool = CommandTool::new("podman");
    /// assert_eq!(tool.name(), "podman");
    /// ```
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `<program> pull <image>`
    pub fn pull_command(&self, image: &ImageReference) -> Command {
        let mut command = Command::new(&self.program);
        command.arg("pull").arg(image.as_str());
        command
    }

    /// `<program> save -o <archive> <image>...`
    pub fn save_command(&self, archive: &Path, images: &[ImageReference]) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("save")
            .arg("-o")
            .arg(archive)
            .args(images.iter().map(ImageReference::as_str));
        command
    }

    fn run(&self, mut command: Command) -> Result<()> {
        let line = describe(&command);
        debug!(command = %line, "Running");

        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| HarbexError::tool_spawn(line.clone(), e))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        std::thread::scope(|scope| {
            if let Some(stdout) = stdout {
                scope.spawn(move || relay_lines(stdout, io::stdout));
            }
            if let Some(stderr) = stderr {
                scope.spawn(move || relay_lines(stderr, io::stderr));
            }
        });

        let status = child
            .wait()
            .map_err(|e| HarbexError::tool_spawn(line.clone(), e))?;

        if status.success() {
            Ok(())
        } else {
            Err(HarbexError::tool_exit(line, status.code()))
        }
    }
}

impl ImageTool for CommandTool {
    fn name(&self) -> &str {
        &self.program
    }

    fn pull(&self, image: &ImageReference) -> Result<()> {
        self.run(self.pull_command(image))
    }

    fn save(&self, archive: &Path, images: &[ImageReference]) -> Result<()> {
        self.run(self.save_command(archive, images))
    }
}

/// Renders a command as a single shell-like line for messages.
fn describe(command: &Command) -> String {
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Copies `source` to the writer returned by `sink` one whole line at a time,
/// so lines from concurrent processes never interleave mid-line.
fn relay_lines<R, W, F>(source: R, sink: F)
where
    R: Read,
    W: Write,
    F: Fn() -> W,
{
    let mut reader = BufReader::new(source);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                if !buf.ends_with(b"\n") {
                    buf.push(b'\n');
                }
                // Relay errors are ignored.
                let _ = sink().write_all(&buf);
            }
        }
    }
}
