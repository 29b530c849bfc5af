//! The `import.sh` script shipped next to the archives.
//!
//! Run on the target side as `./import.sh <target-registry>`, the script
//! loads every `export-*.tar` in the current directory, retags each image
//! from the source registry to the target registry and pushes it.

use crate::error::{HarbexError, Result};
use crate::reference::{ImageReference, TARGET_REGISTRY_PLACEHOLDER};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;


const TAG_SCRIPT: &str = "{{tag_script}}";
const PUSH_SCRIPT: &str = "{{push_script}}";
const TOOL: &str = "{{tool}}";

const TEMPLATE: &str = "#!/bin/sh

target_registry=$1

for f in export-*.tar; do
    cat $f | {{tool}} load
done

{{tag_script}}
{{push_script}}
";

/// Renders the import script for `images`.
///
/// Each image gets one `<tool> tag <source> <target>` line and one
/// `<tool> push <target>` line, where `<target>` is the image with the first
/// occurrence of `source_registry` replaced by `${target_registry}`. All tag
/// lines come before all push lines.
pub fn render(tool: &str, source_registry: &str, images: &[ImageReference]) -> String {
    let mut tag_script = String::new();
    let mut push_script = String::new();

    for image in images {
        let target = image.retarget(source_registry, TARGET_REGISTRY_PLACEHOLDER);
        // Writing to a String cannot fail.
        let _ = writeln!(tag_script, "{} tag {} {}", tool, image, target);
        let _ = writeln!(push_script, "{} push {}", tool, target);
    }

    TEMPLATE
        .replacen(TOOL, tool, 1)
        .replacen(TAG_SCRIPT, &tag_script, 1)
        .replacen(PUSH_SCRIPT, &push_script, 1)
}

/// Writes `script` to `path`, creating parent directories as needed.
///
/// On Unix the file is made executable.
pub fn write(script: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| HarbexError::io("Failed to create directory", parent, e))?;
    }

    fs::write(path, script).map_err(|e| HarbexError::io("Failed to write script", path, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))
            .map_err(|e| HarbexError::io("Failed to make script executable", path, e))?;
    }

    Ok(())
}
