use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{bail, Context, Result};

static TEMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Replaces `path` with `content` so a concurrent reader sees either the old
/// record or the new one, never a torn write.
///
/// The text is staged in a sibling file, flushed to disk, then renamed over
/// the destination. The staging file is removed if any step fails.
pub fn write_text_atomic(path: &Path, content: &str) -> Result<()> {
    let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
        bail!("destination '{}' has no usable file name", path.display());
    };
    if path.is_dir() {
        bail!("destination path '{}' is a directory", path.display());
    }
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(directory)
        .with_context(|| format!("failed to create {}", directory.display()))?;

    let staging = staging_path(directory, file_name);
    let staged = stage(&staging, content).and_then(|()| {
        fs::rename(&staging, path).with_context(|| {
            format!("failed to move {} into place", staging.display())
        })
    });
    if staged.is_err() {
        let _ = fs::remove_file(&staging);
    }
    staged
}

fn staging_path(directory: &Path, file_name: &str) -> PathBuf {
    let sequence = TEMP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    directory.join(format!(
        ".{file_name}.{}.{sequence}.partial",
        std::process::id()
    ))
}

fn stage(staging: &Path, content: &str) -> Result<()> {
    let mut file = File::create(staging)
        .with_context(|| format!("failed to create {}", staging.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("failed to write {}", staging.display()))?;
    file.sync_all()
        .with_context(|| format!("failed to flush {}", staging.display()))
}
