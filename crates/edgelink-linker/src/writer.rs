//! Bundle persistence and the build report.
//!
//! The bundle is written to a sibling temp file and renamed over the output
//! path, so a failed write never leaves a partial bundle behind.

use edgelink_core::{Error, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Summary of one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleReport {
    /// Where the bundle was written
    pub output: PathBuf,
    /// Files found in both input trees
    pub files_discovered: usize,
    /// Modules linked into the bundle
    pub modules_bundled: usize,
    /// Files embedded in the VFS
    pub static_files: usize,
    /// Client bundles dropped from the server tree
    pub dropped_client_assets: usize,
    /// Structural patches that changed the text
    pub patches_applied: usize,
    /// Bundle size in bytes
    pub bytes: usize,
    /// BLAKE3 digest of the bundle, hex encoded
    pub digest: String,
}

impl BundleReport {
    /// Bundle size in KiB.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn kib(&self) -> f64 {
        self.bytes as f64 / 1024.0
    }
}

/// Hex BLAKE3 digest of `content`.
#[must_use]
pub fn digest(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}

/// Expands a leading `~` to the home directory.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` for a non-UTF-8 path and `Error::Io` if
/// the home directory cannot be determined.
pub fn expand_tilde(path: &Path) -> Result<PathBuf> {
    let path_str = path
        .to_str()
        .ok_or_else(|| Error::InvalidArgument(format!("output path is not UTF-8: {}", path.display())))?;

    if path_str == "~" || path_str.starts_with("~/") {
        let home = dirs::home_dir().ok_or_else(|| Error::Io {
            path: path_str.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "Cannot determine home directory"),
        })?;
        Ok(path_str.strip_prefix("~/").map_or_else(|| home.clone(), |rest| home.join(rest)))
    } else {
        Ok(path.to_path_buf())
    }
}

/// Writes `content` to `path` atomically, creating parent directories.
///
/// Returns the path actually written, after `~` expansion.
///
/// # Errors
///
/// Returns `Error::Io` if any filesystem operation fails. The temp file is
/// removed when writing or renaming it fails.
pub fn write_atomic(path: &Path, content: &str) -> Result<PathBuf> {
    let path = expand_tilde(path)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| Error::Io {
            path: parent.display().to_string(),
            source,
        })?;
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| Error::InvalidArgument(format!("output path has no file name: {}", path.display())))?;
    let mut temp_name = file_name.to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    if let Err(source) = fs::write(&temp_path, content) {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::Io {
            path: temp_path.display().to_string(),
            source,
        });
    }

    if let Err(source) = fs::rename(&temp_path, &path) {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::Io {
            path: path.display().to_string(),
            source,
        });
    }

    tracing::info!("Bundle created: {} ({} bytes)", path.display(), content.len());
    Ok(path)
}
