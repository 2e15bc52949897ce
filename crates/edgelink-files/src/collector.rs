//! Input tree collection.
//!
//! [`FileCollector`] walks one directory tree and lazily yields a
//! [`FileRecord`] per regular file. The walk is sorted by file name, so two
//! runs over the same tree yield records in the same order.
//!
//! # Examples
//!
//! ```
//! use edgelink_files::{FileCollector, Origin};
//! # use tempfile::TempDir;
//!
//! # let dir = TempDir::new().unwrap();
//! # std::fs::write(dir.path().join("index.mjs"), "export {};").unwrap();
//! let records = FileCollector::new(dir.path(), Origin::Server)?
//!     .collect::<Result<Vec<_>, _>>()?;
//!
//! assert_eq!(records[0].path().as_str(), "index.mjs");
//! # Ok::<(), edgelink_files::FilesError>(())
//! ```

use crate::types::{FilePath, FileRecord, FilesError, Origin, PUBLIC_PREFIX, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Lazy, single-pass iterator over the files of one input tree.
///
/// Any read failure is yielded as an error; callers abort the build on it.
pub struct FileCollector {
    root: PathBuf,
    origin: Origin,
    walker: walkdir::IntoIter,
}

impl std::fmt::Debug for FileCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCollector")
            .field("root", &self.root)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl FileCollector {
    /// Starts a walk over `root`.
    ///
    /// Public-tree records get [`PUBLIC_PREFIX`] prepended to their path.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::NotADirectory` if `root` is not a directory.
    pub fn new(root: impl AsRef<Path>, origin: Origin) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(FilesError::NotADirectory {
                path: root.display().to_string(),
            });
        }

        let walker = WalkDir::new(&root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter();

        Ok(Self {
            root,
            origin,
            walker,
        })
    }

    fn record_for(&self, file: &Path) -> Result<FileRecord> {
        let mut path = FilePath::relative_to(&self.root, file)?;
        if self.origin == Origin::Public {
            path = path.with_prefix(PUBLIC_PREFIX)?;
        }

        let bytes = std::fs::read(file).map_err(|source| FilesError::IoError {
            path: file.display().to_string(),
            source,
        })?;
        let content = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!("{path} is not valid UTF-8; embedding a lossy decode");
                String::from_utf8_lossy(err.as_bytes()).into_owned()
            }
        };

        Ok(FileRecord::new(path, content, self.origin))
    }
}

impl Iterator for FileCollector {
    type Item = Result<FileRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map_or_else(|| self.root.display().to_string(), |p| p.display().to_string());
                    let source = err
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
                    return Some(Err(FilesError::IoError { path, source }));
                }
            };

            if entry.file_type().is_file() {
                return Some(self.record_for(entry.path()));
            }
        }
    }
}

/// Collects the server tree followed by the public tree.
///
/// # Errors
///
/// Returns the first collection error; no partial list is returned.
pub fn collect_inputs(server_dir: &Path, public_dir: &Path) -> Result<Vec<FileRecord>> {
    let server = FileCollector::new(server_dir, Origin::Server)?;
    let public = FileCollector::new(public_dir, Origin::Public)?;
    let records = server.chain(public).collect::<Result<Vec<_>>>()?;

    tracing::info!(
        "Discovered {} files in {} and {}",
        records.len(),
        server_dir.display(),
        public_dir.display()
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_collects_relative_sorted_paths() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.mjs", b"");
        write(dir.path(), "chunks/b.mjs", b"");
        write(dir.path(), "chunks/a.mjs", b"");

        let paths: Vec<_> = FileCollector::new(dir.path(), Origin::Server)
            .unwrap()
            .map(|r| r.unwrap().path().as_str().to_string())
            .collect();

        assert_eq!(paths, vec!["chunks/a.mjs", "chunks/b.mjs", "index.mjs"]);
    }

    #[test]
    fn test_public_records_are_prefixed() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "assets/app.css", b"body{}");

        let record = FileCollector::new(dir.path(), Origin::Public)
            .unwrap()
            .next()
            .unwrap()
            .unwrap();

        assert_eq!(record.path().as_str(), "public/assets/app.css");
        assert_eq!(record.origin(), Origin::Public);
        assert_eq!(record.content(), "body{}");
    }

    #[test]
    fn test_missing_root_is_error() {
        let dir = TempDir::new().unwrap();
        let err = FileCollector::new(dir.path().join("nope"), Origin::Server).unwrap_err();
        assert!(matches!(err, FilesError::NotADirectory { .. }));
    }

    #[test]
    fn test_non_utf8_is_decoded_lossily() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "favicon.ico", &[0xff, 0xfe, b'o', b'k']);

        let record = FileCollector::new(dir.path(), Origin::Public)
            .unwrap()
            .next()
            .unwrap()
            .unwrap();

        assert!(record.content().ends_with("ok"));
    }

    #[test]
    fn test_collect_inputs_merges_trees_in_order() {
        let server = TempDir::new().unwrap();
        let public = TempDir::new().unwrap();
        write(server.path(), "index.mjs", b"");
        write(public.path(), "robots.txt", b"User-agent: *");

        let records = collect_inputs(server.path(), public.path()).unwrap();
        let paths: Vec<_> = records.iter().map(|r| r.path().as_str()).collect();
        assert_eq!(paths, vec!["index.mjs", "public/robots.txt"]);
    }
}
