//! Builder for the embedded virtual filesystem.
//!
//! # Examples
//!
//! ```
//! use edgelink_files::VfsBuilder;
//!
//! let vfs = VfsBuilder::new()
//!     .add_file("nitro.json", "{}")
//!     .add_file("public/robots.txt", "User-agent: *")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(vfs.file_count(), 2);
//! ```

use crate::types::{FilePath, FileRecord, FilesError, Origin, Result};
use crate::vfs::VirtualFs;

/// Fluent builder for [`VirtualFs`].
///
/// Later insertions replace earlier ones under the same key. Records are fed
/// server tree first, so a public-tree file wins over a server file that
/// maps to the same key.
#[derive(Debug, Default)]
pub struct VfsBuilder {
    vfs: VirtualFs,
    errors: Vec<FilesError>,
}

impl VfsBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder pre-filled with `records`, in order.
    ///
    /// # Examples
    ///
    /// ```
    /// use edgelink_files::{FilePath, FileRecord, Origin, VfsBuilder};
    ///
    /// let records = vec![
    ///     FileRecord::new(FilePath::new("public/a.css").unwrap(), "old", Origin::Server),
    ///     FileRecord::new(FilePath::new("public/a.css").unwrap(), "new", Origin::Public),
    /// ];
    ///
    /// let vfs = VfsBuilder::from_records(records).build().unwrap();
    /// assert_eq!(vfs.get("public/a.css"), Some("new"));
    /// ```
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = FileRecord>) -> Self {
        records.into_iter().fold(Self::new(), Self::add_record)
    }

    /// Adds one collected record.
    #[must_use]
    pub fn add_record(mut self, record: FileRecord) -> Self {
        let origin = record.origin();
        let (path, content) = record.into_parts();
        self.insert(path, content, origin);
        self
    }

    /// Adds a file by raw path.
    ///
    /// An invalid path is collected and reported by [`build`](Self::build).
    #[must_use]
    pub fn add_file(mut self, path: &str, content: impl Into<String>) -> Self {
        match FilePath::new(path) {
            Ok(path) => {
                let origin = if path.is_public() {
                    Origin::Public
                } else {
                    Origin::Server
                };
                self.insert(path, content.into(), origin);
            }
            Err(e) => self.errors.push(e),
        }
        self
    }

    fn insert(&mut self, path: FilePath, content: String, origin: Origin) {
        let key = path.to_string();
        if self.vfs.insert(path, content).is_some() {
            tracing::debug!("Duplicate VFS key {key}; keeping the {origin:?} copy");
        }
    }

    /// Consumes the builder.
    ///
    /// # Errors
    ///
    /// Returns the first path error collected by [`add_file`](Self::add_file).
    pub fn build(self) -> Result<VirtualFs> {
        if let Some(error) = self.errors.into_iter().next() {
            return Err(error);
        }
        Ok(self.vfs)
    }

    /// Number of files added so far.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.vfs.file_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_empty() {
        let vfs = VfsBuilder::new().build().unwrap();
        assert!(vfs.is_empty());
    }

    #[test]
    fn test_add_file_invalid_path() {
        let err = VfsBuilder::new()
            .add_file("ok.txt", "")
            .add_file("/abs.txt", "")
            .build()
            .unwrap_err();
        assert!(err.is_invalid_path());
    }

    #[test]
    fn test_later_record_wins() {
        let vfs = VfsBuilder::new()
            .add_file("public/favicon.ico", "server")
            .add_record(FileRecord::new(
                FilePath::new("public/favicon.ico").unwrap(),
                "public",
                Origin::Public,
            ))
            .build()
            .unwrap();

        assert_eq!(vfs.file_count(), 1);
        assert_eq!(vfs.get("public/favicon.ico"), Some("public"));
    }

    #[test]
    fn test_file_count_tracks_distinct_keys() {
        let mut builder = VfsBuilder::new();
        assert_eq!(builder.file_count(), 0);

        builder = builder.add_file("a.txt", "").add_file("b.txt", "");
        assert_eq!(builder.file_count(), 2);

        builder = builder.add_file("a.txt", "again");
        assert_eq!(builder.file_count(), 2);
    }
}
