//! The embedded virtual filesystem.
//!
//! [`VirtualFs`] maps relative paths to text content. It is serialized
//! verbatim into the bundle as one JSON object literal, and the runtime
//! filesystem polyfill resolves reads against it with the same three-stage
//! lookup implemented by [`VirtualFs::lookup`]:
//!
//! 1. exact key match on the normalized request
//! 2. suffix match on a segment boundary, or containment of a key longer
//!    than [`MIN_CONTAINED_KEY_LEN`] bytes
//! 3. basename match
//!
//! # Examples
//!
//! ```
//! use edgelink_files::{FilePath, LookupStage, VirtualFs};
//!
//! let mut vfs = VirtualFs::new();
//! vfs.insert(FilePath::new("dir/a.txt").unwrap(), "hello");
//!
//! let hit = vfs.lookup("a.txt").unwrap();
//! assert_eq!(hit.content, "hello");
//! assert_eq!(hit.stage, LookupStage::Basename);
//!
//! assert!(vfs.lookup("zzz/nomatch.txt").unwrap_err().is_not_found());
//! ```

use crate::types::{FilePath, FilesError, Result};
use std::collections::BTreeMap;

/// Keys this short are never matched by containment, only by suffix.
pub const MIN_CONTAINED_KEY_LEN: usize = 10;

/// Which lookup stage produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStage {
    /// Key equals the normalized request
    Exact,
    /// Key is a segment-aligned suffix of the request (or the reverse), or
    /// a long key is contained in the request
    Suffix,
    /// Key ends with the request's file name
    Basename,
}

/// A successful lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VfsHit<'a> {
    /// Matching key
    pub key: &'a FilePath,
    /// Content stored under the key
    pub content: &'a str,
    /// Stage that matched
    pub stage: LookupStage,
}

/// Read-only path-to-content map embedded in the bundle.
///
/// Keys are kept sorted so the serialized literal, and the iteration order
/// the runtime lookup sees, are stable across builds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VirtualFs {
    files: BTreeMap<FilePath, String>,
}

impl VirtualFs {
    /// Creates an empty VFS.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a file, returning the content it replaced.
    pub fn insert(&mut self, path: FilePath, content: impl Into<String>) -> Option<String> {
        self.files.insert(path, content.into())
    }

    /// Returns the content stored under an exact key.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    /// Returns `true` if a lookup for `request` would succeed.
    #[must_use]
    pub fn exists(&self, request: &str) -> bool {
        self.lookup(request).is_ok()
    }

    /// Number of embedded files.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if nothing is embedded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Keys in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &FilePath> {
        self.files.keys()
    }

    /// Total content size in bytes.
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        self.files.values().map(String::len).sum()
    }

    /// Resolves a runtime-style request against the VFS.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::FileNotFound` carrying both the raw and the
    /// normalized request when no stage matches.
    pub fn lookup(&self, request: &str) -> Result<VfsHit<'_>> {
        let normalized = normalize_request(request);

        if let Some((key, content)) = self.files.get_key_value(normalized.as_str()) {
            return Ok(VfsHit {
                key,
                content,
                stage: LookupStage::Exact,
            });
        }

        let multi_segment = normalized.contains('/');
        for (key, content) in &self.files {
            let key_str = key.as_str();
            let suffix = ends_with_segment(&normalized, key_str)
                || (multi_segment && ends_with_segment(key_str, &normalized));
            let contained = key_str.len() > MIN_CONTAINED_KEY_LEN && normalized.contains(key_str);
            if suffix || contained {
                return Ok(VfsHit {
                    key,
                    content,
                    stage: LookupStage::Suffix,
                });
            }
        }

        let file_name = normalized.rsplit('/').next().unwrap_or_default();
        if !file_name.is_empty() {
            for (key, content) in &self.files {
                if key.file_name() == file_name {
                    return Ok(VfsHit {
                        key,
                        content,
                        stage: LookupStage::Basename,
                    });
                }
            }
        }

        Err(FilesError::FileNotFound {
            requested: request.to_string(),
            normalized,
        })
    }

    /// Reads a file through [`lookup`](Self::lookup).
    ///
    /// # Errors
    ///
    /// Returns `FilesError::FileNotFound` on a miss.
    pub fn read(&self, request: &str) -> Result<&str> {
        self.lookup(request).map(|hit| hit.content)
    }

    /// Serializes the VFS as a JSON object literal.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::Serialization` if serialization fails.
    pub fn to_json_literal(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.files)?)
    }
}

/// Normalizes a runtime file request the way the filesystem polyfill does.
///
/// Converts backslashes, strips a `file://` scheme and a drive letter, and
/// drops everything up to a `/dist/../` hop.
///
/// # Examples
///
/// ```
/// use edgelink_files::vfs::normalize_request;
///
/// assert_eq!(normalize_request(r"C:\app\dist\..\public\x.css"), "public/x.css");
/// assert_eq!(normalize_request("file:///server/a.json"), "/server/a.json");
/// ```
#[must_use]
pub fn normalize_request(request: &str) -> String {
    let mut path = request.replace('\\', "/");

    if let Some(rest) = path.strip_prefix("file://") {
        path = rest.to_string();
    }

    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        path = path[2..].to_string();
    }

    const DIST_HOP: &str = "/dist/../";
    if let Some(idx) = path.rfind(DIST_HOP) {
        path = path[idx + DIST_HOP.len()..].to_string();
    }

    path
}

/// `haystack` ends with `suffix` and the match starts on a segment boundary.
fn ends_with_segment(haystack: &str, suffix: &str) -> bool {
    if suffix.is_empty() || !haystack.ends_with(suffix) {
        return false;
    }
    let start = haystack.len() - suffix.len();
    start == 0 || suffix.starts_with('/') || haystack.as_bytes()[start - 1] == b'/'
}
