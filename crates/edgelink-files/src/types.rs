//! Core types for collected files.
//!
//! Defines the relative path type used as VFS and module registry key, the
//! extension-based MIME table, and the immutable [`FileRecord`].
//!
//! # Examples
//!
//! ```
//! use edgelink_files::{FilePath, FileRecord, MimeClass, Origin};
//!
//! let path = FilePath::new("chunks/_/nitro.mjs").unwrap();
//! let record = FileRecord::new(path, "export {}", Origin::Server);
//!
//! assert_eq!(record.mime(), MimeClass::JavaScript);
//! assert!(record.is_executable());
//! ```

use serde::Serialize;
use std::fmt;
use std::path::{Component, Path};
use thiserror::Error;

/// Prefix given to every public-tree path so it cannot collide with server paths.
pub const PUBLIC_PREFIX: &str = "public/";

/// Errors raised while collecting files or reading the VFS.
#[derive(Error, Debug)]
pub enum FilesError {
    /// Reading a file or walking a directory failed
    #[error("I/O error at {path}: {source}")]
    IoError {
        /// The path being read
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Input root is missing or not a directory
    #[error("Not a directory: {path}")]
    NotADirectory {
        /// The offending root
        path: String,
    },

    /// Path is empty or not valid UTF-8
    #[error("Invalid path: {path}")]
    InvalidPath {
        /// The invalid path
        path: String,
    },

    /// Path is absolute; collected paths are always relative
    #[error("Path must be relative: {path}")]
    PathNotRelative {
        /// The absolute path
        path: String,
    },

    /// Path contains `..`, `.` or empty segments
    #[error("Path contains invalid components: {path}")]
    InvalidPathComponent {
        /// The path with invalid components
        path: String,
    },

    /// No VFS entry matched any lookup stage
    #[error("File not found in VFS: {requested} (normalized: {normalized})")]
    FileNotFound {
        /// The path as requested
        requested: String,
        /// The path after normalization
        normalized: String,
    },

    /// VFS serialization failed
    #[error("VFS serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FilesError {
    /// Returns `true` if this is a VFS miss.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::FileNotFound { .. })
    }

    /// Returns `true` if this is a path validation error.
    #[must_use]
    pub const fn is_invalid_path(&self) -> bool {
        matches!(
            self,
            Self::InvalidPath { .. } | Self::PathNotRelative { .. } | Self::InvalidPathComponent { .. }
        )
    }
}

impl From<FilesError> for edgelink_core::Error {
    fn from(err: FilesError) -> Self {
        match err {
            FilesError::IoError { path, source } => Self::Io { path, source },
            FilesError::Serialization(source) => source.into(),
            other => Self::ValidationError {
                field: "path".to_string(),
                reason: other.to_string(),
            },
        }
    }
}

/// Result alias for file operations.
pub type Result<T> = std::result::Result<T, FilesError>;

/// A validated relative, forward-slash path.
///
/// Used both as VFS key and as module registry key, so two spellings of the
/// same file always compare equal.
///
/// # Examples
///
/// ```
/// use edgelink_files::FilePath;
///
/// let path = FilePath::new(r"chunks\routes\home.mjs").unwrap();
/// assert_eq!(path.as_str(), "chunks/routes/home.mjs");
/// assert_eq!(path.file_name(), "home.mjs");
///
/// assert!(FilePath::new("/etc/passwd").is_err());
/// assert!(FilePath::new("a/../b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct FilePath(String);

impl FilePath {
    /// Creates a path, normalizing backslashes and a leading `./`.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidPath` for empty input,
    /// `FilesError::PathNotRelative` for absolute paths and
    /// `FilesError::InvalidPathComponent` for `..`, `.` or empty segments.
    pub fn new(path: impl AsRef<str>) -> Result<Self> {
        let raw = path.as_ref();
        let normalized = raw.replace('\\', "/");
        let normalized = normalized.strip_prefix("./").unwrap_or(&normalized);

        if normalized.is_empty() {
            return Err(FilesError::InvalidPath {
                path: raw.to_string(),
            });
        }

        let bytes = normalized.as_bytes();
        let has_drive = bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':';
        if normalized.starts_with('/') || has_drive {
            return Err(FilesError::PathNotRelative {
                path: normalized.to_string(),
            });
        }

        if normalized
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(FilesError::InvalidPathComponent {
                path: normalized.to_string(),
            });
        }

        Ok(Self(normalized.to_string()))
    }

    /// Builds the path of `file` relative to `root`.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidPath` if `file` is not under `root` or a
    /// component is not valid UTF-8.
    pub fn relative_to(root: &Path, file: &Path) -> Result<Self> {
        let invalid = || FilesError::InvalidPath {
            path: file.display().to_string(),
        };
        let relative = file.strip_prefix(root).map_err(|_| invalid())?;

        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => segments.push(part.to_str().ok_or_else(invalid)?),
                _ => return Err(invalid()),
            }
        }
        Self::new(segments.join("/"))
    }

    /// Returns this path with `prefix` prepended.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefixed path is invalid.
    pub fn with_prefix(&self, prefix: &str) -> Result<Self> {
        Self::new(format!("{prefix}{}", self.0))
    }

    /// Returns the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the last segment.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Returns the directory part, or `""` for top-level files.
    #[must_use]
    pub fn dir(&self) -> &str {
        self.0.rfind('/').map_or("", |idx| &self.0[..idx])
    }

    /// Returns the extension of the last segment including the dot, if any.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        name.rfind('.').filter(|&idx| idx > 0).map(|idx| &name[idx..])
    }

    /// Returns `true` if the path lies in the public tree.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.0.starts_with(PUBLIC_PREFIX)
    }
}

impl fmt::Display for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::borrow::Borrow<str> for FilePath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for FilePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// MIME classification derived from the file extension alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MimeClass {
    /// `.js` / `.mjs`; the only class that can be linked as a module
    JavaScript,
    /// `.json`
    Json,
    /// `.html`
    Html,
    /// `.css`
    Css,
    /// `.svg`
    Svg,
    /// Anything else
    PlainText,
}

impl MimeClass {
    /// Classifies a path by extension.
    ///
    /// # Examples
    ///
    /// ```
    /// use edgelink_files::{FilePath, MimeClass};
    ///
    /// let path = FilePath::new("index.mjs").unwrap();
    /// assert_eq!(MimeClass::from_path(&path), MimeClass::JavaScript);
    ///
    /// let path = FilePath::new("LICENSE").unwrap();
    /// assert_eq!(MimeClass::from_path(&path), MimeClass::PlainText);
    /// ```
    #[must_use]
    pub fn from_path(path: &FilePath) -> Self {
        match path.extension() {
            Some(".js" | ".mjs") => Self::JavaScript,
            Some(".json") => Self::Json,
            Some(".html") => Self::Html,
            Some(".css") => Self::Css,
            Some(".svg") => Self::Svg,
            _ => Self::PlainText,
        }
    }

    /// Returns the MIME type string.
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::JavaScript => "application/javascript",
            Self::Json => "application/json",
            Self::Html => "text/html",
            Self::Css => "text/css",
            Self::Svg => "image/svg+xml",
            Self::PlainText => "text/plain",
        }
    }

    /// Returns `true` for classes that may be linked as modules.
    #[must_use]
    pub const fn is_executable_capable(&self) -> bool {
        matches!(self, Self::JavaScript)
    }
}

/// Which input tree a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// The compiled server tree
    Server,
    /// The public/static tree (paths carry [`PUBLIC_PREFIX`])
    Public,
}

/// One collected file. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    path: FilePath,
    content: String,
    mime: MimeClass,
    origin: Origin,
    executable: bool,
}

impl FileRecord {
    /// Creates a record, deriving MIME class and executability from the path.
    ///
    /// A record is executable only if it is executable-capable, came from
    /// the server tree and does not live under [`PUBLIC_PREFIX`].
    #[must_use]
    pub fn new(path: FilePath, content: impl Into<String>, origin: Origin) -> Self {
        let mime = MimeClass::from_path(&path);
        let executable =
            mime.is_executable_capable() && origin == Origin::Server && !path.is_public();
        Self {
            path,
            content: content.into(),
            mime,
            origin,
            executable,
        }
    }

    /// Relative path of the file.
    #[must_use]
    pub const fn path(&self) -> &FilePath {
        &self.path
    }

    /// Text content of the file.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// MIME classification.
    #[must_use]
    pub const fn mime(&self) -> MimeClass {
        self.mime
    }

    /// Tree the file came from.
    #[must_use]
    pub const fn origin(&self) -> Origin {
        self.origin
    }

    /// Whether the file is a server module to be linked.
    #[must_use]
    pub const fn is_executable(&self) -> bool {
        self.executable
    }

    /// Consumes the record, returning path and content.
    #[must_use]
    pub fn into_parts(self) -> (FilePath, String) {
        (self.path, self.content)
    }
}
