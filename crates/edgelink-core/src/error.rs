//! Error types for the edgelink linker.
//!
//! Every fatal build condition is an [`Error`] variant. A build that returns
//! an error never writes a bundle.
//!
//! # Examples
//!
//! ```
//! use edgelink_core::{Error, Result};
//!
//! fn require_marker(marker: &str) -> Result<()> {
//!     if marker.is_empty() {
//!         return Err(Error::ConfigError {
//!             message: "library marker cannot be empty".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//!
//! let err = require_marker("").unwrap_err();
//! assert!(err.is_config_error());
//! ```

use thiserror::Error;

/// Main error type for edgelink.
///
/// All library crates in the workspace report failures through this type.
#[derive(Error, Debug)]
pub enum Error {
    /// Reading an input file or writing the bundle failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path of the file or directory involved
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A module contains an `import`/`export` form the rewriter does not handle.
    ///
    /// The rewriter only understands a narrow set of shapes and refuses to
    /// guess at anything else.
    #[error("unsupported module syntax in {module} at line {line}: {message}")]
    UnsupportedSyntax {
        /// Relative path of the offending module
        module: String,
        /// 1-based line number of the statement
        line: usize,
        /// What was found
        message: String,
    },

    /// A static reference cannot be satisfied by the link order.
    ///
    /// Only raised when `strict_references` is enabled.
    #[error("unresolved reference '{specifier}' in {module}: {reason}")]
    UnresolvedReference {
        /// Module containing the reference
        module: String,
        /// Specifier as written in the source
        specifier: String,
        /// Why it cannot be satisfied
        reason: String,
    },

    /// A builtin module outside the polyfill table was referenced.
    ///
    /// Only raised when `strict_builtins` is enabled.
    #[error("unknown builtin module '{name}' referenced from {module}")]
    UnknownBuiltin {
        /// Module containing the reference
        module: String,
        /// Builtin name without the namespace marker
        name: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration problem
        message: String,
    },

    /// Invalid argument error.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Validation error for domain types such as relative file paths.
    #[error("Validation error in {field}: {reason}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Detailed reason for the validation failure
        reason: String,
    },

    /// Template registration or rendering failed.
    #[error("Template error: {message}")]
    TemplateError {
        /// Description of the template failure
        message: String,
    },

    /// Serialization error.
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Description of the serialization failure
        message: String,
        /// Underlying serde error
        #[source]
        source: Option<serde_json::Error>,
    },
}

impl Error {
    /// Returns `true` if this is an I/O error.
    #[must_use]
    pub const fn is_io_error(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns `true` if this is an unsupported syntax error.
    ///
    /// # Examples
    ///
    /// ```
    /// use edgelink_core::Error;
    ///
    /// let err = Error::UnsupportedSyntax {
    ///     module: "chunks/a.mjs".to_string(),
    ///     line: 3,
    ///     message: "import type".to_string(),
    /// };
    /// assert!(err.is_unsupported_syntax());
    /// ```
    #[must_use]
    pub const fn is_unsupported_syntax(&self) -> bool {
        matches!(self, Self::UnsupportedSyntax { .. })
    }

    /// Returns `true` if this is an unresolved reference error.
    #[must_use]
    pub const fn is_unresolved_reference(&self) -> bool {
        matches!(self, Self::UnresolvedReference { .. })
    }

    /// Returns `true` if this is an unknown builtin error.
    #[must_use]
    pub const fn is_unknown_builtin(&self) -> bool {
        matches!(self, Self::UnknownBuiltin { .. })
    }

    /// Returns `true` if this is a configuration error.
    ///
    /// # Examples
    ///
    /// ```
    /// use edgelink_core::Error;
    ///
    /// let err = Error::ConfigError {
    ///     message: "empty entry module".to_string(),
    /// };
    /// assert!(err.is_config_error());
    /// ```
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigError { .. })
    }

    /// Returns `true` if this is a validation error.
    #[must_use]
    pub const fn is_validation_error(&self) -> bool {
        matches!(self, Self::ValidationError { .. })
    }

    /// Returns `true` if this is a template error.
    #[must_use]
    pub const fn is_template_error(&self) -> bool {
        matches!(self, Self::TemplateError { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::SerializationError {
            message: source.to_string(),
            source: Some(source),
        }
    }
}

/// Result type alias for edgelink operations.
pub type Result<T> = std::result::Result<T, Error>;
