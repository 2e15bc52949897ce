//! Linker configuration.
//!
//! [`LinkerConfig`] carries the input/output locations and the path
//! conventions the linker relies on. Every field has a default matching the
//! layout a Nitro build produces, so an empty `edgelink.toml` is valid.
//!
//! # Examples
//!
//! ```
//! use edgelink_core::LinkerConfig;
//!
//! let config = LinkerConfig::from_toml_str(r#"
//!     entry_module = "server.mjs"
//!     strict_references = true
//! "#).unwrap();
//!
//! assert_eq!(config.entry_module, "server.mjs");
//! assert_eq!(config.library_marker, "_libs");
//! assert!(config.strict_references);
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "edgelink.toml";

/// Configuration for one link run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkerConfig {
    /// Root of the compiled server tree.
    ///
    /// Default: `.output/server`
    pub server_dir: PathBuf,

    /// Root of the public/static tree. Its files are embedded under `public/`.
    ///
    /// Default: `.output/public`
    pub public_dir: PathBuf,

    /// Where the bundle is written. A leading `~` expands to the home directory.
    ///
    /// Default: `dist/deploy.ts`
    pub output: PathBuf,

    /// Relative path of the module that starts serving; always linked last.
    ///
    /// Default: `index.mjs`
    pub entry_module: String,

    /// Path substring marking library modules (linked first).
    ///
    /// Default: `_libs`
    pub library_marker: String,

    /// Path substring marking route modules (linked after libraries).
    ///
    /// Default: `_routes`
    pub route_marker: String,

    /// Sub-path holding compiled client bundles that must never run server-side.
    ///
    /// Default: `public/assets/`
    pub client_asset_prefix: String,

    /// Specifier prefix of platform builtin modules.
    ///
    /// Default: `node:`
    pub builtin_prefix: String,

    /// Host global whose presence identifies the edge platform.
    ///
    /// Default: `Bunny`
    pub edge_global: String,

    /// URL published to the application as its main module location.
    ///
    /// Default: `file:///server/index.mjs`
    pub main_url: String,

    /// Fail the build on builtin modules outside the polyfill table.
    ///
    /// Default: false (bind to an empty object and warn)
    pub strict_builtins: bool,

    /// Fail the build on static references the link order cannot satisfy.
    ///
    /// Default: false (warn)
    pub strict_references: bool,
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self {
            server_dir: PathBuf::from(".output/server"),
            public_dir: PathBuf::from(".output/public"),
            output: PathBuf::from("dist/deploy.ts"),
            entry_module: "index.mjs".to_string(),
            library_marker: "_libs".to_string(),
            route_marker: "_routes".to_string(),
            client_asset_prefix: "public/assets/".to_string(),
            builtin_prefix: "node:".to_string(),
            edge_global: "Bunny".to_string(),
            main_url: "file:///server/index.mjs".to_string(),
            strict_builtins: false,
            strict_references: false,
        }
    }
}

impl LinkerConfig {
    /// Parses a configuration from TOML text.
    ///
    /// Missing keys take their defaults; unknown keys are rejected.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the TOML is malformed or the
    /// resulting configuration fails [`validate`](Self::validate).
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::ConfigError {
            message: format!("invalid configuration: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and
    /// `Error::ConfigError` if its content is invalid.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Checks that every marker and path is usable.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` naming the first empty field.
    ///
    /// # Examples
    ///
    /// ```
    /// use edgelink_core::LinkerConfig;
    ///
    /// let mut config = LinkerConfig::default();
    /// assert!(config.validate().is_ok());
    ///
    /// config.route_marker.clear();
    /// assert!(config.validate().unwrap_err().is_config_error());
    /// ```
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("entry_module", self.entry_module.as_str()),
            ("library_marker", self.library_marker.as_str()),
            ("route_marker", self.route_marker.as_str()),
            ("client_asset_prefix", self.client_asset_prefix.as_str()),
            ("builtin_prefix", self.builtin_prefix.as_str()),
            ("edge_global", self.edge_global.as_str()),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::ConfigError {
                    message: format!("{field} cannot be empty"),
                });
            }
        }

        for (field, path) in [
            ("server_dir", &self.server_dir),
            ("public_dir", &self.public_dir),
            ("output", &self.output),
        ] {
            if path.as_os_str().is_empty() {
                return Err(Error::ConfigError {
                    message: format!("{field} cannot be empty"),
                });
            }
        }

        if !is_js_identifier(&self.edge_global) {
            return Err(Error::ConfigError {
                message: format!("edge_global '{}' is not an identifier", self.edge_global),
            });
        }

        Ok(())
    }
}

fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
