//! Module specifier classification and resolution.
//!
//! A specifier is either relative (`./`, `../`), a platform builtin (carrying
//! the configured namespace marker, `node:` by default) or bare. Relative
//! specifiers are resolved by pure string arithmetic against the importing
//! module's directory; the filesystem is never consulted.

use edgelink_files::FilePath;

/// Builtin modules with a polyfill in the bundle preamble, and the
/// expression each one binds to.
pub const BUILTIN_POLYFILLS: &[(&str, &str)] = &[
    ("fs", "node_fs"),
    ("fs/promises", "node_fs.promises"),
    ("url", "node_url"),
    ("path", "node_path"),
];

/// Returns the polyfill expression for a builtin name, if one exists.
///
/// # Examples
///
/// ```
/// use edgelink_linker::specifier::polyfill_for;
///
/// assert_eq!(polyfill_for("path"), Some("node_path"));
/// assert_eq!(polyfill_for("crypto"), None);
/// ```
#[must_use]
pub fn polyfill_for(name: &str) -> Option<&'static str> {
    BUILTIN_POLYFILLS
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .map(|(_, polyfill)| *polyfill)
}

/// A classified specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Specifier {
    /// Relative reference, resolved to a registry key
    Relative(String),
    /// Builtin reference, with its polyfill if one exists
    Builtin {
        /// Name without the namespace marker
        name: String,
        /// Polyfill expression
        polyfill: Option<&'static str>,
    },
    /// Anything else; used verbatim as a registry key
    Bare(String),
}

/// Classifies and resolves `raw` as written in `importer`.
///
/// # Errors
///
/// Returns a reason string when a relative specifier climbs above the
/// server root.
///
/// # Examples
///
/// ```
/// use edgelink_files::FilePath;
/// use edgelink_linker::specifier::{Specifier, classify};
///
/// let importer = FilePath::new("chunks/routes/home.mjs").unwrap();
/// assert_eq!(
///     classify(&importer, "../_/nitro.mjs", "node:").unwrap(),
///     Specifier::Relative("chunks/_/nitro.mjs".to_string())
/// );
/// ```
pub fn classify(importer: &FilePath, raw: &str, builtin_prefix: &str) -> Result<Specifier, String> {
    if raw.starts_with("./") || raw.starts_with("../") {
        return resolve_relative(importer.dir(), raw).map(Specifier::Relative);
    }

    if let Some(name) = raw.strip_prefix(builtin_prefix).filter(|_| !builtin_prefix.is_empty()) {
        return Ok(Specifier::Builtin {
            name: name.to_string(),
            polyfill: polyfill_for(name),
        });
    }

    Ok(Specifier::Bare(raw.to_string()))
}

/// Resolves a relative specifier against the importing module's directory.
///
/// `./` keeps the directory; each `../` pops one segment. Interior `.`
/// segments are dropped and interior `..` segments pop as well.
///
/// # Errors
///
/// Returns a reason string if resolution climbs above the root or the
/// result is empty.
pub fn resolve_relative(importer_dir: &str, raw: &str) -> Result<String, String> {
    let mut segments: Vec<&str> = importer_dir.split('/').filter(|s| !s.is_empty()).collect();

    for segment in raw.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(format!("'{raw}' climbs above the server root"));
                }
            }
            name => segments.push(name),
        }
    }

    if segments.is_empty() {
        return Err(format!("'{raw}' does not name a module"));
    }
    Ok(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(p: &str) -> FilePath {
        FilePath::new(p).unwrap()
    }

    #[test]
    fn test_same_directory() {
        assert_eq!(
            classify(&path("chunks/_libs/a.mjs"), "./b.mjs", "node:").unwrap(),
            Specifier::Relative("chunks/_libs/b.mjs".to_string())
        );
        assert_eq!(
            classify(&path("index.mjs"), "./chunks/x.mjs", "node:").unwrap(),
            Specifier::Relative("chunks/x.mjs".to_string())
        );
    }

    #[test]
    fn test_parent_directory() {
        assert_eq!(
            resolve_relative("chunks/routes/api", "../../_/nitro.mjs").unwrap(),
            "chunks/_/nitro.mjs"
        );
        assert_eq!(resolve_relative("chunks", "../index.mjs").unwrap(), "index.mjs");
    }

    #[test]
    fn test_climbing_above_root_is_error() {
        let err = resolve_relative("chunks", "../../x.mjs").unwrap_err();
        assert!(err.contains("above the server root"));
    }

    #[test]
    fn test_builtins() {
        assert_eq!(
            classify(&path("a.mjs"), "node:fs/promises", "node:").unwrap(),
            Specifier::Builtin {
                name: "fs/promises".to_string(),
                polyfill: Some("node_fs.promises"),
            }
        );
        assert_eq!(
            classify(&path("a.mjs"), "node:crypto", "node:").unwrap(),
            Specifier::Builtin {
                name: "crypto".to_string(),
                polyfill: None,
            }
        );
    }

    #[test]
    fn test_bare() {
        assert_eq!(
            classify(&path("a.mjs"), "h3", "node:").unwrap(),
            Specifier::Bare("h3".to_string())
        );
        // without the marker a builtin name is just a bare specifier
        assert_eq!(
            classify(&path("a.mjs"), "fs", "node:").unwrap(),
            Specifier::Bare("fs".to_string())
        );
    }
}
