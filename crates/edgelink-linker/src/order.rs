//! Link order for executable modules.
//!
//! Modules are bucketed by path convention and stably sorted, so library
//! modules register before the routes that import them and the entry module,
//! which starts serving, runs last. Pairs inside one bucket keep their
//! collection order.

use edgelink_core::LinkerConfig;
use edgelink_files::{FilePath, FileRecord};
use serde::Serialize;

/// Ordering bucket of a module. Lower sorts earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkPriority {
    /// Path contains the library marker
    Library,
    /// Path contains the route marker
    Route,
    /// Everything else
    Other,
    /// The application entry module
    Entry,
}

/// Computes [`LinkPriority`] and sorts modules by it.
#[derive(Debug, Clone)]
pub struct Orderer {
    entry_module: String,
    library_marker: String,
    route_marker: String,
}

impl Orderer {
    /// Creates an orderer from the path conventions in `config`.
    #[must_use]
    pub fn new(config: &LinkerConfig) -> Self {
        Self {
            entry_module: config.entry_module.clone(),
            library_marker: config.library_marker.clone(),
            route_marker: config.route_marker.clone(),
        }
    }

    /// Returns the bucket of `path`.
    ///
    /// The entry test wins over both markers, and the library marker wins
    /// over the route marker.
    ///
    /// # Examples
    ///
    /// ```
    /// use edgelink_core::LinkerConfig;
    /// use edgelink_files::FilePath;
    /// use edgelink_linker::order::{LinkPriority, Orderer};
    ///
    /// let orderer = Orderer::new(&LinkerConfig::default());
    /// let path = FilePath::new("chunks/_libs/h3.mjs").unwrap();
    /// assert_eq!(orderer.priority(&path), LinkPriority::Library);
    /// ```
    #[must_use]
    pub fn priority(&self, path: &FilePath) -> LinkPriority {
        let path = path.as_str();
        if path == self.entry_module {
            LinkPriority::Entry
        } else if path.contains(&self.library_marker) {
            LinkPriority::Library
        } else if path.contains(&self.route_marker) {
            LinkPriority::Route
        } else {
            LinkPriority::Other
        }
    }

    /// Sorts `records` into link order.
    ///
    /// A missing entry module is logged; nothing is then forced last.
    #[must_use]
    pub fn order(&self, mut records: Vec<FileRecord>) -> Vec<FileRecord> {
        records.sort_by_key(|record| self.priority(record.path()));

        if records
            .last()
            .is_none_or(|record| self.priority(record.path()) != LinkPriority::Entry)
        {
            tracing::warn!(
                "Entry module {} not found among executable modules; nothing is forced last",
                self.entry_module
            );
        }

        for (position, record) in records.iter().enumerate() {
            tracing::debug!("Link #{position}: {}", record.path());
        }
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgelink_files::Origin;

    fn records(paths: &[&str]) -> Vec<FileRecord> {
        paths
            .iter()
            .map(|p| FileRecord::new(FilePath::new(p).unwrap(), "", Origin::Server))
            .collect()
    }

    fn ordered(paths: &[&str]) -> Vec<String> {
        Orderer::new(&LinkerConfig::default())
            .order(records(paths))
            .iter()
            .map(|r| r.path().to_string())
            .collect()
    }

    #[test]
    fn test_buckets() {
        assert_eq!(
            ordered(&["index.mjs", "chunks/_routes/home.mjs", "chunks/nitro.mjs", "chunks/_libs/util.mjs"]),
            vec!["chunks/_libs/util.mjs", "chunks/_routes/home.mjs", "chunks/nitro.mjs", "index.mjs"]
        );
    }

    #[test]
    fn test_stable_within_bucket() {
        assert_eq!(
            ordered(&["b/_libs/z.mjs", "a/_libs/y.mjs", "c.mjs", "b.mjs"]),
            vec!["b/_libs/z.mjs", "a/_libs/y.mjs", "c.mjs", "b.mjs"]
        );
    }

    #[test]
    fn test_library_marker_wins_over_route_marker() {
        let orderer = Orderer::new(&LinkerConfig::default());
        let path = FilePath::new("_routes/_libs/x.mjs").unwrap();
        assert_eq!(orderer.priority(&path), LinkPriority::Library);
    }

    #[test]
    fn test_entry_is_exact_match() {
        let orderer = Orderer::new(&LinkerConfig::default());
        assert_eq!(
            orderer.priority(&FilePath::new("index.mjs").unwrap()),
            LinkPriority::Entry
        );
        assert_eq!(
            orderer.priority(&FilePath::new("chunks/index.mjs").unwrap()),
            LinkPriority::Other
        );
    }

    #[test]
    fn test_missing_entry_keeps_other_order() {
        assert_eq!(
            ordered(&["x.mjs", "_routes/r.mjs"]),
            vec!["_routes/r.mjs", "x.mjs"]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(ordered(&[]).is_empty());
    }
}
