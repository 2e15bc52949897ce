//! Splits collected records into modules to link and files to embed.

use crate::types::{FilePath, FileRecord, Origin};

/// Where a record ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Linked as a server module
    Executable,
    /// Embedded in the virtual filesystem
    Embeddable,
    /// Compiled client bundle found in the server tree; neither linked nor embedded
    Dropped,
}

/// Classification rules.
///
/// Extension and path prefix are the only signals, so script files from the
/// server tree that sit under the client asset prefix are dropped outright
/// instead of being trusted as either modules or server-side assets.
#[derive(Debug, Clone)]
pub struct Classifier {
    client_asset_prefix: String,
}

/// Output of [`Classifier::partition`], each list in collection order.
#[derive(Debug, Default)]
pub struct ClassifiedFiles {
    /// Server modules to link
    pub executable: Vec<FileRecord>,
    /// Files for the virtual filesystem
    pub embeddable: Vec<FileRecord>,
    /// Paths of dropped client bundles
    pub dropped: Vec<FilePath>,
}

impl Classifier {
    /// Creates a classifier dropping scripts under `client_asset_prefix`.
    #[must_use]
    pub fn new(client_asset_prefix: impl Into<String>) -> Self {
        Self {
            client_asset_prefix: client_asset_prefix.into(),
        }
    }

    /// Classifies one record.
    ///
    /// # Examples
    ///
    /// ```
    /// use edgelink_files::{Classification, Classifier, FilePath, FileRecord, Origin};
    ///
    /// let classifier = Classifier::new("public/assets/");
    /// let record = FileRecord::new(
    ///     FilePath::new("public/assets/entry.js").unwrap(),
    ///     "",
    ///     Origin::Server,
    /// );
    /// assert_eq!(classifier.classify(&record), Classification::Dropped);
    /// ```
    #[must_use]
    pub fn classify(&self, record: &FileRecord) -> Classification {
        let client_bundle = record.mime().is_executable_capable()
            && record.origin() == Origin::Server
            && record.path().as_str().starts_with(&self.client_asset_prefix);

        if client_bundle {
            Classification::Dropped
        } else if record.is_executable() {
            Classification::Executable
        } else {
            Classification::Embeddable
        }
    }

    /// Partitions records, preserving their relative order.
    #[must_use]
    pub fn partition(&self, records: Vec<FileRecord>) -> ClassifiedFiles {
        let mut classified = ClassifiedFiles::default();
        for record in records {
            match self.classify(&record) {
                Classification::Executable => classified.executable.push(record),
                Classification::Embeddable => classified.embeddable.push(record),
                Classification::Dropped => {
                    tracing::debug!("Dropping client bundle {}", record.path());
                    classified.dropped.push(record.path().clone());
                }
            }
        }

        tracing::info!(
            "Classified {} modules, {} static files, {} dropped client bundles",
            classified.executable.len(),
            classified.embeddable.len(),
            classified.dropped.len()
        );
        classified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str, origin: Origin) -> FileRecord {
        FileRecord::new(FilePath::new(path).unwrap(), "", origin)
    }

    #[test]
    fn test_server_script_is_executable() {
        let classifier = Classifier::new("public/assets/");
        assert_eq!(
            classifier.classify(&record("chunks/_/nitro.mjs", Origin::Server)),
            Classification::Executable
        );
    }

    #[test]
    fn test_non_script_is_embeddable() {
        let classifier = Classifier::new("public/assets/");
        assert_eq!(
            classifier.classify(&record("chunks/build/styles.css", Origin::Server)),
            Classification::Embeddable
        );
        assert_eq!(
            classifier.classify(&record("nitro.json", Origin::Server)),
            Classification::Embeddable
        );
    }

    #[test]
    fn test_public_tree_script_is_embeddable() {
        let classifier = Classifier::new("public/assets/");
        assert_eq!(
            classifier.classify(&record("public/assets/app.js", Origin::Public)),
            Classification::Embeddable
        );
    }

    #[test]
    fn test_server_tree_client_bundle_is_dropped() {
        let classifier = Classifier::new("public/assets/");
        assert_eq!(
            classifier.classify(&record("public/assets/app.js", Origin::Server)),
            Classification::Dropped
        );
        assert_eq!(
            classifier.classify(&record("public/assets/app.css", Origin::Server)),
            Classification::Embeddable
        );
    }

    #[test]
    fn test_partition_preserves_order() {
        let classifier = Classifier::new("public/assets/");
        let classified = classifier.partition(vec![
            record("b.mjs", Origin::Server),
            record("a.json", Origin::Server),
            record("a.mjs", Origin::Server),
            record("public/assets/x.js", Origin::Server),
            record("public/index.html", Origin::Public),
        ]);

        let executable: Vec<_> = classified.executable.iter().map(|r| r.path().as_str()).collect();
        let embeddable: Vec<_> = classified.embeddable.iter().map(|r| r.path().as_str()).collect();
        assert_eq!(executable, vec!["b.mjs", "a.mjs"]);
        assert_eq!(embeddable, vec!["a.json", "public/index.html"]);
        assert_eq!(classified.dropped.len(), 1);
    }
}
