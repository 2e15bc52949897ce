//! Input collection and the embedded virtual filesystem for edgelink.
//!
//! The pipeline front half lives here:
//!
//! 1. [`FileCollector`] walks the server and public trees into [`FileRecord`]s
//! 2. [`Classifier`] splits them into modules to link, files to embed and
//!    client bundles to drop
//! 3. [`VfsBuilder`] turns the embeddable records into a [`VirtualFs`]
//!
//! # Examples
//!
//! ```
//! use edgelink_files::{Classifier, FilePath, FileRecord, Origin, VfsBuilder};
//!
//! let records = vec![
//!     FileRecord::new(FilePath::new("index.mjs").unwrap(), "export {};", Origin::Server),
//!     FileRecord::new(FilePath::new("public/robots.txt").unwrap(), "", Origin::Public),
//! ];
//!
//! let classified = Classifier::new("public/assets/").partition(records);
//! let vfs = VfsBuilder::from_records(classified.embeddable).build().unwrap();
//!
//! assert_eq!(classified.executable.len(), 1);
//! assert!(vfs.exists("robots.txt"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod builder;
pub mod classifier;
pub mod collector;
pub mod types;
pub mod vfs;

pub use builder::VfsBuilder;
pub use classifier::{Classification, ClassifiedFiles, Classifier};
pub use collector::{FileCollector, collect_inputs};
pub use types::{FilePath, FileRecord, FilesError, MimeClass, Origin, PUBLIC_PREFIX, Result};
pub use vfs::{LookupStage, VfsHit, VirtualFs};
