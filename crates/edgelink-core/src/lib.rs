//! Core types for edgelink.
//!
//! edgelink collapses a compiled server application (a tree of small
//! modules plus static assets) into one self-contained script for an edge
//! platform that accepts a single uploaded file. This crate holds the pieces
//! every other crate shares:
//!
//! - [`Error`] / [`Result`]: the fatal build error taxonomy
//! - [`LinkerConfig`]: input/output locations and path conventions
//! - [`cli`]: output format and exit code types for the binary

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod cli;
pub mod config;
pub mod error;

pub use config::{DEFAULT_CONFIG_FILE, LinkerConfig};
pub use error::{Error, Result};
