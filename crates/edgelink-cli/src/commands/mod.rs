//! Command implementations for the edgelink CLI.
//!
//! Each command module resolves its configuration, runs its operation and
//! formats output according to the requested format.

pub mod build;
pub mod common;
pub mod completions;
pub mod inspect;
