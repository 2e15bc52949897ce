//! edgelink CLI library.
//!
//! Exposes the argument definitions, commands and formatters behind the
//! `edgelink` binary so they can be tested.

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::unused_async)]

pub mod cli;
pub mod commands;
pub mod formatters;
pub mod runner;

pub use cli::{Cli, Commands, LinkArgs};
