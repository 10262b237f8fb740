//! Command-line host for the synchronizer

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};
