//! Window activity report CLI library.
//!
//! This crate provides the `wl` command-line interface over the core
//! accounting engine.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
