//! CLI subcommand implementations.

pub mod focus;
pub mod idles;
pub mod plot;
pub mod util;
