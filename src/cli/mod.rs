//! CLI layer for rengu-store.
//!
//! Provides the `rengu` command-line interface using clap, with commands
//! for querying, saving, and deleting objects in a store.

pub mod commands;
pub mod output;
pub mod parser;

#[cfg(feature = "http")]
pub use commands::execute;
pub use commands::run;
pub use output::OutputFormat;
pub use parser::{Cli, Commands};
