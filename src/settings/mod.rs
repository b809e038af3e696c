//! Settings come from a TOML file plus `TOKENBIND__*` environment overrides.

mod cli;
pub use clap::{Parser, Subcommand};
pub use cli::*;

mod settings;
pub use settings::*;
