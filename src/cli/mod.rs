//! CLI layer for scour-rs.
//!
//! Provides the command-line interface using clap, with commands for
//! running research questions, scaffolding prompt templates, and
//! inspecting configuration.

pub mod commands;
pub mod parser;

pub use commands::{OutputFormat, execute};
pub use parser::{Cli, Commands, ConfigCommands, PromptCommands};
