//! CLI module for algoviz - command-line interface and subcommands.
//!
//! `generate` (the default) runs the repair loop; `design` only produces a
//! visual metaphor.

pub mod commands;

pub use commands::Cli;
