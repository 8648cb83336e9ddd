//! CLI command definitions for cslrun-config
//!
//! The main entry point is the `Cli` struct, built with clap's derive macros.

use crate::format::OutputFormat;
use clap::{Args, Parser, Subcommand};

/// Resolve and inspect cslrun configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the resolved configuration (default if no subcommand given)
    Show(ShowArgs),

    /// Write the default ~/.cslrun.yaml
    Init(InitArgs),

    /// Show which config files were used and the resulting mode
    Where,
}

/// Arguments for the show subcommand
#[derive(Args, Debug, Default)]
pub struct ShowArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,
}

/// Arguments for the init subcommand
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing ~/.cslrun.yaml
    #[arg(long)]
    pub force: bool,
}
