//! Command-line interface for the CC: Tweaked language server.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tweaked-lsp")]
#[command(about = "Language server for CC: Tweaked Lua scripts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the Language Server Protocol (LSP) server on stdio
    #[command(alias = "lsp")]
    Serve {
        /// API catalog JSON to use instead of the embedded one
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Log filter for stderr, e.g. `debug` or `tweaked_lsp=trace`
        #[arg(long, default_value = "info")]
        log_level: String,

        /// Also send log events to the client as window/logMessage
        #[arg(long)]
        log_to_client: bool,
    },
    /// Load and validate an API catalog, then report what it indexes
    Check {
        /// API catalog JSON to check instead of the embedded one
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Print every indexed label
        #[arg(long)]
        list: bool,
    },
}
