//! CC: Tweaked language server entry point.

mod cli;

use std::path::Path;

use clap::Parser;
use cli::{Cli, Command};
use tweaked_lsp::lsp::symbol_index::SymbolIndex;
use tweaked_lsp::lsp::{ServeOptions, load_catalog, serve};

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            catalog,
            log_level,
            log_to_client,
        } => {
            let options = ServeOptions {
                catalog,
                log_level,
                log_to_client,
            };
            if let Err(e) = serve(&options) {
                eprintln!("LSP server error: {e}");
                std::process::exit(1);
            }
        }
        Command::Check { catalog, list } => {
            check_catalog(catalog.as_deref(), list);
        }
    }
}

fn check_catalog(path: Option<&Path>, list: bool) {
    let catalog = match load_catalog(path) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("Error loading catalog: {e}");
            std::process::exit(1);
        }
    };

    let index = SymbolIndex::build(&catalog);
    let source = path.map_or_else(|| "embedded".to_string(), |p| p.display().to_string());
    println!(
        "{source}: {} globals, {} modules, {} symbols",
        catalog.globals.len(),
        catalog.modules.len(),
        index.len()
    );

    if list {
        for symbol in index.symbols() {
            println!("  {}", symbol.label);
        }
    }
}
