//! Setsync CLI Binary
//!
//! Command-line interface for content-addressed directory synchronization.

use clap::Parser;
use setsync::cli::{Cli, RunContext};
use setsync::config::ConfigLoader;
use setsync::logging::{init_logging, LoggingConfig};
use setsync::workspace::Workspace;
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    // Build logging config from CLI args and config files
    let logging_config = build_logging_config(&cli);

    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("Setsync CLI starting");

    let context = match RunContext::new(cli.workspace.clone(), cli.config.clone(), cli.yes) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Error initializing CLI context: {:#}", e);
            eprintln!("{}", setsync::cli::map_error(&e));
            process::exit(1);
        }
    };

    match context.execute(&cli.command) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("{}", setsync::cli::map_error(&e));
            process::exit(1);
        }
    }
}

/// Build logging configuration from CLI args and config files.
/// Precedence: CLI flags override config files override defaults.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let mut config = if let Some(ref config_path) = cli.config {
        ConfigLoader::load_from_file(config_path)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default()
    } else {
        let root = Workspace::discover_root(&cli.workspace).unwrap_or_else(|_| cli.workspace.clone());
        ConfigLoader::load(&root)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default()
    };

    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = file.clone();
    }

    config
}
