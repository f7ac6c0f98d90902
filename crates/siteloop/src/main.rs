//! siteloop CLI - static site development loop.
//!
//! Provides commands for:
//! - `serve`: Watch the project, rebuild on change and serve the output with
//!   live reload
//! - `build`: Run the project's build command once

mod browser;
mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BuildArgs, ServeArgs};
use error::CliError;
use output::Output;

/// Log filter for `serve --debug`.
const DEBUG_FILTER: &str = "info,siteloop=debug,siteloop_build=debug,siteloop_config=debug,\
                            siteloop_server=debug,siteloop_watch=debug,tower_http=debug";

/// siteloop - rebuild and live reload a static site while editing it.
#[derive(Parser)]
#[command(name = "siteloop", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch, rebuild and serve the site with live reload.
    Serve(ServeArgs),
    /// Build the site once.
    Build(BuildArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let debug = matches!(&cli.command, Commands::Serve(args) if args.debug);

    // --debug enables debug logs for siteloop and HTTP access logs,
    // otherwise use RUST_LOG or default to INFO
    let filter = if debug {
        EnvFilter::new(DEBUG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Serve(args) => tokio::runtime::Runtime::new()
            .map_err(CliError::from)
            .and_then(|rt| rt.block_on(args.execute())),
        Commands::Build(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
