//! # sinopia
//!
//! Sinopia - Reactive template binding in Rust.
//!
//! ## Name Origin
//!
//! **Sinopia** is the red-earth underdrawing a fresco painter lays on the
//! wall before the final plaster: the structure everything else is bound to.
//! This binary renders templates against JSON data and inspects their
//! compiled bindings.

mod commands;
mod config;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sinopia")]
#[command(about = "Reactive template binding in Rust", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file path (defaults to ./sinopia.config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bind a template to JSON data and print the rendered markup
    Render(commands::render::RenderArgs),

    /// Print the compiled binding map of a template
    Inspect(commands::inspect::InspectArgs),
}

/// Log to stderr, filtered by `SINOPIA_LOG` (default `warn`).
fn init_logging() {
    let filter = EnvFilter::try_from_env("SINOPIA_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let config = config::load_config(cli.config.as_deref());

    match cli.command {
        Commands::Render(args) => commands::render::run(args, &config),
        Commands::Inspect(args) => commands::inspect::run(args, &config),
    }
}
