//! nat64plot - charts and summary tables for NAT64/DNS64 measurements
//!
//! A CLI tool that reads ping logs and iperf3 JSON reports of translator
//! measurement runs and renders SVG charts plus CSV, LaTeX and JSON
//! summary tables.
//!
//! Exit codes:
//!   0 - Success (including runs where no data was found)
//!   1 - Runtime error (missing input folder, unwritable output, etc.)
//!   2 - Invalid arguments

mod analysis;
mod cli;
mod commands;
mod config;
mod error;
mod models;
mod parser;
mod report;
mod scanner;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(2);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("nat64plot v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(&args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .nat64plot.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to customize folders, scenarios, colours, and more.");
    Ok(())
}

/// Initialize the tracing subscriber for logging.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the selected subcommand. Returns the exit code.
fn run(args: &Args) -> Result<i32> {
    let start_time = Instant::now();

    let Some(ref command) = args.command else {
        anyhow::bail!("No subcommand given");
    };

    // Load configuration
    let mut config = load_config(args)?;
    config.merge_with_args(args);
    config.validate()?;

    let ctx = commands::Context::new(&config, args.show_progress());

    // Handle --dry-run: scan files and exit
    if args.dry_run {
        return commands::dry_run(command, &ctx);
    }

    let exit_code = commands::run(command, &ctx)?;

    info!(
        "{} finished in {:.2}s",
        command.name(),
        start_time.elapsed().as_secs_f64()
    );
    Ok(exit_code)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
