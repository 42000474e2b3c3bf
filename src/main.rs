//! Arize - log model inferences from the command line
//!
//! Main entry point for the arize CLI application.

use std::path::PathBuf;
use std::process::ExitCode;

use console::style;
use tracing_subscriber::EnvFilter;

use arize::cli::{self, Cli, Commands};
use arize::config::Config;
use arize::error::Result;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    let config_path = match config_path(&cli) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            return ExitCode::FAILURE;
        }
    };
    let config = match Config::load_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    setup_logging(&cli, &config);

    match run(cli, config, config_path).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn config_path(cli: &Cli) -> Result<PathBuf> {
    match cli.config {
        Some(ref path) => Ok(path.clone()),
        None => Config::config_path(),
    }
}

/// Set up logging based on CLI arguments and the configured level
fn setup_logging(cli: &Cli, config: &Config) {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        config.logging.level.as_str()
    };

    console::set_colors_enabled(config.logging.color);
    console::set_colors_enabled_stderr(config.logging.color);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(config.logging.color)
        .without_time()
        .init();
}

/// Main application logic
async fn run(cli: Cli, config: Config, config_path: PathBuf) -> Result<()> {
    // Bulk record conversion runs on the global rayon pool
    if let Some(jobs) = cli.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    match cli.command {
        Commands::Log(args) => cli::execute_log(&args, &config).await,
        Commands::Validate(args) => cli::execute_validate(&args).await,
        Commands::Config(args) => cli::execute_config(&args, &config_path).await,
    }
}
