//! Command-line interface for arize

mod commands;
mod input;

pub use commands::*;
pub use input::*;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::dataframe::LogOptions;
use crate::models::{Environment, ModelType};

/// Arize - log model inferences from the command line
///
/// Validate a CSV or Arrow file against a column schema and upload it
/// to the Arize platform.
#[derive(Parser, Debug)]
#[command(name = "arize")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "ARIZE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of parallel jobs (default: number of CPUs)
    #[arg(short, long, global = true)]
    pub jobs: Option<usize>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate and upload a dataframe file
    Log(LogArgs),

    /// Validate a dataframe file without uploading it
    Validate(ValidateArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Input file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// Comma separated values with a header row
    Csv,
    /// Arrow IPC file or stream
    Arrow,
}

/// The dataframe and how to interpret it
#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    /// CSV or Arrow IPC file to log
    #[arg(required = true)]
    pub input: PathBuf,

    /// Column schema (TOML or JSON)
    #[arg(short, long)]
    pub schema: PathBuf,

    /// Model to log under
    #[arg(short, long)]
    pub model_id: String,

    /// Model type
    #[arg(short = 't', long, default_value = "score_categorical")]
    pub model_type: ModelType,

    /// Environment the data comes from
    #[arg(short, long, default_value = "production")]
    pub environment: Environment,

    /// Model version
    #[arg(long)]
    pub model_version: Option<String>,

    /// Batch id, required for the validation environment
    #[arg(short, long)]
    pub batch_id: Option<String>,

    /// Input format (default: from the file extension)
    #[arg(short, long, value_enum)]
    pub format: Option<InputFormat>,
}

impl DataArgs {
    /// Upload options described by the arguments
    pub fn options(&self) -> LogOptions {
        let mut options = LogOptions::new(&self.model_id, self.model_type, self.environment);
        options.model_version = self.model_version.clone();
        options.batch_id = self.batch_id.clone();
        options
    }
}

/// Arguments for the log command
#[derive(Parser, Debug, Clone)]
pub struct LogArgs {
    /// The dataframe to upload
    #[command(flatten)]
    pub data: DataArgs,

    /// Wait for the server to ingest the data
    #[arg(long)]
    pub sync: bool,

    /// Skip local validation
    #[arg(long)]
    pub no_validate: bool,

    /// Keep the uploaded Arrow stream at this path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone)]
pub struct ValidateArgs {
    /// The dataframe to check
    #[command(flatten)]
    pub data: DataArgs,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Configuration subcommand
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Reset configuration to defaults
    Reset,
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Initialize configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
