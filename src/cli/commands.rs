//! Command execution handlers

use std::path::Path;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use super::{read_batch, read_schema, ConfigArgs, ConfigCommands, LogArgs, ValidateArgs};
use crate::config::Config;
use crate::dataframe::{self, DataFrameClient};
use crate::error::{ArizeError, Result};

fn spinner(message: &'static str) -> ProgressBar {
    let style = ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());

    let pb = ProgressBar::new_spinner();
    pb.set_style(style);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Execute the log command
pub async fn execute_log(args: &LogArgs, config: &Config) -> Result<()> {
    let batch = read_batch(&args.data.input, args.data.format)?;
    let schema = read_schema(&args.data.schema)?;

    // Without --sync the client default from `network.sync` applies
    let mut options = args.data.options().with_validate(!args.no_validate);
    if args.sync {
        options = options.with_sync(true);
    }
    if let Some(ref output) = args.output {
        options = options.with_path(output);
    }
    if let Some(timeout) = args.timeout {
        options = options.with_timeout(Duration::from_secs(timeout));
    }

    let client = DataFrameClient::from_config(config)?;

    let pb = spinner("Uploading dataframe...");
    let result = client.log(&batch, &schema, &options).await;
    pb.finish_and_clear();
    let resp = result?;

    if !resp.is_success() {
        return Err(ArizeError::Network(format!(
            "upload rejected with status {}: {}",
            resp.status, resp.body
        )));
    }

    println!(
        "{} Logged {} rows for model {}",
        style("✓").green().bold(),
        batch.num_rows(),
        style(&options.model_id).bold()
    );
    if let Some(url) = resp.ingestion_url {
        println!("  {}", style(url).cyan());
    }
    Ok(())
}

/// Execute the validate command
pub async fn execute_validate(args: &ValidateArgs) -> Result<()> {
    let batch = read_batch(&args.data.input, args.data.format)?;
    let schema = read_schema(&args.data.schema)?;

    let prepared = dataframe::prepare(&batch, &schema, &args.data.options())?;

    println!(
        "{} {} rows valid for a {} model in {}",
        style("✓").green().bold(),
        prepared.batch.num_rows(),
        style(args.data.model_type).bold(),
        args.data.environment
    );
    println!("  Columns: {}", prepared.schema.used_columns().join(", "));
    Ok(())
}

/// Execute the config command against the file at `path`
pub async fn execute_config(args: &ConfigArgs, path: &Path) -> Result<()> {
    match &args.command {
        ConfigCommands::Show => {
            let config = Config::load_from(path)?;
            println!(
                "{}",
                toml::to_string_pretty(&config).map_err(|e| ArizeError::Config(e.to_string()))?
            );
        }
        ConfigCommands::Reset => {
            Config::reset_at(path)?;
            println!("Configuration reset to defaults");
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load_from(path)?;
            config.set(key, value)?;
            config.save_to(path)?;
            println!("Set {} = {}", key, value);
        }
        ConfigCommands::Get { key } => {
            let config = Config::load_from(path)?;
            if let Some(value) = config.get(key) {
                println!("{}", value);
            } else {
                println!("Key '{}' not found", key);
            }
        }
        ConfigCommands::Init { force } => {
            Config::init_at(path, *force)?;
            println!("Configuration initialized at {}", path.display());
        }
    }

    Ok(())
}
