//! `stampede config`

use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use stampede_config::StampedeConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::commands::load_config;

pub fn handle_config_validate(config_file: &Path) -> Result<()> {
    info!("Validating configuration file: {:?}", config_file);

    if !config_file.exists() {
        return Err(anyhow!("Configuration file not found: {:?}", config_file));
    }

    match load_config(Some(&config_file.to_path_buf())) {
        Ok(_) => {
            println!("{} Configuration file is valid", "✓".green());
            Ok(())
        }
        Err(e) => {
            println!("{} Configuration validation failed: {:#}", "✗".red(), e);
            error!("Configuration validation failed: {:#}", e);
            Err(e)
        }
    }
}

pub fn handle_config_generate(output: &Path, force: bool) -> Result<()> {
    info!("Generating configuration at: {:?}", output);

    if output.exists() && !force {
        return Err(anyhow!(
            "Output file already exists: {:?}. Use --force to overwrite.",
            output
        ));
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }

    fs::write(output, StampedeConfig::generate_sample()).context("Failed to write configuration file")?;

    println!("{} Configuration generated at: {:?}", "✓".green(), output);
    println!("Validate with: stampede config validate --config-file {:?}", output);
    Ok(())
}

pub fn handle_config_show(config_file: Option<&PathBuf>, format: &str) -> Result<()> {
    let config = load_config(config_file)?;
    println!("{}", render_config(&config, format)?);
    Ok(())
}

fn render_config(config: &StampedeConfig, format: &str) -> Result<String> {
    match format.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml::to_string(config).context("Failed to serialize to YAML"),
        "json" => serde_json::to_string_pretty(config).context("Failed to serialize to JSON"),
        other => Err(anyhow!(
            "Unknown output format: {}. Valid formats: yaml, json",
            other
        )),
    }
}
