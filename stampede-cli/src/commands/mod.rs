//! Subcommand implementations

pub mod config;
pub mod run;
pub mod saturate;

use anyhow::{Context, Result};
use stampede_config::{ConfigLoader, StampedeConfig};
use stampede_core::PlanDefinition;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Load configuration from file or use defaults
pub fn load_config(config_path: Option<&PathBuf>) -> Result<StampedeConfig> {
    let loader = ConfigLoader::new();

    match config_path {
        Some(path) if path.exists() => {
            info!("Loading configuration from: {:?}", path);
            loader
                .from_file(path)
                .with_context(|| format!("Failed to load configuration from {:?}", path))
        }
        Some(path) => {
            warn!("Configuration file not found: {:?}. Using defaults.", path);
            loader
                .from_env()
                .context("Failed to load configuration from environment")
        }
        None => {
            debug!("No configuration file specified. Loading from environment or defaults.");
            loader
                .from_env()
                .context("Failed to load configuration from environment")
        }
    }
}

/// Read a plan document; `.json` files are parsed as JSON, everything else as YAML
pub fn load_plan(path: &Path) -> Result<PlanDefinition> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read plan {:?}", path))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let plan = if is_json {
        PlanDefinition::from_json(&text)
    } else {
        PlanDefinition::from_yaml(&text)
    };
    plan.with_context(|| format!("Invalid plan {:?}", path))
}
