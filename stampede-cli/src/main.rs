use anyhow::Result;
use clap::Parser;
use stampede_logging::{init_logging_from_config, init_simple_tracing};
use tracing::info;

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands, ConfigCommands};
use commands::saturate::SaturateArgs;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = commands::load_config(cli.config.as_ref())?;

    match cli.log_level.as_deref() {
        Some(level) => init_simple_tracing(level)?,
        None => init_logging_from_config(&config.logging)?,
    }

    info!("Stampede CLI starting");

    match &cli.command {
        Commands::Run {
            plan,
            threads,
            recurrences,
            json,
        } => commands::run::run_command(&config, plan, *threads, *recurrences, *json).await,

        Commands::Saturate {
            plan,
            hosts,
            local,
            max_threads,
            increment,
            recurrences,
            threshold_ms,
            json,
        } => {
            let args = SaturateArgs {
                plan,
                hosts,
                local: *local,
                max_threads: *max_threads,
                increment: *increment,
                recurrences: *recurrences,
                threshold_ms: *threshold_ms,
                json: *json,
            };
            commands::saturate::saturate_command(&config, args).await
        }

        Commands::Config { config_cmd } => match config_cmd {
            ConfigCommands::Validate { config_file } => {
                commands::config::handle_config_validate(config_file)
            }
            ConfigCommands::Generate { output, force } => {
                commands::config::handle_config_generate(output, *force)
            }
            ConfigCommands::Show { format } => {
                commands::config::handle_config_show(cli.config.as_ref(), format)
            }
        },
    }
}
