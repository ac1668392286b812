//! `stampede run`

use anyhow::{Context, Result};
use stampede_config::StampedeConfig;
use stampede_core::Recurrence;
use stampede_execution::ExecutionEnvironment;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::commands::load_plan;
use crate::output;

pub async fn run_command(
    config: &StampedeConfig,
    plan_path: &Path,
    threads: Option<usize>,
    recurrences: Option<u64>,
    json: bool,
) -> Result<()> {
    let definition = load_plan(plan_path)?;
    let registry = stampede_plugins::builtin_registry();
    let plan = definition
        .build(&registry)
        .with_context(|| format!("Failed to build plan '{}'", definition.name))?;

    let threads = threads.unwrap_or(config.execution.default_workers);
    let recurrences = recurrences.unwrap_or(config.execution.default_recurrences);

    let environment = ExecutionEnvironment::new(Arc::new(plan), Recurrence::times(recurrences), threads)
        .context("Failed to create execution environment")?
        .with_config(&config.execution);

    info!(
        "Running plan '{}' with {} threads x {} recurrences",
        definition.name, threads, recurrences
    );

    // Ctrl-C stops every executor at its next recurrence boundary
    let interrupt = environment.interrupt_flag();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping executors");
            interrupt.interrupt();
        }
    });

    let outcome = environment.execute().await;
    watcher.abort();

    let result = outcome.context("Plan execution failed")?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialize result")?
        );
    } else {
        output::print_environment_result(&result);
    }

    Ok(())
}
