//! `stampede saturate`

use anyhow::{Context, Result};
use stampede_config::StampedeConfig;
use stampede_core::RemoteEnvironment;
use stampede_execution::LocalHost;
use stampede_http::HttpRemote;
use stampede_saturation::{
    poll_retry_policy, RetryingRemote, SaturationController, SaturationSettings,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::commands::load_plan;
use crate::output;

/// Host name used for in-process rounds
const LOCAL_HOST: &str = "local";

pub struct SaturateArgs<'a> {
    pub plan: &'a Path,
    pub hosts: &'a [String],
    pub local: bool,
    pub max_threads: Option<usize>,
    pub increment: Option<usize>,
    pub recurrences: Option<u64>,
    pub threshold_ms: Option<u64>,
    pub json: bool,
}

pub async fn saturate_command(config: &StampedeConfig, args: SaturateArgs<'_>) -> Result<()> {
    let plan = load_plan(args.plan)?;
    let settings = build_settings(config, &args)?;

    let remote = build_remote(config, args.local)?;
    let controller = SaturationController::new(remote, plan, settings)
        .context("Invalid saturation settings")?;

    info!(
        "Saturation ramp over {} host(s), waiting {:?} per round",
        controller.settings().hosts.len(),
        controller.round_wait()
    );

    let handle = controller.handle();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current round");
            handle.cancel();
        }
    });

    let report = controller.run().await;
    watcher.abort();

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
    } else {
        output::print_saturation_report(&report);
    }

    Ok(())
}

fn build_settings(config: &StampedeConfig, args: &SaturateArgs<'_>) -> Result<SaturationSettings> {
    let mut saturation = config.saturation.clone();

    if args.local {
        saturation.hosts = vec![LOCAL_HOST.to_string()];
    } else if !args.hosts.is_empty() {
        saturation.hosts = args.hosts.to_vec();
    }
    if let Some(max_threads) = args.max_threads {
        saturation.max_threads = max_threads;
    }
    if let Some(increment) = args.increment {
        saturation.thread_increment = increment;
    }
    if let Some(recurrences) = args.recurrences {
        saturation.recurrences = recurrences;
    }
    if let Some(threshold) = args.threshold_ms {
        saturation.max_runtime_threshold = Duration::from_millis(threshold);
    }

    SaturationSettings::from_config(&saturation).context("Invalid saturation settings")
}

fn build_remote(config: &StampedeConfig, local: bool) -> Result<Arc<dyn RemoteEnvironment>> {
    let retry = config.saturation.poll_retry.as_ref().map(poll_retry_policy);

    if local {
        let host = LocalHost::with_config(stampede_plugins::builtin_registry(), config.execution.clone());
        let remote: Arc<dyn RemoteEnvironment> = match retry {
            Some(policy) => Arc::new(RetryingRemote::new(host, policy)),
            None => Arc::new(host),
        };
        return Ok(remote);
    }

    let http = HttpRemote::from_config(&config.http).context("Failed to create HTTP client")?;
    let remote: Arc<dyn RemoteEnvironment> = match retry {
        Some(policy) => Arc::new(RetryingRemote::new(http, policy)),
        None => Arc::new(http),
    };
    Ok(remote)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args<'a>(hosts: &'a [String], local: bool) -> SaturateArgs<'a> {
        SaturateArgs {
            plan: Path::new("plan.yaml"),
            hosts,
            local,
            max_threads: Some(12),
            increment: None,
            recurrences: Some(3),
            threshold_ms: Some(250),
            json: false,
        }
    }

    #[test]
    fn test_flags_override_config() {
        let hosts = vec!["a:8080".to_string()];
        let settings = build_settings(&StampedeConfig::default(), &args(&hosts, false)).unwrap();

        assert_eq!(settings.hosts, hosts);
        assert_eq!(settings.max_threads, 12);
        assert_eq!(settings.thread_increment, 8);
        assert_eq!(settings.recurrences, 3);
        assert_eq!(settings.max_runtime_threshold, Duration::from_millis(250));
    }

    #[test]
    fn test_local_uses_single_host() {
        let settings = build_settings(&StampedeConfig::default(), &args(&[], true)).unwrap();
        assert_eq!(settings.hosts, vec![LOCAL_HOST.to_string()]);
    }

    #[test]
    fn test_no_hosts_is_rejected() {
        assert!(build_settings(&StampedeConfig::default(), &args(&[], false)).is_err());
    }
}
