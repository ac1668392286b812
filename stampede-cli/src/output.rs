//! Human-readable rendering of results

use colored::Colorize;
use stampede_core::PlanEnvironmentResult;
use stampede_saturation::{SaturationOutcome, SaturationReport};
use std::time::Duration;

fn ms(duration: Duration) -> String {
    format!("{:.1}ms", duration.as_secs_f64() * 1000.0)
}

pub fn print_environment_result(result: &PlanEnvironmentResult) {
    let status = if result.success {
        "SUCCESS".green().bold()
    } else {
        "ERRORS".yellow().bold()
    };

    println!("{} plan '{}' ({})", status, result.plan_name, result.environment_id);
    println!(
        "  executors: {}  recurrences: {}  errors: {}  wall time: {}",
        result.executor_ids.len(),
        result.recurrences_run,
        result.error_count,
        ms(result.duration())
    );
    println!(
        "  min {}  avg {}  median {}  max {}",
        ms(result.stats.min),
        ms(result.stats.average),
        ms(result.stats.median),
        ms(result.stats.max)
    );
}

pub fn print_saturation_report(report: &SaturationReport) {
    println!("Saturation ramp for plan '{}'", report.plan_name.bold());

    for round in &report.rounds {
        println!("\nround {} ({} threads)", round.number, round.thread_count);
        for host in &round.hosts {
            let median = if host.exceeds_threshold {
                ms(host.median()).red().bold()
            } else {
                ms(host.median()).normal()
            };
            println!(
                "  {:<24} min {:>10}  median {:>10}  max {:>10}  errors {}",
                host.host,
                ms(host.stats.min),
                median,
                ms(host.stats.max),
                host.error_count
            );
        }
        for failure in &round.failures {
            println!(
                "  {:<24} {} {}",
                failure.host,
                format!("{} failed:", failure.stage).yellow(),
                failure.message
            );
        }
    }

    let summary = report.outcome.to_string();
    let summary = match report.outcome {
        SaturationOutcome::Saturated { .. } => summary.red().bold(),
        SaturationOutcome::NotSaturated { .. } => summary.green().bold(),
        SaturationOutcome::Cancelled { .. } => summary.yellow(),
    };
    println!("\n{}", summary);
}
