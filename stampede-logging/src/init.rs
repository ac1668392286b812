use anyhow::Result;
use stampede_config::{LogFormat, LogLevel, LoggingConfig};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Map a configured level onto the tracing level
pub fn to_tracing_level(level: LogLevel) -> Level {
    match level {
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    }
}

/// Filter built from the level plus any extra directives, falling back to
/// `RUST_LOG` and then `info` when the result does not parse
pub fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    let mut filter = config.level.to_string();
    for directive in &config.directives {
        filter.push(',');
        filter.push_str(directive.trim());
    }

    EnvFilter::try_new(&filter)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize logging from configuration
pub fn init_logging_from_config(config: &LoggingConfig) -> Result<()> {
    let env_filter = build_env_filter(config);
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);

    // Use try_init to avoid panic if global subscriber already set
    let installed = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    if installed.is_err() {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(())
}

/// Initialize simple tracing for basic console output
pub fn init_simple_tracing(log_level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_new(log_level)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .is_err()
    {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(())
}
