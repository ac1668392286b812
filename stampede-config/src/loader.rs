//! Configuration loading and environment variable handling

use crate::domains::StampedeConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "STAMPEDE".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<StampedeConfig> {
        let path = path.as_ref();
        log::debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        self.from_yaml(&content)
    }

    /// Parse YAML text, then apply environment overrides and validate
    pub fn from_yaml(&self, content: &str) -> ConfigResult<StampedeConfig> {
        let mut config: StampedeConfig = serde_yaml::from_str(content)?;
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<StampedeConfig> {
        let mut config = StampedeConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<StampedeConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut StampedeConfig) -> ConfigResult<()> {
        self.apply_execution_overrides(&mut config.execution)?;
        self.apply_saturation_overrides(&mut config.saturation)?;
        self.apply_http_overrides(&mut config.http)?;
        self.apply_logging_overrides(&mut config.logging)?;
        Ok(())
    }

    fn apply_execution_overrides(
        &self,
        config: &mut crate::domains::execution::ExecutionConfig,
    ) -> ConfigResult<()> {
        if let Some(size) = self.parse_env_var::<usize>("MAX_POOL_SIZE")? {
            config.max_pool_size = size;
        }
        Ok(())
    }

    fn apply_saturation_overrides(
        &self,
        config: &mut crate::domains::saturation::SaturationConfig,
    ) -> ConfigResult<()> {
        if let Ok(hosts) = self.get_env_var("HOSTS") {
            config.hosts = hosts
                .split(',')
                .map(str::trim)
                .filter(|host| !host.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(max_threads) = self.parse_env_var::<usize>("MAX_THREADS")? {
            config.max_threads = max_threads;
        }

        if let Some(increment) = self.parse_env_var::<usize>("THREAD_INCREMENT")? {
            config.thread_increment = increment;
        }

        if let Some(millis) = self.parse_env_var::<u64>("THRESHOLD_MS")? {
            config.max_runtime_threshold = Duration::from_millis(millis);
        }

        Ok(())
    }

    fn apply_http_overrides(
        &self,
        config: &mut crate::domains::http::HttpConfig,
    ) -> ConfigResult<()> {
        if let Some(seconds) = self.parse_env_var::<u64>("HTTP_TIMEOUT")? {
            config.timeout = Duration::from_secs(seconds);
        }

        if let Ok(user_agent) = self.get_env_var("HTTP_USER_AGENT") {
            config.user_agent = user_agent;
        }

        Ok(())
    }

    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = crate::domains::logging::LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = crate::domains::logging::LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    /// Parse a prefixed variable if it is set
    fn parse_env_var<T>(&self, name: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_env_var(name) {
            Ok(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|e| ConfigError::EnvError(format!("Invalid {}: {}", name, e))),
            Err(_) => Ok(None),
        }
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
