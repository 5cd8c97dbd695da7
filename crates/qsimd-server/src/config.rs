//! Configuration management for the qsimd service.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with `QSIMD_` prefix)
//! 3. .env files
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::tracing_config::TracingFormat;

/// Worker threads the dispatcher may be configured with.
const MAX_WORKERS: usize = 1024;

/// Jobs that may wait for a worker at once.
const MAX_QUEUED_JOBS: usize = 65_536;

/// One hour.
const MAX_JOB_TIMEOUT_MS: u64 = 3_600_000;

/// Largest register the statevector backend is allowed to be configured for.
const QUBIT_CEILING: u32 = 30;

/// Complete service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Shot bounds and circuit size limits
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Worker pool and timeouts
    #[serde(default)]
    pub limits: ResourceLimits,

    /// Logging output
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8000")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Comma-separated allowed origins, or "*"
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,

    /// Largest accepted request body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// How the outcome distribution is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountsFormat {
    /// Integer shot counts summing to `shots`.
    #[default]
    Counts,
    /// Relative frequencies summing to 1.
    Probabilities,
}

impl std::str::FromStr for CountsFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counts" => Ok(Self::Counts),
            "probabilities" => Ok(Self::Probabilities),
            other => Err(ConfigError::ValidationError(format!(
                "Invalid counts format: {other}"
            ))),
        }
    }
}

/// Shot bounds and circuit size limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Shots used when a request does not say
    #[serde(default = "default_shots")]
    pub default_shots: u32,

    #[serde(default = "default_min_shots")]
    pub min_shots: u32,

    #[serde(default = "default_max_shots")]
    pub max_shots: u32,

    /// Largest circuit accepted, in qubits
    #[serde(default = "default_max_qubits")]
    pub max_qubits: u32,

    /// Format used when a request does not say
    #[serde(default)]
    pub counts_format: CountsFormat,
}

/// Worker pool and timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Simulations running at the same time
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,

    /// Admitted jobs allowed to wait for a worker
    #[serde(default = "default_max_queued_jobs")]
    pub max_queued_jobs: usize,

    /// Deadline covering queue wait and execution, in milliseconds
    #[serde(default = "default_job_timeout_ms")]
    pub job_timeout_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "console" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_cors_origins() -> String {
    "*".to_string()
}

fn default_max_body_bytes() -> usize {
    1024 * 1024 // 1 MB
}

fn default_shots() -> u32 {
    1024
}

fn default_min_shots() -> u32 {
    1
}

fn default_max_shots() -> u32 {
    8192
}

fn default_max_qubits() -> u32 {
    20
}

fn default_max_concurrent_jobs() -> usize {
    4
}

fn default_max_queued_jobs() -> usize {
    16
}

fn default_job_timeout_ms() -> u64 {
    30_000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "console".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_origins: default_cors_origins(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            default_shots: default_shots(),
            min_shots: default_min_shots(),
            max_shots: default_max_shots(),
            max_qubits: default_max_qubits(),
            counts_format: CountsFormat::default(),
        }
    }
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: default_max_concurrent_jobs(),
            max_queued_jobs: default_max_queued_jobs(),
            job_timeout_ms: default_job_timeout_ms(),
        }
    }
}

impl ResourceLimits {
    pub fn job_timeout(&self) -> Duration {
        Duration::from_millis(self.job_timeout_ms)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load and validate configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::read_file(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config = Self::parse_yaml(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::parse_yaml(&contents)
    }

    fn parse_yaml(contents: &str) -> Result<Self, ConfigError> {
        serde_yaml_ng::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load configuration with the following precedence:
    /// 1. Load .env file if it exists
    /// 2. Load from file if provided
    /// 3. Apply environment variable overrides
    ///
    /// Validation runs once, on the merged result.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let base = match config_file {
            Some(path) => Self::read_file(path)?,
            None => Config::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides<F>(self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = self.merge_env(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `QSIMD_*` overrides read through `lookup`.
    ///
    /// Only variables that are set override the current values. A variable
    /// that is set but does not parse is an error rather than silently
    /// ignored.
    pub fn merge_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(key: &str, raw: String) -> Result<T, ConfigError> {
            raw.trim()
                .parse()
                .map_err(|_| ConfigError::ValidationError(format!("Invalid value for {key}: {raw}")))
        }

        // Server
        if let Some(v) = lookup("QSIMD_BIND_ADDRESS") {
            self.server.bind_address = v;
        }
        if let Some(v) = lookup("QSIMD_CORS_ORIGINS") {
            self.server.cors_origins = v;
        }
        if let Some(v) = lookup("QSIMD_MAX_BODY_BYTES") {
            self.server.max_body_bytes = parsed("QSIMD_MAX_BODY_BYTES", v)?;
        }

        // Simulation
        if let Some(v) = lookup("QSIMD_DEFAULT_SHOTS") {
            self.simulation.default_shots = parsed("QSIMD_DEFAULT_SHOTS", v)?;
        }
        if let Some(v) = lookup("QSIMD_MAX_SHOTS") {
            self.simulation.max_shots = parsed("QSIMD_MAX_SHOTS", v)?;
        }
        if let Some(v) = lookup("QSIMD_MAX_QUBITS") {
            self.simulation.max_qubits = parsed("QSIMD_MAX_QUBITS", v)?;
        }
        if let Some(v) = lookup("QSIMD_COUNTS_FORMAT") {
            self.simulation.counts_format = v.trim().parse()?;
        }

        // Resource limits
        if let Some(v) = lookup("QSIMD_MAX_CONCURRENT_JOBS") {
            self.limits.max_concurrent_jobs = parsed("QSIMD_MAX_CONCURRENT_JOBS", v)?;
        }
        if let Some(v) = lookup("QSIMD_MAX_QUEUED_JOBS") {
            self.limits.max_queued_jobs = parsed("QSIMD_MAX_QUEUED_JOBS", v)?;
        }
        if let Some(v) = lookup("QSIMD_JOB_TIMEOUT_MS") {
            self.limits.job_timeout_ms = parsed("QSIMD_JOB_TIMEOUT_MS", v)?;
        }

        // Logging
        if let Some(v) = lookup("QSIMD_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = lookup("QSIMD_LOG_FORMAT") {
            self.logging.format = v;
        }

        Ok(self)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_address()?;

        let sim = &self.simulation;
        if sim.min_shots == 0 {
            return Err(ConfigError::ValidationError(
                "min_shots must be at least 1".to_string(),
            ));
        }
        if sim.default_shots < sim.min_shots || sim.default_shots > sim.max_shots {
            return Err(ConfigError::ValidationError(format!(
                "default_shots {} is outside {}..={}",
                sim.default_shots, sim.min_shots, sim.max_shots
            )));
        }
        if sim.max_qubits == 0 || sim.max_qubits > QUBIT_CEILING {
            return Err(ConfigError::ValidationError(format!(
                "max_qubits must be in 1..={QUBIT_CEILING}, got {}",
                sim.max_qubits
            )));
        }

        if self.limits.max_concurrent_jobs == 0 {
            return Err(ConfigError::ValidationError(
                "max_concurrent_jobs must be greater than 0".to_string(),
            ));
        }
        if self.limits.max_concurrent_jobs > MAX_WORKERS {
            return Err(ConfigError::ValidationError(format!(
                "max_concurrent_jobs must be at most {MAX_WORKERS}, got {}",
                self.limits.max_concurrent_jobs
            )));
        }
        if self.limits.max_queued_jobs > MAX_QUEUED_JOBS {
            return Err(ConfigError::ValidationError(format!(
                "max_queued_jobs must be at most {MAX_QUEUED_JOBS}, got {}",
                self.limits.max_queued_jobs
            )));
        }
        if self.limits.job_timeout_ms == 0 || self.limits.job_timeout_ms > MAX_JOB_TIMEOUT_MS {
            return Err(ConfigError::ValidationError(format!(
                "job_timeout_ms must be in 1..={MAX_JOB_TIMEOUT_MS}, got {}",
                self.limits.job_timeout_ms
            )));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: {other}"
                )));
            }
        }
        self.logging
            .format
            .parse::<TracingFormat>()
            .map_err(ConfigError::ValidationError)?;

        Ok(())
    }

    /// Get the parsed bind address.
    pub fn bind_address(&self) -> Result<SocketAddr, ConfigError> {
        self.server.bind_address.parse().map_err(|_| {
            ConfigError::ValidationError(format!(
                "Invalid bind address: {}",
                self.server.bind_address
            ))
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
