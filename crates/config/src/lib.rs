//! Configuration loading, validation, and management for patternlab.
//!
//! Loads configuration from `~/.patternlab/config.toml` (or an explicit path)
//! with environment variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variables forwarded to pattern scripts when set.
///
/// Pattern scripts read cloud project ids, credential paths and provider
/// keys from these.
pub const FORWARDED_ENV_VARS: &[&str] = &[
    "GOOGLE_CLOUD_PROJECT",
    "GOOGLE_CLOUD_LOCATION",
    "GOOGLE_APPLICATION_CREDENTIALS",
    "GOOGLE_API_KEY",
    "GOOGLE_GENAI_USE_VERTEXAI",
    "OPENAI_API_KEY",
];

/// The root configuration structure.
///
/// Maps directly to `~/.patternlab/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Test runner settings
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Benchmark simulator settings
    #[serde(default)]
    pub bench: BenchConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Program used to launch each script (`<interpreter> <path>`)
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Root of the pattern catalog (contains `1-foundational/` etc.)
    #[serde(default = "default_catalog_root")]
    pub catalog_root: String,

    /// Where Markdown/JSON reports are written
    #[serde(default = "default_report_dir")]
    pub report_dir: String,

    /// Timeout applied when no override matches
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,

    /// Per-pattern timeouts; the first override whose `pattern` occurs in
    /// the script path wins
    #[serde(default = "default_timeout_overrides")]
    pub timeout_overrides: Vec<TimeoutOverride>,

    /// Fixed pause between scripts (respects upstream API rate limits)
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Sliding-window cap on script launches per minute (0 = unlimited)
    #[serde(default)]
    pub max_runs_per_minute: u32,

    /// Extra environment variables for every script
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

fn default_interpreter() -> String {
    "python3".into()
}
fn default_catalog_root() -> String {
    ".".into()
}
fn default_report_dir() -> String {
    "test-reports".into()
}
fn default_timeout_secs() -> u64 {
    180
}
fn default_delay_ms() -> u64 {
    2000
}
fn default_timeout_overrides() -> Vec<TimeoutOverride> {
    vec![
        TimeoutOverride::new("learning_agents", 400),
        TimeoutOverride::new("4-production", 300),
        TimeoutOverride::new("3-intelligence", 240),
    ]
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            catalog_root: default_catalog_root(),
            report_dir: default_report_dir(),
            default_timeout_secs: default_timeout_secs(),
            timeout_overrides: default_timeout_overrides(),
            delay_ms: default_delay_ms(),
            max_runs_per_minute: 0,
            env: HashMap::new(),
        }
    }
}

impl std::fmt::Debug for RunnerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let env_keys: Vec<&String> = self.env.keys().collect();
        f.debug_struct("RunnerConfig")
            .field("interpreter", &self.interpreter)
            .field("catalog_root", &self.catalog_root)
            .field("report_dir", &self.report_dir)
            .field("default_timeout_secs", &self.default_timeout_secs)
            .field("timeout_overrides", &self.timeout_overrides)
            .field("delay_ms", &self.delay_ms)
            .field("max_runs_per_minute", &self.max_runs_per_minute)
            .field("env", &format_args!("{env_keys:?} [values redacted]"))
            .finish()
    }
}

impl RunnerConfig {
    /// Timeout for one script, matched against its path.
    pub fn timeout_for(&self, script_path: &str) -> Duration {
        let normalized = script_path.replace('\\', "/");
        let secs = self
            .timeout_overrides
            .iter()
            .find(|o| normalized.contains(&o.pattern))
            .map(|o| o.timeout_secs)
            .unwrap_or(self.default_timeout_secs);
        Duration::from_secs(secs)
    }

    /// Environment for a script: forwarded process variables first, then
    /// configured ones (which win on conflict).
    pub fn script_env(&self) -> Vec<(String, String)> {
        let mut vars: Vec<(String, String)> = FORWARDED_ENV_VARS
            .iter()
            .filter_map(|name| std::env::var(name).ok().map(|v| (name.to_string(), v)))
            .filter(|(name, _)| !self.env.contains_key(name))
            .collect();
        let mut configured: Vec<(String, String)> =
            self.env.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        configured.sort();
        vars.extend(configured);
        vars
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutOverride {
    /// Path fragment, e.g. `learning_agents` or `06_abm.py`
    pub pattern: String,
    pub timeout_secs: u64,
}

impl TimeoutOverride {
    pub fn new(pattern: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            pattern: pattern.into(),
            timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Model used for cost estimation
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Load levels for the performance simulator
    #[serde(default = "default_load_levels")]
    pub load_levels: Vec<u32>,

    /// Export directory
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Multiplier applied to simulated waits (1.0 = real time)
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,

    /// Concurrent simulated operations
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Probability that a simulated operation fails
    #[serde(default = "default_failure_rate")]
    pub failure_rate: f64,

    /// Fixed RNG seed for reproducible tables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Custom model pricing overrides (model name → pricing)
    #[serde(default)]
    pub custom_pricing: HashMap<String, PricingOverrideConfig>,
}

fn default_model() -> String {
    "gemini-2.5-flash-exp".into()
}
fn default_load_levels() -> Vec<u32> {
    vec![1, 5, 10]
}
fn default_output_dir() -> String {
    "results".into()
}
fn default_time_scale() -> f64 {
    1.0
}
fn default_max_workers() -> usize {
    10
}
fn default_failure_rate() -> f64 {
    0.05
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            load_levels: default_load_levels(),
            output_dir: default_output_dir(),
            time_scale: default_time_scale(),
            max_workers: default_max_workers(),
            failure_rate: default_failure_rate(),
            seed: None,
            custom_pricing: HashMap::new(),
        }
    }
}

/// Custom per-million-token pricing for a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingOverrideConfig {
    /// Price per 1M input tokens in USD
    pub input_per_m: f64,
    /// Price per 1M output tokens in USD
    pub output_per_m: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.patternlab/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `PATTERNLAB_INTERPRETER`
    /// - `PATTERNLAB_CATALOG_ROOT`
    /// - `PATTERNLAB_MODEL`
    /// - `PATTERNLAB_LOG`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_overrides(&config_path)
    }

    /// Load from an explicit path, then apply environment overrides.
    pub fn load_with_overrides(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;

        if let Ok(interpreter) = std::env::var("PATTERNLAB_INTERPRETER") {
            config.runner.interpreter = interpreter;
        }
        if let Ok(root) = std::env::var("PATTERNLAB_CATALOG_ROOT") {
            config.runner.catalog_root = root;
        }
        if let Ok(model) = std::env::var("PATTERNLAB_MODEL") {
            config.bench.default_model = model;
        }
        if let Ok(level) = std::env::var("PATTERNLAB_LOG") {
            config.logging.level = level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".patternlab")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.runner.interpreter.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "runner.interpreter must not be empty".into(),
            ));
        }

        if self.runner.default_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "runner.default_timeout_secs must be > 0".into(),
            ));
        }

        if let Some(o) = self.runner.timeout_overrides.iter().find(|o| o.timeout_secs == 0) {
            return Err(ConfigError::ValidationError(format!(
                "timeout override '{}' must be > 0",
                o.pattern
            )));
        }

        if self.bench.load_levels.is_empty() || self.bench.load_levels.contains(&0) {
            return Err(ConfigError::ValidationError(
                "bench.load_levels must be non-empty and positive".into(),
            ));
        }

        if !self.bench.time_scale.is_finite() || self.bench.time_scale <= 0.0 {
            return Err(ConfigError::ValidationError(
                "bench.time_scale must be a finite number > 0".into(),
            ));
        }

        if self.bench.max_workers == 0 {
            return Err(ConfigError::ValidationError(
                "bench.max_workers must be > 0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.bench.failure_rate) {
            return Err(ConfigError::ValidationError(
                "bench.failure_rate must be between 0.0 and 1.0".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
