//! Configuration System
//!
//! Provides hierarchical configuration loading from:
//! - sys2.toml (default configuration)
//! - sys2.local.toml (git-ignored local overrides)
//! - Environment variables (SYS2_* prefix)
//!
//! ## Example
//!
//! ```toml
//! # sys2.toml
//! [thresholds]
//! true_certain_at = 0.95
//! true_likely_at = 0.5
//!
//! [performance]
//! rayon_threads = 4
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! SYS2_THRESHOLDS__TRUE_CERTAIN_AT=0.9
//! SYS2_LOGGING__LEVEL=debug
//! ```

use crate::truth::TruthBands;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Deployment-wide knobs that are not per-query but shape how a session
/// runs: default truth bands, how many rayon threads serve `top_k_similar`
/// scans, and logging. Distinct from `SessionConfig` (dimension, strategy,
/// proof depth/timeout), which is per-session and constructed in code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub thresholds: TruthBands,

    #[serde(default)]
    pub performance: PerformanceConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Performance tuning options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Number of rayon worker threads for `top_k_similar`/`lookup_similar`
    /// scans. 0 = use all available CPU cores.
    #[serde(default)]
    pub rayon_threads: usize,

    /// Default minimum similarity a direct query/ask answer must clear.
    #[serde(default = "default_similarity_floor")]
    pub similarity_floor: f32,
}

fn default_similarity_floor() -> f32 {
    0.5
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        PerformanceConfig {
            rayon_threads: 0,
            similarity_floor: default_similarity_floor(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            thresholds: TruthBands::default(),
            performance: PerformanceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from default locations
    ///
    /// Merges in order:
    /// 1. sys2.toml (base configuration)
    /// 2. sys2.local.toml (local overrides, git-ignored)
    /// 3. Environment variables (SYS2_* prefix)
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(figment::providers::Serialized::defaults(EngineConfig::default()))
            .merge(Toml::file("sys2.toml"))
            .merge(Toml::file("sys2.local.toml"))
            .merge(Env::prefixed("SYS2_").split("__"))
            .extract()
    }

    /// Load configuration from a specific file path, still layered under
    /// environment overrides.
    pub fn from_file(path: &str) -> Result<Self, figment::Error> {
        Figment::from(figment::providers::Serialized::defaults(EngineConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("SYS2_").split("__"))
            .extract()
    }
}

/// Installs a `tracing_subscriber::fmt` subscriber at the configured level
/// and format. Idempotent-enough for tests: a second call after one already
/// succeeded is a harmless no-op error that callers may ignore.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if config.format == "json" {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };
    if let Err(err) = result {
        tracing::trace!(%err, "tracing subscriber already installed");
    }
}
