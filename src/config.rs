//! Layered configuration for the parsing pipeline.
//!
//! Loaded with `Figment`: built-in defaults, then an optional `cxxgraph.toml`,
//! then `CXXGRAPH_`-prefixed environment variables, in that order (later
//! layers win). Double underscores separate nested keys, e.g.
//! `CXXGRAPH_PARSE__WORKER_POOL_SIZE=8` sets `parse.worker_pool_size`.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Per-parse behavioural knobs (spec §6 `ParseOptions`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseOptions {
    #[serde(default)]
    pub debug_mode: bool,

    /// Files at or above this size route straight to the fallback parser
    /// regardless of grammar availability (spec §4.10).
    #[serde(default = "default_large_file_threshold")]
    pub large_file_threshold: u64,

    #[serde(default = "default_true")]
    pub enable_control_flow: bool,

    #[serde(default = "default_true")]
    pub enable_complexity: bool,

    #[serde(default = "default_true")]
    pub enable_pattern_detection: bool,

    #[serde(default = "default_worker_pool_size")]
    pub worker_pool_size: usize,

    #[serde(default = "default_parse_timeout_ms")]
    pub parse_timeout_ms: u64,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            debug_mode: false,
            large_file_threshold: default_large_file_threshold(),
            enable_control_flow: true,
            enable_complexity: true,
            enable_pattern_detection: true,
            worker_pool_size: default_worker_pool_size(),
            parse_timeout_ms: default_parse_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Per-module level overrides, e.g. `{"cxxgraph::driver": "debug"}`.
    #[serde(default)]
    pub module_levels: std::collections::HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            module_levels: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionCacheConfig {
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

impl Default for ResolutionCacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub parse: ParseOptions,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub resolution_cache: ResolutionCacheConfig,
}

fn default_true() -> bool {
    true
}
fn default_large_file_threshold() -> u64 {
    50 * 1024
}
fn default_worker_pool_size() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
fn default_parse_timeout_ms() -> u64 {
    60_000
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_cache_capacity() -> usize {
    50_000
}

impl Settings {
    /// Load defaults, then `cxxgraph.toml` in the current directory (if
    /// present), then `CXXGRAPH_`-prefixed environment overrides.
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(PathBuf::from("cxxgraph.toml"))
    }

    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(
                Env::prefixed("CXXGRAPH_")
                    .map(|key| key.as_str().to_lowercase().replace("__", ".").into()),
            )
            .extract()
    }
}
