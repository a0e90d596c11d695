//! OTL Configuration Management
//!
//! Handles configuration from environment variables and config files
//! with defaults tuned for sentence-sized relation graphs.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Relation resolution engine budgets and heuristics
    pub resolver: ResolverConfig,

    /// Caller-side hypothesis expansion
    pub expansion: ExpansionConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Resolver
        if let Some(ms) = parse_env("RESOLVER_TIMEOUT_MS")? {
            config.resolver.solver_timeout_ms = ms;
        }
        if let Some(max) = parse_env("RESOLVER_MAX_SOLUTIONS")? {
            config.resolver.max_solutions = max;
        }
        if let Some(depth) = parse_env("RESOLVER_MAX_DEPTH")? {
            config.resolver.max_depth = depth;
        }

        // Expansion
        if let Some(entropy) = parse_env("PATTERN_MAX_ENTROPY")? {
            config.expansion.max_entropy = entropy;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(json) = parse_env("LOG_JSON")? {
            config.logging.json_format = json;
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        let env_config = Self::from_env()?;
        let resolver_defaults = ResolverConfig::default();

        // Only override if env values differ from defaults
        if env_config.resolver.solver_timeout_ms != resolver_defaults.solver_timeout_ms {
            self.resolver.solver_timeout_ms = env_config.resolver.solver_timeout_ms;
        }
        if env_config.resolver.max_solutions != resolver_defaults.max_solutions {
            self.resolver.max_solutions = env_config.resolver.max_solutions;
        }
        if env_config.resolver.max_depth != resolver_defaults.max_depth {
            self.resolver.max_depth = env_config.resolver.max_depth;
        }
        if env_config.expansion.max_entropy != ExpansionConfig::default().max_entropy {
            self.expansion.max_entropy = env_config.expansion.max_entropy;
        }
        if env_config.logging.level != LoggingConfig::default().level {
            self.logging.level = env_config.logging.level;
        }
        if env_config.logging.json_format {
            self.logging.json_format = true;
        }

        Ok(self)
    }
}

fn parse_env<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

/// Budgets and tuning knobs of the relation resolution engine
///
/// The percentile steps and the limit-hit threshold are empirically tuned;
/// they are exposed here rather than hard-coded so they can be adjusted
/// per corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Wall-clock budget for one constraint search, in milliseconds
    pub solver_timeout_ms: u64,

    /// Maximum number of satisfying assignments enumerated per search
    pub max_solutions: usize,

    /// Distinct-edge universes smaller than this get every subset as a removal candidate
    pub powerset_limit: usize,

    /// Iterative deepening stops when the depth reaches this value
    pub max_depth: usize,

    /// Deepest level at which candidate removal sets are applied
    pub removal_depth: usize,

    /// Stop deepening once the solver hit its limit more than this many times in one depth
    pub max_limit_hits: usize,

    /// Percent of entropy values dropped per additional depth
    pub entropy_step: f64,

    /// Percent of count values dropped per additional depth
    pub count_step: f64,

    /// Lower bound for both surviving percentiles
    pub min_keep_percent: f64,

    /// Edges scoring at or above this survive the adaptive cutoff
    pub protected_score: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            solver_timeout_ms: 5_000,
            max_solutions: 100,
            powerset_limit: 30,
            max_depth: 5,
            removal_depth: 3,
            max_limit_hits: 3,
            entropy_step: 40.0,
            count_step: 10.0,
            min_keep_percent: 2.0,
            protected_score: 0.9,
        }
    }
}

impl ResolverConfig {
    /// Solver budget as a duration
    pub fn solver_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.solver_timeout_ms)
    }
}

/// How pattern-index matches are turned into hypothesis edges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    /// Entropy ceiling passed to the pattern index
    pub max_entropy: f64,

    /// A hypothesis is fixed only above this score
    pub fixed_min_score: f64,

    /// ...and at or below this entropy
    pub fixed_max_entropy: f64,

    /// ...and above this many occurrences
    pub fixed_min_count: u32,

    /// Also emit edges for the broader domain/range types of a relation
    pub expand_supertypes: bool,

    /// Hypotheses scoring below this are not added
    pub min_score: f64,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            max_entropy: 3.0,
            fixed_min_score: 0.9,
            fixed_max_entropy: 1.5,
            fixed_min_count: 20,
            expand_supertypes: true,
            min_score: 0.0,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}
