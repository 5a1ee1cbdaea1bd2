//! Logger engine configuration and subscriber initialization.
//!
//! `RUST_LOG` takes precedence over the configured level, matching how the
//! rest of the tracing ecosystem is driven.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable overriding [`LoggingConfig::level`].
pub const ENV_LOG_LEVEL: &str = "OPSCOPE_LOG_LEVEL";
/// Environment variable overriding [`LoggingConfig::format`].
pub const ENV_LOG_FORMAT: &str = "OPSCOPE_LOG_FORMAT";
/// Environment variable switching output to a file.
pub const ENV_LOG_FILE: &str = "OPSCOPE_LOG_FILE";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid log level: {0}")]
    InvalidLevel(String),

    #[error("invalid log format: {0} (expected `json` or `text`)")]
    InvalidFormat(String),

    #[error("invalid filter directive `{directive}`: {reason}")]
    InvalidDirective { directive: String, reason: String },

    #[error("invalid log file path: {0:?}")]
    InvalidFile(PathBuf),

    #[error("failed to prepare log output: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to install subscriber: {0}")]
    Subscriber(String),
}

/// Output encoding of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" => Ok(LogFormat::Text),
            _ => Err(ConfigError::InvalidFormat(s.to_string())),
        }
    }
}

/// Where events are written.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    /// Append to a single file. No rotation.
    File(PathBuf),
}

/// Logger engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level: trace, debug, info, warn/warning, error
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Extra per-target directives, e.g. `opscope_storage=info`
    pub filter: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            format: LogFormat::Json,
            output: LogOutput::Stdout,
            filter: Vec::new(),
        }
    }
}

impl LoggingConfig {
    /// Defaults overridden by the process environment (after loading `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            parse_level(&level)?;
            self.level = level;
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            self.format = format.parse()?;
        }
        if let Some(file) = lookup(ENV_LOG_FILE).filter(|f| !f.is_empty()) {
            self.output = LogOutput::File(PathBuf::from(file));
        }
        Ok(self)
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.filter.push(directive.into());
        self
    }

    /// Build the filter: `RUST_LOG` if set, else level plus directives.
    pub fn env_filter(&self) -> Result<EnvFilter, ConfigError> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        self.configured_filter()
    }

    fn configured_filter(&self) -> Result<EnvFilter, ConfigError> {
        let level = parse_level(&self.level)?;
        let mut filter = EnvFilter::default().add_directive(level.into());
        for directive in &self.filter {
            let parsed = directive
                .parse::<Directive>()
                .map_err(|e| ConfigError::InvalidDirective {
                    directive: directive.clone(),
                    reason: e.to_string(),
                })?;
            filter = filter.add_directive(parsed);
        }
        Ok(filter)
    }
}

/// Parse a level name, accepting `warning` as an alias for `warn`.
pub fn parse_level(level: &str) -> Result<LevelFilter, ConfigError> {
    let normalized = level.trim().to_ascii_lowercase();
    let normalized = if normalized == "warning" {
        "warn"
    } else {
        normalized.as_str()
    };
    normalized
        .parse::<LevelFilter>()
        .map_err(|_| ConfigError::InvalidLevel(level.to_string()))
}

/// Keeps the non-blocking writer flushing. Hold it for the program's lifetime.
#[must_use = "dropping the guard stops log output"]
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

/// Install the global subscriber described by `config`.
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard, ConfigError> {
    let filter = config.env_filter()?;

    let (writer, guard) = match &config.output {
        LogOutput::Stdout => tracing_appender::non_blocking(std::io::stdout()),
        LogOutput::File(path) => {
            let file_name = path
                .file_name()
                .ok_or_else(|| ConfigError::InvalidFile(path.clone()))?;
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            std::fs::create_dir_all(&dir)?;
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name))
        }
    };
    let ansi = matches!(config.output, LogOutput::Stdout);

    let installed = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(writer).with_target(true))
            .try_init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .compact()
                    .with_ansi(ansi)
                    .with_writer(writer)
                    .with_target(true),
            )
            .try_init(),
    };
    installed.map_err(|e| ConfigError::Subscriber(e.to_string()))?;

    Ok(LoggingGuard { _guard: guard })
}
