//! Configuration for Weft (`weft.toml`) and process-wide logging setup.
//!
//! ```toml
//! [logging]
//! level = "info"
//! json = false
//!
//! [mappings]
//! version = "1.12.2"
//!
//! [[mappings.tables]]
//! version = "1.12.2"
//! path = "mappings/1.12.2.srg"
//!
//! [resolve]
//! optimistic_string_completion = true
//! navigate_source = true
//! max_candidates = 500
//! ```

mod diagnostics;
mod validation;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Layer;

pub use crate::diagnostics::{
    ConfigDiagnostics, ConfigValidationError, ConfigWarning, ValidationDiagnostics,
};
pub use crate::validation::ConfigValidationContext;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeftConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Name mapping tables and the active target-platform version.
    #[serde(default)]
    pub mappings: MappingsConfig,

    /// Resolution engine knobs.
    #[serde(default)]
    pub resolve: ResolveConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// A simple level (`info`, `debug`, ...) or a full `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,

    #[serde(default = "LoggingConfig::default_stderr")]
    pub stderr: bool,

    /// Append logs to this file. If it cannot be opened, file logging is
    /// disabled and the other sinks stay active.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    fn default_stderr() -> bool {
        true
    }

    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "trace" => "trace".to_owned(),
            "debug" => "debug".to_owned(),
            "info" => "info".to_owned(),
            "warn" | "warning" => "warn".to_owned(),
            "error" => "error".to_owned(),
            _ => trimmed.to_owned(),
        }
    }

    fn config_env_filter(&self) -> tracing_subscriber::EnvFilter {
        let directives = Self::normalize_level_directives(&self.level);
        tracing_subscriber::EnvFilter::try_new(directives).unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::default()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        })
    }

    /// The effective filter: the configured level, with `RUST_LOG` merged in
    /// when set.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let env_directives = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let config_directives = Self::normalize_level_directives(&self.level);

        match env_directives {
            Some(env_directives) => {
                let combined = format!("{config_directives},{env_directives}");
                tracing_subscriber::EnvFilter::try_new(combined)
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(env_directives))
                    .unwrap_or_else(|_| self.config_env_filter())
            }
            None => self.config_env_filter(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            stderr: Self::default_stderr(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingsConfig {
    /// Active target-platform version. Without it names are used unmapped.
    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub tables: Vec<MappingTableConfig>,
}

impl MappingsConfig {
    /// Resolves a table path against the directory holding the config file.
    pub fn resolve_path(&self, config_dir: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            config_dir.join(path)
        }
    }

    /// `(version, absolute path)` for every configured table.
    pub fn resolved_tables(&self, config_dir: &Path) -> Vec<(String, PathBuf)> {
        self.tables
            .iter()
            .map(|table| (table.version.clone(), self.resolve_path(config_dir, &table.path)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingTableConfig {
    pub version: String,
    /// SRG file, relative to the config file directory.
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveConfig {
    /// Offer string-argument candidates in completion even when the preceding
    /// constant push could not be verified.
    #[serde(default = "default_true")]
    pub optimistic_string_completion: bool,

    /// Look for matching source expressions when a target class has source.
    #[serde(default = "default_true")]
    pub navigate_source: bool,

    /// Upper bound on completion candidates returned per request.
    #[serde(default = "ResolveConfig::default_max_candidates")]
    pub max_candidates: usize,
}

impl ResolveConfig {
    fn default_max_candidates() -> usize {
        500
    }
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            optimistic_string_completion: true,
            navigate_source: true,
            max_candidates: Self::default_max_candidates(),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Toml(err.message().to_string())
    }
}

impl WeftConfig {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = read_config(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Loads a config file and reports unknown keys and validation problems.
    pub fn load_from_path_with_diagnostics(
        path: impl AsRef<Path>,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let path = path.as_ref();
        let text = read_config(path)?;
        let ctx = ConfigValidationContext {
            config_dir: path.parent(),
        };
        Self::load_from_str_with_diagnostics_inner(&text, ctx)
    }

    pub fn load_from_str_with_diagnostics(
        text: &str,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        Self::load_from_str_with_diagnostics_inner(text, ConfigValidationContext::default())
    }

    fn load_from_str_with_diagnostics_inner(
        text: &str,
        ctx: ConfigValidationContext<'_>,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let (config, unknown_keys) =
            diagnostics::deserialize_toml_with_unknown_keys::<WeftConfig>(text)?;

        let mut diagnostics = ConfigDiagnostics {
            unknown_keys,
            ..ConfigDiagnostics::default()
        };
        diagnostics.extend_validation(config.validate_with_context(ctx));

        Ok((config, diagnostics))
    }
}

fn read_config(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Finds the config file for `root`: `weft.toml`, then `.weft/config.toml`.
pub fn discover_config_path(root: &Path) -> Option<PathBuf> {
    ["weft.toml", ".weft/config.toml"]
        .into_iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
        .map(|path| path.canonicalize().unwrap_or(path))
}

/// Loads the config for `root`, or the defaults when none is present.
///
/// Returns the path that was loaded so callers can resolve relative paths.
pub fn load_for_root(root: &Path) -> Result<(WeftConfig, Option<PathBuf>), ConfigError> {
    match discover_config_path(root) {
        Some(path) => {
            let (config, diagnostics) = WeftConfig::load_from_path_with_diagnostics(&path)?;
            report_diagnostics(&path, &diagnostics);
            Ok((config, Some(path)))
        }
        None => Ok((WeftConfig::default(), None)),
    }
}

fn report_diagnostics(path: &Path, diagnostics: &ConfigDiagnostics) {
    for key in &diagnostics.unknown_keys {
        tracing::warn!(target: "weft.config", path = %path.display(), key = %key, "unknown config key");
    }
    for warning in &diagnostics.warnings {
        tracing::warn!(target: "weft.config", path = %path.display(), ?warning, "config warning");
    }
    for error in &diagnostics.errors {
        tracing::error!(target: "weft.config", path = %path.display(), ?error, "invalid config");
    }
}

static TRACING_INIT: Once = Once::new();

/// Installs the global `tracing` subscriber.
///
/// Safe to call more than once; only the first call has an effect.
pub fn init_tracing(config: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let filter = config.env_filter();

        let file = config.file.as_ref().and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });
        let file_failed = config.file.is_some() && file.is_none();

        let mut make_writer = if config.stderr {
            BoxMakeWriter::new(std::io::stderr)
        } else {
            BoxMakeWriter::new(std::io::sink)
        };
        if let Some(file) = file {
            make_writer = BoxMakeWriter::new(make_writer.and(Arc::new(file)));
        }

        let layer: Box<dyn Layer<_> + Send + Sync> = if config.json {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(make_writer)
                .with_ansi(false)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(make_writer)
                .with_ansi(false)
                .boxed()
        };

        let subscriber = tracing_subscriber::registry().with(filter).with(layer);
        if tracing::subscriber::set_global_default(subscriber).is_ok() && file_failed {
            if let Some(path) = config.file.as_ref() {
                tracing::warn!(
                    target: "weft.config",
                    path = %path.display(),
                    "failed to open log file; file logging disabled"
                );
            }
        }
    });
}
