use std::collections::HashSet;
use std::path::Path;

use crate::diagnostics::{ConfigValidationError, ConfigWarning, ValidationDiagnostics};
use crate::{LoggingConfig, WeftConfig};

/// Directory that relative paths in the config resolve against.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigValidationContext<'a> {
    pub config_dir: Option<&'a Path>,
}

impl WeftConfig {
    /// Checks semantic invariants, reporting every problem found in one pass.
    #[must_use]
    pub fn validate(&self) -> ValidationDiagnostics {
        self.validate_with_context(ConfigValidationContext::default())
    }

    #[must_use]
    pub fn validate_with_context(&self, ctx: ConfigValidationContext<'_>) -> ValidationDiagnostics {
        let mut out = ValidationDiagnostics::default();

        validate_logging(self, &mut out);
        validate_mappings(self, ctx, &mut out);
        validate_resolve(self, &mut out);

        out
    }
}

fn validate_logging(config: &WeftConfig, out: &mut ValidationDiagnostics) {
    let normalized = LoggingConfig::normalize_level_directives(&config.logging.level);
    if !config.logging.level.trim().is_empty()
        && tracing_subscriber::EnvFilter::try_new(normalized.clone()).is_err()
    {
        out.warnings.push(ConfigWarning::LoggingLevelInvalid {
            value: config.logging.level.clone(),
            normalized,
        });
    }
}

fn validate_mappings(config: &WeftConfig, ctx: ConfigValidationContext<'_>, out: &mut ValidationDiagnostics) {
    let mut seen = HashSet::new();
    for table in &config.mappings.tables {
        if !seen.insert(table.version.as_str()) {
            out.errors.push(ConfigValidationError::DuplicateMappingVersion {
                version: table.version.clone(),
            });
        }

        if let Some(dir) = ctx.config_dir {
            let resolved = config.mappings.resolve_path(dir, &table.path);
            if !resolved.is_file() {
                out.warnings.push(ConfigWarning::MappingsTableMissing {
                    version: table.version.clone(),
                    path: resolved.display().to_string(),
                });
            }
        }
    }

    if let Some(version) = &config.mappings.version {
        if !seen.contains(version.as_str()) {
            out.warnings.push(ConfigWarning::MappingsVersionWithoutTable {
                version: version.clone(),
            });
        }
    }
}

fn validate_resolve(config: &WeftConfig, out: &mut ValidationDiagnostics) {
    if config.resolve.max_candidates == 0 {
        out.errors.push(ConfigValidationError::InvalidValue {
            toml_path: "resolve.max_candidates".to_string(),
            message: "must be >= 1".to_string(),
        });
    }
}
