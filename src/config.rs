//! Layered configuration for the CLI.
//!
//! Precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (`TUGDOC_PROJECT_ROOT`, `TUGDOC_ALWAYS_WRAP`,
//!    `TUGDOC_LOG_LEVEL`)
//! 3. Defaults

use std::path::{Path, PathBuf};

/// Environment variable naming the project root.
pub const ENV_PROJECT_ROOT: &str = "TUGDOC_PROJECT_ROOT";
/// Environment variable forcing merge mode for a single input.
pub const ENV_ALWAYS_WRAP: &str = "TUGDOC_ALWAYS_WRAP";
/// Environment variable for the default log level.
pub const ENV_LOG_LEVEL: &str = "TUGDOC_LOG_LEVEL";

// ============================================================================
// Config Values
// ============================================================================

/// Configuration value source (for precedence tracking).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigSource {
    /// Built-in default value.
    Default = 0,
    /// From environment variable.
    EnvVar = 1,
    /// From CLI flag (highest precedence).
    CliFlag = 2,
}

/// A configuration value with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValue<T> {
    /// The actual value.
    pub value: T,
    /// Where the value came from.
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    /// Create a new config value with the given source.
    pub fn new(value: T, source: ConfigSource) -> Self {
        ConfigValue { value, source }
    }

    /// Merge with another value, preferring higher precedence.
    pub fn merge(self, other: Self) -> Self {
        if other.source >= self.source {
            other
        } else {
            self
        }
    }
}

// ============================================================================
// Overrides
// ============================================================================

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub project_root: Option<PathBuf>,
    /// `--wrap`; absent means "not given", not "false".
    pub always_wrap: Option<bool>,
    pub log_level: Option<String>,
}

// ============================================================================
// Resolved Config
// ============================================================================

/// Effective configuration after applying every layer.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Root that file-registry paths are written relative to and resolved
    /// against.
    pub project_root: ConfigValue<PathBuf>,
    /// Wrap a single merge input in a module below a fresh root.
    pub always_wrap: ConfigValue<bool>,
    /// Default tracing level; `RUST_LOG` still wins when set.
    pub log_level: ConfigValue<String>,
}

impl ResolvedConfig {
    /// Resolve configuration from the process environment and `overrides`.
    pub fn resolve(current_dir: &Path, overrides: &CliOverrides) -> Self {
        Self::resolve_with_env(current_dir, overrides, |key| std::env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup.
    pub fn resolve_with_env<F>(current_dir: &Path, overrides: &CliOverrides, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ResolvedConfig::defaults(current_dir);
        config.apply_env_vars(current_dir, env);
        config.apply_cli_overrides(current_dir, overrides);
        config
    }

    fn defaults(current_dir: &Path) -> Self {
        ResolvedConfig {
            project_root: ConfigValue::new(current_dir.to_path_buf(), ConfigSource::Default),
            always_wrap: ConfigValue::new(false, ConfigSource::Default),
            log_level: ConfigValue::new("warn".to_string(), ConfigSource::Default),
        }
    }

    fn apply_env_vars<F>(&mut self, current_dir: &Path, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = env(ENV_PROJECT_ROOT).filter(|v| !v.is_empty()) {
            let root = ConfigValue::new(current_dir.join(root), ConfigSource::EnvVar);
            self.project_root = self.project_root.clone().merge(root);
        }

        if let Some(wrap) = env(ENV_ALWAYS_WRAP).and_then(|v| parse_bool(&v)) {
            let wrap = ConfigValue::new(wrap, ConfigSource::EnvVar);
            self.always_wrap = self.always_wrap.clone().merge(wrap);
        }

        if let Some(level) = env(ENV_LOG_LEVEL).filter(|v| !v.is_empty()) {
            let level = ConfigValue::new(level, ConfigSource::EnvVar);
            self.log_level = self.log_level.clone().merge(level);
        }
    }

    fn apply_cli_overrides(&mut self, current_dir: &Path, overrides: &CliOverrides) {
        if let Some(ref root) = overrides.project_root {
            let root = ConfigValue::new(current_dir.join(root), ConfigSource::CliFlag);
            self.project_root = self.project_root.clone().merge(root);
        }

        if let Some(wrap) = overrides.always_wrap {
            let wrap = ConfigValue::new(wrap, ConfigSource::CliFlag);
            self.always_wrap = self.always_wrap.clone().merge(wrap);
        }

        if let Some(ref level) = overrides.log_level {
            let level = ConfigValue::new(level.clone(), ConfigSource::CliFlag);
            self.log_level = self.log_level.clone().merge(level);
        }
    }
}

/// `1`/`true`/`yes`/`on` and `0`/`false`/`no`/`off`, case-insensitive.
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    mod precedence_tests {
        use super::*;

        #[test]
        fn merge_prefers_higher_or_equal_source() {
            let default = ConfigValue::new(1, ConfigSource::Default);
            let env = ConfigValue::new(2, ConfigSource::EnvVar);
            let cli = ConfigValue::new(3, ConfigSource::CliFlag);
            assert_eq!(default.clone().merge(env.clone()).value, 2);
            assert_eq!(cli.clone().merge(env).value, 3);
            assert_eq!(cli.merge(default).value, 3);
        }

        #[test]
        fn defaults_apply_without_env_or_flags() {
            let config =
                ResolvedConfig::resolve_with_env(Path::new("/work"), &CliOverrides::default(), env_of(&[]));
            assert_eq!(config.project_root.value, PathBuf::from("/work"));
            assert_eq!(config.project_root.source, ConfigSource::Default);
            assert!(!config.always_wrap.value);
            assert_eq!(config.log_level.value, "warn");
        }

        #[test]
        fn env_overrides_defaults() {
            let env = env_of(&[
                (ENV_PROJECT_ROOT, "site"),
                (ENV_ALWAYS_WRAP, "yes"),
                (ENV_LOG_LEVEL, "debug"),
            ]);
            let config = ResolvedConfig::resolve_with_env(Path::new("/work"), &CliOverrides::default(), env);
            assert_eq!(config.project_root.value, PathBuf::from("/work/site"));
            assert_eq!(config.project_root.source, ConfigSource::EnvVar);
            assert!(config.always_wrap.value);
            assert_eq!(config.log_level.value, "debug");
        }

        #[test]
        fn cli_overrides_env() {
            let env = env_of(&[(ENV_PROJECT_ROOT, "/from/env"), (ENV_ALWAYS_WRAP, "1")]);
            let overrides = CliOverrides {
                project_root: Some(PathBuf::from("/from/cli")),
                always_wrap: Some(false),
                log_level: None,
            };
            let config = ResolvedConfig::resolve_with_env(Path::new("/work"), &overrides, env);
            assert_eq!(config.project_root.value, PathBuf::from("/from/cli"));
            assert_eq!(config.project_root.source, ConfigSource::CliFlag);
            assert!(!config.always_wrap.value);
            assert_eq!(config.always_wrap.source, ConfigSource::CliFlag);
        }

        #[test]
        fn unparseable_env_values_are_ignored() {
            let env = env_of(&[(ENV_ALWAYS_WRAP, "maybe"), (ENV_PROJECT_ROOT, "")]);
            let config = ResolvedConfig::resolve_with_env(Path::new("/work"), &CliOverrides::default(), env);
            assert_eq!(config.always_wrap.source, ConfigSource::Default);
            assert_eq!(config.project_root.source, ConfigSource::Default);
        }
    }
}
