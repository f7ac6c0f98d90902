//! Configuration management for siteloop.
//!
//! Parses `siteloop.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `build.command`
//! - `build.args`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override project root directory.
    pub project_root: Option<PathBuf>,
}

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "siteloop.toml";

/// Default output directory, relative to the project root.
const DEFAULT_OUTPUT_DIR: &str = "output";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Project configuration (paths are relative strings from TOML).
    project: ProjectConfigRaw,
    /// Build command configuration.
    pub build: BuildConfig,
    /// File watching configuration.
    pub watch: WatchConfig,
    /// Live reload configuration.
    pub live_reload: LiveReloadConfig,

    /// Resolved project configuration (set after loading).
    #[serde(skip)]
    pub project_resolved: ProjectConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
        }
    }
}

/// Raw project configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ProjectConfigRaw {
    output_dir: Option<String>,
}

/// Resolved project configuration with absolute paths.
#[derive(Debug, Default)]
pub struct ProjectConfig {
    /// Project root: watched recursively, working directory of the build.
    pub root: PathBuf,
    /// Directory the build writes the site into; served over HTTP.
    pub output_dir: PathBuf,
}

/// Build command configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Program to run.
    pub command: String,
    /// Arguments passed to the program (the build target).
    pub args: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            command: "make".to_owned(),
            args: vec!["html".to_owned()],
        }
    }
}

/// File watching configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Settle interval after a build, also the dispatcher batch interval.
    pub settle_ms: u64,
    /// Glob patterns (relative to the project root) never reported as changes.
    pub ignore: Vec<String>,
    /// Treat metadata-only changes (a bare `touch`) as source changes.
    pub metadata: bool,
}

impl WatchConfig {
    /// Settle interval as a [`Duration`].
    #[must_use]
    pub fn settle_interval(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            settle_ms: 500,
            ignore: Vec::new(),
            metadata: false,
        }
    }
}

/// Live reload configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LiveReloadConfig {
    /// How often each notification stream checks for a new build.
    pub poll_interval_ms: u64,
}

impl LiveReloadConfig {
    /// Poll interval as a [`Duration`].
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for LiveReloadConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`build.command`").
        field: String,
        /// Error message (e.g., "${`PYTHON`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a millisecond interval to be positive.
fn require_positive_ms(value: u64, field: &str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation(format!(
            "{field} must be greater than 0"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `siteloop.toml` starting at the CLI project root (or the current
    /// directory) and walking up through its parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails, or
    /// the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let search_start = cli_settings
            .and_then(|s| s.project_root.clone())
            .or_else(|| std::env::current_dir().ok());

        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = search_start.as_deref().and_then(Self::discover_config) {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(root) = &settings.project_root {
            self.project_resolved = self.project.resolve(root);
        }
    }

    /// Search for config file in `start` and its parents.
    fn discover_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        let project = ProjectConfigRaw::default();
        Self {
            server: ServerConfig::default(),
            project_resolved: project.resolve(base),
            project,
            build: BuildConfig::default(),
            watch: WatchConfig::default(),
            live_reload: LiveReloadConfig::default(),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file and after CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;
        require_non_empty(&self.build.command, "build.command")?;
        require_positive_ms(self.watch.settle_ms, "watch.settle_ms")?;
        require_positive_ms(self.live_reload.poll_interval_ms, "live_reload.poll_interval_ms")?;

        for pattern in &self.watch.ignore {
            glob_check(pattern)?;
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;
        self.build.command = expand::expand_env(&self.build.command, "build.command")?;
        self.build.args = self
            .build
            .args
            .iter()
            .map(|arg| expand::expand_env(arg, "build.args"))
            .collect::<Result<_, _>>()?;
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.project_resolved = self.project.resolve(config_dir);
    }
}

impl ProjectConfigRaw {
    fn resolve(&self, root: &Path) -> ProjectConfig {
        ProjectConfig {
            root: root.to_path_buf(),
            output_dir: root.join(self.output_dir.as_deref().unwrap_or(DEFAULT_OUTPUT_DIR)),
        }
    }
}

/// Reject ignore patterns that are not valid globs.
fn glob_check(pattern: &str) -> Result<(), ConfigError> {
    glob::Pattern::new(pattern).map(|_| ()).map_err(|e| {
        ConfigError::Validation(format!(
            "watch.ignore pattern {pattern:?} is not a valid glob: {e}"
        ))
    })
}
