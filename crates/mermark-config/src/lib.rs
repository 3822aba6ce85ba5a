//! Configuration management for mermark.
//!
//! Parses `mermark.toml` configuration files with serde and provides
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
//! - `mermaid.executable`
//! - `mermaid.theme`
//! - `mermaid.args`
//! - `output.dir`

mod expand;

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override embed-only mode.
    pub simple: Option<bool>,
    /// Override renderer executable.
    pub executable: Option<String>,
    /// Override output directory.
    pub output_dir: Option<PathBuf>,
    /// Override inline output flag.
    pub inline: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mermark.toml";

/// Default renderer executable.
const DEFAULT_EXECUTABLE: &str = "mmdc";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Diagram handling and renderer configuration.
    pub mermaid: MermaidConfig,
    /// Output configuration (directory is a raw string from TOML).
    output: OutputConfigRaw,
    /// Resolved output configuration.
    #[serde(skip)]
    output_resolved: OutputConfig,
    /// Path to the loaded config file, if any.
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// `[mermaid]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MermaidConfig {
    /// Embed-only mode: wrap diagram text instead of rendering.
    pub simple: bool,
    /// Renderer executable name (looked up in `PATH`) or path.
    pub executable: String,
    /// Mermaid theme.
    pub theme: Option<String>,
    /// Extra renderer arguments.
    pub args: Vec<String>,
    /// Upper bound on concurrent renders per phase (unbounded if unset).
    pub max_concurrent_renders: Option<usize>,
}

impl Default for MermaidConfig {
    fn default() -> Self {
        Self {
            simple: false,
            executable: DEFAULT_EXECUTABLE.to_owned(),
            theme: None,
            args: Vec::new(),
            max_concurrent_renders: None,
        }
    }
}

impl MermaidConfig {
    /// Concurrency bound, if configured and valid.
    #[must_use]
    pub fn concurrency_limit(&self) -> Option<NonZeroUsize> {
        self.max_concurrent_renders.and_then(NonZeroUsize::new)
    }
}

/// Raw `[output]` section as written in TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OutputConfigRaw {
    dir: Option<String>,
    inline: bool,
}

/// Resolved output configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputConfig {
    /// Explicit directory for generated files (absolute when loaded from file).
    pub dir: Option<PathBuf>,
    /// Embed rendered markup instead of writing image files.
    pub inline: bool,
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
        /// Config field path (e.g., "`mermaid.executable`").
        field: String,
        /// Error message (e.g., "${`MMDC`} not set").
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

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `mermark.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails, or
    /// the result does not validate.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Resolved output configuration.
    #[must_use]
    pub fn output(&self) -> &OutputConfig {
        &self.output_resolved
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(simple) = settings.simple {
            self.mermaid.simple = simple;
        }
        if let Some(executable) = &settings.executable {
            self.mermaid.executable.clone_from(executable);
        }
        if let Some(output_dir) = &settings.output_dir {
            self.output_resolved.dir = Some(output_dir.clone());
        }
        if let Some(inline) = settings.inline {
            self.output_resolved.inline = inline;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
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
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.mermaid.executable, "mermaid.executable")?;

        if self.mermaid.max_concurrent_renders == Some(0) {
            return Err(ConfigError::Validation(
                "mermaid.max_concurrent_renders must be greater than 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        let mermaid = &mut self.mermaid;
        mermaid.executable = expand::expand_env(&mermaid.executable, "mermaid.executable")?;
        if let Some(ref theme) = mermaid.theme {
            mermaid.theme = Some(expand::expand_env(theme, "mermaid.theme")?);
        }
        for arg in &mut mermaid.args {
            *arg = expand::expand_env(arg, "mermaid.args")?;
        }

        if let Some(ref dir) = self.output.dir {
            self.output.dir = Some(expand::expand_env(dir, "output.dir")?);
        }

        Ok(())
    }

    /// Resolve relative paths against the config directory.
    ///
    /// An executable given as a relative path (containing a separator) is
    /// resolved too; bare names are left for `PATH` lookup.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.output_resolved = OutputConfig {
            dir: self.output.dir.as_deref().map(|dir| config_dir.join(dir)),
            inline: self.output.inline,
        };

        let executable = Path::new(&self.mermaid.executable);
        if executable.is_relative() && executable.components().count() > 1 {
            self.mermaid.executable = config_dir.join(executable).to_string_lossy().into_owned();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(toml: &str) -> Config {
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.mermaid, MermaidConfig::default());
        assert_eq!(config.mermaid.executable, "mmdc");
        assert!(!config.mermaid.simple);
        assert_eq!(config.output(), &OutputConfig::default());
        assert!(config.config_path.is_none());
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse("");

        assert_eq!(config.mermaid, MermaidConfig::default());
        assert_eq!(config.output().dir, None);
    }

    #[test]
    fn test_parse_full_config() {
        let config = parse(
            r#"
[mermaid]
simple = true
executable = "/usr/local/bin/mmdc"
theme = "dark"
args = ["--scale", "2"]
max_concurrent_renders = 4

[output]
dir = "public/diagrams"
inline = true
"#,
        );

        assert_eq!(
            config.mermaid,
            MermaidConfig {
                simple: true,
                executable: "/usr/local/bin/mmdc".to_owned(),
                theme: Some("dark".to_owned()),
                args: vec!["--scale".to_owned(), "2".to_owned()],
                max_concurrent_renders: Some(4),
            }
        );
        assert_eq!(
            config.output(),
            &OutputConfig {
                dir: Some(PathBuf::from("/project/public/diagrams")),
                inline: true,
            }
        );
        assert_eq!(config.mermaid.concurrency_limit(), NonZeroUsize::new(4));
    }

    #[test]
    fn test_resolve_relative_executable() {
        let config = parse("[mermaid]\nexecutable = \"node_modules/.bin/mmdc\"\n");

        assert_eq!(
            Path::new(&config.mermaid.executable),
            Path::new("/project/node_modules/.bin/mmdc")
        );
    }

    #[test]
    fn test_bare_executable_left_for_lookup() {
        let config = parse("[mermaid]\nexecutable = \"mermaid-cli\"\n");

        assert_eq!(config.mermaid.executable, "mermaid-cli");
    }

    #[test]
    fn test_concurrency_unbounded_by_default() {
        let config = parse("[mermaid]\nsimple = false\n");

        assert_eq!(config.mermaid.concurrency_limit(), None);
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = parse("[output]\ndir = \"out\"\n");

        config.apply_cli_settings(&CliSettings {
            simple: Some(true),
            executable: Some("/opt/mmdc".to_owned()),
            output_dir: Some(PathBuf::from("/tmp/diagrams")),
            inline: Some(true),
        });

        assert!(config.mermaid.simple);
        assert_eq!(config.mermaid.executable, "/opt/mmdc");
        assert_eq!(config.output().dir, Some(PathBuf::from("/tmp/diagrams")));
        assert!(config.output().inline);
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = parse("[output]\ndir = \"out\"\n");

        config.apply_cli_settings(&CliSettings::default());

        assert!(!config.mermaid.simple);
        assert_eq!(config.output().dir, Some(PathBuf::from("/project/out")));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("MERMARK_TEST_CONFIG_THEME", "neutral");
        }

        let mut config: Config = toml::from_str(
            r#"
[mermaid]
executable = "${MERMARK_TEST_CONFIG_UNSET_EXE:-mmdc}"
theme = "${MERMARK_TEST_CONFIG_THEME}"
args = ["--configFile", "${MERMARK_TEST_CONFIG_UNSET_CFG:-mermaid.json}"]
"#,
        )
        .unwrap();
        config.expand_env_vars().unwrap();

        assert_eq!(config.mermaid.executable, "mmdc");
        assert_eq!(config.mermaid.theme.as_deref(), Some("neutral"));
        assert_eq!(config.mermaid.args, vec!["--configFile", "mermaid.json"]);

        unsafe {
            std::env::remove_var("MERMARK_TEST_CONFIG_THEME");
        }
    }

    #[test]
    fn test_expand_env_vars_missing_required_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("MERMARK_TEST_CONFIG_MISSING");
        }

        let mut config: Config =
            toml::from_str("[output]\ndir = \"${MERMARK_TEST_CONFIG_MISSING}\"\n").unwrap();
        let err = config.expand_env_vars().unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("output.dir"));
    }

    #[test]
    fn test_validate_default_config_passes() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_executable() {
        let config = parse("[mermaid]\nexecutable = \"\"\n");

        let err = config.validate().unwrap_err();

        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("mermaid.executable cannot be empty"));
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let config = parse("[mermaid]\nmax_concurrent_renders = 0\n");

        let err = config.validate().unwrap_err();

        assert!(err.to_string().contains("max_concurrent_renders"));
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/mermark.toml")), None).unwrap_err();

        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("mermark.toml");
        std::fs::write(&path, "[mermaid]\ntheme = \"forest\"\n\n[output]\ndir = \"img\"\n").unwrap();

        let config = Config::load(Some(path.as_path()), None).unwrap();

        assert_eq!(config.mermaid.theme.as_deref(), Some("forest"));
        assert_eq!(config.output().dir, Some(temp_dir.path().join("img")));
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("mermark.toml");
        std::fs::write(&path, "[mermaid]\nmax_concurrent_renders = 0\n").unwrap();

        let err = Config::load(Some(path.as_path()), None).unwrap_err();

        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("mermark.toml");
        std::fs::write(&path, "[mermaid\n").unwrap();

        let err = Config::load(Some(path.as_path()), None).unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
