//! TOML configuration file parsing and loading
//!
//! The configuration file is optional. When `--config-file` is given the file
//! must exist; otherwise `<config_dir>/Scanorch/scanorch.toml` is used if it
//! is present. Command-line values always win over the file.
//!
//! ```toml
//! mode = "both"
//! parallel = true
//! workers = 4
//! output_dir = "scans"
//! exclude = "katana"
//!
//! [[tool]]
//! name = "nuclei"
//! binary = "nuclei"
//! args = ["-u", "{target}", "-silent"]
//! scan_type = "active"
//! depends_on = [{ plugin_name = "httpx", condition = "completed" }]
//! ```

use super::args::Args;
use crate::core::error_handling::ContextualError;
use crate::core::validation::{parse_name_list, validate_selection};
use crate::plugin::api::{PluginRegistry, RunMode, ToolSpec};
use crate::scheduler::api::DEFAULT_MAX_WORKERS;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Output directory used when neither CLI nor config names one
pub const DEFAULT_OUTPUT_DIR: &str = "scan-results";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("The specified configuration file does not exist: {path}")]
    NotFound { path: String },

    #[error("Error reading configuration file {path}: {cause}")]
    Read { path: String, cause: String },

    #[error("Error parsing configuration file {path}: {cause}")]
    Parse { path: String, cause: String },

    #[error("{message}")]
    Invalid { message: String },
}

impl ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, ConfigError::Invalid { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ConfigError::Invalid { message } => Some(message),
            _ => None,
        }
    }
}

/// A single name or a list of names, each possibly comma separated
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NameList {
    One(String),
    Many(Vec<String>),
}

impl Default for NameList {
    fn default() -> Self {
        NameList::Many(Vec::new())
    }
}

impl NameList {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            NameList::One(value) => vec![value.clone()],
            NameList::Many(values) => values.clone(),
        }
    }
}

/// Contents of the configuration file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub mode: Option<RunMode>,
    pub parallel: Option<bool>,
    pub workers: Option<usize>,
    pub output_dir: Option<PathBuf>,
    pub report_only: Option<bool>,
    #[serde(default)]
    pub run_only: NameList,
    #[serde(default)]
    pub exclude: NameList,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub log_file: Option<String>,
    pub color: Option<bool>,
    /// `[[tool]]` tables: extra tools, or overrides of builtins by name
    #[serde(default, rename = "tool")]
    pub tools: Vec<ToolSpec>,
}

impl FileConfig {
    pub fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            cause: e.to_string(),
        })
    }
}

/// Default configuration file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("Scanorch").join("scanorch.toml"))
}

/// Load the configuration, returning it with the path it came from
pub async fn load_config(
    config_file: Option<&Path>,
) -> Result<(FileConfig, Option<PathBuf>), ConfigError> {
    let path = match config_file {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::NotFound {
                    path: path.display().to_string(),
                });
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok((FileConfig::default(), None)),
        },
    };

    let contents = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            cause: e.to_string(),
        })?;
    let config = FileConfig::parse(&contents, &path)?;
    Ok((config, Some(path)))
}

/// Logging options after merging CLI and config
#[derive(Debug, Clone, PartialEq)]
pub struct LogSettings {
    pub level: String,
    pub format: Option<String>,
    pub file: Option<String>,
    pub color: bool,
}

impl LogSettings {
    /// `--log-level` beats `-v`/`-q`, which beat the config file
    pub fn resolve(args: &Args, config: &FileConfig, tty: bool) -> Self {
        let level = match (&args.log_level, args.verbosity()) {
            (Some(level), _) => level.clone(),
            (None, 0) => config
                .log_level
                .clone()
                .unwrap_or_else(|| "info".to_string()),
            (None, verbosity) => crate::core::logging::level_for_verbosity(verbosity).to_string(),
        };
        let color = args
            .color_override()
            .or(config.color)
            .unwrap_or(tty && std::env::var_os("NO_COLOR").is_none());

        Self {
            level,
            format: args.log_format.clone().or_else(|| config.log_format.clone()),
            file: args.log_file.clone().or_else(|| config.log_file.clone()),
            color,
        }
    }
}

/// Everything a run needs, after merging CLI, config and defaults
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub target: Option<String>,
    pub mode: RunMode,
    pub parallel: bool,
    pub workers: usize,
    pub output_dir: PathBuf,
    pub report_only: bool,
    pub run_only: Vec<String>,
    pub exclude: Vec<String>,
    pub html: bool,
    pub fail_on_error: bool,
    pub tools: Vec<ToolSpec>,
}

impl RunSettings {
    pub fn resolve(args: &Args, config: FileConfig) -> Result<Self, ConfigError> {
        let invalid = |message: String| ConfigError::Invalid { message };

        let workers = args
            .workers
            .or(config.workers)
            .unwrap_or(DEFAULT_MAX_WORKERS);
        if workers == 0 {
            return Err(invalid(
                "workers must be greater than 0 in the configuration file".to_string(),
            ));
        }

        let parallel = if args.parallel {
            true
        } else if args.sequential {
            false
        } else {
            config.parallel.unwrap_or(false)
        };

        let run_only = if args.run_only.is_empty() {
            parse_name_list(&config.run_only.to_vec())
        } else {
            parse_name_list(&args.run_only)
        };
        let mut exclude = parse_name_list(&config.exclude.to_vec());
        exclude.extend(parse_name_list(&args.exclude));
        let exclude = parse_name_list(&exclude);
        validate_selection(&run_only, &exclude).map_err(invalid)?;

        for tool in &config.tools {
            tool.validate().map_err(|e| invalid(e.to_string()))?;
        }

        Ok(Self {
            target: args.target.clone(),
            mode: args.mode.or(config.mode).unwrap_or_default(),
            parallel,
            workers,
            output_dir: args
                .output_dir
                .clone()
                .or(config.output_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            report_only: args.report_only || config.report_only.unwrap_or(false),
            run_only,
            exclude,
            html: !args.no_html,
            fail_on_error: args.fail_on_error,
            tools: config.tools,
        })
    }

    /// Builtins plus configured tools; disabled tools are dropped
    pub fn build_registry(&self) -> PluginRegistry {
        let mut registry = PluginRegistry::with_builtins();
        for tool in &self.tools {
            if !tool.enabled {
                if registry.remove(&tool.name).is_ok() {
                    log::debug!("tool '{}' disabled by configuration", tool.name);
                }
                continue;
            }
            if registry
                .register_or_replace(tool.clone().into_descriptor())
                .is_some()
            {
                log::debug!("tool '{}' overridden by configuration", tool.name);
            }
        }
        registry
    }
}
