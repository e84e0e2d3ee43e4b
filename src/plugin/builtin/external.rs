//! External command-line tool plugin
//!
//! A [`ToolSpec`] describes how to invoke one scanner binary; the
//! [`ExternalToolPlugin`] built from it runs the binary as a subprocess,
//! saves its stdout in the output directory and normalizes the saved lines
//! into a JSON artefact.

use crate::core::logging::ScopedLogger;
use crate::plugin::dependency::Dependency;
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::traits::{PluginDescriptor, ScanPlugin, DEFAULT_PRIORITY};
use crate::plugin::types::{DryRunInfo, PluginContext, ResultRecord, RunContext, ScanType};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Timeout applied when a tool does not configure one
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Payload of the failure recorded when report-only mode finds nothing saved
pub const NO_SAVED_RESULTS: &str = "No saved results found";

const PLACEHOLDERS: &[&str] = &["target", "output_dir", "output_file"];
const STDERR_TAIL_LINES: usize = 5;

static PLACEHOLDER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}]*)\}").expect("placeholder pattern is valid"));

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_enabled() -> bool {
    true
}

/// How to run one external scanner
///
/// Also the shape of a `[[tool]]` table in the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolSpec {
    pub name: String,
    pub binary: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub scan_type: ScanType,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Name of the saved raw output, `<name>.txt` when unset
    #[serde(default)]
    pub output_file: Option<String>,
    #[serde(default)]
    pub depends_on: Vec<Dependency>,
    #[serde(default)]
    pub description: String,
    /// A disabled tool is removed from the registry
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, binary: impl Into<String>, scan_type: ScanType) -> Self {
        Self {
            name: name.into(),
            binary: binary.into(),
            args: Vec::new(),
            scan_type,
            priority: DEFAULT_PRIORITY,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            output_file: None,
            depends_on: Vec::new(),
            description: String::new(),
            enabled: true,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_secs = seconds;
        self
    }

    pub fn with_output_file(mut self, output_file: impl Into<String>) -> Self {
        self.output_file = Some(output_file.into());
        self
    }

    pub fn depends_on(mut self, dependency: Dependency) -> Self {
        self.depends_on.push(dependency);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn output_file_name(&self) -> String {
        self.output_file
            .clone()
            .unwrap_or_else(|| format!("{}.txt", self.name))
    }

    /// Name of the normalized artefact written by post-processing
    pub fn artifact_file_name(&self) -> String {
        format!("{}.json", self.name)
    }

    pub fn validate(&self) -> PluginResult<()> {
        let invalid = |message: String| PluginError::Configuration {
            plugin_name: self.name.clone(),
            message,
        };

        crate::core::validation::validate_plugin_name(&self.name).map_err(invalid)?;
        if self.binary.trim().is_empty() {
            return Err(invalid("binary cannot be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(invalid("timeout_secs must be greater than 0".to_string()));
        }

        let output_file = self.output_file_name();
        if output_file.contains(['/', '\\']) || output_file == self.artifact_file_name() {
            return Err(invalid(format!(
                "output_file '{}' must be a plain file name other than '{}'",
                output_file,
                self.artifact_file_name()
            )));
        }

        for arg in &self.args {
            for capture in PLACEHOLDER_PATTERN.captures_iter(arg) {
                let placeholder = &capture[1];
                if !PLACEHOLDERS.contains(&placeholder) {
                    return Err(invalid(format!(
                        "unknown placeholder '{{{}}}' in argument '{}'",
                        placeholder, arg
                    )));
                }
            }
        }
        Ok(())
    }

    /// Substitute placeholders in the argument templates
    pub fn expand_args(&self, target: &str, output_dir: &Path) -> Vec<String> {
        let output_dir = output_dir.display().to_string();
        let output_file = self.output_file_name();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{target}", target)
                    .replace("{output_dir}", &output_dir)
                    .replace("{output_file}", &output_file)
            })
            .collect()
    }

    pub fn command_line(&self, target: &str, output_dir: &Path) -> String {
        std::iter::once(self.binary.clone())
            .chain(self.expand_args(target, output_dir))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Descriptor whose factory validates the spec and builds the plugin
    pub fn into_descriptor(self) -> PluginDescriptor {
        let description = if self.description.is_empty() {
            format!("Run {}", self.binary)
        } else {
            self.description.clone()
        };
        let name = self.name.clone();
        let scan_type = self.scan_type;
        let priority = self.priority;

        PluginDescriptor::new(name, scan_type, priority, move |ctx| {
            ExternalToolPlugin::new(self.clone(), ctx)
                .map(|plugin| Box::new(plugin) as Box<dyn ScanPlugin>)
        })
        .with_description(description)
    }
}

/// Locate an executable the way a shell would
///
/// A binary containing a path separator is taken as a path; anything else
/// is searched for in `PATH`.
pub fn find_executable(binary: &str) -> Option<PathBuf> {
    let candidate = Path::new(binary);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths).find_map(|dir| {
        let full = dir.join(binary);
        if full.is_file() {
            return Some(full);
        }
        if cfg!(windows) {
            let exe = full.with_extension("exe");
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}

pub struct ExternalToolPlugin {
    spec: ToolSpec,
    executable: Option<PathBuf>,
    report_only: bool,
    logger: ScopedLogger,
    target: Option<String>,
}

impl ExternalToolPlugin {
    pub fn new(spec: ToolSpec, ctx: &PluginContext) -> PluginResult<Self> {
        spec.validate()?;
        let executable = find_executable(&spec.binary);
        match &executable {
            Some(path) => ctx
                .logger
                .debug(format_args!("using {}", path.display())),
            None => ctx
                .logger
                .debug(format_args!("'{}' not found on PATH", spec.binary)),
        }

        Ok(Self {
            spec,
            executable,
            report_only: ctx.report_only,
            logger: ctx.logger.clone(),
            target: None,
        })
    }

    pub fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    fn output_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(self.spec.output_file_name())
    }

    async fn load_saved(&self, ctx: &RunContext) -> PluginResult<ResultRecord> {
        let path = self.output_path(&ctx.output_dir);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                self.logger
                    .info(format_args!("loaded saved results from {}", path.display()));
                Ok(ResultRecord::success(
                    self.spec.name.clone(),
                    serde_json::json!({
                        "source": "saved",
                        "output_file": path,
                        "lines": non_empty_lines(&content).len(),
                    }),
                ))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                self.logger
                    .warn(format_args!("no saved results at {}", path.display()));
                Ok(ResultRecord::fail(self.spec.name.clone(), NO_SAVED_RESULTS))
            }
            Err(err) => Err(PluginError::io("read", &path, &err)),
        }
    }

    async fn execute_tool(&self, ctx: &RunContext) -> PluginResult<ResultRecord> {
        let name = self.spec.name.clone();
        let executable = self
            .executable
            .clone()
            .ok_or_else(|| PluginError::Execution {
                plugin_name: name.clone(),
                operation: "spawn".to_string(),
                cause: format!("'{}' not found", self.spec.binary),
            })?;

        tokio::fs::create_dir_all(&ctx.output_dir)
            .await
            .map_err(|err| PluginError::io("create directory", &ctx.output_dir, &err))?;

        let args = self.spec.expand_args(&ctx.target, &ctx.output_dir);
        self.logger
            .debug(format_args!("{} {}", executable.display(), args.join(" ")));

        let mut command = Command::new(&executable);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let timeout = Duration::from_secs(self.spec.timeout_secs);
        let output = tokio::time::timeout(timeout, command.output())
            .await
            .map_err(|_| PluginError::Timeout {
                plugin_name: name.clone(),
                seconds: self.spec.timeout_secs,
            })?
            .map_err(|err| PluginError::Execution {
                plugin_name: name.clone(),
                operation: "spawn".to_string(),
                cause: err.to_string(),
            })?;

        let path = self.output_path(&ctx.output_dir);
        tokio::fs::write(&path, &output.stdout)
            .await
            .map_err(|err| PluginError::io("write", &path, &err))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if output.status.success() {
            Ok(ResultRecord::success(
                name,
                serde_json::json!({
                    "source": "executed",
                    "command": self.spec.command_line(&ctx.target, &ctx.output_dir),
                    "output_file": path,
                    "lines": non_empty_lines(&stdout).len(),
                }),
            ))
        } else {
            let status = match output.status.code() {
                Some(code) => format!("exit status {}", code),
                None => "terminated by signal".to_string(),
            };
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail = tail_lines(&stderr, STDERR_TAIL_LINES);
            let message = if tail.is_empty() {
                status
            } else {
                format!("{}: {}", status, tail)
            };
            Ok(ResultRecord::fail(name, message))
        }
    }
}

#[async_trait::async_trait]
impl ScanPlugin for ExternalToolPlugin {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn scan_type(&self) -> ScanType {
        self.spec.scan_type
    }

    fn priority(&self) -> i32 {
        self.spec.priority
    }

    fn dependencies(&self) -> &[Dependency] {
        &self.spec.depends_on
    }

    fn is_available(&self) -> bool {
        // Saved output replaces the tool in report-only runs
        self.report_only || self.executable.is_some()
    }

    async fn run(&mut self, ctx: &RunContext) -> PluginResult<ResultRecord> {
        self.target = Some(ctx.target.clone());
        if self.report_only || ctx.report_only {
            self.load_saved(ctx).await
        } else {
            self.execute_tool(ctx).await
        }
    }

    async fn post_process(
        &mut self,
        _record: &ResultRecord,
        output_dir: &Path,
    ) -> PluginResult<Option<PathBuf>> {
        let raw = self.output_path(output_dir);
        let content = match tokio::fs::read_to_string(&raw).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(PluginError::io("read", &raw, &err)),
        };

        let items = non_empty_lines(&content);
        let normalized = serde_json::json!({
            "tool": self.spec.name,
            "target": self.target,
            "count": items.len(),
            "items": items,
        });
        let artifact = output_dir.join(self.spec.artifact_file_name());
        let body = serde_json::to_vec_pretty(&normalized).map_err(|err| {
            PluginError::Execution {
                plugin_name: self.spec.name.clone(),
                operation: "post_process".to_string(),
                cause: err.to_string(),
            }
        })?;
        tokio::fs::write(&artifact, body)
            .await
            .map_err(|err| PluginError::io("write", &artifact, &err))?;

        self.logger.debug(format_args!(
            "normalized {} item(s) into {}",
            items.len(),
            artifact.display()
        ));
        Ok(Some(artifact))
    }

    fn dry_run_info(&self, target: &str, output_dir: &Path) -> DryRunInfo {
        let description = if self.spec.description.is_empty() {
            format!("Run {}", self.spec.binary)
        } else {
            self.spec.description.clone()
        };
        let raw = self.output_path(output_dir);
        let artifact = output_dir.join(self.spec.artifact_file_name());

        if self.report_only {
            DryRunInfo::new(description)
                .with_operation(format!("load saved results from {}", raw.display()))
                .with_operation(format!("write findings to {}", artifact.display()))
        } else {
            DryRunInfo::new(description)
                .with_command(self.spec.command_line(target, output_dir))
                .with_operation(format!("save stdout to {}", raw.display()))
                .with_operation(format!("write findings to {}", artifact.display()))
        }
    }
}

fn non_empty_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

fn tail_lines(content: &str, count: usize) -> String {
    let lines = non_empty_lines(content);
    let skip = lines.len().saturating_sub(count);
    lines[skip..].join(" | ")
}
