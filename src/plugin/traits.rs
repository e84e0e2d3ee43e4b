//! Plugin Trait System
//!
//! Every scanning capability is a [`ScanPlugin`]. The scheduler never knows
//! which tool sits behind a plugin; it only uses this contract:
//!
//! - identity and classification (`name`, `scan_type`, `priority`)
//! - a cheap, side-effect free availability check
//! - `run`, which may block on subprocesses or network I/O and may fail
//! - `post_process`, which turns the raw result into an on-disk artefact
//! - `dry_run_info` for `--dry-run`
//! - `check_dependencies`, answered by default from `dependencies()`
//!
//! Plugins are constructed fresh for every run through a
//! [`PluginDescriptor`] and are never shared between runs.

use crate::plugin::dependency::Dependency;
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::types::{DryRunInfo, PluginContext, ResultRecord, RunContext, ScanType};
use crate::scheduler::resolver::{self, CompletedResults, DependencyCheck};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Priority used when a plugin does not specify one
pub const DEFAULT_PRIORITY: i32 = 100;

#[async_trait::async_trait]
pub trait ScanPlugin: Send {
    /// Stable unique identifier
    fn name(&self) -> &str;

    fn scan_type(&self) -> ScanType;

    /// Ordering hint, lower runs earlier; never a precedence gate
    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    fn dependencies(&self) -> &[Dependency] {
        &[]
    }

    /// Whether the underlying tool can be used; must not have side effects
    fn is_available(&self) -> bool;

    async fn run(&mut self, ctx: &RunContext) -> PluginResult<ResultRecord>;

    /// Normalize the raw result on disk, returning the artefact path if any
    async fn post_process(
        &mut self,
        _record: &ResultRecord,
        _output_dir: &Path,
    ) -> PluginResult<Option<PathBuf>> {
        Ok(None)
    }

    fn dry_run_info(&self, target: &str, output_dir: &Path) -> DryRunInfo;

    fn check_dependencies(&self, completed: &CompletedResults) -> DependencyCheck {
        resolver::resolve(self.dependencies(), completed)
    }
}

/// Constructor of a plugin instance for one run
pub type PluginFactory =
    Arc<dyn Fn(&PluginContext) -> PluginResult<Box<dyn ScanPlugin>> + Send + Sync>;

/// Static metadata about a plugin plus the means to construct it
///
/// This is what callers hand to the scheduler: enough to filter and order
/// plugins without building them.
#[derive(Clone)]
pub struct PluginDescriptor {
    pub name: String,
    pub scan_type: ScanType,
    pub priority: i32,
    pub description: String,
    factory: PluginFactory,
}

impl PluginDescriptor {
    pub fn new<F>(name: impl Into<String>, scan_type: ScanType, priority: i32, factory: F) -> Self
    where
        F: Fn(&PluginContext) -> PluginResult<Box<dyn ScanPlugin>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            scan_type,
            priority,
            description: String::new(),
            factory: Arc::new(factory),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Build a plugin instance
    ///
    /// The instance must report the descriptor's name, since results and
    /// dependencies are keyed by it.
    pub fn instantiate(&self, ctx: &PluginContext) -> PluginResult<Box<dyn ScanPlugin>> {
        let plugin = (self.factory)(ctx).map_err(|err| match err {
            PluginError::Construction { .. } => err,
            other => PluginError::Construction {
                plugin_name: self.name.clone(),
                cause: other.to_string(),
            },
        })?;

        if plugin.name() != self.name {
            return Err(PluginError::Construction {
                plugin_name: self.name.clone(),
                cause: format!(
                    "factory produced a plugin named '{}'",
                    plugin.name()
                ),
            });
        }
        Ok(plugin)
    }
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("name", &self.name)
            .field("scan_type", &self.scan_type)
            .field("priority", &self.priority)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
