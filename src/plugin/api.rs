//! Public API for the plugin system
//!
//! External modules should import from here rather than directly from
//! internal modules.

// Plugin contract
pub use crate::plugin::traits::{PluginDescriptor, PluginFactory, ScanPlugin, DEFAULT_PRIORITY};

// Plugin metadata, results and contexts
pub use crate::plugin::types::{
    Disposition, DryRunInfo, PluginContext, ResultRecord, RunContext, RunMode, ScanType,
};

// Dependencies between plugins
pub use crate::plugin::dependency::{Condition, Dependency};

// Plugin registry
pub use crate::plugin::registry::PluginRegistry;

// Builtin external-tool plugins
pub use crate::plugin::builtin::api::builtin_descriptors;
pub use crate::plugin::builtin::external::{
    find_executable, ExternalToolPlugin, ToolSpec, DEFAULT_TIMEOUT_SECS, NO_SAVED_RESULTS,
};

// Error handling
pub use crate::plugin::error::{PluginError, PluginResult};
