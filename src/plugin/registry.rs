//! Plugin Registry
//!
//! Holds the known plugin descriptors by unique name and turns CLI selection
//! flags into the ordered input list handed to the scheduler.

use crate::plugin::builtin::api::builtin_descriptors;
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::traits::PluginDescriptor;
use std::collections::HashMap;

/// Registry of plugin descriptors keyed by name
#[derive(Default, Clone)]
pub struct PluginRegistry {
    descriptors: HashMap<String, PluginDescriptor>,
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.names())
            .finish()
    }
}

impl PluginRegistry {
    /// Create a new empty plugin registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with every builtin plugin
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for descriptor in builtin_descriptors() {
            if let Some(previous) = registry.register_or_replace(descriptor) {
                log::warn!("builtin plugin '{}' registered twice", previous.name);
            }
        }
        registry
    }

    /// Register a plugin; a name can only be registered once
    pub fn register(&mut self, descriptor: PluginDescriptor) -> PluginResult<()> {
        if self.descriptors.contains_key(&descriptor.name) {
            return Err(PluginError::Duplicate {
                plugin_name: descriptor.name,
            });
        }
        self.descriptors.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    /// Register a plugin, replacing any existing one of the same name
    pub fn register_or_replace(&mut self, descriptor: PluginDescriptor) -> Option<PluginDescriptor> {
        self.descriptors.insert(descriptor.name.clone(), descriptor)
    }

    pub fn remove(&mut self, name: &str) -> PluginResult<PluginDescriptor> {
        self.descriptors
            .remove(name)
            .ok_or_else(|| PluginError::NotFound {
                plugin_name: name.to_string(),
            })
    }

    pub fn get(&self, name: &str) -> Option<&PluginDescriptor> {
        self.descriptors.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// All descriptors in run order: priority first, then name
    pub fn descriptors(&self) -> Vec<&PluginDescriptor> {
        let mut all: Vec<&PluginDescriptor> = self.descriptors.values().collect();
        all.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
        all
    }

    pub fn names(&self) -> Vec<String> {
        self.descriptors()
            .into_iter()
            .map(|d| d.name.clone())
            .collect()
    }

    /// Build the scheduler's input list
    ///
    /// An empty `run_only` selects everything. Every `run_only` name must be
    /// registered; unknown `exclude` names are ignored with a warning.
    pub fn select(
        &self,
        run_only: &[String],
        exclude: &[String],
    ) -> PluginResult<Vec<PluginDescriptor>> {
        if let Some(unknown) = run_only.iter().find(|name| !self.contains(name)) {
            return Err(PluginError::NotFound {
                plugin_name: unknown.clone(),
            });
        }
        for name in exclude.iter().filter(|name| !self.contains(name)) {
            log::warn!("excluded plugin '{}' is not registered", name);
        }

        let selected = self
            .descriptors()
            .into_iter()
            .filter(|d| run_only.is_empty() || run_only.contains(&d.name))
            .filter(|d| !exclude.contains(&d.name))
            .cloned()
            .collect();
        Ok(selected)
    }
}
