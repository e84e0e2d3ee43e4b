//! Dependency resolution against the completed-results map
//!
//! Resolution is a pure function of a dependency list and a snapshot of the
//! results recorded so far. It is cheap enough to call for every pending
//! plugin on every scheduling tick.

use crate::plugin::dependency::Dependency;
use crate::plugin::types::ResultRecord;
use crate::scheduler::error::{SchedulerError, SchedulerResult};
use std::collections::HashMap;

/// Results of finished plugins, keyed by plugin name
///
/// Append-only for the duration of a run: a name can be recorded once.
#[derive(Debug, Default, Clone)]
pub struct CompletedResults {
    results: HashMap<String, ResultRecord>,
}

impl CompletedResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a plugin's result; a second result for the same name is refused
    pub fn insert(&mut self, name: &str, record: ResultRecord) -> SchedulerResult<()> {
        if self.results.contains_key(name) {
            return Err(SchedulerError::DuplicateResult {
                plugin_name: name.to_string(),
            });
        }
        self.results.insert(name.to_string(), record);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ResultRecord> {
        self.results.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.results.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Take the records out in the given name order, skipping unknown names
    pub fn into_ordered(mut self, order: &[String]) -> Vec<ResultRecord> {
        order
            .iter()
            .filter_map(|name| self.results.remove(name))
            .collect()
    }
}

/// Answer to "may this plugin be submitted now?"
///
/// The reason is for diagnostics and deadlock reporting only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyCheck {
    satisfied: bool,
    reason: String,
}

impl DependencyCheck {
    pub fn satisfied() -> Self {
        Self {
            satisfied: true,
            reason: String::new(),
        }
    }

    pub fn unmet(reason: impl Into<String>) -> Self {
        Self {
            satisfied: false,
            reason: reason.into(),
        }
    }

    pub fn is_satisfied(&self) -> bool {
        self.satisfied
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Check every dependency in declaration order; report the first unmet one
pub fn resolve(dependencies: &[Dependency], completed: &CompletedResults) -> DependencyCheck {
    for dependency in dependencies {
        match completed.get(&dependency.plugin_name) {
            None => {
                return DependencyCheck::unmet(format!(
                    "dependency '{}' has not completed",
                    dependency.plugin_name
                ));
            }
            Some(result) if !dependency.condition.evaluate(result) => {
                return DependencyCheck::unmet(format!(
                    "dependency '{}' finished with disposition '{}' but requires {}",
                    dependency.plugin_name,
                    result.disposition(),
                    dependency.condition
                ));
            }
            Some(_) => {}
        }
    }
    DependencyCheck::satisfied()
}
