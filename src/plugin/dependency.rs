//! Inter-plugin dependency declarations
//!
//! A dependency names another plugin and a condition its completed result
//! must meet. Conditions are a small closed set of composable primitives
//! rather than arbitrary closures, so they can be displayed in diagnostics
//! and loaded from configuration.

use crate::plugin::types::{Disposition, ResultRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Predicate over a completed dependency's result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Any completed result, success or failure
    Completed,
    /// Completed with the given disposition
    DispositionIs(Disposition),
    /// Every inner condition holds
    All(Vec<Condition>),
    /// At least one inner condition holds
    Any(Vec<Condition>),
}

impl Condition {
    pub fn evaluate(&self, result: &ResultRecord) -> bool {
        match self {
            Condition::Completed => true,
            Condition::DispositionIs(disposition) => result.disposition() == *disposition,
            Condition::All(conditions) => conditions.iter().all(|c| c.evaluate(result)),
            Condition::Any(conditions) => conditions.iter().any(|c| c.evaluate(result)),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Completed => write!(f, "completed"),
            Condition::DispositionIs(disposition) => write!(f, "disposition={}", disposition),
            Condition::All(conditions) => write_joined(f, conditions, " and "),
            Condition::Any(conditions) => write_joined(f, conditions, " or "),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, conditions: &[Condition], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, condition) in conditions.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        write!(f, "{}", condition)?;
    }
    write!(f, ")")
}

/// Dependency of one plugin on another plugin's result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub plugin_name: String,
    pub condition: Condition,
}

impl Dependency {
    pub fn new(plugin_name: impl Into<String>, condition: Condition) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            condition,
        }
    }

    /// Satisfied once the named plugin has finished, whatever the outcome
    pub fn completed(plugin_name: impl Into<String>) -> Self {
        Self::new(plugin_name, Condition::Completed)
    }

    /// Satisfied once the named plugin has finished successfully
    pub fn succeeded(plugin_name: impl Into<String>) -> Self {
        Self::new(plugin_name, Condition::DispositionIs(Disposition::Success))
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.plugin_name, self.condition)
    }
}
