//! Type definitions for the plugin system
//!
//! Scan classification, result records, and the context values handed to
//! plugins at construction and at run time.

use crate::core::logging::ScopedLogger;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strum_macros::{Display, EnumIter, EnumString};

/// Whether a plugin sends probing traffic to the target
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ScanType {
    Active,
    Passive,
}

/// Which scan types a run selects
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RunMode {
    Active,
    Passive,
    #[default]
    Both,
}

impl RunMode {
    /// True when a plugin of `scan_type` takes part in a run of this mode
    pub fn selects(self, scan_type: ScanType) -> bool {
        match self {
            RunMode::Both => true,
            RunMode::Active => scan_type == ScanType::Active,
            RunMode::Passive => scan_type == ScanType::Passive,
        }
    }
}

/// A plugin's self-reported outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Disposition {
    Success,
    Fail,
}

/// Outcome of one plugin in one run
///
/// Fields are private: a record is built once through the constructors and
/// the consuming `with_*` adapters, then only read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    name: String,
    timestamp: DateTime<Utc>,
    disposition: Disposition,
    results: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    artifact: Option<PathBuf>,
}

impl ResultRecord {
    pub fn new(
        name: impl Into<String>,
        disposition: Disposition,
        results: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            timestamp: Utc::now(),
            disposition,
            results,
            artifact: None,
        }
    }

    pub fn success(name: impl Into<String>, results: serde_json::Value) -> Self {
        Self::new(name, Disposition::Success, results)
    }

    /// Failure whose payload is a human-readable reason
    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            name,
            Disposition::Fail,
            serde_json::Value::String(message.into()),
        )
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_artifact(mut self, artifact: PathBuf) -> Self {
        self.artifact = Some(artifact);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn disposition(&self) -> Disposition {
        self.disposition
    }

    pub fn is_success(&self) -> bool {
        self.disposition == Disposition::Success
    }

    pub fn results(&self) -> &serde_json::Value {
        &self.results
    }

    /// The failure reason, when the payload is a plain message
    pub fn message(&self) -> Option<&str> {
        self.results.as_str()
    }

    pub fn artifact(&self) -> Option<&Path> {
        self.artifact.as_deref()
    }
}

/// What a plugin would do, for `--dry-run`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DryRunInfo {
    pub description: String,
    pub commands: Vec<String>,
    pub operations: Vec<String>,
}

impl DryRunInfo {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.commands.push(command.into());
        self
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operations.push(operation.into());
        self
    }
}

/// Arguments of a single `run` invocation
#[derive(Debug, Clone)]
pub struct RunContext {
    pub target: String,
    pub output_dir: PathBuf,
    pub report_only: bool,
}

/// Values available to a plugin factory when the plugin is constructed
#[derive(Debug, Clone)]
pub struct PluginContext {
    pub output_dir: PathBuf,
    pub report_only: bool,
    pub logger: ScopedLogger,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_run_mode_selection() {
        for scan_type in ScanType::iter() {
            assert!(RunMode::Both.selects(scan_type));
        }
        assert!(RunMode::Active.selects(ScanType::Active));
        assert!(!RunMode::Active.selects(ScanType::Passive));
        assert!(RunMode::Passive.selects(ScanType::Passive));
        assert!(!RunMode::Passive.selects(ScanType::Active));
    }

    #[test]
    fn test_string_forms() {
        assert_eq!(ScanType::Passive.to_string(), "passive");
        assert_eq!(RunMode::from_str("both").unwrap(), RunMode::Both);
        assert_eq!(Disposition::Fail.to_string(), "fail");
        assert!(ScanType::from_str("loud").is_err());
    }

    #[test]
    fn test_fail_record_carries_message() {
        let record = ResultRecord::fail("wafw00f", "Tool not available.");
        assert_eq!(record.name(), "wafw00f");
        assert_eq!(record.disposition(), Disposition::Fail);
        assert!(!record.is_success());
        assert_eq!(record.message(), Some("Tool not available."));
        assert!(record.artifact().is_none());
    }

    #[test]
    fn test_record_serializes_wire_shape() {
        let record = ResultRecord::success("subfinder", serde_json::json!({"count": 2}))
            .with_artifact(PathBuf::from("out/subfinder.json"));
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["name"], "subfinder");
        assert_eq!(value["disposition"], "success");
        assert_eq!(value["results"]["count"], 2);
        assert_eq!(value["artifact"], "out/subfinder.json");
        // RFC 3339 / ISO-8601 timestamp
        let ts = value["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(ts).is_ok());
    }

    #[test]
    fn test_dry_run_info_builder() {
        let info = DryRunInfo::new("Enumerate subdomains")
            .with_command("subfinder -d example.com -silent")
            .with_operation("write stdout to subfinder.txt");
        assert_eq!(info.commands.len(), 1);
        assert_eq!(info.operations.len(), 1);
    }
}
