//! Shared fixtures for the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use scanorch::plugin::api::{
    Dependency, DryRunInfo, PluginDescriptor, PluginResult, ResultRecord, RunContext, ScanPlugin,
    ScanType,
};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::{Arc, Mutex};

/// Records plugin names in the order their `run` was entered
pub type RunLog = Arc<Mutex<Vec<String>>>;

/// Plugin that reports a fixed outcome and writes nothing
pub struct StaticPlugin {
    name: String,
    scan_type: ScanType,
    dependencies: Vec<Dependency>,
    succeed: bool,
    log: RunLog,
}

#[async_trait]
impl ScanPlugin for StaticPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn scan_type(&self) -> ScanType {
        self.scan_type
    }

    fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn run(&mut self, ctx: &RunContext) -> PluginResult<ResultRecord> {
        self.log.lock().unwrap().push(self.name.clone());
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        if self.succeed {
            Ok(ResultRecord::success(
                &self.name,
                serde_json::json!({ "target": ctx.target }),
            ))
        } else {
            Ok(ResultRecord::fail(&self.name, "scripted failure"))
        }
    }

    fn dry_run_info(&self, target: &str, _output_dir: &Path) -> DryRunInfo {
        DryRunInfo::new(format!("static check of {}", target))
    }
}

pub fn static_plugin(
    name: &str,
    scan_type: ScanType,
    dependencies: Vec<Dependency>,
    succeed: bool,
    log: &RunLog,
) -> PluginDescriptor {
    let owned = name.to_string();
    let log = log.clone();
    PluginDescriptor::new(name, scan_type, 100, move |_ctx| {
        Ok(Box::new(StaticPlugin {
            name: owned.clone(),
            scan_type,
            dependencies: dependencies.clone(),
            succeed,
            log: log.clone(),
        }) as Box<dyn ScanPlugin>)
    })
}

/// Run the built binary with an empty config so user settings never leak in
pub fn run_scanorch(work_dir: &Path, args: &[&str]) -> Output {
    let config = work_dir.join("scanorch.toml");
    if !config.exists() {
        std::fs::write(&config, "").unwrap();
    }
    Command::new(env!("CARGO_BIN_EXE_scanorch"))
        .current_dir(work_dir)
        .arg("--config-file")
        .arg(&config)
        .arg("--no-color")
        .args(args)
        .env("NO_COLOR", "1")
        .output()
        .expect("failed to launch scanorch")
}

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

pub fn read_json(path: PathBuf) -> serde_json::Value {
    let bytes = std::fs::read(&path).unwrap_or_else(|e| panic!("reading {:?}: {}", path, e));
    serde_json::from_slice(&bytes).unwrap()
}
