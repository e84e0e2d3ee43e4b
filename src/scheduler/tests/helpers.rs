//! Scripted plugins and probes shared by the scheduler tests

use crate::core::logging::ScopedLogger;
use crate::plugin::dependency::Dependency;
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::traits::{PluginDescriptor, ScanPlugin};
use crate::plugin::types::{DryRunInfo, ResultRecord, RunContext, ScanType};
use crate::scheduler::orchestrator::{Scheduler, SchedulerOptions};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Tracks how many plugins are inside `run` at the same time
#[derive(Debug, Default)]
pub struct ConcurrencyProbe {
    current: AtomicUsize,
    peak: AtomicUsize,
    started: Mutex<Vec<String>>,
    finished: Mutex<Vec<String>>,
}

impl ConcurrencyProbe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn enter(&self, name: &str) {
        self.started.lock().unwrap().push(name.to_string());
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self, name: &str) {
        self.current.fetch_sub(1, Ordering::SeqCst);
        self.finished.lock().unwrap().push(name.to_string());
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    pub fn finished(&self) -> Vec<String> {
        self.finished.lock().unwrap().clone()
    }

    pub fn position_started(&self, name: &str) -> Option<usize> {
        self.started().iter().position(|n| n == name)
    }

    pub fn position_finished(&self, name: &str) -> Option<usize> {
        self.finished().iter().position(|n| n == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Succeed,
    ReportFail,
    Error,
    Panic,
}

/// Builder for a scripted plugin
#[derive(Clone)]
pub struct MockSpec {
    pub name: String,
    pub scan_type: ScanType,
    pub priority: i32,
    pub dependencies: Vec<Dependency>,
    pub available: bool,
    pub delay: Duration,
    pub outcome: Outcome,
    pub construct_error: Option<String>,
    pub probe: Arc<ConcurrencyProbe>,
}

impl MockSpec {
    pub fn new(name: &str, probe: &Arc<ConcurrencyProbe>) -> Self {
        Self {
            name: name.to_string(),
            scan_type: ScanType::Passive,
            priority: 100,
            dependencies: Vec::new(),
            available: true,
            delay: Duration::ZERO,
            outcome: Outcome::Succeed,
            construct_error: None,
            probe: probe.clone(),
        }
    }

    pub fn active(mut self) -> Self {
        self.scan_type = ScanType::Active;
        self
    }

    pub fn depends_on(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn delay_ms(mut self, millis: u64) -> Self {
        self.delay = Duration::from_millis(millis);
        self
    }

    pub fn outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn failing_construction(mut self, cause: &str) -> Self {
        self.construct_error = Some(cause.to_string());
        self
    }

    pub fn descriptor(&self) -> PluginDescriptor {
        let spec = self.clone();
        PluginDescriptor::new(
            self.name.clone(),
            self.scan_type,
            self.priority,
            move |_ctx| match &spec.construct_error {
                Some(cause) => Err(PluginError::Configuration {
                    plugin_name: spec.name.clone(),
                    message: cause.clone(),
                }),
                None => Ok(Box::new(MockPlugin { spec: spec.clone() }) as Box<dyn ScanPlugin>),
            },
        )
    }
}

pub struct MockPlugin {
    spec: MockSpec,
}

#[async_trait::async_trait]
impl ScanPlugin for MockPlugin {
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
        &self.spec.dependencies
    }

    fn is_available(&self) -> bool {
        self.spec.available
    }

    async fn run(&mut self, ctx: &RunContext) -> PluginResult<ResultRecord> {
        let name = self.spec.name.clone();
        self.spec.probe.enter(&name);
        if !self.spec.delay.is_zero() {
            tokio::time::sleep(self.spec.delay).await;
        }
        self.spec.probe.leave(&name);

        match self.spec.outcome {
            Outcome::Succeed => Ok(ResultRecord::success(
                name,
                serde_json::json!({ "target": ctx.target }),
            )),
            Outcome::ReportFail => Ok(ResultRecord::fail(name, "nothing found")),
            Outcome::Error => Err(PluginError::Execution {
                plugin_name: name,
                operation: "run".to_string(),
                cause: "scripted error".to_string(),
            }),
            Outcome::Panic => panic!("scripted panic in {}", name),
        }
    }

    fn dry_run_info(&self, target: &str, _output_dir: &Path) -> DryRunInfo {
        DryRunInfo::new(format!("mock scan of {}", target))
            .with_command(format!("{} {}", self.spec.name, target))
    }
}

pub fn descriptors(specs: &[MockSpec]) -> Vec<PluginDescriptor> {
    specs.iter().map(MockSpec::descriptor).collect()
}

pub fn sequential_scheduler() -> Scheduler {
    Scheduler::new(
        SchedulerOptions::new("example.com", "target/test-output"),
        ScopedLogger::new("test-scheduler"),
    )
}

pub fn parallel_scheduler(workers: usize) -> Scheduler {
    Scheduler::new(
        SchedulerOptions::new("example.com", "target/test-output").with_parallel(workers),
        ScopedLogger::new("test-scheduler"),
    )
}
