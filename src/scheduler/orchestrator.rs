//! Scheduler: selects plugins and drives them to completion
//!
//! Three collections carry the state of a run. `pending` holds constructed
//! plugins not yet submitted, `in_flight` the names of plugins running on
//! worker tasks, and `completed` the append-only results map. All transitions
//! happen on the task that called [`Scheduler::run`]; worker tasks only
//! execute a plugin and hand its result back.

use crate::core::logging::ScopedLogger;
use crate::core::time::{SystemTimeProvider, TimeProvider};
use crate::plugin::error::PluginError;
use crate::plugin::traits::{PluginDescriptor, ScanPlugin};
use crate::plugin::types::{
    DryRunInfo, PluginContext, ResultRecord, RunContext, RunMode, ScanType,
};
use crate::scheduler::engine::{panic_message, ExecutionEngine};
use crate::scheduler::error::{SchedulerError, SchedulerResult};
use crate::scheduler::resolver::CompletedResults;
use crate::scheduler::timing::{TimingLog, TimingRecord};
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinError;

/// Worker bound used when none is configured
pub const DEFAULT_MAX_WORKERS: usize = 3;

/// How a run is carried out
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    pub run_mode: RunMode,
    pub parallel: bool,
    pub max_workers: usize,
    pub target: String,
    pub output_dir: PathBuf,
    pub report_only: bool,
}

impl SchedulerOptions {
    /// Sequential run over every scan type
    pub fn new(target: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            run_mode: RunMode::Both,
            parallel: false,
            max_workers: DEFAULT_MAX_WORKERS,
            target: target.into(),
            output_dir: output_dir.into(),
            report_only: false,
        }
    }

    pub fn with_run_mode(mut self, run_mode: RunMode) -> Self {
        self.run_mode = run_mode;
        self
    }

    pub fn with_parallel(mut self, max_workers: usize) -> Self {
        self.parallel = true;
        self.max_workers = max_workers;
        self
    }

    pub fn with_report_only(mut self, report_only: bool) -> Self {
        self.report_only = report_only;
        self
    }

    pub fn validate(&self) -> SchedulerResult<()> {
        if self.max_workers == 0 {
            return Err(SchedulerError::InvalidOptions {
                message: "worker count must be greater than 0".to_string(),
            });
        }
        if self.target.trim().is_empty() {
            return Err(SchedulerError::InvalidOptions {
                message: "target cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    fn run_context(&self) -> RunContext {
        RunContext {
            target: self.target.clone(),
            output_dir: self.output_dir.clone(),
            report_only: self.report_only,
        }
    }
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// One record per selected plugin, in selection order
    pub results: Vec<ResultRecord>,
    pub timings: Vec<TimingRecord>,
}

impl RunOutcome {
    pub fn result(&self, name: &str) -> Option<&ResultRecord> {
        self.results.iter().find(|r| r.name() == name)
    }

    pub fn timing(&self, name: &str) -> Option<&TimingRecord> {
        self.timings.iter().find(|t| t.plugin_name == name)
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed_count() == 0
    }
}

/// One line of `--dry-run` output
#[derive(Debug, Clone, Serialize)]
pub struct DryRunEntry {
    pub name: String,
    pub scan_type: ScanType,
    pub priority: i32,
    pub available: bool,
    pub dependencies: Vec<String>,
    pub info: DryRunInfo,
}

struct PendingPlugin {
    name: String,
    plugin: Box<dyn ScanPlugin>,
}

type Harvest = BoxFuture<'static, (String, Result<ResultRecord, JoinError>)>;

pub struct Scheduler {
    options: SchedulerOptions,
    time: Arc<dyn TimeProvider>,
    timings: TimingLog,
    engine: ExecutionEngine,
    logger: ScopedLogger,
}

impl Scheduler {
    pub fn new(options: SchedulerOptions, logger: ScopedLogger) -> Self {
        Self::with_time_provider(options, logger, Arc::new(SystemTimeProvider))
    }

    pub fn with_time_provider(
        options: SchedulerOptions,
        logger: ScopedLogger,
        time: Arc<dyn TimeProvider>,
    ) -> Self {
        let timings = TimingLog::new();
        let engine = ExecutionEngine::new(time.clone(), timings.clone(), logger.clone());
        Self {
            options,
            time,
            timings,
            engine,
            logger,
        }
    }

    pub fn options(&self) -> &SchedulerOptions {
        &self.options
    }

    /// Timing records of the most recent run
    pub fn timings(&self) -> Vec<TimingRecord> {
        self.timings.snapshot()
    }

    /// Apply the scan-type filter and reject duplicate names
    ///
    /// The result is the fixed universe of the run. A dependency on a plugin
    /// filtered out here can never be met.
    pub fn select(
        &self,
        descriptors: Vec<PluginDescriptor>,
    ) -> SchedulerResult<Vec<PluginDescriptor>> {
        let mut seen = HashSet::new();
        let mut selected = Vec::with_capacity(descriptors.len());

        for descriptor in descriptors {
            if !seen.insert(descriptor.name.clone()) {
                return Err(SchedulerError::DuplicatePlugin {
                    plugin_name: descriptor.name,
                });
            }
            if self.options.run_mode.selects(descriptor.scan_type) {
                selected.push(descriptor);
            } else {
                self.logger.debug(format_args!(
                    "'{}' ({}) not selected in {} mode",
                    descriptor.name, descriptor.scan_type, self.options.run_mode
                ));
            }
        }
        Ok(selected)
    }

    /// Execute the selected plugins and collect their results
    pub async fn run(&self, descriptors: Vec<PluginDescriptor>) -> SchedulerResult<RunOutcome> {
        self.options.validate()?;
        self.timings.clear();

        let selected = self.select(descriptors)?;
        let order: Vec<String> = selected.iter().map(|d| d.name.clone()).collect();
        self.logger.info(format_args!(
            "running {} plugin(s) against {} ({} mode, {})",
            selected.len(),
            self.options.target,
            self.options.run_mode,
            if self.options.parallel {
                format!("parallel, {} workers", self.options.max_workers)
            } else {
                "sequential".to_string()
            }
        ));

        let mut completed = CompletedResults::new();
        let pending = self.instantiate(selected, &mut completed)?;

        if self.options.parallel {
            self.run_parallel(pending, &mut completed).await?;
        } else {
            self.run_sequential(pending, &mut completed).await?;
        }

        let outcome = RunOutcome {
            results: completed.into_ordered(&order),
            timings: self.timings.snapshot(),
        };
        self.logger.info(format_args!(
            "run complete: {} succeeded, {} failed",
            outcome.results.len() - outcome.failed_count(),
            outcome.failed_count()
        ));
        Ok(outcome)
    }

    /// Describe what a run would do without executing anything
    pub fn dry_run(&self, descriptors: Vec<PluginDescriptor>) -> SchedulerResult<Vec<DryRunEntry>> {
        let selected = self.select(descriptors)?;
        let entries = selected
            .into_iter()
            .map(|descriptor| match descriptor.instantiate(&self.plugin_context(&descriptor.name)) {
                Ok(plugin) => DryRunEntry {
                    name: descriptor.name.clone(),
                    scan_type: descriptor.scan_type,
                    priority: descriptor.priority,
                    available: plugin.is_available(),
                    dependencies: plugin.dependencies().iter().map(|d| d.to_string()).collect(),
                    info: plugin.dry_run_info(&self.options.target, &self.options.output_dir),
                },
                Err(err) => DryRunEntry {
                    name: descriptor.name.clone(),
                    scan_type: descriptor.scan_type,
                    priority: descriptor.priority,
                    available: false,
                    dependencies: Vec::new(),
                    info: DryRunInfo::new(err.to_string()),
                },
            })
            .collect();
        Ok(entries)
    }

    fn plugin_context(&self, name: &str) -> PluginContext {
        PluginContext {
            output_dir: self.options.output_dir.clone(),
            report_only: self.options.report_only,
            logger: self.logger.child(name),
        }
    }

    /// Construct every selected plugin
    ///
    /// A plugin whose construction fails is completed immediately with a
    /// synthetic failure, so it still yields exactly one result.
    fn instantiate(
        &self,
        selected: Vec<PluginDescriptor>,
        completed: &mut CompletedResults,
    ) -> SchedulerResult<Vec<PendingPlugin>> {
        let mut pending = Vec::with_capacity(selected.len());
        for descriptor in selected {
            match descriptor.instantiate(&self.plugin_context(&descriptor.name)) {
                Ok(plugin) => pending.push(PendingPlugin {
                    name: descriptor.name,
                    plugin,
                }),
                Err(err) => {
                    let message = match err {
                        PluginError::Construction { cause, .. } => {
                            format!("Plugin failed to initialise: {}", cause)
                        }
                        other => format!("Plugin failed to initialise: {}", other),
                    };
                    self.logger
                        .error(format_args!("'{}': {}", descriptor.name, message));

                    let now = self.time.utc_now();
                    let mut timing = TimingRecord::new(&descriptor.name);
                    timing.mark_failed(now, None, message.clone());
                    self.timings.append(timing);

                    let record = ResultRecord::fail(&descriptor.name, message).with_timestamp(now);
                    completed.insert(&descriptor.name, record)?;
                }
            }
        }
        Ok(pending)
    }

    async fn run_sequential(
        &self,
        pending: Vec<PendingPlugin>,
        completed: &mut CompletedResults,
    ) -> SchedulerResult<()> {
        let ctx = self.options.run_context();
        for PendingPlugin { name, mut plugin } in pending {
            let check = plugin.check_dependencies(completed);
            if !check.is_satisfied() {
                self.logger.warn(format_args!(
                    "'{}' running sequentially with {}",
                    name,
                    check.reason()
                ));
            }
            let record = self.engine.execute(plugin.as_mut(), &ctx).await;
            completed.insert(&name, record)?;
        }
        Ok(())
    }

    async fn run_parallel(
        &self,
        mut pending: Vec<PendingPlugin>,
        completed: &mut CompletedResults,
    ) -> SchedulerResult<()> {
        let ctx = self.options.run_context();
        let max_workers = self.options.max_workers;
        let mut in_flight: HashSet<String> = HashSet::new();
        let mut running: FuturesUnordered<Harvest> = FuturesUnordered::new();

        loop {
            // Submission pass
            let mut submitted = 0;
            let mut still_pending = Vec::with_capacity(pending.len());
            for entry in pending.drain(..) {
                if in_flight.len() >= max_workers {
                    still_pending.push(entry);
                    continue;
                }
                let check = entry.plugin.check_dependencies(completed);
                if check.is_satisfied() {
                    self.logger.debug(format_args!("submitting '{}'", entry.name));
                    in_flight.insert(entry.name.clone());
                    running.push(self.spawn(entry, ctx.clone()));
                    submitted += 1;
                } else {
                    self.logger
                        .trace(format_args!("'{}' waiting: {}", entry.name, check.reason()));
                    still_pending.push(entry);
                }
            }
            pending = still_pending;

            if pending.is_empty() && in_flight.is_empty() {
                break;
            }

            // Deadlock: nothing submitted and nothing running that could help
            if submitted == 0 && in_flight.is_empty() {
                self.fail_deadlocked(pending, completed)?;
                break;
            }

            // Wait-and-harvest a single completion, then resubmit
            if let Some((name, joined)) = running.next().await {
                in_flight.remove(&name);
                let record = match joined {
                    Ok(record) => record,
                    Err(err) => self.record_join_failure(&name, err),
                };
                completed.insert(&name, record)?;
            }
        }
        Ok(())
    }

    fn spawn(&self, entry: PendingPlugin, ctx: RunContext) -> Harvest {
        let engine = self.engine.clone();
        let PendingPlugin { name, mut plugin } = entry;
        let handle = tokio::spawn(async move { engine.execute(plugin.as_mut(), &ctx).await });
        async move { (name, handle.await) }.boxed()
    }

    fn fail_deadlocked(
        &self,
        pending: Vec<PendingPlugin>,
        completed: &mut CompletedResults,
    ) -> SchedulerResult<()> {
        // Reasons are computed against the same snapshot for every plugin
        let failures: Vec<(String, String)> = pending
            .iter()
            .map(|entry| {
                let check = entry.plugin.check_dependencies(completed);
                (entry.name.clone(), check.reason().to_string())
            })
            .collect();

        for (name, reason) in failures {
            let message = format!("Dependency deadlock: {}", reason);
            self.logger
                .warn(format_args!("'{}' can never run: {}", name, reason));

            let mut timing = TimingRecord::new(&name);
            timing.error = Some(message.clone());
            self.timings.append(timing);

            let record = ResultRecord::fail(&name, message).with_timestamp(self.time.utc_now());
            completed.insert(&name, record)?;
        }
        Ok(())
    }

    fn record_join_failure(&self, name: &str, err: JoinError) -> ResultRecord {
        let message = if err.is_panic() {
            format!("Plugin '{}' panicked: {}", name, panic_message(err.into_panic().as_ref()))
        } else {
            format!("Plugin '{}' task was cancelled", name)
        };
        self.logger.error(format_args!("{}", message));

        let now = self.time.utc_now();
        let mut timing = TimingRecord::new(name);
        timing.mark_failed(now, None, message.clone());
        self.timings.append(timing);
        ResultRecord::fail(name, message).with_timestamp(now)
    }
}
