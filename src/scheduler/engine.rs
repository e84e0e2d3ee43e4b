//! Execution engine: runs one plugin to completion
//!
//! Whatever the plugin does (reports unavailable, returns an error, panics)
//! the engine hands back a well-formed [`ResultRecord`] and appends exactly
//! one [`TimingRecord`] to the shared log. Nothing escapes to the scheduler.

use crate::core::logging::ScopedLogger;
use crate::core::time::TimeProvider;
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::traits::ScanPlugin;
use crate::plugin::types::{ResultRecord, RunContext};
use crate::scheduler::timing::{TimingLog, TimingRecord};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Payload of the result record for an unavailable tool
pub const TOOL_NOT_AVAILABLE: &str = "Tool not available.";

#[derive(Clone)]
pub struct ExecutionEngine {
    time: Arc<dyn TimeProvider>,
    timings: TimingLog,
    logger: ScopedLogger,
}

impl ExecutionEngine {
    pub fn new(time: Arc<dyn TimeProvider>, timings: TimingLog, logger: ScopedLogger) -> Self {
        Self {
            time,
            timings,
            logger,
        }
    }

    pub async fn execute(&self, plugin: &mut dyn ScanPlugin, ctx: &RunContext) -> ResultRecord {
        let name = plugin.name().to_string();
        let logger = self.logger.child(&name);
        let mut timing = TimingRecord::new(&name);

        let available =
            std::panic::catch_unwind(AssertUnwindSafe(|| plugin.is_available()));
        match available {
            Ok(true) => {}
            Ok(false) => {
                logger.warn(format_args!("tool not available, skipping run"));
                let now = self.time.utc_now();
                timing.mark_unavailable(now);
                self.timings.append(timing);
                return ResultRecord::fail(&name, TOOL_NOT_AVAILABLE).with_timestamp(now);
            }
            Err(payload) => {
                // Failed before timing started: no duration
                let err = PluginError::Panicked {
                    plugin_name: name.clone(),
                    message: panic_message(payload.as_ref()),
                };
                return self.record_failure(&logger, timing, None, err);
            }
        }

        let started = self.time.now();
        timing.mark_started(self.time.utc_now());
        logger.info(format_args!("started against {}", ctx.target));

        let outcome = AssertUnwindSafe(run_and_post_process(plugin, ctx))
            .catch_unwind()
            .await;
        let elapsed = self.time.now().saturating_duration_since(started);

        let result = match outcome {
            Ok(result) => result,
            Err(payload) => Err(PluginError::Panicked {
                plugin_name: name.clone(),
                message: panic_message(payload.as_ref()),
            }),
        };
        // Results are keyed by plugin name
        let result = result.and_then(|record| {
            if record.name() == name {
                Ok(record)
            } else {
                Err(PluginError::Execution {
                    plugin_name: name.clone(),
                    operation: "run".to_string(),
                    cause: format!("result record is named '{}'", record.name()),
                })
            }
        });

        match result {
            Ok(record) => {
                let now = self.time.utc_now();
                timing.mark_finished(now, elapsed, record.disposition());
                self.timings.append(timing);
                logger.info(format_args!(
                    "finished with disposition '{}' in {:.2}s",
                    record.disposition(),
                    elapsed.as_secs_f64()
                ));
                record
            }
            Err(err) => self.record_failure(&logger, timing, Some(elapsed), err),
        }
    }

    fn record_failure(
        &self,
        logger: &ScopedLogger,
        mut timing: TimingRecord,
        elapsed: Option<std::time::Duration>,
        err: PluginError,
    ) -> ResultRecord {
        let message = err.to_string();
        logger.error(format_args!("{}", message));

        let now = self.time.utc_now();
        timing.mark_failed(now, elapsed, message.clone());
        let name = timing.plugin_name.clone();
        self.timings.append(timing);
        ResultRecord::fail(name, message).with_timestamp(now)
    }
}

async fn run_and_post_process(
    plugin: &mut dyn ScanPlugin,
    ctx: &RunContext,
) -> PluginResult<ResultRecord> {
    let record = plugin.run(ctx).await?;
    match plugin.post_process(&record, &ctx.output_dir).await? {
        Some(artifact) => Ok(record.with_artifact(artifact)),
        None => Ok(record),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::MockTimeProvider;
    use crate::plugin::types::{Disposition, DryRunInfo, ScanType};
    use crate::scheduler::timing::TimingStatus;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    enum Behaviour {
        Succeed,
        ReportFail,
        RunError,
        PostProcessError,
        Panic,
        UnavailablePanic,
        WrongName,
    }

    struct ScriptedPlugin {
        behaviour: Behaviour,
        available: bool,
        runs: Arc<AtomicUsize>,
        clock: Option<MockTimeProvider>,
    }

    impl ScriptedPlugin {
        fn new(behaviour: Behaviour) -> Self {
            Self {
                behaviour,
                available: true,
                runs: Arc::new(AtomicUsize::new(0)),
                clock: None,
            }
        }
    }

    #[async_trait::async_trait]
    impl ScanPlugin for ScriptedPlugin {
        fn name(&self) -> &str {
            "scripted"
        }

        fn scan_type(&self) -> ScanType {
            ScanType::Active
        }

        fn is_available(&self) -> bool {
            if matches!(self.behaviour, Behaviour::UnavailablePanic) {
                panic!("availability probe crashed");
            }
            self.available
        }

        async fn run(&mut self, _ctx: &RunContext) -> PluginResult<ResultRecord> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if let Some(clock) = &self.clock {
                clock.advance_time(Duration::from_secs(10));
            }
            match self.behaviour {
                Behaviour::ReportFail => Ok(ResultRecord::fail("scripted", "exit status 1")),
                Behaviour::RunError => Err(PluginError::Execution {
                    plugin_name: "scripted".to_string(),
                    operation: "run".to_string(),
                    cause: "connection refused".to_string(),
                }),
                Behaviour::Panic => panic!("scanner exploded"),
                Behaviour::WrongName => {
                    Ok(ResultRecord::success("impostor", serde_json::json!([])))
                }
                _ => Ok(ResultRecord::success("scripted", serde_json::json!({"hits": 3}))),
            }
        }

        async fn post_process(
            &mut self,
            _record: &ResultRecord,
            output_dir: &Path,
        ) -> PluginResult<Option<PathBuf>> {
            match self.behaviour {
                Behaviour::PostProcessError => Err(PluginError::Io {
                    operation: "write".to_string(),
                    path: output_dir.display().to_string(),
                    cause: "disk full".to_string(),
                }),
                _ => Ok(Some(output_dir.join("scripted.json"))),
            }
        }

        fn dry_run_info(&self, _target: &str, _output_dir: &Path) -> DryRunInfo {
            DryRunInfo::new("scripted")
        }
    }

    fn ctx() -> RunContext {
        RunContext {
            target: "example.com".to_string(),
            output_dir: PathBuf::from("out"),
            report_only: false,
        }
    }

    fn engine_with(clock: Arc<dyn TimeProvider>) -> (ExecutionEngine, TimingLog) {
        let timings = TimingLog::new();
        let engine = ExecutionEngine::new(clock, timings.clone(), ScopedLogger::new("test"));
        (engine, timings)
    }

    #[tokio::test]
    async fn test_success_records_artifact_and_duration() {
        let clock = MockTimeProvider::new();
        let (engine, timings) = engine_with(Arc::new(clock.clone()));
        let mut plugin = ScriptedPlugin::new(Behaviour::Succeed);
        plugin.clock = Some(clock);

        let record = engine.execute(&mut plugin, &ctx()).await;

        assert_eq!(record.disposition(), Disposition::Success);
        assert_eq!(record.artifact(), Some(Path::new("out/scripted.json")));

        let timings = timings.snapshot();
        assert_eq!(timings.len(), 1);
        assert_eq!(timings[0].status, TimingStatus::Success);
        assert_eq!(timings[0].duration_seconds, Some(10.0));
        let start = timings[0].start_timestamp.unwrap();
        let end = timings[0].end_timestamp.unwrap();
        assert_eq!(end - start, chrono::Duration::seconds(10));
    }

    #[tokio::test]
    async fn test_unavailable_never_runs() {
        let (engine, timings) = engine_with(Arc::new(MockTimeProvider::new()));
        let mut plugin = ScriptedPlugin::new(Behaviour::Succeed);
        plugin.available = false;
        let runs = plugin.runs.clone();

        let record = engine.execute(&mut plugin, &ctx()).await;

        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(record.disposition(), Disposition::Fail);
        assert_eq!(record.message(), Some(TOOL_NOT_AVAILABLE));

        let timings = timings.snapshot();
        assert_eq!(timings[0].status, TimingStatus::Unavailable);
        assert!(timings[0].start_timestamp.is_none());
    }

    #[tokio::test]
    async fn test_reported_failure_is_recorded_as_is() {
        let (engine, timings) = engine_with(Arc::new(MockTimeProvider::new()));
        let mut plugin = ScriptedPlugin::new(Behaviour::ReportFail);

        let record = engine.execute(&mut plugin, &ctx()).await;

        assert_eq!(record.message(), Some("exit status 1"));
        // Post-processing still ran on the plugin-reported failure
        assert!(record.artifact().is_some());
        assert_eq!(timings.snapshot()[0].status, TimingStatus::Fail);
    }

    #[tokio::test]
    async fn test_run_error_becomes_failed_record() {
        let (engine, timings) = engine_with(Arc::new(MockTimeProvider::new()));
        let mut plugin = ScriptedPlugin::new(Behaviour::RunError);

        let record = engine.execute(&mut plugin, &ctx()).await;

        assert_eq!(record.disposition(), Disposition::Fail);
        assert!(record.message().unwrap().contains("connection refused"));

        let timing = &timings.snapshot()[0];
        assert_eq!(timing.status, TimingStatus::Failed);
        assert!(timing.duration_seconds.is_some());
        assert!(timing.error.as_deref().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_post_process_error_becomes_failed_record() {
        let (engine, timings) = engine_with(Arc::new(MockTimeProvider::new()));
        let mut plugin = ScriptedPlugin::new(Behaviour::PostProcessError);

        let record = engine.execute(&mut plugin, &ctx()).await;

        assert!(record.message().unwrap().contains("disk full"));
        assert_eq!(timings.snapshot()[0].status, TimingStatus::Failed);
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let (engine, timings) = engine_with(Arc::new(MockTimeProvider::new()));
        let mut plugin = ScriptedPlugin::new(Behaviour::Panic);

        let record = engine.execute(&mut plugin, &ctx()).await;

        assert_eq!(record.disposition(), Disposition::Fail);
        assert!(record.message().unwrap().contains("scanner exploded"));
        assert_eq!(timings.len(), 1);
    }

    #[tokio::test]
    async fn test_panicking_availability_check_has_no_duration() {
        let (engine, timings) = engine_with(Arc::new(MockTimeProvider::new()));
        let mut plugin = ScriptedPlugin::new(Behaviour::UnavailablePanic);
        let runs = plugin.runs.clone();

        let record = engine.execute(&mut plugin, &ctx()).await;

        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(record.message().unwrap().contains("availability probe crashed"));
        let timing = &timings.snapshot()[0];
        assert_eq!(timing.status, TimingStatus::Failed);
        assert!(timing.start_timestamp.is_none());
        assert!(timing.duration_seconds.is_none());
    }

    #[tokio::test]
    async fn test_misnamed_result_becomes_failed_record() {
        let (engine, timings) = engine_with(Arc::new(MockTimeProvider::new()));
        let mut plugin = ScriptedPlugin::new(Behaviour::WrongName);

        let record = engine.execute(&mut plugin, &ctx()).await;

        assert_eq!(record.name(), "scripted");
        assert_eq!(record.disposition(), Disposition::Fail);
        assert!(record.message().unwrap().contains("'impostor'"));
        let timing = &timings.snapshot()[0];
        assert_eq!(timing.plugin_name, "scripted");
        assert_eq!(timing.status, TimingStatus::Failed);
    }

    #[test]
    fn test_panic_message_payloads() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn Any + Send> = Box::new("borrowed");
        let other: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(borrowed.as_ref()), "borrowed");
        assert_eq!(panic_message(other.as_ref()), "unknown panic payload");
    }
}
