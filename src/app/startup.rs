//! Application startup: arguments, configuration, logging, then the run

use crate::app::cli::args::Args;
use crate::app::cli::config::{self, ConfigError, LogSettings, RunSettings};
use crate::app::cli::display;
use crate::core::error_handling::{fatal_message, log_error_with_context};
use crate::core::logging::{init_logging, ScopedLogger};
use crate::core::version;
use crate::plugin::api::PluginContext;
use crate::report::api::{print_summary, write_html, write_results};
use crate::scheduler::api::{RunOutcome, Scheduler, SchedulerOptions};
use std::io::IsTerminal;

/// Process exit codes
pub const EXIT_OK: i32 = 0;
pub const EXIT_STARTUP_ERROR: i32 = 1;
pub const EXIT_PLUGIN_FAILED: i32 = 2;

/// Run the application and return the process exit code
pub async fn startup() -> i32 {
    let args = match Args::try_parse_styled(std::env::args_os()) {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                EXIT_STARTUP_ERROR
            } else {
                EXIT_OK
            };
        }
    };
    execute(args).await
}

/// Everything after argument parsing
pub async fn execute(args: Args) -> i32 {
    let (file_config, config_path) = match config::load_config(args.config_file.as_deref()).await {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("{}", fatal_message(&err, "loading configuration"));
            return EXIT_STARTUP_ERROR;
        }
    };

    let log_settings = LogSettings::resolve(&args, &file_config, std::io::stderr().is_terminal());
    if let Err(err) = init_logging(
        Some(&log_settings.level),
        log_settings.format.as_deref(),
        log_settings.file.as_deref(),
        log_settings.color,
    ) {
        eprintln!("Warning: logging unavailable: {}", err);
    }

    log::info!(
        "scanorch {} ({}) starting, config: {}",
        version::version(),
        version::git_hash(),
        config_path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "none".to_string())
    );

    let settings = match RunSettings::resolve(&args, file_config) {
        Ok(settings) => settings,
        Err(err) => {
            log_error_with_context(&err, "resolving settings");
            return EXIT_STARTUP_ERROR;
        }
    };
    let color = log_settings.color;
    let registry = settings.build_registry();

    if args.list_plugins {
        let ctx = PluginContext {
            output_dir: settings.output_dir.clone(),
            report_only: settings.report_only,
            logger: ScopedLogger::new("list"),
        };
        print!("{}", display::plugin_table(&registry, &ctx, color));
        return EXIT_OK;
    }

    let target = match settings.target.clone() {
        Some(target) => target,
        None => {
            let err = ConfigError::Invalid {
                message: "a target is required".to_string(),
            };
            log_error_with_context(&err, "resolving settings");
            return EXIT_STARTUP_ERROR;
        }
    };

    let descriptors = match registry.select(&settings.run_only, &settings.exclude) {
        Ok(descriptors) => descriptors,
        Err(err) => {
            log_error_with_context(&err, &format!("selecting plugins: {}", err));
            return EXIT_STARTUP_ERROR;
        }
    };

    let mut options = SchedulerOptions::new(&target, &settings.output_dir)
        .with_run_mode(settings.mode)
        .with_report_only(settings.report_only);
    if settings.parallel {
        options = options.with_parallel(settings.workers);
    }
    let scheduler = Scheduler::new(options, ScopedLogger::new("scheduler"));

    if args.dry_run {
        return match scheduler.dry_run(descriptors) {
            Ok(entries) => {
                print!("{}", display::render_dry_run(&entries, &target, color));
                EXIT_OK
            }
            Err(err) => {
                log_error_with_context(&err, "planning the run");
                EXIT_STARTUP_ERROR
            }
        };
    }

    let outcome = match scheduler.run(descriptors).await {
        Ok(outcome) => outcome,
        Err(err) => {
            log_error_with_context(&err, "running plugins");
            return EXIT_STARTUP_ERROR;
        }
    };

    match write_results(&settings.output_dir, &outcome).await {
        Ok(paths) => log::debug!("wrote {:?}", paths),
        Err(err) => log_error_with_context(&err, &format!("writing results: {}", err)),
    }
    if settings.html {
        match write_html(&settings.output_dir, &target, &outcome).await {
            Ok(path) => log::info!("HTML report: {}", path.display()),
            Err(err) => log_error_with_context(&err, &format!("writing HTML report: {}", err)),
        }
    }

    print_summary(&outcome, color);
    exit_code(&outcome, settings.fail_on_error)
}

/// Failed plugins only change the exit code with `--fail-on-error`
pub fn exit_code(outcome: &RunOutcome, fail_on_error: bool) -> i32 {
    if fail_on_error && !outcome.all_succeeded() {
        EXIT_PLUGIN_FAILED
    } else {
        EXIT_OK
    }
}
