use anyhow::Context as _;
use std::path::Path;
use std::time::Duration;

use dirbench_core::Error;
use dirbench_core::driver::{
    BenchPlan, BenchReport, ScanSettings, ScannerCommand, load_targets, run_bench,
};

use crate::cli::BenchArgs;
use crate::command_error::{CommandError, ResultExt as _};
use crate::exit_codes::ExitCode;
use crate::output;

/// Script launched through `--python` when `--exec-dir` is given.
const SCANNER_SCRIPT: &str = "intellidirb.py";

pub(crate) struct BenchSummary<'a> {
    pub report: &'a BenchReport,
    pub out_dir: &'a Path,
}

pub(crate) async fn bench(args: BenchArgs) -> Result<ExitCode, CommandError> {
    let out = output::formatter(args.output);
    let plan = plan(&args)?;

    tracing::info!(
        targets = plan.targets.len(),
        modes = plan.modes.len(),
        iterations = plan.iterations,
        units = plan.unit_count(),
        out_dir = %plan.settings.out_dir.display(),
        "starting bench"
    );

    let report = run_bench(&plan).await.map_err(classify)?;

    let elapsed = Duration::from_secs(report.elapsed.as_secs());
    tracing::info!(
        completed = report.completed(),
        failed = report.failed().count(),
        elapsed = %humantime::format_duration(elapsed),
        "bench finished"
    );

    out.print_bench(&BenchSummary {
        report: &report,
        out_dir: &plan.settings.out_dir,
    })
    .runtime_error()?;

    if report.failed().next().is_some() {
        Ok(ExitCode::UnitsFailed)
    } else {
        Ok(ExitCode::Success)
    }
}

fn plan(args: &BenchArgs) -> Result<BenchPlan, CommandError> {
    let targets = load_targets(&args.target_file)
        .with_context(|| format!("load targets from {}", args.target_file.display()))
        .invalid_input()?;
    if targets.is_empty() {
        return Err(CommandError::invalid_input(anyhow::anyhow!(
            "no targets in {}",
            args.target_file.display()
        )));
    }

    Ok(BenchPlan {
        settings: ScanSettings {
            scanner: scanner_command(args)?,
            wordlist: args.wordlist.clone(),
            threads: args.threads,
            extensions: Some(args.extensions.trim())
                .filter(|e| !e.is_empty())
                .map(str::to_string),
            out_dir: args.out_dir.clone(),
        },
        targets,
        modes: args.modes.clone(),
        iterations: args.iterations,
        max_concurrency: args
            .max_concurrency
            .map(|n| usize::try_from(n).unwrap_or(usize::MAX)),
    })
}

fn scanner_command(args: &BenchArgs) -> Result<ScannerCommand, CommandError> {
    match (&args.exec_dir, &args.scanner) {
        (Some(dir), _) => Ok(ScannerCommand::new(&args.python).arg(dir.join(SCANNER_SCRIPT))),
        (None, Some(program)) => Ok(args
            .scanner_args
            .iter()
            .fold(ScannerCommand::new(program), |cmd, a| cmd.arg(a))),
        (None, None) => Err(CommandError::invalid_input(anyhow::anyhow!(
            "either --exec-dir or --scanner is required"
        ))),
    }
}

fn classify(err: Error) -> CommandError {
    match err {
        Error::InvalidMode(_) | Error::InvalidTarget(_) | Error::DuplicateSite(_) => {
            CommandError::invalid_input(err)
        }
        other => CommandError::runtime(other),
    }
}
