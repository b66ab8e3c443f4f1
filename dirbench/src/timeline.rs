use anyhow::Context as _;
use std::path::PathBuf;

use dirbench_core::timeline::write_timelines;
use dirbench_core::{GroupKey, RunIndex, discover_run_logs};

use crate::cli::TimelineArgs;
use crate::command_error::{CommandError, ResultExt as _};
use crate::exit_codes::ExitCode;
use crate::output;

#[derive(Debug, Default)]
pub(crate) struct TimelineSummary {
    pub iteration: u32,
    pub found: usize,
    pub aggregated: usize,
    pub skipped_files: Vec<(PathBuf, String)>,
    pub missing: Vec<GroupKey>,
    pub written: Vec<PathBuf>,
}

pub(crate) fn timeline(args: TimelineArgs) -> Result<ExitCode, CommandError> {
    let out = output::formatter(args.output);

    if !args.directory.is_dir() {
        return Err(CommandError::invalid_input(anyhow::anyhow!(
            "input directory does not exist: {}",
            args.directory.display()
        )));
    }

    let logs = discover_run_logs(&args.directory, &args.prefix)
        .with_context(|| format!("list run logs in {}", args.directory.display()))
        .runtime_error()?;
    let load = RunIndex::load(&logs);

    let written = write_timelines(&load.index, args.iteration, &args.out_dir)
        .with_context(|| format!("write timelines to {}", args.out_dir.display()))
        .runtime_error()?;

    let summary = TimelineSummary {
        iteration: args.iteration,
        found: load.found,
        aggregated: load.aggregated(),
        skipped_files: load
            .failures
            .iter()
            .map(|f| (f.path.clone(), f.error.to_string()))
            .collect(),
        missing: written.missing,
        written: written.written,
    };

    out.print_timeline(&summary).runtime_error()?;
    Ok(ExitCode::from_skipped(summary.skipped_files.len()))
}
