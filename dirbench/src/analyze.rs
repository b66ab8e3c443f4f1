use anyhow::Context as _;
use std::path::PathBuf;

use dirbench_core::{
    GroupKey, ReportSet, ReportWriter, RunIndex, discover_run_logs, summarize_index,
};

use crate::cli::AnalyzeArgs;
use crate::command_error::{CommandError, ResultExt as _};
use crate::exit_codes::ExitCode;
use crate::output;

#[derive(Debug, Default)]
pub(crate) struct AnalyzeSummary {
    pub found: usize,
    pub aggregated: usize,
    pub groups: usize,
    pub skipped_files: Vec<(PathBuf, String)>,
    pub dropped_groups: Vec<(GroupKey, String)>,
    pub reports: Vec<PathBuf>,
}

impl AnalyzeSummary {
    fn skipped(&self) -> usize {
        self.skipped_files.len() + self.dropped_groups.len()
    }
}

pub(crate) fn analyze(args: AnalyzeArgs) -> Result<ExitCode, CommandError> {
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
    tracing::info!(dir = %args.directory.display(), found = logs.len(), "discovered run logs");

    let load = RunIndex::load(&logs);
    let table = summarize_index(&load.index);
    let reports = ReportSet::build(&table);

    let out_dir = args.out_dir.unwrap_or_else(|| args.directory.clone());
    let written = ReportWriter::new(out_dir.clone())
        .create_dir(args.create_out_dir)
        .write_all(&reports)
        .with_context(|| format!("write reports to {}", out_dir.display()))
        .runtime_error()?;

    let summary = AnalyzeSummary {
        found: load.found,
        aggregated: load.aggregated(),
        groups: table.summaries.len(),
        skipped_files: load
            .failures
            .iter()
            .map(|f| (f.path.clone(), f.error.to_string()))
            .collect(),
        dropped_groups: table
            .failures
            .iter()
            .map(|(key, err)| (key.clone(), err.to_string()))
            .collect(),
        reports: written,
    };

    out.print_analyze(&summary).runtime_error()?;
    Ok(ExitCode::from_skipped(summary.skipped()))
}
