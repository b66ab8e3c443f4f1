use serde::Serialize;
use std::io::Write as _;
use std::path::Path;

use dirbench_core::driver::{UnitOutcome, UnitState};

use super::OutputFormatter;
use crate::analyze::AnalyzeSummary;
use crate::bench::BenchSummary;
use crate::timeline::TimelineSummary;

pub(crate) struct JsonOutput;

impl OutputFormatter for JsonOutput {
    fn print_bench(&self, summary: &BenchSummary<'_>) -> anyhow::Result<()> {
        emit_json_line(&build_bench_line(summary))
    }

    fn print_analyze(&self, summary: &AnalyzeSummary) -> anyhow::Result<()> {
        emit_json_line(&build_analyze_line(summary))
    }

    fn print_timeline(&self, summary: &TimelineSummary) -> anyhow::Result<()> {
        emit_json_line(&build_timeline_line(summary))
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonBenchLine {
    pub kind: &'static str,
    pub out_dir: String,
    pub units_total: usize,
    pub units_completed: usize,
    pub units_nonzero_exit: usize,
    pub units_failed: usize,
    pub elapsed_secs: f64,
    pub units: Vec<JsonUnit>,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonUnit {
    pub mode: String,
    pub site: String,
    pub url: String,
    pub iteration: u32,
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonSkipped {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonAnalyzeLine {
    pub kind: &'static str,
    pub found: usize,
    pub aggregated: usize,
    pub groups: usize,
    pub skipped_files: Vec<JsonSkipped>,
    pub dropped_groups: Vec<JsonSkipped>,
    pub reports: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonTimelineLine {
    pub kind: &'static str,
    pub iteration: u32,
    pub found: usize,
    pub aggregated: usize,
    pub skipped_files: Vec<JsonSkipped>,
    pub missing: Vec<String>,
    pub written: Vec<String>,
}

fn build_bench_line(summary: &BenchSummary<'_>) -> JsonBenchLine {
    let report = summary.report;
    JsonBenchLine {
        kind: "bench",
        out_dir: path_string(summary.out_dir),
        units_total: report.outcomes.len(),
        units_completed: report.completed(),
        units_nonzero_exit: report.nonzero_exits(),
        units_failed: report.failed().count(),
        elapsed_secs: report.elapsed.as_secs_f64(),
        units: report.outcomes.iter().map(json_unit).collect(),
    }
}

fn json_unit(o: &UnitOutcome) -> JsonUnit {
    let mut unit = JsonUnit {
        mode: o.unit.mode.clone(),
        site: o.unit.target.site.clone(),
        url: o.unit.target.url.clone(),
        iteration: o.unit.iteration,
        state: "pending",
        exit_code: None,
        elapsed_secs: None,
        error: None,
    };

    match &o.state {
        UnitState::Pending => {}
        UnitState::Running => unit.state = "running",
        UnitState::Completed { exit_code, elapsed } => {
            unit.state = "completed";
            unit.exit_code = *exit_code;
            unit.elapsed_secs = Some(elapsed.as_secs_f64());
        }
        UnitState::Failed { error } => {
            unit.state = "failed";
            unit.error = Some(error.clone());
        }
    }
    unit
}

fn build_analyze_line(summary: &AnalyzeSummary) -> JsonAnalyzeLine {
    JsonAnalyzeLine {
        kind: "analyze",
        found: summary.found,
        aggregated: summary.aggregated,
        groups: summary.groups,
        skipped_files: summary
            .skipped_files
            .iter()
            .map(|(path, error)| JsonSkipped {
                path: path_string(path),
                error: error.clone(),
            })
            .collect(),
        dropped_groups: summary
            .dropped_groups
            .iter()
            .map(|(group, error)| JsonSkipped {
                path: group.to_string(),
                error: error.clone(),
            })
            .collect(),
        reports: summary.reports.iter().map(|p| path_string(p)).collect(),
    }
}

fn build_timeline_line(summary: &TimelineSummary) -> JsonTimelineLine {
    JsonTimelineLine {
        kind: "timeline",
        iteration: summary.iteration,
        found: summary.found,
        aggregated: summary.aggregated,
        skipped_files: summary
            .skipped_files
            .iter()
            .map(|(path, error)| JsonSkipped {
                path: path_string(path),
                error: error.clone(),
            })
            .collect(),
        missing: summary.missing.iter().map(ToString::to_string).collect(),
        written: summary.written.iter().map(|p| path_string(p)).collect(),
    }
}

fn path_string(path: &Path) -> String {
    path.display().to_string()
}

fn emit_json_line<T: Serialize>(line: &T) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer(&mut out, line)?;
    writeln!(out)?;
    Ok(())
}
