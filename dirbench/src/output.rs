use crate::cli::OutputFormat;

mod human;
mod json;

pub(crate) use human::HumanReadableOutput;

use crate::analyze::AnalyzeSummary;
use crate::bench::BenchSummary;
use crate::timeline::TimelineSummary;

pub(crate) trait OutputFormatter: Send + Sync {
    fn print_bench(&self, summary: &BenchSummary<'_>) -> anyhow::Result<()>;
    fn print_analyze(&self, summary: &AnalyzeSummary) -> anyhow::Result<()>;
    fn print_timeline(&self, summary: &TimelineSummary) -> anyhow::Result<()>;
}

pub(crate) fn formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::HumanReadable => Box::new(HumanReadableOutput),
        OutputFormat::Json => Box::new(json::JsonOutput),
    }
}
