use std::io::Write as _;

use dirbench_core::driver::UnitState;

use super::OutputFormatter;
use crate::analyze::AnalyzeSummary;
use crate::bench::BenchSummary;
use crate::timeline::TimelineSummary;

pub(crate) struct HumanReadableOutput;

impl OutputFormatter for HumanReadableOutput {
    fn print_bench(&self, summary: &BenchSummary<'_>) -> anyhow::Result<()> {
        let report = summary.report;
        let mut out = std::io::stdout().lock();

        writeln!(
            out,
            "units: {} (completed {}, non-zero exit {}, failed to launch {})",
            report.outcomes.len(),
            report.completed(),
            report.nonzero_exits(),
            report.failed().count()
        )?;
        writeln!(
            out,
            "elapsed: {}",
            humantime::format_duration(std::time::Duration::from_secs(report.elapsed.as_secs()))
        )?;

        for o in &report.outcomes {
            match &o.state {
                UnitState::Failed { error } => {
                    writeln!(out, "failed: {} ({}): {error}", o.unit.run_id(), o.unit.target.url)?;
                }
                UnitState::Completed {
                    exit_code: Some(code),
                    ..
                } if *code != 0 => {
                    writeln!(out, "exit {code}: {} ({})", o.unit.run_id(), o.unit.target.url)?;
                }
                _ => {}
            }
        }

        writeln!(out, "run logs: {}", summary.out_dir.display())?;
        Ok(())
    }

    fn print_analyze(&self, summary: &AnalyzeSummary) -> anyhow::Result<()> {
        let mut out = std::io::stdout().lock();

        writeln!(
            out,
            "found {} run logs, aggregated {}",
            summary.found, summary.aggregated
        )?;
        for (path, error) in &summary.skipped_files {
            writeln!(out, "skipped {}: {error}", path.display())?;
        }
        for (group, error) in &summary.dropped_groups {
            writeln!(out, "dropped group {group}: {error}")?;
        }
        writeln!(out, "groups: {}", summary.groups)?;
        for path in &summary.reports {
            writeln!(out, "wrote {}", path.display())?;
        }
        Ok(())
    }

    fn print_timeline(&self, summary: &TimelineSummary) -> anyhow::Result<()> {
        let mut out = std::io::stdout().lock();

        writeln!(
            out,
            "found {} run logs, aggregated {}",
            summary.found, summary.aggregated
        )?;
        for (path, error) in &summary.skipped_files {
            writeln!(out, "skipped {}: {error}", path.display())?;
        }
        for group in &summary.missing {
            writeln!(out, "no iteration {} for {group}", summary.iteration)?;
        }
        for path in &summary.written {
            writeln!(out, "wrote {}", path.display())?;
        }
        Ok(())
    }
}
