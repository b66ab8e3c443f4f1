//! Run-over-time tables: how discovered responses accumulate during one iteration.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::event::TIMESTAMP_UNITS_PER_SEC;
use crate::index::{GroupKey, RunIndex};
use crate::parser_type::ParserType;
use crate::record::RunRecord;
use crate::table::{TABLE_EXTENSION, csv_field, format_decimal};

const HEADER: &str = "Time,Total,Time Of Finish,Parser,Status Code,URL";

#[derive(Debug, Clone, PartialEq)]
pub struct TimelinePoint {
    /// Seconds since the run started.
    pub seconds: f64,
    /// Responses seen so far, this one included.
    pub total: usize,
    /// Fraction of the run's duration, when the log carries a finish time.
    pub fraction_of_finish: Option<f64>,
    pub parser: ParserType,
    pub status_code: u16,
    pub url: String,
}

pub fn timeline(record: &RunRecord) -> Vec<TimelinePoint> {
    let duration = record
        .finish_time()
        .and_then(|t| t.checked_sub(record.start_time()))
        .filter(|d| *d > 0);

    let mut responses: Vec<_> = record.responses().iter().collect();
    responses.sort_by(|a, b| {
        a.1.relative_time
            .cmp(&b.1.relative_time)
            .then_with(|| a.0.cmp(b.0))
    });

    responses
        .into_iter()
        .enumerate()
        .map(|(idx, (url, r))| TimelinePoint {
            seconds: r.relative_time as f64 / TIMESTAMP_UNITS_PER_SEC,
            total: idx + 1,
            fraction_of_finish: duration.map(|d| r.relative_time as f64 / d as f64),
            parser: r.parser,
            status_code: r.status_code,
            url: url.clone(),
        })
        .collect()
}

pub fn render_timeline(points: &[TimelinePoint]) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for p in points {
        let fraction = p.fraction_of_finish.map(format_decimal).unwrap_or_default();
        out.push_str(&format!(
            "{},{},{fraction},{},{},{}\n",
            format_decimal(p.seconds),
            p.total,
            p.parser,
            p.status_code,
            csv_field(&p.url)
        ));
    }
    out
}

#[derive(Debug, Default)]
pub struct TimelineOutput {
    pub written: Vec<PathBuf>,
    /// Groups that have no run with the requested iteration.
    pub missing: Vec<GroupKey>,
}

/// Writes `{mode}_{site}_timeline.csv` for every group's run of `iteration`.
pub fn write_timelines(index: &RunIndex, iteration: u32, out_dir: &Path) -> Result<TimelineOutput> {
    std::fs::create_dir_all(out_dir).map_err(|err| Error::io_at(out_dir, err))?;

    let mut output = TimelineOutput::default();
    for (key, runs) in index.groups() {
        let Some(record) = runs.iter().find(|r| r.iteration() == iteration) else {
            tracing::warn!(group = %key, iteration, "no run for requested iteration");
            output.missing.push(key.clone());
            continue;
        };

        let path = out_dir.join(format!(
            "{}_{}_timeline.{TABLE_EXTENSION}",
            key.mode, key.site
        ));
        std::fs::write(&path, render_timeline(&timeline(record)))
            .map_err(|err| Error::io_at(&path, err))?;
        output.written.push(path);
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ResponseEntry, RunId, RunRecordParts, RunTotals};

    fn entry(relative_time: i64, parser: ParserType) -> ResponseEntry {
        ResponseEntry {
            relative_time,
            parser,
            status_code: 200,
        }
    }

    #[test]
    fn points_accumulate_in_time_order() {
        let record: RunRecord = RunRecordParts {
            id: RunId {
                mode: "all".to_string(),
                site: "site1".to_string(),
                iteration: 1,
            },
            start_time: 1_000_000_000,
            finish_time: Some(5_000_000_000),
            responses: vec![
                ("http://s/late".to_string(), entry(3_000_000_000, ParserType::Href)),
                ("http://s/early".to_string(), entry(1_000_000_000, ParserType::Dict)),
            ],
            totals: RunTotals::default(),
            parser_stats: Vec::new(),
        }
        .into();

        let points = timeline(&record);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].url, "http://s/early");
        assert_eq!(points[0].seconds, 1.0);
        assert_eq!(points[0].total, 1);
        assert_eq!(points[0].fraction_of_finish, Some(0.25));
        assert_eq!(points[1].total, 2);
        assert_eq!(points[1].fraction_of_finish, Some(0.75));

        let csv = render_timeline(&points);
        assert_eq!(
            csv.lines().nth(1),
            Some("1.0,1,0.25,Dict,200,http://s/early")
        );
    }

    #[test]
    fn url_with_commas_stays_in_one_column() {
        let log = "0,Start\n50,Response,Href,200,0,http://s/a?x=1,2\n200,Finish,1,1,0.1\n";
        let record = RunRecord::from_reader(
            RunId {
                mode: "all".to_string(),
                site: "site1".to_string(),
                iteration: 0,
            },
            Path::new("out_all_site1_0.txt"),
            log.as_bytes(),
        )
        .unwrap_or_else(|e| panic!("parse failed: {e}"));

        let csv = render_timeline(&timeline(&record));
        let row = csv.lines().nth(1).unwrap_or_default();
        assert_eq!(row, "0.00000005,1,0.25,Href,200,\"http://s/a?x=1,2\"");

        let header_cols = HEADER.split(',').count();
        let row_cols = row.replacen("\"http://s/a?x=1,2\"", "url", 1).split(',').count();
        assert_eq!(row_cols, header_cols);
    }

    #[test]
    fn missing_finish_leaves_fraction_empty() {
        let record: RunRecord = RunRecordParts {
            id: RunId {
                mode: "all".to_string(),
                site: "site1".to_string(),
                iteration: 1,
            },
            start_time: 0,
            finish_time: None,
            responses: vec![("http://s/".to_string(), entry(500_000_000, ParserType::Src))],
            totals: RunTotals::default(),
            parser_stats: Vec::new(),
        }
        .into();

        let csv = render_timeline(&timeline(&record));
        assert_eq!(csv.lines().nth(1), Some("0.5,1,,Src,200,http://s/"));
    }
}
