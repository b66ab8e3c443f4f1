use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::index::{GroupKey, RunIndex};
use crate::parser_type::PerParser;
use crate::record::RunRecord;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct MeanTotals {
    pub requests_total: f64,
    pub requests_valid: f64,
    pub elapsed_minutes: f64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct MeanCounts {
    pub valid: f64,
    pub total: f64,
}

/// Mean of all iterations recorded for one `(mode, site)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub runs: usize,
    pub totals: MeanTotals,
    pub parser_stats: PerParser<MeanCounts>,
}

impl Summary {
    /// Averages the iterations of `key`. Every run must belong to `key`.
    pub fn for_group(key: &GroupKey, runs: &[RunRecord]) -> Result<Self> {
        if runs.is_empty() {
            return Err(Error::EmptyGroup {
                mode: key.mode.clone(),
                site: key.site.clone(),
            });
        }

        if let Some(stray) = runs.iter().find(|r| r.mode() != key.mode || r.site() != key.site) {
            return Err(Error::MixedGroup {
                mode: key.mode.clone(),
                site: key.site.clone(),
                found_mode: stray.mode().to_string(),
                found_site: stray.site().to_string(),
            });
        }

        let totals = MeanTotals {
            requests_total: mean(runs, |r| r.totals().requests_total as f64),
            requests_valid: mean(runs, |r| r.totals().requests_valid as f64),
            elapsed_minutes: mean(runs, |r| r.totals().elapsed_minutes),
        };

        let parser_stats = PerParser::from_fn(|ty| MeanCounts {
            valid: mean(runs, |r| r.parser_stats()[ty].valid as f64),
            total: mean(runs, |r| r.parser_stats()[ty].total as f64),
        });

        Ok(Self {
            runs: runs.len(),
            totals,
            parser_stats,
        })
    }
}

fn mean(runs: &[RunRecord], value: impl Fn(&RunRecord) -> f64) -> f64 {
    runs.iter().map(value).sum::<f64>() / runs.len() as f64
}

/// Per-response timing aggregate across iterations.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ResponseTimeSummary {
    pub points: Vec<(f64, f64)>,
}

/// Not computed yet: always empty. Per-response detail is available through
/// [`crate::timeline`] for a single iteration.
pub fn summarize_response_times(_runs: &[RunRecord]) -> ResponseTimeSummary {
    ResponseTimeSummary::default()
}

/// Summaries for every group of an index.
#[derive(Debug, Default)]
pub struct SummaryTable {
    pub summaries: BTreeMap<GroupKey, Summary>,
    pub failures: Vec<(GroupKey, Error)>,
}

impl SummaryTable {
    pub fn insert(&mut self, key: GroupKey, summary: Summary) {
        self.summaries.insert(key, summary);
    }
}

pub fn summarize_index(index: &RunIndex) -> SummaryTable {
    let mut table = SummaryTable::default();

    for (key, runs) in index.groups() {
        match Summary::for_group(key, runs) {
            Ok(summary) => table.insert(key.clone(), summary),
            Err(error) => {
                tracing::warn!(group = %key, %error, "dropping group from reports");
                table.failures.push((key.clone(), error));
            }
        }
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser_type::ParserType;
    use crate::record::{ParserCounts, RunId, RunRecordParts, RunTotals};

    fn run(site: &str, iteration: u32, requests_total: u64, dict: (u64, u64)) -> RunRecord {
        RunRecordParts {
            id: RunId {
                mode: "all".to_string(),
                site: site.to_string(),
                iteration,
            },
            start_time: 0,
            finish_time: None,
            responses: Vec::new(),
            totals: RunTotals {
                requests_total,
                requests_valid: requests_total / 10,
                elapsed_minutes: 2.5,
            },
            parser_stats: vec![(
                ParserType::Dict,
                ParserCounts {
                    valid: dict.0,
                    total: dict.1,
                },
            )],
        }
        .into()
    }

    fn summarize(runs: &[RunRecord]) -> Summary {
        Summary::for_group(&GroupKey::new("all", "site1"), runs)
            .unwrap_or_else(|e| panic!("summary failed: {e}"))
    }

    #[test]
    fn averages_three_iterations() {
        let s = summarize(&[
            run("site1", 0, 100, (1, 10)),
            run("site1", 1, 150, (2, 10)),
            run("site1", 2, 200, (4, 11)),
        ]);

        assert_eq!(s.runs, 3);
        assert_eq!(s.totals.requests_total, 150.0);
        assert_eq!(s.totals.requests_valid, 15.0);
        assert_eq!(s.totals.elapsed_minutes, 2.5);
        assert_eq!(s.parser_stats[ParserType::Dict].valid, 7.0 / 3.0);
        assert_eq!(s.parser_stats[ParserType::Dict].total, 31.0 / 3.0);
    }

    #[test]
    fn single_iteration_is_identity() {
        let r = run("site1", 0, 123, (5, 9));
        let s = summarize(std::slice::from_ref(&r));

        assert_eq!(s.totals.requests_total, r.totals().requests_total as f64);
        assert_eq!(s.totals.requests_valid, r.totals().requests_valid as f64);
        assert_eq!(s.totals.elapsed_minutes, r.totals().elapsed_minutes);
        for (ty, counts) in r.parser_stats().iter() {
            assert_eq!(s.parser_stats[ty].valid, counts.valid as f64);
            assert_eq!(s.parser_stats[ty].total, counts.total as f64);
        }
    }

    #[test]
    fn absent_parser_type_averages_to_zero() {
        let s = summarize(&[run("site1", 0, 1, (1, 1)), run("site1", 1, 1, (1, 1))]);
        assert_eq!(s.parser_stats[ParserType::Script], MeanCounts::default());
    }

    #[test]
    fn empty_and_mixed_groups_are_rejected() {
        let key = GroupKey::new("all", "site1");
        assert!(matches!(
            Summary::for_group(&key, &[]),
            Err(Error::EmptyGroup { .. })
        ));
        assert!(matches!(
            Summary::for_group(&key, &[run("site1", 0, 1, (0, 0)), run("site2", 0, 1, (0, 0))]),
            Err(Error::MixedGroup { .. })
        ));
    }

    #[test]
    fn empty_group_in_index_does_not_sink_the_others() {
        let mut index = RunIndex::new();
        index.insert(run("site1", 0, 10, (0, 0)));
        index.open_group(GroupKey::new("all", "ghost"));

        let table = summarize_index(&index);
        assert_eq!(table.summaries.len(), 1);
        assert_eq!(table.failures.len(), 1);
        assert!(matches!(table.failures[0].1, Error::EmptyGroup { .. }));
    }

    #[test]
    fn response_time_summary_is_not_computed() {
        let runs = [run("site1", 0, 10, (0, 0))];
        assert!(summarize_response_times(&runs).points.is_empty());
    }
}
