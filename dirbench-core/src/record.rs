use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};
use crate::event::LogEvent;
use crate::parser_type::{ParserType, PerParser};

const NAME_SEPARATOR: char = '_';
const NAME_SEGMENTS: usize = 4;

const OFFSET_OVERFLOW: &str = "timestamp offset from `Start` is out of range";

/// Identity of one scanner run: `{prefix}_{mode}_{site}_{iteration}.{ext}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId {
    pub mode: String,
    pub site: String,
    pub iteration: u32,
}

impl RunId {
    pub fn from_path(path: &Path) -> Result<Self> {
        let bad_name = |reason: String| Error::FileName {
            path: path.to_path_buf(),
            reason,
        };

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| bad_name("file name is not valid UTF-8".to_string()))?;

        let segments: Vec<&str> = stem.split(NAME_SEPARATOR).collect();
        let [_, mode, site, iteration] = segments.as_slice() else {
            return Err(bad_name(format!(
                "expected {NAME_SEGMENTS} `{NAME_SEPARATOR}`-separated segments, found {}",
                segments.len()
            )));
        };

        if mode.is_empty() || site.is_empty() {
            return Err(bad_name("empty mode or site segment".to_string()));
        }

        let iteration = iteration
            .parse()
            .map_err(|_| bad_name(format!("iteration `{iteration}` is not a number")))?;

        Ok(Self {
            mode: mode.to_string(),
            site: site.to_string(),
            iteration,
        })
    }

    /// File name for this run under `prefix`, e.g. `out_dict_site1_0.txt`.
    #[must_use]
    pub fn file_name(&self, prefix: &str, extension: &str) -> String {
        format!(
            "{prefix}_{}_{}_{}.{extension}",
            self.mode, self.site, self.iteration
        )
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.mode, self.site, self.iteration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponseEntry {
    /// Offset from the run's `Start` event, in scanner timestamp units.
    pub relative_time: i64,
    pub parser: ParserType,
    pub status_code: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunTotals {
    pub requests_total: u64,
    pub requests_valid: u64,
    pub elapsed_minutes: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserCounts {
    pub valid: u64,
    pub total: u64,
}

/// One parsed scanner run. Built in a single pass over its log and never mutated after.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    id: RunId,
    start_time: i64,
    finish_time: Option<i64>,
    responses: HashMap<String, ResponseEntry>,
    totals: RunTotals,
    parser_stats: PerParser<ParserCounts>,
}

impl RunRecord {
    pub fn from_path(path: &Path) -> Result<Self> {
        let id = RunId::from_path(path)?;
        let file = File::open(path).map_err(|err| Error::io_at(path, err))?;
        Self::from_reader(id, path, BufReader::new(file))
    }

    /// Builds a record from log lines; `path` is only used in error messages.
    pub fn from_reader(id: RunId, path: &Path, reader: impl BufRead) -> Result<Self> {
        let mut builder = RecordBuilder::new(id);

        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|err| Error::io_at(path, err))?;
            let line = line.strip_suffix('\r').unwrap_or(&line);

            let event = LogEvent::decode(line).map_err(|err| Error::Parse {
                path: path.to_path_buf(),
                line: idx + 1,
                reason: err.to_string(),
            })?;

            match event {
                Some(event) => builder.apply(event).map_err(|reason| Error::Parse {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    reason: reason.to_string(),
                })?,
                None if !line.trim().is_empty() => {
                    tracing::trace!(
                        path = %path.display(),
                        line = idx + 1,
                        "skipping unrecognised line"
                    );
                }
                None => {}
            }
        }

        Ok(builder.finish())
    }

    pub fn id(&self) -> &RunId {
        &self.id
    }

    pub fn mode(&self) -> &str {
        &self.id.mode
    }

    pub fn site(&self) -> &str {
        &self.id.site
    }

    pub fn iteration(&self) -> u32 {
        self.id.iteration
    }

    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    pub fn finish_time(&self) -> Option<i64> {
        self.finish_time
    }

    pub fn responses(&self) -> &HashMap<String, ResponseEntry> {
        &self.responses
    }

    pub fn totals(&self) -> RunTotals {
        self.totals
    }

    pub fn parser_stats(&self) -> &PerParser<ParserCounts> {
        &self.parser_stats
    }

    /// Serializes the record as an event log that parses back to an equal record.
    ///
    /// Response lines are written in ascending time order.
    #[must_use]
    pub fn to_log(&self) -> String {
        let mut events = vec![LogEvent::Start {
            timestamp: self.start_time,
        }];

        let mut responses: Vec<_> = self.responses.iter().collect();
        responses.sort_by(|a, b| a.1.relative_time.cmp(&b.1.relative_time).then(a.0.cmp(b.0)));
        events.extend(responses.into_iter().map(|(url, r)| LogEvent::Response {
            timestamp: self.start_time.saturating_add(r.relative_time),
            parser: r.parser,
            status_code: r.status_code,
            url: url.clone(),
        }));

        events.extend(self.parser_stats.iter().map(|(parser, c)| LogEvent::ParserStat {
            parser,
            valid: c.valid,
            total: c.total,
        }));

        events.push(LogEvent::Finish {
            timestamp: self.finish_time,
            total_requests: self.totals.requests_total,
            valid_responses: self.totals.requests_valid,
            elapsed_minutes: self.totals.elapsed_minutes,
        });

        let mut out = String::new();
        for ev in events {
            out.push_str(&ev.to_string());
            out.push('\n');
        }
        out
    }
}

struct RecordBuilder {
    record: RunRecord,
}

impl RecordBuilder {
    fn new(id: RunId) -> Self {
        Self {
            record: RunRecord {
                id,
                start_time: 0,
                finish_time: None,
                responses: HashMap::new(),
                totals: RunTotals::default(),
                parser_stats: PerParser::default(),
            },
        }
    }

    fn apply(&mut self, event: LogEvent) -> std::result::Result<(), &'static str> {
        let r = &mut self.record;
        match event {
            LogEvent::Start { timestamp } => r.start_time = timestamp,
            LogEvent::Response {
                timestamp,
                parser,
                status_code,
                url,
            } => {
                let relative_time = timestamp
                    .checked_sub(r.start_time)
                    .ok_or(OFFSET_OVERFLOW)?;
                // A url probed twice keeps its latest result.
                r.responses.insert(
                    url,
                    ResponseEntry {
                        relative_time,
                        parser,
                        status_code,
                    },
                );
            }
            LogEvent::Finish {
                timestamp,
                total_requests,
                valid_responses,
                elapsed_minutes,
            } => {
                if let Some(ts) = timestamp {
                    ts.checked_sub(r.start_time).ok_or(OFFSET_OVERFLOW)?;
                }
                r.finish_time = timestamp;
                r.totals = RunTotals {
                    requests_total: total_requests,
                    requests_valid: valid_responses,
                    elapsed_minutes,
                };
            }
            LogEvent::ParserStat {
                parser,
                valid,
                total,
            } => r.parser_stats[parser] = ParserCounts { valid, total },
        }
        Ok(())
    }

    fn finish(self) -> RunRecord {
        self.record
    }
}

/// Test and fixture helper for assembling records without going through a log file.
#[derive(Debug, Clone)]
pub struct RunRecordParts {
    pub id: RunId,
    pub start_time: i64,
    pub finish_time: Option<i64>,
    pub responses: Vec<(String, ResponseEntry)>,
    pub totals: RunTotals,
    pub parser_stats: Vec<(ParserType, ParserCounts)>,
}

impl From<RunRecordParts> for RunRecord {
    fn from(parts: RunRecordParts) -> Self {
        let mut parser_stats = PerParser::default();
        for (ty, counts) in parts.parser_stats {
            parser_stats[ty] = counts;
        }

        Self {
            id: parts.id,
            start_time: parts.start_time,
            finish_time: parts.finish_time,
            responses: parts.responses.into_iter().collect(),
            totals: parts.totals,
            parser_stats,
        }
    }
}
