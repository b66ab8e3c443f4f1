use std::fmt;
use std::str::FromStr;

use crate::parser_type::ParserType;

/// Scanner timestamps are nanoseconds since the epoch.
pub const TIMESTAMP_UNITS_PER_SEC: f64 = 1e9;

const FIELD_SEPARATOR: char = ',';

// Response lines carry the url last; it may itself contain commas.
const MAX_FIELDS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
pub enum EventTag {
    Start,
    Response,
    Finish,
    ParserStat,
}

impl EventTag {
    fn min_fields(self) -> usize {
        match self {
            Self::Start => 2,
            Self::Response => 6,
            Self::Finish | Self::ParserStat => 5,
        }
    }
}

/// One line of a scanner event log.
#[derive(Debug, Clone, PartialEq)]
pub enum LogEvent {
    Start {
        timestamp: i64,
    },
    Response {
        timestamp: i64,
        parser: ParserType,
        status_code: u16,
        url: String,
    },
    Finish {
        timestamp: Option<i64>,
        total_requests: u64,
        valid_responses: u64,
        elapsed_minutes: f64,
    },
    ParserStat {
        parser: ParserType,
        valid: u64,
        total: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    #[error("`{tag}` line needs at least {needed} fields, found {found}")]
    MissingFields {
        tag: EventTag,
        needed: usize,
        found: usize,
    },

    #[error("field {field} of `{tag}` line: `{value}` is not a valid {expected}")]
    BadNumber {
        tag: EventTag,
        field: usize,
        value: String,
        expected: &'static str,
    },

    #[error("unknown parser type `{0}`")]
    UnknownParser(String),
}

impl LogEvent {
    /// Decodes one newline-stripped log line.
    ///
    /// Returns `Ok(None)` for lines whose tag is not a known event kind, so
    /// logs from newer scanners with extra event kinds still parse.
    pub fn decode(line: &str) -> Result<Option<Self>, EventError> {
        let fields: Vec<&str> = line.splitn(MAX_FIELDS, FIELD_SEPARATOR).collect();
        let Some(tag) = fields.get(1).and_then(|t| EventTag::from_str(t.trim()).ok()) else {
            return Ok(None);
        };

        if fields.len() < tag.min_fields() {
            return Err(EventError::MissingFields {
                tag,
                needed: tag.min_fields(),
                found: fields.len(),
            });
        }

        let fields = Fields { tag, fields };
        let event = match tag {
            EventTag::Start => Self::Start {
                timestamp: fields.number(0, "integer timestamp")?,
            },
            EventTag::Response => Self::Response {
                timestamp: fields.number(0, "integer timestamp")?,
                parser: fields.parser(2)?,
                status_code: fields.number(3, "status code")?,
                url: fields.raw(5).to_string(),
            },
            EventTag::Finish => Self::Finish {
                timestamp: if fields.raw(0).trim().is_empty() {
                    None
                } else {
                    Some(fields.number(0, "integer timestamp")?)
                },
                total_requests: fields.number(2, "integer request count")?,
                valid_responses: fields.number(3, "integer response count")?,
                elapsed_minutes: fields.number(4, "elapsed minutes")?,
            },
            EventTag::ParserStat => Self::ParserStat {
                parser: fields.parser(2)?,
                valid: fields.number(3, "integer valid count")?,
                total: fields.number(4, "integer total count")?,
            },
        };

        Ok(Some(event))
    }

    #[must_use]
    pub fn tag(&self) -> EventTag {
        match self {
            Self::Start { .. } => EventTag::Start,
            Self::Response { .. } => EventTag::Response,
            Self::Finish { .. } => EventTag::Finish,
            Self::ParserStat { .. } => EventTag::ParserStat,
        }
    }
}

struct Fields<'a> {
    tag: EventTag,
    fields: Vec<&'a str>,
}

impl<'a> Fields<'a> {
    fn raw(&self, idx: usize) -> &'a str {
        self.fields.get(idx).copied().unwrap_or("")
    }

    fn number<T: FromStr>(&self, idx: usize, expected: &'static str) -> Result<T, EventError> {
        let value = self.raw(idx).trim();
        value.parse().map_err(|_| EventError::BadNumber {
            tag: self.tag,
            field: idx,
            value: value.to_string(),
            expected,
        })
    }

    fn parser(&self, idx: usize) -> Result<ParserType, EventError> {
        let value = self.raw(idx).trim();
        value
            .parse()
            .map_err(|_| EventError::UnknownParser(value.to_string()))
    }
}

/// Writes the canonical log line for the event (the inverse of [`LogEvent::decode`]).
impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.tag();
        match self {
            Self::Start { timestamp } => write!(f, "{timestamp},{tag}"),
            Self::Response {
                timestamp,
                parser,
                status_code,
                url,
            } => write!(f, "{timestamp},{tag},{parser},{status_code},,{url}"),
            Self::Finish {
                timestamp,
                total_requests,
                valid_responses,
                elapsed_minutes,
            } => {
                if let Some(ts) = timestamp {
                    write!(f, "{ts}")?;
                }
                write!(
                    f,
                    ",{tag},{total_requests},{valid_responses},{elapsed_minutes}"
                )
            }
            Self::ParserStat {
                parser,
                valid,
                total,
            } => write!(f, ",{tag},{parser},{valid},{total}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_some(line: &str) -> LogEvent {
        match LogEvent::decode(line) {
            Ok(Some(ev)) => ev,
            Ok(None) => panic!("line was skipped: {line}"),
            Err(err) => panic!("decode failed for {line}: {err}"),
        }
    }

    #[test]
    fn decodes_scanner_lines() {
        assert_eq!(
            decode_some("1700000000000000000,Start,,,,"),
            LogEvent::Start {
                timestamp: 1_700_000_000_000_000_000
            }
        );

        assert_eq!(
            decode_some("1700000000500000000,Response,Href,200,5120,http://site1/a?x=1,2"),
            LogEvent::Response {
                timestamp: 1_700_000_000_500_000_000,
                parser: ParserType::Href,
                status_code: 200,
                url: "http://site1/a?x=1,2".to_string(),
            }
        );

        assert_eq!(
            decode_some("1700000060000000000,Finish,4600,120,1.25"),
            LogEvent::Finish {
                timestamp: Some(1_700_000_060_000_000_000),
                total_requests: 4600,
                valid_responses: 120,
                elapsed_minutes: 1.25,
            }
        );

        assert_eq!(
            decode_some(",ParserStat,Script,3,40"),
            LogEvent::ParserStat {
                parser: ParserType::Script,
                valid: 3,
                total: 40,
            }
        );
    }

    #[test]
    fn unknown_and_blank_lines_are_skipped() {
        for line in ["", "garbage", "123,Progress,50%", "123,Heartbeat"] {
            match LogEvent::decode(line) {
                Ok(None) => {}
                other => panic!("expected {line:?} to be skipped, got {other:?}"),
            }
        }
    }

    #[test]
    fn short_finish_line_is_an_error() {
        let err = LogEvent::decode("1,Finish,10,2").err();
        assert_eq!(
            err,
            Some(EventError::MissingFields {
                tag: EventTag::Finish,
                needed: 5,
                found: 4,
            })
        );
    }

    #[test]
    fn non_numeric_fields_are_errors() {
        assert!(matches!(
            LogEvent::decode("1,ParserStat,Dict,many,40"),
            Err(EventError::BadNumber { field: 3, .. })
        ));
        assert!(matches!(
            LogEvent::decode("1,Finish,10,2,soon"),
            Err(EventError::BadNumber { field: 4, .. })
        ));
        assert!(matches!(
            LogEvent::decode("1,Response,Ftp,200,0,http://x/"),
            Err(EventError::UnknownParser(_))
        ));
    }

    #[test]
    fn canonical_lines_decode_back() {
        let events = [
            LogEvent::Start { timestamp: 42 },
            LogEvent::Response {
                timestamp: 50,
                parser: ParserType::Index,
                status_code: 403,
                url: "http://site2/admin/".to_string(),
            },
            LogEvent::Finish {
                timestamp: None,
                total_requests: 9,
                valid_responses: 4,
                elapsed_minutes: 0.75,
            },
            LogEvent::ParserStat {
                parser: ParserType::Service,
                valid: 1,
                total: 2,
            },
        ];

        for ev in events {
            assert_eq!(decode_some(&ev.to_string()), ev);
        }
    }
}
