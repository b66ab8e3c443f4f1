mod error;
mod event;
mod index;
mod parser_type;
mod record;
mod report;
mod summary;
mod table;

pub mod driver;
pub mod timeline;

pub use error::{Error, Result};
pub use event::{EventError, EventTag, LogEvent, TIMESTAMP_UNITS_PER_SEC};
pub use index::{
    FileFailure, GroupKey, IndexLoad, RUN_LOG_EXTENSION, RUN_LOG_PREFIX, RunIndex,
    discover_run_logs,
};
pub use parser_type::{ParserType, PerParser};
pub use record::{ParserCounts, ResponseEntry, RunId, RunRecord, RunRecordParts, RunTotals};
pub use report::{ReportSet, TierRows};
pub use summary::{
    MeanCounts, MeanTotals, ResponseTimeSummary, Summary, SummaryTable, summarize_index,
    summarize_response_times,
};
pub use table::{
    GLOBAL_REPORT_NAME, GLOBAL_TIER_LABEL, MODE_TIER_LABEL, ReportWriter, SITE_TIER_LABEL,
    TABLE_EXTENSION, csv_field, format_decimal, render_reports, render_table,
};
