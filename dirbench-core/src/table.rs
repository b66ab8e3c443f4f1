use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::parser_type::ParserType;
use crate::report::{ReportSet, TierRows};
use crate::summary::Summary;

pub const TABLE_EXTENSION: &str = "csv";
pub const GLOBAL_REPORT_NAME: &str = "summary";

pub const MODE_TIER_LABEL: &str = "Site";
pub const SITE_TIER_LABEL: &str = "Mode";
pub const GLOBAL_TIER_LABEL: &str = "Mode,Site";

const SEPARATOR: char = ',';

fn header(label: &str) -> String {
    let mut cols = vec![
        label.to_string(),
        "Total Time".to_string(),
        "Total Requests".to_string(),
        "Total Valid Responses".to_string(),
    ];
    for ty in ParserType::all() {
        cols.push(format!("{ty} Requests"));
        cols.push(format!("{ty} Valid Responses"));
    }
    cols.join(",")
}

/// Quotes a field that holds a separator, a quote or a line break; other fields pass through.
pub fn csv_field(field: &str) -> Cow<'_, str> {
    if field.contains([SEPARATOR, '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Shortest exact decimal form; whole numbers keep a trailing `.0`.
pub fn format_decimal(v: f64) -> String {
    let s = v.to_string();
    if v.is_finite() && !s.contains('.') {
        format!("{s}.0")
    } else {
        s
    }
}

fn push_row(out: &mut String, key: &str, s: &Summary) {
    out.push_str(key);
    for v in [
        s.totals.elapsed_minutes,
        s.totals.requests_total,
        s.totals.requests_valid,
    ] {
        out.push(SEPARATOR);
        out.push_str(&format_decimal(v));
    }
    for (_, counts) in s.parser_stats.iter() {
        for v in [counts.total, counts.valid] {
            out.push(SEPARATOR);
            out.push_str(&format_decimal(v));
        }
    }
    out.push('\n');
}

/// Renders one report table. Row keys are written verbatim into the first column(s), so
/// callers quote them with [`csv_field`].
pub fn render_table<'a>(
    label: &str,
    rows: impl IntoIterator<Item = (&'a str, &'a Summary)>,
) -> String {
    let mut out = header(label);
    out.push('\n');
    for (key, summary) in rows {
        push_row(&mut out, key, summary);
    }
    out
}

/// Renders every report file as `(file name, contents)`, in write order.
pub fn render_reports(reports: &ReportSet) -> Vec<(String, String)> {
    let mut files = Vec::new();

    for (mode, rows) in &reports.by_mode {
        let body = render_tier(MODE_TIER_LABEL, rows);
        files.push((format!("{mode}_{GLOBAL_REPORT_NAME}.{TABLE_EXTENSION}"), body));
    }

    for (site, rows) in &reports.by_site {
        let body = render_tier(SITE_TIER_LABEL, rows);
        files.push((format!("{site}_{GLOBAL_REPORT_NAME}.{TABLE_EXTENSION}"), body));
    }

    let keys: Vec<String> = reports
        .global
        .iter()
        .map(|(key, _)| {
            format!("{}{SEPARATOR}{}", csv_field(&key.mode), csv_field(&key.site))
        })
        .collect();
    let body = render_table(
        GLOBAL_TIER_LABEL,
        keys.iter()
            .map(String::as_str)
            .zip(reports.global.iter().map(|(_, s)| s)),
    );
    files.push((format!("{GLOBAL_REPORT_NAME}.{TABLE_EXTENSION}"), body));

    files
}

fn render_tier(label: &str, rows: &TierRows) -> String {
    let keys: Vec<Cow<'_, str>> = rows.iter().map(|(k, _)| csv_field(k)).collect();
    render_table(
        label,
        keys.iter().map(|k| &**k).zip(rows.iter().map(|(_, s)| s)),
    )
}

/// Writes the report tiers into one directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    out_dir: PathBuf,
    create_dir: bool,
}

impl ReportWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            create_dir: false,
        }
    }

    /// Create the output directory (and parents) if missing.
    #[must_use]
    pub fn create_dir(mut self, yes: bool) -> Self {
        self.create_dir = yes;
        self
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn write_all(&self, reports: &ReportSet) -> Result<Vec<PathBuf>> {
        if self.create_dir {
            std::fs::create_dir_all(&self.out_dir).map_err(|err| Error::io_at(&self.out_dir, err))?;
        }

        let mut written = Vec::new();
        for (name, body) in render_reports(reports) {
            let path = self.out_dir.join(name);
            std::fs::write(&path, body).map_err(|err| Error::io_at(&path, err))?;
            tracing::debug!(path = %path.display(), "wrote report");
            written.push(path);
        }

        Ok(written)
    }
}
