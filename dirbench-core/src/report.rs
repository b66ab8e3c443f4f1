use std::collections::BTreeMap;

use crate::index::GroupKey;
use crate::summary::{Summary, SummaryTable};

/// Rows of one report file: row key and the summary for it.
pub type TierRows = Vec<(String, Summary)>;

/// The three report tiers derived from a [`SummaryTable`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReportSet {
    /// mode -> one row per site.
    pub by_mode: BTreeMap<String, TierRows>,
    /// site -> one row per mode.
    pub by_site: BTreeMap<String, TierRows>,
    /// Every `(mode, site)` cell.
    pub global: Vec<(GroupKey, Summary)>,
}

impl ReportSet {
    pub fn build(table: &SummaryTable) -> Self {
        let mut by_mode: BTreeMap<String, TierRows> = BTreeMap::new();
        for (key, summary) in &table.summaries {
            by_mode
                .entry(key.mode.clone())
                .or_default()
                .push((key.site.clone(), summary.clone()));
        }

        let by_site = transpose(&by_mode);

        let global = table
            .summaries
            .iter()
            .map(|(key, summary)| (key.clone(), summary.clone()))
            .collect();

        Self {
            by_mode,
            by_site,
            global,
        }
    }

    /// Cross-site figure for a whole mode. Not computed yet: always empty.
    pub fn mode_overview(&self, _mode: &str) -> Vec<Summary> {
        Vec::new()
    }

    pub fn is_empty(&self) -> bool {
        self.global.is_empty()
    }
}

fn transpose(by_mode: &BTreeMap<String, TierRows>) -> BTreeMap<String, TierRows> {
    let mut by_site: BTreeMap<String, TierRows> = BTreeMap::new();
    for (mode, rows) in by_mode {
        for (site, summary) in rows {
            by_site
                .entry(site.clone())
                .or_default()
                .push((mode.clone(), summary.clone()));
        }
    }
    by_site
}
