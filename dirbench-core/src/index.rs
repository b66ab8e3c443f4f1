use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::record::RunRecord;

pub const RUN_LOG_PREFIX: &str = "out";
pub const RUN_LOG_EXTENSION: &str = "txt";

/// Composite `(mode, site)` key. Orders by mode, then site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub mode: String,
    pub site: String,
}

impl GroupKey {
    pub fn new(mode: impl Into<String>, site: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            site: site.into(),
        }
    }

    pub fn of(record: &RunRecord) -> Self {
        Self::new(record.mode(), record.site())
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.mode, self.site)
    }
}

/// Run records grouped by `(mode, site)`, iterations kept in insertion order.
#[derive(Debug, Default, Clone)]
pub struct RunIndex {
    groups: BTreeMap<GroupKey, Vec<RunRecord>>,
}

impl RunIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses every path; files that fail are collected instead of aborting the batch.
    pub fn load<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> IndexLoad {
        let mut index = Self::new();
        let mut found = 0usize;
        let mut failures = Vec::new();

        for path in paths {
            let path = path.as_ref();
            found += 1;

            match RunRecord::from_path(path) {
                Ok(record) => index.insert(record),
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "skipping run log");
                    failures.push(FileFailure {
                        path: path.to_path_buf(),
                        error,
                    });
                }
            }
        }

        IndexLoad {
            index,
            found,
            failures,
        }
    }

    /// Creates an empty group for `key`. Returns `false` if it already existed.
    pub fn open_group(&mut self, key: GroupKey) -> bool {
        if self.groups.contains_key(&key) {
            return false;
        }
        tracing::debug!(group = %key, "opening run group");
        self.groups.insert(key, Vec::new());
        true
    }

    pub fn insert(&mut self, record: RunRecord) {
        let key = GroupKey::of(&record);
        self.open_group(key.clone());
        if let Some(runs) = self.groups.get_mut(&key) {
            runs.push(record);
        }
    }

    pub fn get(&self, key: &GroupKey) -> Option<&[RunRecord]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&GroupKey, &[RunRecord])> {
        self.groups.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn run_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: Error,
}

/// Outcome of loading a batch of run logs.
#[derive(Debug)]
pub struct IndexLoad {
    pub index: RunIndex,
    pub found: usize,
    pub failures: Vec<FileFailure>,
}

impl IndexLoad {
    pub fn aggregated(&self) -> usize {
        self.found - self.failures.len()
    }
}

/// Lists run logs (`{prefix}_*.txt`) in `dir`, sorted by path.
pub fn discover_run_logs(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let wanted = format!("{prefix}_");
    let mut out = Vec::new();

    let entries = std::fs::read_dir(dir).map_err(|err| Error::io_at(dir, err))?;
    for entry in entries {
        let entry = entry.map_err(|err| Error::io_at(dir, err))?;
        let path = entry.path();

        let is_file = entry
            .file_type()
            .map_err(|err| Error::io_at(&path, err))?
            .is_file();
        let name_matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(&wanted));
        let ext_matches = path
            .extension()
            .is_some_and(|e| e == RUN_LOG_EXTENSION);

        if is_file && name_matches && ext_matches {
            out.push(path);
        }
    }

    out.sort();
    Ok(out)
}
