use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{}: {source}", path.display())]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: {reason}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("{}: unrecognized run log name ({reason})", path.display())]
    FileName { path: PathBuf, reason: String },

    #[error("no iterations recorded for mode `{mode}` site `{site}`")]
    EmptyGroup { mode: String, site: String },

    #[error(
        "cannot average runs of `{found_mode}/{found_site}` into group `{mode}/{site}`"
    )]
    MixedGroup {
        mode: String,
        site: String,
        found_mode: String,
        found_site: String,
    },

    #[error("invalid target `{0}`")]
    InvalidTarget(String),

    #[error("invalid mode `{0}` (must be non-empty and contain no `_` or path separators)")]
    InvalidMode(String),

    #[error("duplicate site `{0}` (every target needs a distinct site name)")]
    DuplicateSite(String),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    pub(crate) fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoAt {
            path: path.into(),
            source,
        }
    }

    /// `true` for malformed log content or an unrecognized log file name.
    #[must_use]
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::FileName { .. })
    }
}
