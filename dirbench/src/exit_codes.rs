#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,

    /// Some run logs (or whole groups) could not be aggregated; reports cover the rest.
    SkippedInputs = 10,

    /// One or more scanner invocations could not be launched.
    UnitsFailed = 11,

    /// Invalid CLI/config input (bad flags, unreadable target list, missing input directory).
    InvalidInput = 30,

    /// Internal/runtime error (unwritable output directory, IO errors while reading inputs).
    RuntimeError = 40,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub fn from_skipped(skipped: usize) -> Self {
        if skipped > 0 {
            Self::SkippedInputs
        } else {
            Self::Success
        }
    }
}
