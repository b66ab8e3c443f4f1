use crate::exit_codes::ExitCode;

/// A failed command: the error chain plus the exit class it maps to.
#[derive(Debug)]
pub struct CommandError {
    code: ExitCode,
    error: anyhow::Error,
}

impl CommandError {
    pub fn invalid_input(error: impl Into<anyhow::Error>) -> Self {
        Self {
            code: ExitCode::InvalidInput,
            error: error.into(),
        }
    }

    pub fn runtime(error: impl Into<anyhow::Error>) -> Self {
        Self {
            code: ExitCode::RuntimeError,
            error: error.into(),
        }
    }

    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        self.code
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#}", self.error)
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.error.as_ref())
    }
}

/// Tags a fallible step with the exit class its failure should produce.
pub(crate) trait ResultExt<T> {
    fn invalid_input(self) -> Result<T, CommandError>;
    fn runtime_error(self) -> Result<T, CommandError>;
}

impl<T, E: Into<anyhow::Error>> ResultExt<T> for Result<T, E> {
    fn invalid_input(self) -> Result<T, CommandError> {
        self.map_err(CommandError::invalid_input)
    }

    fn runtime_error(self) -> Result<T, CommandError> {
        self.map_err(CommandError::runtime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context as _;

    #[test]
    fn display_keeps_the_context_chain() {
        let res: Result<(), _> = Err(std::io::Error::other("permission denied"))
            .context("write reports to /out")
            .runtime_error();
        let err = res.err();

        assert_eq!(err.as_ref().map(CommandError::exit_code), Some(ExitCode::RuntimeError));
        assert_eq!(
            err.map(|e| e.to_string()).as_deref(),
            Some("write reports to /out: permission denied")
        );
    }
}
