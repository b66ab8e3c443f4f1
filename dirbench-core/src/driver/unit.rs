use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use super::target::Target;
use crate::index::{RUN_LOG_EXTENSION, RUN_LOG_PREFIX};
use crate::record::RunId;

pub const TRANSCRIPT_PREFIX: &str = "transcript";

/// The external scanner: a program plus any leading arguments (e.g. an interpreter and script).
#[derive(Debug, Clone)]
pub struct ScannerCommand {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl ScannerCommand {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// Settings shared by every unit of a bench run.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub scanner: ScannerCommand,
    pub wordlist: PathBuf,
    pub threads: u32,
    pub extensions: Option<String>,
    pub out_dir: PathBuf,
}

/// One scanner invocation: a target under a mode, for one iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    pub mode: String,
    pub target: Target,
    pub iteration: u32,
}

impl WorkUnit {
    pub fn run_id(&self) -> RunId {
        RunId {
            mode: self.mode.clone(),
            site: self.target.site.clone(),
            iteration: self.iteration,
        }
    }

    /// Event log the scanner is told to write.
    pub fn output_path(&self, out_dir: &Path) -> PathBuf {
        out_dir.join(self.run_id().file_name(RUN_LOG_PREFIX, RUN_LOG_EXTENSION))
    }

    pub fn transcript_path(&self, out_dir: &Path) -> PathBuf {
        out_dir.join(self.run_id().file_name(TRANSCRIPT_PREFIX, RUN_LOG_EXTENSION))
    }

    pub(crate) fn command(&self, settings: &ScanSettings) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&settings.scanner.program);
        cmd.args(&settings.scanner.args)
            .arg(&self.target.url)
            .arg("-m")
            .arg(&self.mode)
            .arg("-o")
            .arg(self.output_path(&settings.out_dir))
            .arg("-w")
            .arg(&settings.wordlist)
            .arg("-t")
            .arg(settings.threads.to_string());
        if let Some(ext) = &settings.extensions {
            cmd.arg("-x").arg(ext);
        }
        cmd
    }
}

/// Lifecycle of a unit: `Pending -> Running -> Completed | Failed`.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitState {
    Pending,
    Running,
    /// The scanner ran to the end. A non-zero `exit_code` is reported, not treated as failure.
    Completed {
        exit_code: Option<i32>,
        elapsed: Duration,
    },
    /// The scanner could not be launched or waited on.
    Failed { error: String },
}

impl UnitState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Completed { exit_code, .. } => *exit_code,
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UnitOutcome {
    pub unit: WorkUnit,
    pub state: UnitState,
}

/// Runs one unit to a terminal state. The transcript handle is released on every path.
pub(crate) async fn run_unit(unit: &WorkUnit, settings: &ScanSettings) -> UnitState {
    let id = unit.run_id();
    let transcript_path = unit.transcript_path(&settings.out_dir);

    let transcript = match open_transcript(&transcript_path).await {
        Ok(files) => files,
        Err(err) => {
            let error = format!("create transcript {}: {err}", transcript_path.display());
            tracing::warn!(unit = %id, %error, "unit failed");
            return UnitState::Failed { error };
        }
    };

    let mut cmd = unit.command(settings);
    cmd.stdin(Stdio::null())
        .stdout(transcript.0)
        .stderr(transcript.1);

    tracing::debug!(unit = %id, state = ?UnitState::Running, "launching scanner");
    let started = Instant::now();
    let spawned = cmd.spawn();
    // The command holds our copies of the transcript handles.
    drop(cmd);

    let mut child = match spawned {
        Ok(child) => child,
        Err(err) => {
            let error = format!("spawn {}: {err}", settings.scanner.program.to_string_lossy());
            tracing::warn!(unit = %id, %error, "unit failed");
            return UnitState::Failed { error };
        }
    };

    match child.wait().await {
        Ok(status) => {
            let elapsed = started.elapsed();
            tracing::info!(
                unit = %id,
                target = %unit.target.url,
                exit_code = status.code(),
                elapsed = %humantime::format_duration(round_to_millis(elapsed)),
                "scanner finished"
            );
            UnitState::Completed {
                exit_code: status.code(),
                elapsed,
            }
        }
        Err(err) => {
            let error = format!("wait for scanner: {err}");
            tracing::warn!(unit = %id, %error, "unit failed");
            UnitState::Failed { error }
        }
    }
}

async fn open_transcript(path: &Path) -> std::io::Result<(Stdio, Stdio)> {
    let stdout = tokio::fs::File::create(path).await?.into_std().await;
    let stderr = stdout.try_clone()?;
    Ok((Stdio::from(stdout), Stdio::from(stderr)))
}

fn round_to_millis(d: Duration) -> Duration {
    Duration::from_millis(d.as_millis().try_into().unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> WorkUnit {
        WorkUnit {
            mode: "dict".to_string(),
            target: Target {
                site: "site1".to_string(),
                url: "http://10.0.0.5/site1/".to_string(),
            },
            iteration: 3,
        }
    }

    #[test]
    fn file_names_are_derived_from_the_run() {
        let out = Path::new("results");
        assert_eq!(
            unit().output_path(out),
            Path::new("results/out_dict_site1_3.txt")
        );
        assert_eq!(
            unit().transcript_path(out),
            Path::new("results/transcript_dict_site1_3.txt")
        );
    }

    #[test]
    fn invocation_carries_every_flag() {
        let settings = ScanSettings {
            scanner: ScannerCommand::new("python").arg("bin/intellidirb.py"),
            wordlist: PathBuf::from("words.txt"),
            threads: 16,
            extensions: Some("txt,html,php".to_string()),
            out_dir: PathBuf::from("results"),
        };

        let cmd = unit().command(&settings);
        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(cmd.as_std().get_program(), "python");
        assert_eq!(
            args,
            [
                "bin/intellidirb.py",
                "http://10.0.0.5/site1/",
                "-m",
                "dict",
                "-o",
                "results/out_dict_site1_3.txt",
                "-w",
                "words.txt",
                "-t",
                "16",
                "-x",
                "txt,html,php",
            ]
        );
    }

    #[test]
    fn only_completed_and_failed_are_terminal() {
        assert!(!UnitState::Pending.is_terminal());
        assert!(!UnitState::Running.is_terminal());
        assert!(
            UnitState::Completed {
                exit_code: Some(1),
                elapsed: Duration::ZERO,
            }
            .is_terminal()
        );
        assert!(
            UnitState::Failed {
                error: "x".to_string()
            }
            .is_terminal()
        );
    }
}
