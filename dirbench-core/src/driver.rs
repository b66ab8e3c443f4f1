//! Runs the external scanner for every `(iteration, mode, target)` and captures its transcripts.
//!
//! Each `(iteration, mode)` pair is one batch: every target of the batch is launched as its own
//! task, then the driver waits for all of them before starting the next batch. Units write only
//! to paths derived from their own `(mode, site, iteration)`, so concurrent units never share a
//! file.

mod target;
mod unit;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;

use crate::error::{Error, Result};

pub use target::{Target, load_targets, parse_targets};
pub use unit::{
    ScanSettings, ScannerCommand, TRANSCRIPT_PREFIX, UnitOutcome, UnitState, WorkUnit,
};

pub const DEFAULT_MODES: [&str; 5] = ["dict", "content", "service", "script", "all"];
pub const DEFAULT_ITERATIONS: u32 = 10;
pub const DEFAULT_THREADS: u32 = 10;
pub const DEFAULT_EXTENSIONS: &str = "txt,html,php";

#[derive(Debug, Clone)]
pub struct BenchPlan {
    pub settings: ScanSettings,
    pub targets: Vec<Target>,
    pub modes: Vec<String>,
    pub iterations: u32,
    /// Upper bound on scanners running at once within a batch. `None` runs the whole batch.
    pub max_concurrency: Option<usize>,
}

impl BenchPlan {
    pub fn validate(&self) -> Result<()> {
        for mode in &self.modes {
            if !target::is_valid_name(mode) {
                return Err(Error::InvalidMode(mode.clone()));
            }
        }

        let mut seen = HashSet::new();
        for t in &self.targets {
            if !target::is_valid_name(&t.site) {
                return Err(Error::InvalidTarget(t.site.clone()));
            }
            if !seen.insert(t.site.as_str()) {
                return Err(Error::DuplicateSite(t.site.clone()));
            }
        }

        Ok(())
    }

    pub fn unit_count(&self) -> usize {
        self.targets.len() * self.modes.len() * self.iterations as usize
    }

    fn batch(&self, iteration: u32, mode: &str) -> Vec<WorkUnit> {
        self.targets
            .iter()
            .map(|target| WorkUnit {
                mode: mode.to_string(),
                target: target.clone(),
                iteration,
            })
            .collect()
    }
}

/// Every unit's terminal state, in launch order.
#[derive(Debug, Default)]
pub struct BenchReport {
    pub outcomes: Vec<UnitOutcome>,
    pub elapsed: Duration,
}

impl BenchReport {
    pub fn completed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.state, UnitState::Completed { .. }))
            .count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &UnitOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.state, UnitState::Failed { .. }))
    }

    pub fn nonzero_exits(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.state.exit_code(), Some(code) if code != 0))
            .count()
    }
}

pub async fn run_bench(plan: &BenchPlan) -> Result<BenchReport> {
    plan.validate()?;
    tokio::fs::create_dir_all(&plan.settings.out_dir)
        .await
        .map_err(|err| Error::io_at(&plan.settings.out_dir, err))?;

    let settings = Arc::new(plan.settings.clone());
    let limit = plan.max_concurrency.map(|n| Arc::new(Semaphore::new(n.max(1))));
    let started = Instant::now();
    let mut report = BenchReport::default();

    for iteration in 0..plan.iterations {
        tracing::info!(iteration, "starting iteration");
        for mode in &plan.modes {
            let units = plan.batch(iteration, mode);
            tracing::info!(iteration, mode = %mode, units = units.len(), "starting batch");
            let outcomes = run_batch(units, &settings, limit.as_ref()).await;
            report.outcomes.extend(outcomes);
        }
    }

    report.elapsed = started.elapsed();
    Ok(report)
}

/// Launches every unit, then waits for all of them. Failures come back as outcomes.
pub async fn run_batch(
    units: Vec<WorkUnit>,
    settings: &Arc<ScanSettings>,
    limit: Option<&Arc<Semaphore>>,
) -> Vec<UnitOutcome> {
    let mut handles = Vec::with_capacity(units.len());

    for unit in units {
        tracing::debug!(unit = %unit.run_id(), state = ?UnitState::Pending, "queued");
        let settings = settings.clone();
        let limit = limit.cloned();
        let task_unit = unit.clone();
        let handle = tokio::spawn(async move {
            let _permit = match limit {
                Some(sem) => sem.acquire_owned().await.ok(),
                None => None,
            };
            unit::run_unit(&task_unit, &settings).await
        });
        handles.push((unit, handle));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for (unit, handle) in handles {
        let state = handle.await.unwrap_or_else(|err| UnitState::Failed {
            error: Error::from(err).to_string(),
        });
        outcomes.push(UnitOutcome { unit, state });
    }
    outcomes
}
