#![cfg(unix)]

use std::path::{Path, PathBuf};

use dirbench_core::driver::{
    BenchPlan, ScanSettings, ScannerCommand, Target, UnitState, run_bench,
};
use dirbench_core::{GroupKey, RunIndex, discover_run_logs, summarize_index};

// Stand-in scanner. Arguments: <journal> <url> -m <mode> -o <out> -w <wordlist> -t <threads>
const FAKE_SCANNER: &str = r#"
journal=$1
url=$2
mode=$4
out=$6
echo "begin $mode $url" >> "$journal"
echo "scanning $url ($mode)"
sleep 0.2
case "$url" in
  *broken*)
    echo "target unreachable" >&2
    echo "end $mode $url" >> "$journal"
    exit 1
    ;;
esac
printf '100,Start\n150,Response,Dict,200,0,%s/a\n,ParserStat,Dict,1,5\n400,Finish,5,1,0.5\n' "$url" > "$out"
echo "end $mode $url" >> "$journal"
"#;

fn target(site: &str) -> Target {
    Target {
        site: site.to_string(),
        url: format!("http://127.0.0.1:9/{site}"),
    }
}

fn plan(work: &Path, scanner: ScannerCommand, targets: Vec<Target>, modes: &[&str]) -> BenchPlan {
    BenchPlan {
        settings: ScanSettings {
            scanner,
            wordlist: work.join("words.txt"),
            threads: 4,
            extensions: None,
            out_dir: work.join("results"),
        },
        targets,
        modes: modes.iter().map(|m| m.to_string()).collect(),
        iterations: 1,
        max_concurrency: None,
    }
}

fn fake_scanner(work: &Path) -> anyhow::Result<(ScannerCommand, PathBuf)> {
    let script = work.join("fake_scanner.sh");
    std::fs::write(&script, FAKE_SCANNER)?;
    let journal = work.join("journal.log");
    let cmd = ScannerCommand::new("sh").arg(&script).arg(&journal);
    Ok((cmd, journal))
}

#[tokio::test]
async fn failing_unit_does_not_block_its_siblings() -> anyhow::Result<()> {
    let work = tempfile::tempdir()?;
    let (scanner, _) = fake_scanner(work.path())?;
    let plan = plan(
        work.path(),
        scanner,
        vec![target("site1"), target("broken"), target("site2")],
        &["dict"],
    );

    let report = run_bench(&plan).await?;

    assert_eq!(report.outcomes.len(), 3);
    assert!(report.outcomes.iter().all(|o| o.state.is_terminal()));
    assert_eq!(report.completed(), 3);
    assert_eq!(report.nonzero_exits(), 1);
    assert_eq!(report.failed().count(), 0);

    for o in &report.outcomes {
        let expected = if o.unit.target.site == "broken" { 1 } else { 0 };
        assert_eq!(o.state.exit_code(), Some(expected), "{:?}", o.unit);
    }

    // Transcripts hold both streams, and exist for the failing unit too.
    let out_dir = work.path().join("results");
    let broken = std::fs::read_to_string(out_dir.join("transcript_dict_broken_0.txt"))?;
    assert!(broken.contains("scanning"));
    assert!(broken.contains("target unreachable"));

    let logs = discover_run_logs(&out_dir, "out")?;
    let load = RunIndex::load(&logs);
    assert_eq!(load.aggregated(), 2);

    let table = summarize_index(&load.index);
    let s = table
        .summaries
        .get(&GroupKey::new("dict", "site1"))
        .ok_or_else(|| anyhow::anyhow!("missing site1 summary"))?;
    assert_eq!(s.totals.requests_total, 5.0);
    Ok(())
}

#[tokio::test]
async fn batches_do_not_overlap() -> anyhow::Result<()> {
    let work = tempfile::tempdir()?;
    let (scanner, journal) = fake_scanner(work.path())?;
    let mut plan = plan(
        work.path(),
        scanner,
        vec![target("site1"), target("site2"), target("site3")],
        &["dict", "all"],
    );
    plan.iterations = 2;

    let report = run_bench(&plan).await?;
    assert_eq!(report.outcomes.len(), plan.unit_count());

    let lines: Vec<String> = std::fs::read_to_string(&journal)?
        .lines()
        .map(str::to_string)
        .collect();
    assert_eq!(lines.len(), 2 * plan.unit_count());

    // Four batches of three units: each batch's begins and ends close before the next begins.
    for (batch, chunk) in lines.chunks(6).enumerate() {
        let mode = if batch % 2 == 0 { "dict" } else { "all" };
        let begins = chunk.iter().filter(|l| l.starts_with("begin ")).count();
        let ends = chunk.iter().filter(|l| l.starts_with("end ")).count();
        assert_eq!((begins, ends), (3, 3), "batch {batch}: {chunk:?}");
        assert!(
            chunk.iter().all(|l| l.split(' ').nth(1) == Some(mode)),
            "batch {batch}: {chunk:?}"
        );
    }
    Ok(())
}

#[tokio::test]
async fn spawn_failures_are_recorded_per_unit() -> anyhow::Result<()> {
    let work = tempfile::tempdir()?;
    let scanner = ScannerCommand::new(work.path().join("no-such-scanner"));
    let plan = plan(
        work.path(),
        scanner,
        vec![target("site1"), target("site2")],
        &["dict", "all"],
    );

    let report = run_bench(&plan).await?;

    assert_eq!(report.outcomes.len(), 4);
    assert_eq!(report.failed().count(), 4);
    for o in &report.outcomes {
        assert!(matches!(o.state, UnitState::Failed { .. }), "{:?}", o.state);
        // Transcript is created before launch, even when launch fails.
        assert!(o.unit.transcript_path(&plan.settings.out_dir).exists());
    }
    Ok(())
}

#[tokio::test]
async fn concurrency_limit_still_runs_every_unit() -> anyhow::Result<()> {
    let work = tempfile::tempdir()?;
    let (scanner, _) = fake_scanner(work.path())?;
    let mut plan = plan(
        work.path(),
        scanner,
        vec![target("site1"), target("site2"), target("site3")],
        &["dict"],
    );
    plan.max_concurrency = Some(1);

    let report = run_bench(&plan).await?;
    assert_eq!(report.completed(), 3);
    assert_eq!(report.nonzero_exits(), 0);
    Ok(())
}

#[tokio::test]
async fn invalid_mode_is_rejected_before_launch() -> anyhow::Result<()> {
    let work = tempfile::tempdir()?;
    let (scanner, journal) = fake_scanner(work.path())?;
    let plan = plan(work.path(), scanner, vec![target("site1")], &["dict_only"]);

    let err = run_bench(&plan).await;
    assert!(matches!(err, Err(dirbench_core::Error::InvalidMode(_))));
    assert!(!journal.exists());
    Ok(())
}
