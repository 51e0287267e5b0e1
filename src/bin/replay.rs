use std::path::PathBuf;

use anyhow::Result;

use gaa_live::config::{ScraperConfig, flag_path};
use gaa_live::extract::Extractor;
use gaa_live::logging;
use gaa_live::pipeline::LiveRun;
use gaa_live::sink::{self, JsonFileSink, MatchSink};
use gaa_live::source::FixtureSource;
use gaa_live::sqlite_sink::SqliteSink;

fn main() -> Result<()> {
    let config = ScraperConfig::from_env();
    logging::init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let fixture = flag_path(&args, "--fixture")
        .unwrap_or_else(|| PathBuf::from("tests/fixtures/live_feed.json"));
    let dry_run = args.iter().any(|a| a == "--dry-run");

    // Replays read captured fragments only; nothing touches the network.
    let mut source = FixtureSource::load(&fixture)?;
    let mut run = LiveRun::new(Extractor::standard());
    let reports = run.run_source(&mut source);
    let output = run.finish();

    println!("Fixture: {}", fixture.display());
    for report in &reports {
        println!(
            "  {} fragments={} accepted={} skipped={}{}",
            report.url,
            report.fragments,
            report.accepted,
            report.skipped,
            if report.interrupted { " (interrupted)" } else { "" }
        );
    }

    let s = &output.summary;
    println!("Matches: {}", output.timelines.len());
    println!(
        "Skipped: parse={} marker={} regression={} unidentified={}",
        s.parse_misses, s.unattributable_markers, s.temporal_regressions, s.unidentified
    );
    for snap in output.snapshots() {
        println!(
            "  {:<36} {:>6} {:>6}  min={:<4} ht={} ft={}",
            snap.match_key.as_str(),
            snap.home_score.as_deref().unwrap_or("-"),
            snap.away_score.as_deref().unwrap_or("-"),
            snap.minute.map(|m| m.to_string()).unwrap_or_else(|| "-".to_string()),
            snap.is_halftime,
            snap.is_final
        );
    }

    if dry_run {
        return Ok(());
    }

    let (target, mut sink): (String, Box<dyn MatchSink>) = match flag_path(&args, "--json") {
        Some(path) => (path.display().to_string(), Box::new(JsonFileSink::new(path))),
        None => {
            let Some(db_path) = flag_path(&args, "--db").or(config.db_path) else {
                anyhow::bail!("unable to resolve sqlite path");
            };
            let sink = SqliteSink::open_path(&db_path)?;
            (db_path.display().to_string(), Box::new(sink))
        }
    };
    let report = sink::write_run(sink.as_mut(), &output)?;
    println!(
        "Written to {target}: events={} snapshots={} failures={}",
        report.events_written,
        report.snapshots_written,
        report.failures.len()
    );
    Ok(())
}
