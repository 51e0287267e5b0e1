use anyhow::{Context, Result};
use tracing::info;

use gaa_live::config::{ScraperConfig, flag_path};
use gaa_live::extract::Extractor;
use gaa_live::logging;
use gaa_live::pipeline::{LiveRun, RunOutput};
use gaa_live::rte_source::RteSource;
use gaa_live::sink::{self, JsonFileSink, WriteReport};
use gaa_live::sqlite_sink::SqliteSink;

fn main() -> Result<()> {
    let config = ScraperConfig::from_env();
    logging::init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let dry_run = args.iter().any(|a| a == "--dry-run");
    let show = args.iter().any(|a| a == "--show");

    info!(sources = ?config.source_urls, "starting live scrape");
    let mut source = RteSource::new(&config)?;
    let mut run = LiveRun::new(Extractor::standard());
    run.run_source(&mut source);
    let output = run.finish();

    if dry_run {
        print_output(&output, None);
        return Ok(());
    }

    let report = if let Some(path) = flag_path(&args, "--json") {
        let mut sink = JsonFileSink::new(path);
        sink::write_run(&mut sink, &output)?
    } else {
        let db_path = flag_path(&args, "--db")
            .or_else(|| config.db_path.clone())
            .context("unable to resolve sqlite path")?;
        let mut sink = SqliteSink::open_path(&db_path)?;
        let report = sink::write_run(&mut sink, &output)?;
        if show {
            for row in sink.load_snapshots()? {
                println!(
                    "{:<40} {:>6} {:>6}  min={:<4} final={}",
                    row.match_key.as_str(),
                    row.home_score.as_deref().unwrap_or("-"),
                    row.away_score.as_deref().unwrap_or("-"),
                    row.minute.map(|m| m.to_string()).unwrap_or_else(|| "-".to_string()),
                    row.is_final
                );
            }
        }
        println!("DB: {}", db_path.display());
        report
    };

    print_output(&output, Some(&report));
    Ok(())
}

fn print_output(output: &RunOutput, report: Option<&WriteReport>) {
    let s = &output.summary;
    println!("Live scrape complete");
    println!(
        "Articles: {} (failed {}, interrupted {})",
        s.articles, s.articles_failed, s.articles_interrupted
    );
    println!(
        "Fragments: {} extracted={} accepted={} skipped={}",
        s.fragments,
        s.events_extracted,
        s.events_accepted,
        s.skipped()
    );
    for snap in output.snapshots() {
        println!(
            "  {}: {} - {} ({})",
            snap.match_key,
            snap.home_score.as_deref().unwrap_or("?"),
            snap.away_score.as_deref().unwrap_or("?"),
            match (snap.is_final, snap.minute) {
                (true, _) => "FT".to_string(),
                (false, Some(m)) => format!("{m}'"),
                (false, None) if snap.is_halftime => "HT".to_string(),
                (false, None) => "-".to_string(),
            }
        );
    }
    if let Some(report) = report {
        println!(
            "Written: events={} snapshots={}",
            report.events_written, report.snapshots_written
        );
        if !report.failures.is_empty() {
            println!("  write failures: {}", report.failures.len());
            for err in report.failures.iter().take(6) {
                println!("   - {err}");
            }
        }
    }
}
