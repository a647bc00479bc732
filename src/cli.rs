// NVR Index operator CLI

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;

use nvr_index::config::{DatabaseArgs, ScanArgs};
use nvr_index::constants::DEFAULT_PAGE_LIMIT;
use nvr_index::db::{open_db, Catalog};
use nvr_index::format::{format_bitrate, format_date, format_duration, format_size};
use nvr_index::logging::init_logging;
use nvr_index::query::{self, Cursor, Page, PageRequest};
use nvr_index::{Indexer, ScanKind};

#[derive(Parser)]
#[command(name = "nvrctl")]
#[command(about = "Inspect and maintain the NVR recording catalog", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    db: DatabaseArgs,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one scan now (stop nvr-indexer first)
    ///
    /// The scan guard only covers this process. A daemon scanning the same
    /// catalog at the same time inserts the same recordings and one of the
    /// two scans aborts on the duplicate row.
    Scan {
        #[command(flatten)]
        scan: ScanArgs,
        /// Only pick up recordings newer than the latest known ones
        #[arg(long)]
        partial: bool,
    },

    /// List sources with their recording counts
    Sources,

    /// List recordings, newest first
    List {
        /// Only these source IDs (repeatable)
        #[arg(short, long = "source")]
        sources: Vec<i64>,
        /// Page of recordings older than this recording ID
        #[arg(long, conflicts_with = "newer_than")]
        older_than: Option<i64>,
        /// Page of recordings newer than this recording ID
        #[arg(long)]
        newer_than: Option<i64>,
        /// Maximum recordings to show (at most 100)
        #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT)]
        limit: i64,
    },

    /// Show recording details
    Show {
        /// Recording ID
        id: i64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging("warn");

    let db_path = cli.db.db_path();
    let json = cli.json;

    match cli.command {
        Commands::Scan { scan, partial } => cmd_scan(&db_path, scan, partial, json),
        Commands::Sources => cmd_sources(&open(&db_path)?, json),
        Commands::List { sources, older_than, newer_than, limit } => {
            cmd_list(&open(&db_path)?, sources, older_than, newer_than, limit, json)
        }
        Commands::Show { id } => cmd_show(&open(&db_path)?, id, json),
    }
}

fn open(db_path: &std::path::Path) -> Result<Connection> {
    open_db(db_path).with_context(|| format!("failed to open catalog at {}", db_path.display()))
}

fn cmd_scan(db_path: &std::path::Path, args: ScanArgs, partial: bool, json: bool) -> Result<()> {
    let config = args.scan_config()?;
    let catalog = Catalog::new(open(db_path)?);
    let indexer = Indexer::new(Arc::new(catalog), config);

    let kind = if partial { ScanKind::Partial } else { ScanKind::Full };
    let report = indexer.scan(kind)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Completed {}", report);
    }

    if report.extraction_failures > 0 {
        anyhow::bail!("{} recordings could not be indexed", report.extraction_failures);
    }
    Ok(())
}

fn cmd_sources(conn: &Connection, json: bool) -> Result<()> {
    let sources = query::list_sources_with_counts(conn)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sources)?);
        return Ok(());
    }

    if sources.is_empty() {
        println!("No sources in catalog.");
        return Ok(());
    }

    println!("{:<6} {:<24} {:>10}  {}", "ID", "NAME", "RECORDINGS", "PATH");
    println!("{}", "-".repeat(72));
    for s in &sources {
        println!(
            "{:<6} {:<24} {:>10}  {}",
            s.source.id, s.source.name, s.recording_count, s.source.path
        );
    }
    Ok(())
}

fn cmd_list(
    conn: &Connection,
    sources: Vec<i64>,
    older_than: Option<i64>,
    newer_than: Option<i64>,
    limit: i64,
    json: bool,
) -> Result<()> {
    // Unknown source IDs are an error, not an empty page
    for id in &sources {
        query::get_source(conn, *id)?;
    }

    let mut request = match (older_than, newer_than) {
        (Some(id), _) => PageRequest::older_than(Cursor::from(&query::get_recording(conn, id)?)),
        (None, Some(id)) => PageRequest::newer_than(Cursor::from(&query::get_recording(conn, id)?)),
        (None, None) => PageRequest::default(),
    }
    .with_limit(limit);
    if !sources.is_empty() {
        request = request.with_sources(sources);
    }

    let page = query::paginate(conn, &request)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    print_page(&page);
    Ok(())
}

fn print_page(page: &Page) {
    if page.is_empty() {
        println!("No recordings found.");
        return;
    }

    println!(
        "{:<8} {:<6} {:<20} {:>9} {:>10}  {}",
        "ID", "SOURCE", "START (UTC)", "DURATION", "SIZE", "PATH"
    );
    println!("{}", "-".repeat(100));
    for r in &page.recordings {
        println!(
            "{:<8} {:<6} {:<20} {:>9} {:>10}  {}",
            r.id,
            r.source_id,
            format_date(r.start_ts),
            r.duration.map(format_duration).unwrap_or_else(|| "-".to_string()),
            r.size.map(format_size).unwrap_or_else(|| "-".to_string()),
            r.video_path,
        );
    }

    if let (Some(newest), Some(oldest)) = (page.newest(), page.oldest()) {
        println!();
        if page.has_newer {
            println!("Newer: nvrctl list --newer-than {}", newest.id);
        }
        if page.has_older {
            println!("Older: nvrctl list --older-than {}", oldest.id);
        }
    }
}

fn cmd_show(conn: &Connection, id: i64, json: bool) -> Result<()> {
    let recording = query::get_recording(conn, id)?;
    let source = query::get_source(conn, recording.source_id)?;
    let neighbors = query::get_recording_neighbors(conn, &recording)?;

    if json {
        let doc = serde_json::json!({
            "recording": recording,
            "source": source,
            "prev": neighbors.prev,
            "next": neighbors.next,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    let or_dash = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());

    println!("Recording {}", recording.id);
    println!("  Source:     {} ({})", source.name, source.id);
    println!("  Start:      {} UTC", format_date(recording.start_ts));
    println!("  Clock skew: {} ms", recording.utc_offset);
    println!("  Duration:   {}", or_dash(recording.duration.map(format_duration)));
    println!("  Size:       {}", or_dash(recording.size.map(format_size)));
    println!("  Bitrate:    {}", or_dash(recording.bitrate.map(format_bitrate)));
    println!("  Video:      {}", or_dash(recording.video_codec.clone()));
    println!("  Audio:      {}", or_dash(recording.audio_codec.clone()));
    println!("  File:       {}", recording.video_path);
    println!("  Thumbnail:  {}", or_dash(recording.thumb_path.clone()));

    match neighbors.prev {
        Some(ref prev) => println!("  Previous:   {} ({})", prev.id, format_date(prev.start_ts)),
        None => println!("  Previous:   -"),
    }
    match neighbors.next {
        Some(ref next) => println!("  Next:       {} ({})", next.id, format_date(next.start_ts)),
        None => println!("  Next:       -"),
    }

    Ok(())
}
