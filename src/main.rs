// NVR Index daemon
//
// Full scan at startup, then scheduled full/partial scans until killed.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use nvr_index::config::{DatabaseArgs, ScanArgs};
use nvr_index::db::Catalog;
use nvr_index::logging::init_logging;
use nvr_index::{tools, Indexer, Scheduler};

#[derive(Parser)]
#[command(name = "nvr-indexer")]
#[command(about = "Keep the NVR recording catalog in sync with the storage root", long_about = None)]
#[command(version)]
struct Args {
    #[command(flatten)]
    db: DatabaseArgs,

    #[command(flatten)]
    scan: ScanArgs,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging("info");

    let config = args.scan.scan_config()?;
    let schedule = args.scan.schedule()?;
    let db_path = args.db.db_path();

    for tool in tools::missing_tools() {
        log::warn!("{} not found ({}); {}", tool, tool.env_key(), tool.missing_impact());
    }

    log::info!(
        "Indexing {} into {} (thumbnails in {})",
        config.storage_root.display(),
        db_path.display(),
        config.thumb_dir.display()
    );

    let catalog = Catalog::open(&db_path)
        .with_context(|| format!("failed to open catalog at {}", db_path.display()))?;
    let indexer = Arc::new(Indexer::new(Arc::new(catalog), config));

    let scheduler = Scheduler::start(indexer, schedule)?;
    scheduler.join();

    Ok(())
}
