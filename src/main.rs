use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use abn_extract::{fetch, pipeline, ErrorLog, RunReport, Store};

/// Landing page the registry publishes the split archives on.
const DEFAULT_INDEX_URL: &str = "https://data.gov.au/data/dataset/abn-bulk-extract";

#[derive(Parser)]
#[command(name = "abn-extract")]
#[command(about = "ABN bulk extract loader: fetch the published archives and load them into SQLite")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover, download and unzip the published extract archives
    Fetch {
        /// Landing page listing the split archives
        #[arg(long, default_value = DEFAULT_INDEX_URL)]
        url: String,
        /// Directory the raw extract files are written to
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
    /// Run the pipeline over already-downloaded extract files
    Load {
        /// Directory holding the raw extract files
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
        /// SQLite database path
        #[arg(long, default_value = "abn.db")]
        db: PathBuf,
        /// Append-only log of skipped inputs
        #[arg(long, default_value = "errors.log")]
        error_log: PathBuf,
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fetch the archives, then run the pipeline
    Run {
        #[arg(long, default_value = DEFAULT_INDEX_URL)]
        url: String,
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
        #[arg(long, default_value = "abn.db")]
        db: PathBuf,
        #[arg(long, default_value = "errors.log")]
        error_log: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch { url, data_dir } => run_fetch(&url, &data_dir),
        Commands::Load {
            data_dir,
            db,
            error_log,
            json,
        } => run_load(&data_dir, &db, &error_log, json),
        Commands::Run {
            url,
            data_dir,
            db,
            error_log,
            json,
        } => {
            run_fetch(&url, &data_dir)?;
            run_load(&data_dir, &db, &error_log, json)
        }
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("abn_extract=info")),
        )
        .init();
}

fn run_fetch(url: &str, data_dir: &Path) -> Result<()> {
    println!("📡 Discovering extract archives...");
    let urls = fetch::discover_archive_urls(url)?;
    println!("✓ Found {} archive links", urls.len());

    let files = fetch::download_archives(&urls, data_dir)?;
    println!(
        "✓ Extracted {} files into {}",
        files.len(),
        data_dir.display()
    );
    Ok(())
}

fn run_load(data_dir: &Path, db: &Path, error_log_path: &Path, json: bool) -> Result<()> {
    println!("🔧 Setting up store at {}...", db.display());
    let mut store = Store::open(db)?;
    store.setup()?;

    let mut error_log = ErrorLog::open(error_log_path)?;

    println!("🚚 Processing {}...", data_dir.display());
    match pipeline::process(&mut store, data_dir, &mut error_log) {
        Ok(report) => print_report(&report, json),
        Err(err) => {
            if let pipeline::PipelineError::StoreWrite { remaining, .. } = &err {
                eprintln!("❌ Run failed; files left for retry:");
                for path in remaining {
                    eprintln!("   {}", path.display());
                }
            }
            Err(err.into())
        }
    }
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("\n📊 Run complete");
    println!("   Files processed: {}", report.files_processed);
    println!("   Files skipped:   {}", report.files_skipped);
    println!("   Fragments:       {}", report.fragments_normalized);
    println!("   Rejected:        {}", report.fragments_rejected);
    println!("✓ abn:          {}", report.counts.abns);
    println!("✓ main_entity:  {}", report.counts.main_entities);
    println!("✓ legal_entity: {}", report.counts.legal_entities);
    println!("✓ asic_number:  {}", report.counts.asic_numbers);
    println!("✓ gst:          {}", report.counts.gst_statuses);
    println!("✓ dgr:          {}", report.counts.dgr_entries);
    println!("✓ other_entity: {}", report.counts.other_entities);
    println!("✓ Total entities loaded: {}", report.counts.total());
    Ok(())
}
