mod domain;
mod error;
mod persistence;
mod report;
mod sync;
mod things;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use persistence::{
    ensure_logbook_dir, init_local_dir, load_settings, load_state, save_settings, save_state,
    settings_file, state_file, Settings,
};
use std::path::PathBuf;
use things::{locate_database, ThingsDb};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the tracing filter
const LOG_ENV: &str = "THINGS_LOGBOOK_LOG";

#[derive(Parser)]
#[command(name = "things-logbook")]
#[command(about = "Sync completed Things tasks into daily markdown notes", long_about = None)]
struct Cli {
    /// Log every fetched page to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a local .things-logbook directory with default settings
    Init,
    /// Write the logbook section of every daily note with new completions
    Sync(SyncArgs),
    /// Print the outline for completed tasks without touching any note
    Render(SourceArgs),
}

#[derive(Args, Default)]
struct SourceArgs {
    /// Path to the Things main.sqlite. Probed under ~/Library when omitted.
    #[arg(long)]
    database: Option<PathBuf>,
    /// Unix timestamp to sync from instead of the stored watermark
    #[arg(long)]
    since: Option<f64>,
}

#[derive(Args, Default)]
struct SyncArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// Directory holding the daily notes
    #[arg(long)]
    notes_dir: Option<PathBuf>,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Init) => {
            let dir = init_local_dir()?;
            save_settings(dir.join("settings.json"), &Settings::default())?;
            println!("Initialized things-logbook directory: {}", dir.display());
            println!("Edit settings.json there to point at your notes.");
            Ok(())
        }
        Some(Commands::Render(args)) => run_render(args),
        Some(Commands::Sync(args)) => run_sync(args),
        None => run_sync(SyncArgs::default()),
    }
}

fn open_database(settings: &Settings, database: Option<PathBuf>) -> Result<ThingsDb> {
    let configured = database.or_else(|| settings.database_path.clone());
    let path = locate_database(configured.as_deref()).map_err(error::SyncError::from)?;
    ThingsDb::open(&path)
        .with_context(|| format!("Failed to open Things database: {}", path.display()))
}

fn run_render(args: SourceArgs) -> Result<()> {
    let settings = load_settings(settings_file()?)?;
    let db = open_database(&settings, args.database)?;

    let (tasks, _) = sync::collect_tasks(&db, args.since.unwrap_or(0.0), &Local)?;
    println!("{}", report::render(&tasks, &settings.outline_options()));
    Ok(())
}

fn run_sync(args: SyncArgs) -> Result<()> {
    let logbook_dir = ensure_logbook_dir()?;
    let settings = load_settings(settings_file()?)?;
    let state_path = state_file()?;
    let mut state = load_state(&state_path)?;

    let db = open_database(&settings, args.source.database)?;
    eprintln!("Using Things database: {}", db.path().display());

    let notes_dir = args
        .notes_dir
        .unwrap_or_else(|| settings.notes_dir(&logbook_dir));
    let watermark = args.source.since.unwrap_or(state.latest_sync_time);

    let report = sync::run_sync(&db, &settings, &notes_dir, watermark, &Local)?;

    state.latest_sync_time = state.latest_sync_time.max(report.latest_sync_time);
    state.last_run = Some(Local::now().to_rfc3339());
    save_state(&state_path, &state)?;

    println!(
        "Synced {} tasks into {} daily notes under {}",
        report.tasks,
        report.days,
        notes_dir.display()
    );
    for path in &report.notes_written {
        println!("  {}", path.display());
    }
    Ok(())
}
