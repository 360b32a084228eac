use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

use pacegrid::import;
use pacegrid::logging;
use pacegrid::models::CompositeSurface;
use pacegrid::store::{self, SurfaceStore};
use pacegrid::{AppConfig, RunSelector, SpeedSurfaceBuilder, SurfaceAggregator, TrackPreparer};

#[derive(Parser)]
#[command(
    name = "pacegrid",
    about = "Personal-record speed surfaces from GPS track recordings",
    version
)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root directory for stored surfaces (overrides the configuration)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format (pretty, json, compact)
    #[arg(long, global = true, default_value = "pretty")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a GPX file or a directory of GPX files and store their surfaces
    Import {
        /// GPX file or directory
        path: PathBuf,
    },

    /// Print the composite best-effort surface for a date range as CSV
    Curve {
        /// Start date, inclusive (YYYY-MM-DD)
        #[arg(long = "from")]
        from: String,

        /// End date, inclusive (YYYY-MM-DD)
        #[arg(long = "to")]
        to: String,

        /// Emit JSON instead of CSV
        #[arg(long)]
        json: bool,
    },

    /// Print the best-speed column for one gradient bucket over a date range
    SpeedAt {
        /// Start date, inclusive (YYYY-MM-DD)
        #[arg(long = "from")]
        from: String,

        /// End date, inclusive (YYYY-MM-DD)
        #[arg(long = "to")]
        to: String,

        /// Gradient bucket in rounded percent
        #[arg(long, allow_hyphen_values = true)]
        gradient: i32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let format = cli.log_format.parse().map_err(|e: String| anyhow!(e))?;
    logging::init(&cli.log_level, format);

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    config.surface.validate()?;

    let store = SurfaceStore::new(&config.data_dir);

    match cli.command {
        Commands::Import { path } => cmd_import(&store, &config, &path),
        Commands::Curve { from, to, json } => cmd_curve(&store, &from, &to, json),
        Commands::SpeedAt { from, to, gradient } => cmd_speed_at(&store, &from, &to, gradient),
    }
}

fn cmd_import(store: &SurfaceStore, config: &AppConfig, path: &Path) -> Result<()> {
    if !path.is_dir() {
        let (recording_id, name) = process_track(store, config, path)?;
        println!("Imported {recording_id} ({name})");
        return Ok(());
    }

    let files = import::collect_track_files(path)?;
    if files.is_empty() {
        println!("No GPX files found in {}", path.display());
        return Ok(());
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({msg})")
            .unwrap()
            .progress_chars("#>-"),
    );

    // Recordings are independent, so the whole pipeline runs per file in
    // parallel.
    let results: Vec<(PathBuf, pacegrid::Result<(String, String)>)> = files
        .par_iter()
        .map(|file| {
            pb.set_message(
                file.file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .to_string(),
            );
            let result = process_track(store, config, file);
            pb.inc(1);
            (file.clone(), result)
        })
        .collect();
    pb.finish_with_message("Import complete");

    let mut imported = 0usize;
    for (file, result) in &results {
        match result {
            Ok((recording_id, name)) => {
                imported += 1;
                println!("✓ {recording_id} ({name})");
            }
            Err(e) => {
                warn!(file = %file.display(), error = %e, "import failed");
                println!("✗ {}: {e}", file.display());
            }
        }
    }
    println!("Imported {imported}/{} recordings", results.len());
    Ok(())
}

/// Run the full per-recording pipeline: read, prepare, build, store
fn process_track(
    store: &SurfaceStore,
    config: &AppConfig,
    path: &Path,
) -> pacegrid::Result<(String, String)> {
    let track = import::read_track(path)?;
    let samples = TrackPreparer::prepare(&track.points)?;
    let surface = SpeedSurfaceBuilder::new(config.surface).build(&samples);
    store.save(&track.recording_id, track.date, &surface)?;
    Ok((track.recording_id, track.name))
}

fn cmd_curve(store: &SurfaceStore, from: &str, to: &str, json: bool) -> Result<()> {
    match composite_for_range(store, from, to)? {
        Some(composite) => {
            if json {
                store::write_surface_json(io::stdout().lock(), composite.grid())?;
            } else {
                store::write_surface_csv(io::stdout().lock(), composite.grid())?;
            }
            Ok(())
        }
        None => {
            println!("No runs between {from} and {to}");
            Ok(())
        }
    }
}

fn cmd_speed_at(store: &SurfaceStore, from: &str, to: &str, gradient: i32) -> Result<()> {
    let composite = match composite_for_range(store, from, to)? {
        Some(composite) => composite,
        None => {
            println!("No runs between {from} and {to}");
            return Ok(());
        }
    };

    let column = composite.speed_at_gradient(gradient).ok_or_else(|| {
        anyhow!(
            "gradient {gradient} is outside the stored range [{}, {}]",
            composite.grid().min_gradient(),
            composite.grid().max_gradient()
        )
    })?;

    println!("window_secs,speed_mps");
    for (window, speed) in column.iter().enumerate() {
        println!("{window},{speed}");
    }
    Ok(())
}

fn composite_for_range(
    store: &SurfaceStore,
    from: &str,
    to: &str,
) -> Result<Option<CompositeSurface>> {
    let listings = store.list_runs()?;
    let ids = RunSelector::select(from, to, &listings)?;
    if ids.is_empty() {
        return Ok(None);
    }

    let surfaces = ids
        .iter()
        .map(|id| store.load(id))
        .collect::<pacegrid::Result<Vec<_>>>()?;
    Ok(Some(SurfaceAggregator::aggregate(&surfaces)?))
}
