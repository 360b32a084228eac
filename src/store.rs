//! On-disk surface store and recording index
//!
//! Surfaces are kept as CSV matrices under one subdirectory per calendar
//! date: `<root>/surfaces/<YYYY-MM-DD>/<recording_id>.csv`. The directory
//! name doubles as the recording index consumed by the run selector; it is
//! reported as the raw string so malformed names fail selection instead of
//! vanishing.
//!
//! Interchange format: the header row holds the literal integer gradient
//! labels, each following row is one window length (0..=max, in order), and
//! cells are speeds in m/s.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use chrono::NaiveDate;

use crate::error::{PaceGridError, Result};
use crate::models::{RunListing, SpeedSurface};

const SURFACES_DIR: &str = "surfaces";

/// Persists one [`SpeedSurface`] per recording, keyed by id and date
#[derive(Debug, Clone)]
pub struct SurfaceStore {
    root: PathBuf,
}

impl SurfaceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn surfaces_dir(&self) -> PathBuf {
        self.root.join(SURFACES_DIR)
    }

    fn surface_path(&self, recording_id: &str, date: NaiveDate) -> PathBuf {
        self.surfaces_dir()
            .join(date.to_string())
            .join(format!("{recording_id}.csv"))
    }

    /// Persist a surface, replacing any previous build wholesale
    pub fn save(
        &self,
        recording_id: &str,
        date: NaiveDate,
        surface: &SpeedSurface,
    ) -> Result<PathBuf> {
        let path = self.surface_path(recording_id, date);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = fs::File::create(&path)?;
        write_surface_csv(file, surface)?;

        info!(recording_id, %date, path = %path.display(), "stored speed surface");
        Ok(path)
    }

    /// Load the surface for a recording, searching all date directories
    pub fn load(&self, recording_id: &str) -> Result<SpeedSurface> {
        let file_name = format!("{recording_id}.csv");
        for listing in self.list_runs()? {
            if listing.recording_id == recording_id {
                let path = self.surfaces_dir().join(&listing.date).join(&file_name);
                debug!(recording_id, path = %path.display(), "loading speed surface");
                return read_surface_csv(&path);
            }
        }
        Err(PaceGridError::SurfaceNotFound {
            recording_id: recording_id.to_string(),
        })
    }

    /// The recording index: every stored surface with its date directory name
    pub fn list_runs(&self) -> Result<Vec<RunListing>> {
        let surfaces_dir = self.surfaces_dir();
        if !surfaces_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut date_dirs: Vec<PathBuf> = fs::read_dir(&surfaces_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_dir())
            .collect();
        date_dirs.sort();

        let mut listings = Vec::new();
        for dir in date_dirs {
            let date = dir
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();
            let mut files: Vec<PathBuf> = fs::read_dir(&dir)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| {
                    path.is_file() && path.extension().map(|e| e == "csv").unwrap_or(false)
                })
                .collect();
            files.sort();

            for file in files {
                if let Some(stem) = file.file_stem().and_then(|s| s.to_str()) {
                    listings.push(RunListing {
                        recording_id: stem.to_string(),
                        date: date.clone(),
                    });
                }
            }
        }
        Ok(listings)
    }
}

/// Write a surface in the interchange CSV format
pub fn write_surface_csv<W: Write>(writer: W, surface: &SpeedSurface) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let header: Vec<String> = surface.gradient_buckets().map(|b| b.to_string()).collect();
    csv_writer.write_record(&header)?;

    for w in 0..=surface.max_window_secs() {
        let row: Vec<String> = surface
            .row(w)
            .unwrap_or(&[])
            .iter()
            .map(|v| v.to_string())
            .collect();
        csv_writer.write_record(&row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write a surface as JSON, the typed form for downstream consumers
pub fn write_surface_json<W: Write>(writer: W, surface: &SpeedSurface) -> Result<()> {
    serde_json::to_writer(writer, surface)?;
    Ok(())
}

/// Read a surface from its JSON form
pub fn read_surface_json(data: &[u8]) -> Result<SpeedSurface> {
    Ok(serde_json::from_slice(data)?)
}

/// Read a surface back from the interchange CSV format
pub fn read_surface_csv(path: &Path) -> Result<SpeedSurface> {
    let mut reader = csv::Reader::from_path(path)?;

    let labels: Vec<i32> = reader
        .headers()?
        .iter()
        .map(|label| {
            label.parse::<i32>().map_err(|_| {
                PaceGridError::MalformedSurface(format!(
                    "gradient label {label:?} in {} is not an integer",
                    path.display()
                ))
            })
        })
        .collect::<Result<_>>()?;

    let (&min_gradient, &max_gradient) = match (labels.first(), labels.last()) {
        (Some(min), Some(max)) => (min, max),
        _ => {
            return Err(PaceGridError::MalformedSurface(format!(
                "{} has no gradient columns",
                path.display()
            )))
        }
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Vec<f64> = record
            .iter()
            .map(|cell| {
                cell.parse::<f64>().map_err(|_| {
                    PaceGridError::MalformedSurface(format!(
                        "cell {cell:?} in {} is not a number",
                        path.display()
                    ))
                })
            })
            .collect::<Result<_>>()?;
        rows.push(row);
    }

    SpeedSurface::from_grid(min_gradient, max_gradient, rows)
}
