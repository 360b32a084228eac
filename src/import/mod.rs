//! Track import: reads raw recordings from GPS files
//!
//! The core pipeline only sees an ordered `Vec<RawPoint>`; this module is the
//! track-source collaborator that produces it, plus the recording metadata
//! (identifier and calendar date) the store is keyed by.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

use crate::error::{PaceGridError, Result};
use crate::models::RawPoint;

pub mod gpx;

/// One complete recording as read from a file
#[derive(Debug, Clone)]
pub struct Track {
    /// Identifier derived from the file stem
    pub recording_id: String,
    /// Display name: the GPX track name, falling back to the file stem
    pub name: String,
    /// Calendar date of the first sample
    pub date: NaiveDate,
    /// Ordered raw samples, all segments concatenated in recording order
    pub points: Vec<RawPoint>,
}

/// Read a single recording, dispatching on the file extension
pub fn read_track(path: &Path) -> Result<Track> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);

    match extension.as_deref() {
        Some("gpx") => gpx::read_track(path),
        _ => Err(PaceGridError::Parse {
            path: path.to_path_buf(),
            reason: "unsupported file format (expected .gpx)".to_string(),
        }),
    }
}

/// Collect all importable files from a directory, sorted for stable order
pub fn collect_track_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(PaceGridError::Parse {
            path: dir.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_gpx = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("gpx"))
            .unwrap_or(false);
        if path.is_file() && is_gpx {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
