//! GPX track reader
//!
//! Concatenates every track segment in file order into one continuous point
//! sequence. Recordings exported as multiple segments (auto-pause, tunnel
//! dropouts) are treated as a single run.

use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

use super::Track;
use crate::error::{PaceGridError, Result};
use crate::models::RawPoint;

/// Read one recording from a GPX file
pub fn read_track(path: &Path) -> Result<Track> {
    let file = File::open(path)?;
    let gpx = gpx::read(BufReader::new(file)).map_err(|e| PaceGridError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let track_name = gpx.tracks.iter().find_map(|t| t.name.clone());

    let mut points = Vec::new();
    for track in gpx.tracks {
        for segment in track.segments {
            for waypoint in segment.points {
                points.push(raw_point(waypoint, path)?);
            }
        }
    }

    let first = points.first().ok_or_else(|| PaceGridError::Parse {
        path: path.to_path_buf(),
        reason: "no track points found".to_string(),
    })?;
    let date = first.time.date_naive();

    let recording_id = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .ok_or_else(|| PaceGridError::Parse {
            path: path.to_path_buf(),
            reason: "file name is not valid UTF-8".to_string(),
        })?;

    let name = track_name.unwrap_or_else(|| recording_id.clone());

    info!(
        recording_id = %recording_id,
        name = %name,
        %date,
        points = points.len(),
        "read GPX track"
    );

    Ok(Track {
        recording_id,
        name,
        date,
        points,
    })
}

fn raw_point(waypoint: gpx::Waypoint, path: &Path) -> Result<RawPoint> {
    let point = waypoint.point();

    let elevation = waypoint.elevation.ok_or_else(|| PaceGridError::Parse {
        path: path.to_path_buf(),
        reason: "track point missing elevation".to_string(),
    })?;

    let time = waypoint.time.ok_or_else(|| PaceGridError::Parse {
        path: path.to_path_buf(),
        reason: "track point missing timestamp".to_string(),
    })?;
    let time = gpx_time_to_utc(time).map_err(|reason| PaceGridError::Parse {
        path: path.to_path_buf(),
        reason,
    })?;

    Ok(RawPoint {
        time,
        latitude: point.y(),
        longitude: point.x(),
        elevation,
    })
}

// gpx::Time wraps time::OffsetDateTime; go through RFC 3339 to get chrono.
fn gpx_time_to_utc(time: gpx::Time) -> std::result::Result<DateTime<Utc>, String> {
    let formatted = time.format().map_err(|e| e.to_string())?;
    DateTime::parse_from_rfc3339(&formatted)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| e.to_string())
}
