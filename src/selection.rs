//! Run selection by calendar date range
//!
//! Decides which previously built surfaces contribute to a composite. The
//! persistence listing comes from a collaborator (the store); this module
//! owns the selection policy: date parsing, range validity and the inclusion
//! rule.

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{PaceGridError, Result};
use crate::models::RunListing;

/// Date format for selection bounds and recording index entries
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Resolves which recordings fall inside a date range
pub struct RunSelector;

impl RunSelector {
    /// Select the recordings whose date `d` satisfies `start <= d <= end`
    /// (inclusive both ends), preserving listing order.
    ///
    /// An inverted range (`start > end`) is a deliberate empty result, not an
    /// error. Unparseable bounds fail with [`PaceGridError::InvalidDate`], as
    /// does any malformed date in the listing itself: selection is fail-fast
    /// and never returns a partial result.
    pub fn select(start: &str, end: &str, available: &[RunListing]) -> Result<Vec<String>> {
        let start = parse_date(start)?;
        let end = parse_date(end)?;

        if start > end {
            debug!(%start, %end, "inverted date range selects nothing");
            return Ok(Vec::new());
        }

        let mut selected = Vec::new();
        for listing in available {
            let date = parse_date(&listing.date)?;
            if start <= date && date <= end {
                selected.push(listing.recording_id.clone());
            }
        }
        Ok(selected)
    }
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| PaceGridError::InvalidDate {
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(id: &str, date: &str) -> RunListing {
        RunListing {
            recording_id: id.to_string(),
            date: date.to_string(),
        }
    }

    fn january_runs() -> Vec<RunListing> {
        vec![
            listing("run-a", "2018-01-01"),
            listing("run-b", "2018-01-15"),
            listing("run-c", "2018-02-01"),
        ]
    }

    #[test]
    fn test_inclusive_range() {
        let selected = RunSelector::select("2018-01-01", "2018-01-31", &january_runs()).unwrap();
        assert_eq!(selected, vec!["run-a", "run-b"]);
    }

    #[test]
    fn test_boundary_dates_included() {
        let selected = RunSelector::select("2018-01-15", "2018-02-01", &january_runs()).unwrap();
        assert_eq!(selected, vec!["run-b", "run-c"]);
    }

    #[test]
    fn test_inverted_range_is_empty_not_error() {
        let selected = RunSelector::select("2018-02-01", "2018-01-01", &january_runs()).unwrap();
        assert!(selected.is_empty());
    }

    #[test]
    fn test_invalid_bound_rejected() {
        let err = RunSelector::select("not-a-date", "2018-01-01", &january_runs()).unwrap_err();
        assert!(matches!(err, PaceGridError::InvalidDate { value } if value == "not-a-date"));
    }

    #[test]
    fn test_malformed_listing_date_fails_whole_selection() {
        let runs = vec![
            listing("run-a", "2018-01-01"),
            listing("run-b", "01/15/2018"),
        ];
        assert!(matches!(
            RunSelector::select("2018-01-01", "2018-01-31", &runs),
            Err(PaceGridError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_no_matches_is_empty() {
        let selected = RunSelector::select("2019-01-01", "2019-12-31", &january_runs()).unwrap();
        assert!(selected.is_empty());
    }
}
