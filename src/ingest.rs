//! CSV ingestion with positional column mapping.
//!
//! Input tables come from whatever produced the observations, so columns
//! are addressed by 0-based index rather than by header name. Rows with
//! empty cells in any mapped column are dropped and counted; malformed
//! values in a non-empty cell are an error, because silently skipping
//! them would change the result without anyone noticing.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::error::{PrismergeError, Result};

/// 0-based positions of the mapped columns in the input table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap {
    pub lat: usize,
    pub lon: usize,
    pub time: usize,
    pub name: usize,
}

impl ColumnMap {
    /// Create a column map.
    pub fn new(lat: usize, lon: usize, time: usize, name: usize) -> Self {
        Self {
            lat,
            lon,
            time,
            name,
        }
    }

    fn roles(&self) -> [(&'static str, usize); 4] {
        [
            ("latitude", self.lat),
            ("longitude", self.lon),
            ("timestamp", self.time),
            ("name", self.name),
        ]
    }
}

/// One usable row from the input table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub lon: f64,
    pub lat: f64,
    /// Epoch seconds, UTC.
    pub timestamp: f64,
    pub name: String,
}

/// Read observations from a headered CSV file.
///
/// The header row is only used to establish the table width; fields are
/// picked by the indices in `columns`. Rows whose mapped cells are all
/// present but unparseable abort the read with an error naming the row.
///
/// # Arguments
///
/// * `path` - CSV file with a header row
/// * `columns` - mapped column positions
///
/// # Errors
///
/// Returns an error when the file cannot be opened, a mapped index is
/// outside the table, or a non-empty cell fails to parse.
pub fn read_observations(path: impl AsRef<Path>, columns: ColumnMap) -> Result<Vec<Observation>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let observations = observations_from_reader(file, columns)?;
    log::info!(
        "loaded {} observations from {}",
        observations.len(),
        path.display()
    );
    Ok(observations)
}

/// Read observations from any CSV source with a header row.
pub fn observations_from_reader(reader: impl Read, columns: ColumnMap) -> Result<Vec<Observation>> {
    let mut csv_reader = csv::Reader::from_reader(reader);

    let width = csv_reader.headers()?.len();
    for (role, index) in columns.roles() {
        if index >= width {
            return Err(PrismergeError::Column { role, index, width });
        }
    }

    let mut observations = Vec::new();
    let mut dropped = 0usize;
    for (position, record) in csv_reader.records().enumerate() {
        let record = record?;
        // 1-based, counting from the first data row.
        let row = position + 1;

        let lat_cell = record.get(columns.lat).unwrap_or("").trim();
        let lon_cell = record.get(columns.lon).unwrap_or("").trim();
        let time_cell = record.get(columns.time).unwrap_or("").trim();
        let name_cell = record.get(columns.name).unwrap_or("").trim();
        if lat_cell.is_empty()
            || lon_cell.is_empty()
            || time_cell.is_empty()
            || name_cell.is_empty()
        {
            dropped += 1;
            continue;
        }

        let lat = parse_coordinate("latitude", row, lat_cell)?;
        let lon = parse_coordinate("longitude", row, lon_cell)?;
        let timestamp = parse_timestamp(time_cell)?;
        observations.push(Observation {
            lon,
            lat,
            timestamp,
            name: name_cell.to_string(),
        });
    }

    if dropped > 0 {
        log::warn!("dropped {dropped} rows with empty mapped cells");
    }
    Ok(observations)
}

fn parse_coordinate(role: &'static str, row: usize, value: &str) -> Result<f64> {
    match value.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(PrismergeError::Numeric {
            role,
            row,
            value: value.to_string(),
        }),
    }
}

/// Parse a timestamp cell into epoch seconds.
///
/// Numeric cells are taken as epoch seconds directly; anything else must
/// be an ISO-8601 / RFC 3339 datetime with an offset, e.g.
/// `2023-05-01T12:30:00Z` or `2023-05-01T12:30:00.250+02:00`.
pub fn parse_timestamp(value: &str) -> Result<f64> {
    if let Ok(epoch) = value.parse::<f64>() {
        if epoch.is_finite() {
            return Ok(epoch);
        }
    }
    match DateTime::parse_from_rfc3339(value) {
        Ok(datetime) => Ok(datetime.timestamp_micros() as f64 / 1e6),
        Err(source) => Err(PrismergeError::Timestamp {
            value: value.to_string(),
            reason: source.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const COLUMNS: ColumnMap = ColumnMap {
        lat: 1,
        lon: 2,
        time: 3,
        name: 0,
    };

    fn read(csv: &str) -> Result<Vec<Observation>> {
        observations_from_reader(csv.as_bytes(), COLUMNS)
    }

    #[test]
    fn test_reads_mapped_columns() {
        let observations = read(
            "name,lat,lon,time,extra\n\
             first,40.7128,-74.0060,1000,x\n\
             second,-33.8688,151.2093,2000.5,y\n",
        )
        .unwrap();

        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].lat, 40.7128);
        assert_eq!(observations[0].lon, -74.0060);
        assert_eq!(observations[0].timestamp, 1000.0);
        assert_eq!(observations[0].name, "first");
        assert_eq!(observations[1].timestamp, 2000.5);
    }

    #[test]
    fn test_drops_rows_with_empty_cells() {
        let observations = read(
            "name,lat,lon,time\n\
             a,1.0,2.0,100\n\
             b,,2.0,100\n\
             c,1.0,2.0,\n\
             d,3.0,4.0,200\n",
        )
        .unwrap();

        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].name, "a");
        assert_eq!(observations[1].name, "d");
    }

    #[test]
    fn test_empty_name_drops_row() {
        let observations = read("name,lat,lon,time\n,1.0,2.0,100\na,1.0,2.0,100\n").unwrap();
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].name, "a");
    }

    #[test]
    fn test_column_out_of_range() {
        let result = observations_from_reader("a,b\n1,2\n".as_bytes(), COLUMNS);
        match result {
            Err(PrismergeError::Column { role, index, width }) => {
                assert_eq!(role, "longitude");
                assert_eq!(index, 2);
                assert_eq!(width, 2);
            }
            other => panic!("expected column error, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_coordinate_names_row() {
        let result = read(
            "name,lat,lon,time\n\
             a,1.0,2.0,100\n\
             b,oops,2.0,100\n",
        );
        match result {
            Err(PrismergeError::Numeric { role, row, value }) => {
                assert_eq!(role, "latitude");
                assert_eq!(row, 2);
                assert_eq!(value, "oops");
            }
            other => panic!("expected numeric error, got {other:?}"),
        }
    }

    #[test]
    fn test_iso_timestamps() {
        let observations = read(
            "name,lat,lon,time\n\
             a,1.0,2.0,1970-01-01T00:00:10Z\n\
             b,1.0,2.0,1970-01-01T01:00:00.500+01:00\n",
        )
        .unwrap();

        assert_eq!(observations[0].timestamp, 10.0);
        assert_eq!(observations[1].timestamp, 0.5);
    }

    #[test]
    fn test_unparseable_timestamp() {
        let result = read("name,lat,lon,time\na,1.0,2.0,yesterday\n");
        assert!(matches!(result, Err(PrismergeError::Timestamp { .. })));
    }

    #[test]
    fn test_parse_timestamp_epoch_passthrough() {
        assert_eq!(parse_timestamp("1234.75").unwrap(), 1234.75);
        assert_eq!(parse_timestamp("-60").unwrap(), -60.0);
    }

    #[test]
    fn test_read_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "name,lat,lon,time\nobs,10.0,20.0,3600\n").unwrap();

        let observations = read_observations(file.path(), COLUMNS).unwrap();
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].lat, 10.0);
        assert_eq!(observations[0].timestamp, 3600.0);
    }

    #[test]
    fn test_missing_file() {
        let result = read_observations("/nonexistent/observations.csv", COLUMNS);
        assert!(matches!(result, Err(PrismergeError::Io(_))));
    }
}
