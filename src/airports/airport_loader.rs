//! Reads airport definitions from the header-less 11-column airports CSV format:
//!
//! | # | column   | used |
//! |---|----------|------|
//! | 1 | row      |      |
//! | 2 | name     |      |
//! | 3 | city     |      |
//! | 4 | country  |      |
//! | 5 | IATA/FAA | yes  |
//! | 6 | ICAO     |      |
//! | 7 | latitude | yes  |
//! | 8 | longitude| yes  |
//! | 9 | altitude |      |
//! | 10| timezone |      |
//! | 11| DST      |      |
//!
//! Rows with any other number of fields are skipped and reported, like rows with a
//! bad code or coordinate.

use crate::airports::error::AirportLoadError;
use crate::types::airport::Airport;
use log::{info, warn};
use polars::prelude::*;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::{fs, task};

const EXPECTED_COLUMN_COUNT: usize = 11;
const IATA_COLUMN: &str = "column_5";
const LATITUDE_COLUMN: &str = "column_7";
const LONGITUDE_COLUMN: &str = "column_8";

/// A CSV row that did not produce a valid [`Airport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    /// 1-based row number in the file.
    pub row: usize,
    pub reason: String,
}

/// Outcome of parsing an airports file.
#[derive(Debug, Clone, Default)]
pub struct LoadedAirports {
    pub airports: Vec<Airport>,
    pub rejected: Vec<RejectedRow>,
}

/// Parses airport CSV data into validated [`Airport`]s.
///
/// Parsing is CPU bound and runs on the blocking thread pool. Rows with a missing or
/// invalid code or coordinate are skipped and reported in
/// [`LoadedAirports::rejected`], and so are rows with other than 11 fields. Only
/// unreadable input, or input where no row has 11 fields, fails the whole load.
pub struct AirportLoader;

impl AirportLoader {
    /// Loads airports from a CSV file on disk.
    ///
    /// # Errors
    ///
    /// * [`AirportLoadError::FileRead`] if the file can not be accessed.
    /// * [`AirportLoadError::CsvRead`] if the content is not parsable CSV.
    /// * [`AirportLoadError::SchemaMismatch`] if no row of the file has 11 fields.
    pub async fn load_file(path: &Path) -> Result<LoadedAirports, AirportLoadError> {
        fs::metadata(path)
            .await
            .map_err(|e| AirportLoadError::FileRead(path.to_path_buf(), e))?;

        let path_buf = path.to_path_buf();
        let loaded = task::spawn_blocking(move || Self::parse_csv(&path_buf)).await??;
        info!(
            "Loaded {} airports from {} ({} rows rejected)",
            loaded.airports.len(),
            path.display(),
            loaded.rejected.len()
        );
        Ok(loaded)
    }

    /// Loads airports from in-memory CSV content.
    ///
    /// # Errors
    ///
    /// Same as [`AirportLoader::load_file`], plus [`AirportLoadError::TempFile`] if the
    /// content can not be staged for parsing.
    pub async fn load_bytes(bytes: Vec<u8>) -> Result<LoadedAirports, AirportLoadError> {
        let loaded = task::spawn_blocking(move || {
            let mut temp_file = NamedTempFile::new().map_err(AirportLoadError::TempFile)?;
            temp_file
                .write_all(&bytes)
                .map_err(AirportLoadError::TempFile)?;
            temp_file.flush().map_err(AirportLoadError::TempFile)?;
            Self::parse_csv(temp_file.path())
        })
        .await??;
        info!(
            "Loaded {} airports from memory ({} rows rejected)",
            loaded.airports.len(),
            loaded.rejected.len()
        );
        Ok(loaded)
    }

    fn parse_csv(path: &Path) -> Result<LoadedAirports, AirportLoadError> {
        let content =
            std::fs::read(path).map_err(|e| AirportLoadError::FileRead(path.to_path_buf(), e))?;
        let widths = record_widths(&String::from_utf8_lossy(&content));
        if !widths.is_empty() && widths.iter().all(|width| *width != EXPECTED_COLUMN_COUNT) {
            warn!(
                "Airports CSV {} has {} columns, expected {}",
                path.display(),
                widths[0],
                EXPECTED_COLUMN_COUNT
            );
            return Err(AirportLoadError::SchemaMismatch {
                expected: EXPECTED_COLUMN_COUNT,
                found: widths[0],
            });
        }

        // Every column is read as text against a fixed 11-column schema; ragged rows
        // are truncated or padded here and rejected below by their field count.
        let schema = Schema::from_iter(
            (1..=EXPECTED_COLUMN_COUNT)
                .map(|i| Field::new(format!("column_{i}").into(), DataType::String)),
        );
        let df = CsvReadOptions::default()
            .with_has_header(false)
            .with_schema(Some(Arc::new(schema)))
            .map_parse_options(|options| options.with_truncate_ragged_lines(true))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .map_err(|e| AirportLoadError::CsvRead(path.to_path_buf(), e))?
            .finish()
            .map_err(|e| AirportLoadError::CsvRead(path.to_path_buf(), e))?;

        // Non-strict casts: unparsable cells become null and the row gets rejected.
        let iata_column = column_as(&df, IATA_COLUMN, &DataType::String)?;
        let latitude_column = column_as(&df, LATITUDE_COLUMN, &DataType::Float64)?;
        let longitude_column = column_as(&df, LONGITUDE_COLUMN, &DataType::Float64)?;
        let iata_codes = iata_column.str().map_err(column_error(IATA_COLUMN))?;
        let latitudes = latitude_column.f64().map_err(column_error(LATITUDE_COLUMN))?;
        let longitudes = longitude_column
            .f64()
            .map_err(column_error(LONGITUDE_COLUMN))?;

        let mut loaded = LoadedAirports::default();
        for idx in 0..df.height() {
            let row = idx + 1;
            let width = widths.get(idx).copied().unwrap_or(EXPECTED_COLUMN_COUNT);
            let parsed = match (iata_codes.get(idx), latitudes.get(idx), longitudes.get(idx)) {
                _ if width != EXPECTED_COLUMN_COUNT => Err(format!(
                    "expected {} fields, found {}",
                    EXPECTED_COLUMN_COUNT, width
                )),
                (Some(iata), Some(latitude), Some(longitude)) => {
                    Airport::new(iata.trim(), latitude, longitude).map_err(|e| e.to_string())
                }
                _ => Err("missing or unparsable iata code or coordinates".to_string()),
            };
            match parsed {
                Ok(airport) => loaded.airports.push(airport),
                Err(reason) => {
                    warn!("Ignoring airports CSV row {}: {}", row, reason);
                    loaded.rejected.push(RejectedRow { row, reason });
                }
            }
        }
        Ok(loaded)
    }
}

/// Field count of every non-blank line. Commas inside double quotes do not split.
fn record_widths(content: &str) -> Vec<usize> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let mut quoted = false;
            let separators = line
                .chars()
                .filter(|c| match c {
                    '"' => {
                        quoted = !quoted;
                        false
                    }
                    ',' => !quoted,
                    _ => false,
                })
                .count();
            separators + 1
        })
        .collect()
}

fn column_as(df: &DataFrame, name: &str, dtype: &DataType) -> Result<Column, AirportLoadError> {
    df.column(name)
        .and_then(|column| column.cast(dtype))
        .map_err(column_error(name))
}

fn column_error(name: &str) -> impl Fn(PolarsError) -> AirportLoadError + '_ {
    move |source| AirportLoadError::Column {
        column: name.to_string(),
        source,
    }
}
