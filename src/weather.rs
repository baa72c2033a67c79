//! The entry point for collectors and query clients.
//!
//! [`WeatherService`] takes the raw values a request carries (path segments, JSON
//! bodies) and turns them into [`WeatherRepository`] calls, applying the
//! caller-level rules the repository leaves out: code validation before lookups,
//! duplicate rejection on insert, category name parsing and radius parsing.

use crate::airports::airport_loader::{AirportLoader, LoadedAirports, RejectedRow};
use crate::error::WeatherError;
use crate::repository::statistics::UsageStatistics;
use crate::repository::weather_repository::WeatherRepository;
use crate::types::airport::{validate_iata, Airport};
use crate::types::atmospheric_information::AtmosphericInformation;
use crate::types::data_point::{DataPoint, DataPointType};
use bon::bon;
use log::{info, warn};
use std::collections::BTreeSet;
use std::path::Path;

/// Summary of a bulk airport load.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Number of airports added to the repository.
    pub added: usize,
    /// Codes skipped because an airport with the same code was already registered.
    pub duplicates: Vec<String>,
    /// Rows of the source that did not describe a valid airport.
    pub rejected: Vec<RejectedRow>,
}

/// Request-level operations over a shared [`WeatherRepository`].
///
/// # Examples
///
/// ```
/// use airport_weather::{WeatherRepository, WeatherService};
///
/// let service = WeatherService::new(WeatherRepository::new());
/// service.add_airport("BOS", "42.364347", "-71.005181").unwrap();
/// service
///     .update_weather("BOS", "wind", r#"{"mean":12.5,"first":8,"second":12,"third":15,"count":40}"#)
///     .unwrap();
///
/// let weather = service.query_weather().iata("BOS").radius("0").call().unwrap();
/// assert_eq!(weather.len(), 1);
/// assert_eq!(weather[0].wind().unwrap().mean(), 12.5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct WeatherService {
    repository: WeatherRepository,
}

#[bon]
impl WeatherService {
    pub fn new(repository: WeatherRepository) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &WeatherRepository {
        &self.repository
    }

    /// Registers an airport from its textual code and coordinates.
    ///
    /// # Errors
    ///
    /// * [`WeatherError::Validation`] for a malformed code or out-of-range coordinates.
    /// * [`WeatherError::AirportAlreadyExists`] if the code is already registered.
    /// * [`WeatherError::InvalidNumber`] if a coordinate is not a number.
    pub fn add_airport(
        &self,
        iata: &str,
        latitude: &str,
        longitude: &str,
    ) -> Result<Airport, WeatherError> {
        validate_iata(iata).inspect_err(|e| warn!("{}", e))?;
        self.reject_duplicate(iata)?;
        let latitude = parse_number("latitude", latitude)?;
        let longitude = parse_number("longitude", longitude)?;
        let airport = Airport::new(iata, latitude, longitude)
            .inspect_err(|e| warn!("Invalid airport data received: {}", e))?;
        self.repository.add_airport(airport.clone());
        Ok(airport)
    }

    /// Registers several airports, carrying on past failures.
    ///
    /// Returns the failures in input order; an empty vector means every airport was
    /// added.
    pub fn add_airports(&self, airports: Vec<Airport>) -> Vec<WeatherError> {
        airports
            .into_iter()
            .filter_map(|airport| self.add_validated(airport).err())
            .collect()
    }

    fn add_validated(&self, airport: Airport) -> Result<(), WeatherError> {
        airport
            .validate()
            .inspect_err(|e| warn!("Invalid airport data received: {}", e))?;
        self.reject_duplicate(airport.iata())?;
        self.repository.add_airport(airport);
        Ok(())
    }

    fn reject_duplicate(&self, iata: &str) -> Result<(), WeatherError> {
        if self.repository.contains_airport(iata) {
            warn!("Airport {} is already defined", iata);
            return Err(WeatherError::AirportAlreadyExists {
                iata: iata.to_string(),
            });
        }
        Ok(())
    }

    /// Looks up an airport by code.
    ///
    /// # Errors
    ///
    /// [`WeatherError::Validation`] for a malformed code, [`WeatherError::AirportNotFound`]
    /// if it is not registered.
    pub fn airport(&self, iata: &str) -> Result<Airport, WeatherError> {
        validate_iata(iata).inspect_err(|e| warn!("{}", e))?;
        self.repository.airport(iata).ok_or_else(|| {
            warn!("The iata code {} was not found", iata);
            WeatherError::not_found(iata)
        })
    }

    pub fn airport_codes(&self) -> BTreeSet<String> {
        self.repository.airport_codes()
    }

    /// Removes an airport; its weather data stays in the repository.
    pub fn delete_airport(&self, iata: &str) -> Result<(), WeatherError> {
        validate_iata(iata).inspect_err(|e| warn!("{}", e))?;
        self.repository.remove_airport(iata)?;
        Ok(())
    }

    /// Records a collector measurement.
    ///
    /// # Arguments
    ///
    /// * `iata` - Code of a registered airport.
    /// * `point_type` - Category name, see [`DataPointType`]'s `FromStr`.
    /// * `data_point_json` - A JSON object with `first`, `second`, `third`, `mean`
    ///   and `count`.
    ///
    /// # Errors
    ///
    /// * [`WeatherError::Validation`] for a malformed code or an out-of-range point.
    /// * [`WeatherError::UnknownDataPointType`] for an unrecognized category.
    /// * [`WeatherError::MalformedDataPoint`] if the body is not a data point.
    /// * [`WeatherError::AirportNotFound`] if the airport is not registered.
    pub fn update_weather(
        &self,
        iata: &str,
        point_type: &str,
        data_point_json: &str,
    ) -> Result<(), WeatherError> {
        validate_iata(iata).inspect_err(|e| warn!("{}", e))?;
        let data_type: DataPointType = point_type
            .parse()
            .inspect_err(|e| warn!("{}", e))?;
        let data_point: DataPoint =
            serde_json::from_str(data_point_json).map_err(WeatherError::MalformedDataPoint)?;
        self.repository
            .update_atmospheric_information(iata, data_type, data_point)
            .inspect_err(|e| warn!("Weather update for {} rejected: {}", iata, e))
    }

    /// Returns the weather of an airport and its neighbours.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.iata(&str)`: **Required.** Code of a registered airport.
    /// * `.radius(&str)`: Optional. Search radius in kilometers. Absent, blank and `0`
    ///   all mean "only this airport".
    ///
    /// # Returns
    ///
    /// The aggregates within the radius. When none of them has data yet, a single
    /// empty aggregate is returned instead of an empty list, which is what query
    /// clients have always received.
    ///
    /// # Errors
    ///
    /// * [`WeatherError::Validation`] for a malformed code.
    /// * [`WeatherError::InvalidNumber`] if the radius is not a number.
    /// * [`WeatherError::AirportNotFound`] if the airport is not registered.
    #[builder]
    pub fn query_weather(
        &self,
        iata: &str,
        radius: Option<&str>,
    ) -> Result<Vec<AtmosphericInformation>, WeatherError> {
        validate_iata(iata).inspect_err(|e| warn!("{}", e))?;
        let radius = match radius.map(str::trim) {
            None | Some("") => 0.0,
            Some(value) => parse_number("radius", value)?,
        };
        let radius = (radius != 0.0).then_some(radius);

        let mut result = self.repository.atmospheric_information(iata, radius)?;
        if result.is_empty() {
            result.push(AtmosphericInformation::new());
        }
        Ok(result)
    }

    /// The health payload: data size, per-airport query frequency and radius histogram.
    pub fn statistics(&self) -> UsageStatistics {
        self.repository.usage_statistics()
    }

    /// [`WeatherService::statistics`] as a JSON document.
    pub fn statistics_json(&self) -> Result<String, WeatherError> {
        serde_json::to_string(&self.statistics()).map_err(WeatherError::StatisticsEncoding)
    }

    /// Loads an airports CSV file and registers every valid airport whose code is not
    /// taken yet.
    ///
    /// # Errors
    ///
    /// [`WeatherError::AirportLoad`] if the file can not be read or parsed as a whole.
    /// Individual bad rows and duplicates are reported in the [`LoadReport`].
    pub async fn load_airports(&self, path: &Path) -> Result<LoadReport, WeatherError> {
        let loaded = AirportLoader::load_file(path).await?;
        Ok(self.register_loaded(loaded))
    }

    /// Same as [`WeatherService::load_airports`] for CSV content already in memory.
    pub async fn load_airports_from_bytes(&self, bytes: Vec<u8>) -> Result<LoadReport, WeatherError> {
        let loaded = AirportLoader::load_bytes(bytes).await?;
        Ok(self.register_loaded(loaded))
    }

    fn register_loaded(&self, loaded: LoadedAirports) -> LoadReport {
        let mut report = LoadReport {
            rejected: loaded.rejected,
            ..Default::default()
        };
        for airport in loaded.airports {
            if self.repository.contains_airport(airport.iata()) {
                report.duplicates.push(airport.iata().to_string());
                continue;
            }
            self.repository.add_airport(airport);
            report.added += 1;
        }
        info!(
            "Airport load finished: {} added, {} duplicates, {} rejected",
            report.added,
            report.duplicates.len(),
            report.rejected.len()
        );
        report
    }
}

fn parse_number(field: &'static str, value: &str) -> Result<f64, WeatherError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|source| WeatherError::InvalidNumber {
            field,
            value: value.to_string(),
            source,
        })
}
