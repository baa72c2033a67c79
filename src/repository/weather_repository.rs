//! The concurrent in-memory store for airports, their atmospheric aggregates and
//! the query counters behind the usage statistics.

use crate::error::WeatherError;
use crate::repository::config::RepositoryConfig;
use crate::repository::statistics::{CallCounters, UsageStatistics, UsageStatisticsBuilder};
use crate::types::airport::{distance, Airport};
use crate::types::atmospheric_information::AtmosphericInformation;
use crate::types::data_point::{DataPoint, DataPointType};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Thread-safe repository of airports and atmospheric information.
///
/// All state (the airport registry, the per-airport aggregates and the call
/// counters) sits behind a single mutex, and every public method holds it for its
/// whole duration. Each call is therefore atomic with respect to every other call,
/// and readers never observe a half-applied mutation or a partially cleared
/// repository.
///
/// The handle is cheap to clone; clones share the same state. Create one at the
/// service root and hand it to whatever needs it.
///
/// The registry and the aggregates are keyed independently: removing an airport
/// keeps its aggregate, which stays visible through
/// [`WeatherRepository::all_atmospheric_information`].
///
/// # Examples
///
/// ```
/// use airport_weather::{Airport, DataPoint, DataPointType, WeatherRepository};
///
/// let repository = WeatherRepository::new();
/// repository.add_airport(Airport::new("BOS", 42.364347, -71.005181).unwrap());
/// repository.add_airport(Airport::new("JFK", 40.639751, -73.778925).unwrap());
///
/// let wind = DataPoint::builder().mean(12.0).count(20).build();
/// repository
///     .update_atmospheric_information("JFK", DataPointType::Wind, wind)
///     .unwrap();
///
/// let nearby = repository.atmospheric_information("BOS", Some(250.0)).unwrap();
/// assert_eq!(nearby.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct WeatherRepository {
    config: RepositoryConfig,
    state: Arc<Mutex<RepositoryState>>,
}

#[derive(Debug, Default)]
struct RepositoryState {
    // Insertion ordered; never holds two identical airports.
    airports: Vec<Airport>,
    atmospheric_information: HashMap<String, AtmosphericInformation>,
    counters: CallCounters,
}

impl RepositoryState {
    fn airport(&self, iata: &str) -> Option<&Airport> {
        self.airports.iter().find(|airport| airport.iata() == iata)
    }
}

impl WeatherRepository {
    /// Creates an empty repository with the default [`RepositoryConfig`].
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RepositoryConfig) -> Self {
        Self {
            config,
            state: Arc::default(),
        }
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Registers `airport`, making it visible to every query.
    ///
    /// There is no duplicate check on the IATA code here; callers that must reject
    /// duplicates ask [`WeatherRepository::contains_airport`] first. Re-adding an
    /// identical airport is a no-op.
    pub fn add_airport(&self, airport: Airport) {
        let mut state = self.state.lock();
        Self::insert_airport(&mut state, airport);
    }

    /// Registers every airport of `airports` under one lock acquisition.
    ///
    /// Returns how many were actually inserted (identical repeats are skipped).
    pub fn add_airports<I>(&self, airports: I) -> usize
    where
        I: IntoIterator<Item = Airport>,
    {
        let mut state = self.state.lock();
        airports
            .into_iter()
            .map(|airport| Self::insert_airport(&mut state, airport))
            .filter(|inserted| *inserted)
            .count()
    }

    fn insert_airport(state: &mut RepositoryState, airport: Airport) -> bool {
        if state.airports.contains(&airport) {
            return false;
        }
        debug!("Adding airport {}", airport);
        state.airports.push(airport);
        true
    }

    /// Removes the airport registered under `iata` and returns it.
    ///
    /// The airport's atmospheric aggregate, if any, is kept.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::AirportNotFound`] if no airport has that code.
    pub fn remove_airport(&self, iata: &str) -> Result<Airport, WeatherError> {
        let mut state = self.state.lock();
        let Some(position) = state.airports.iter().position(|a| a.iata() == iata) else {
            warn!("Attempt to remove unknown airport {}", iata);
            return Err(WeatherError::not_found(iata));
        };
        let removed = state.airports.remove(position);
        debug!("Removed airport {}", removed);
        Ok(removed)
    }

    pub fn airport(&self, iata: &str) -> Option<Airport> {
        self.state.lock().airport(iata).cloned()
    }

    pub fn contains_airport(&self, iata: &str) -> bool {
        self.state.lock().airport(iata).is_some()
    }

    /// A copy of the registry at the time of the call.
    pub fn airports(&self) -> Vec<Airport> {
        self.state.lock().airports.clone()
    }

    /// The codes of every registered airport at the time of the call.
    pub fn airport_codes(&self) -> BTreeSet<String> {
        self.state
            .lock()
            .airports
            .iter()
            .map(|airport| airport.iata().to_string())
            .collect()
    }

    /// Records `data_point` as the latest `data_type` measurement for `iata`.
    ///
    /// The airport's aggregate is created on its first successful update. An update
    /// that fails validation leaves no empty aggregate behind, even for an airport that
    /// never had one: the rule that a failed operation mutates nothing takes precedence
    /// over creating the aggregate ahead of validation.
    ///
    /// # Errors
    ///
    /// * [`WeatherError::AirportNotFound`] if `iata` is not registered; no aggregate
    ///   is created.
    /// * [`WeatherError::Validation`] wrapping
    ///   [`crate::ValidationError::InvalidDataPoint`] if the point is out of range for
    ///   the category; the existing aggregate, its other categories and its update
    ///   time are left untouched.
    pub fn update_atmospheric_information(
        &self,
        iata: &str,
        data_type: DataPointType,
        data_point: DataPoint,
    ) -> Result<(), WeatherError> {
        let mut state = self.state.lock();
        if state.airport(iata).is_none() {
            warn!("Weather update for unknown airport {}", iata);
            return Err(WeatherError::not_found(iata));
        }

        match state.atmospheric_information.entry(iata.to_string()) {
            Entry::Occupied(mut entry) => entry.get_mut().update(data_type, data_point)?,
            Entry::Vacant(entry) => {
                let mut info = AtmosphericInformation::new();
                info.update(data_type, data_point)?;
                entry.insert(info);
            }
        }
        debug!("Updated {} for airport {}", data_type, iata);
        Ok(())
    }

    /// Returns the aggregates of every registered airport within `radius` km of `iata`
    /// (the airport itself included) that has received at least one update.
    ///
    /// An absent radius means 0, i.e. only the airport itself. The order of the
    /// result is unspecified. The call is counted in the usage statistics, with the
    /// radius as requested, even when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::AirportNotFound`] if `iata` is not registered. Such
    /// calls are not counted.
    pub fn atmospheric_information(
        &self,
        iata: &str,
        radius: Option<f64>,
    ) -> Result<Vec<AtmosphericInformation>, WeatherError> {
        let mut state = self.state.lock();
        let Some(center) = state.airport(iata).cloned() else {
            warn!("Weather query for unknown airport {}", iata);
            return Err(WeatherError::not_found(iata));
        };

        state
            .counters
            .record(iata, radius, self.config.max_tracked_radius());

        let max_distance = radius.unwrap_or(0.0);
        let result: Vec<AtmosphericInformation> = state
            .airports
            .iter()
            .filter(|other| distance(&center, other) <= max_distance)
            .filter_map(|other| state.atmospheric_information.get(other.iata()))
            .cloned()
            .collect();

        debug!(
            "Weather query for {} within {} km matched {} aggregates",
            iata,
            max_distance,
            result.len()
        );
        Ok(result)
    }

    /// A copy of every aggregate, including those of removed airports.
    pub fn all_atmospheric_information(&self) -> Vec<AtmosphericInformation> {
        self.state
            .lock()
            .atmospheric_information
            .values()
            .cloned()
            .collect()
    }

    /// Builds the usage statistics as of now.
    pub fn usage_statistics(&self) -> UsageStatistics {
        self.usage_statistics_at(Utc::now())
    }

    /// Builds the usage statistics as of `now`, which decides which aggregates are
    /// still fresh enough to count.
    pub fn usage_statistics_at(&self, now: DateTime<Utc>) -> UsageStatistics {
        let state = self.state.lock();
        UsageStatisticsBuilder {
            airports: &state.airports,
            atmospheric_information: &state.atmospheric_information,
            counters: &state.counters,
            freshness_window: self.config.freshness_window(),
        }
        .build_at(now)
    }

    /// Drops every airport, aggregate and counter. Meant for isolating test scenarios.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.airports.clear();
        state.atmospheric_information.clear();
        state.counters.clear();
        debug!("Repository reset");
    }
}
