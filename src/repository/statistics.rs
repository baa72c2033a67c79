//! Call counters recorded by radius queries and the [`UsageStatistics`] snapshot
//! derived from them.

use crate::types::airport::Airport;
use crate::types::atmospheric_information::AtmosphericInformation;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Process-wide query counters. Only `clear` ever lowers them.
#[derive(Debug, Clone, Default)]
pub(crate) struct CallCounters {
    total: u64,
    per_iata: HashMap<String, u64>,
    per_radius: BTreeMap<usize, u64>,
}

impl CallCounters {
    pub(crate) fn record(&mut self, iata: &str, radius: Option<f64>, max_tracked_radius: u32) {
        self.total += 1;
        *self.per_iata.entry(iata.to_string()).or_default() += 1;
        *self
            .per_radius
            .entry(radius_bucket(radius, max_tracked_radius))
            .or_default() += 1;
    }

    pub(crate) fn total(&self) -> u64 {
        self.total
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Maps a requested radius to its histogram slot: `clamp(round(radius), 0, max)`.
/// An absent or NaN radius lands in slot 0.
pub fn radius_bucket(radius: Option<f64>, max_tracked_radius: u32) -> usize {
    let rounded = radius.unwrap_or(0.0).round();
    if rounded.is_nan() {
        return 0;
    }
    rounded.clamp(0.0, f64::from(max_tracked_radius)) as usize
}

/// A point-in-time view of how the repository has been used.
///
/// Serializes to the health payload shape
/// `{ "datasize": .., "iata_freq": {..}, "radius_freq": [..] }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageStatistics {
    #[serde(rename = "datasize")]
    data_point_count: usize,
    #[serde(rename = "iata_freq")]
    iata_frequency: BTreeMap<String, f64>,
    #[serde(rename = "radius_freq")]
    radius_histogram: Vec<u64>,
}

impl UsageStatistics {
    /// Populated categories summed over every aggregate updated inside the freshness window.
    pub fn data_point_count(&self) -> usize {
        self.data_point_count
    }

    /// Share of all radius queries that targeted each registered airport.
    pub fn iata_frequency(&self) -> &BTreeMap<String, f64> {
        &self.iata_frequency
    }

    /// Number of queries per rounded radius, indexed `0..=max observed radius`.
    pub fn radius_histogram(&self) -> &[u64] {
        &self.radius_histogram
    }
}

/// Derives [`UsageStatistics`] from repository state. Borrowed views only, so the
/// caller decides which lock covers the read.
pub(crate) struct UsageStatisticsBuilder<'a> {
    pub(crate) airports: &'a [Airport],
    pub(crate) atmospheric_information: &'a HashMap<String, AtmosphericInformation>,
    pub(crate) counters: &'a CallCounters,
    pub(crate) freshness_window: Duration,
}

impl UsageStatisticsBuilder<'_> {
    pub(crate) fn build_at(&self, now: DateTime<Utc>) -> UsageStatistics {
        UsageStatistics {
            data_point_count: self.data_point_count(now),
            iata_frequency: self.iata_frequency(),
            radius_histogram: self.radius_histogram(),
        }
    }

    fn data_point_count(&self, now: DateTime<Utc>) -> usize {
        // A window reaching past the representable range keeps every aggregate.
        let threshold = now.checked_sub_signed(self.freshness_window);
        self.atmospheric_information
            .values()
            .filter(|info| threshold.map_or(true, |t| info.last_update_time() > t))
            .map(AtmosphericInformation::not_null_count)
            .sum()
    }

    fn iata_frequency(&self) -> BTreeMap<String, f64> {
        let total = self.counters.total();
        self.airports
            .iter()
            .map(|airport| {
                let frequency = if total == 0 {
                    0.0
                } else {
                    let calls = self
                        .counters
                        .per_iata
                        .get(airport.iata())
                        .copied()
                        .unwrap_or(0);
                    calls as f64 / total as f64
                };
                (airport.iata().to_string(), frequency)
            })
            .collect()
    }

    fn radius_histogram(&self) -> Vec<u64> {
        let Some(max_radius) = self.counters.per_radius.keys().next_back() else {
            return Vec::new();
        };
        let mut histogram = vec![0; max_radius + 1];
        for (radius, calls) in &self.counters.per_radius {
            histogram[*radius] = *calls;
        }
        histogram
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::data_point::{DataPoint, DataPointType};
    use chrono::TimeZone;

    fn builder<'a>(
        airports: &'a [Airport],
        info: &'a HashMap<String, AtmosphericInformation>,
        counters: &'a CallCounters,
    ) -> UsageStatisticsBuilder<'a> {
        UsageStatisticsBuilder {
            airports,
            atmospheric_information: info,
            counters,
            freshness_window: Duration::milliseconds(86_400_000),
        }
    }

    #[test]
    fn test_radius_bucket_rounds_and_clamps() {
        assert_eq!(radius_bucket(None, 1000), 0);
        assert_eq!(radius_bucket(Some(0.4), 1000), 0);
        assert_eq!(radius_bucket(Some(0.5), 1000), 1);
        assert_eq!(radius_bucket(Some(4.6), 1000), 5);
        assert_eq!(radius_bucket(Some(999.7), 1000), 1000);
        assert_eq!(radius_bucket(Some(2000.0), 1000), 1000);
        assert_eq!(radius_bucket(Some(-12.0), 1000), 0);
        assert_eq!(radius_bucket(Some(f64::NAN), 1000), 0);
        assert_eq!(radius_bucket(Some(f64::INFINITY), 1000), 1000);
    }

    #[test]
    fn test_empty_state_gives_empty_statistics() {
        let counters = CallCounters::default();
        let info = HashMap::new();
        let stats = builder(&[], &info, &counters).build_at(Utc::now());

        assert_eq!(stats.data_point_count(), 0);
        assert!(stats.iata_frequency().is_empty());
        assert!(stats.radius_histogram().is_empty());
    }

    #[test]
    fn test_frequency_is_zero_without_calls() {
        let airports = vec![
            Airport::new("BOS", 42.364347, -71.005181).unwrap(),
            Airport::new("JFK", 40.639751, -73.778925).unwrap(),
        ];
        let counters = CallCounters::default();
        let info = HashMap::new();
        let stats = builder(&airports, &info, &counters).build_at(Utc::now());

        assert_eq!(stats.iata_frequency().get("BOS"), Some(&0.0));
        assert_eq!(stats.iata_frequency().get("JFK"), Some(&0.0));
    }

    #[test]
    fn test_stale_aggregates_are_not_counted() {
        let now = Utc.with_ymd_and_hms(2024, 6, 2, 12, 0, 0).unwrap();
        let point = DataPoint::builder().mean(10.0).count(1).build();

        let mut fresh = AtmosphericInformation::new();
        fresh
            .update_at(DataPointType::Wind, point.clone(), now - Duration::hours(1))
            .unwrap();
        fresh
            .update_at(DataPointType::Humidity, point.clone(), now - Duration::hours(1))
            .unwrap();
        let mut stale = AtmosphericInformation::new();
        stale
            .update_at(DataPointType::Wind, point.clone(), now - Duration::hours(25))
            .unwrap();
        let mut edge = AtmosphericInformation::new();
        edge.update_at(DataPointType::Wind, point, now - Duration::hours(24))
            .unwrap();

        let info = HashMap::from([
            ("BOS".to_string(), fresh),
            ("JFK".to_string(), stale),
            ("EWR".to_string(), edge),
        ]);
        let counters = CallCounters::default();
        let stats = builder(&[], &info, &counters).build_at(now);

        assert_eq!(stats.data_point_count(), 2);
    }

    #[test]
    fn test_unbounded_freshness_window_counts_everything() {
        let mut old = AtmosphericInformation::new();
        old.update_at(
            DataPointType::Wind,
            DataPoint::builder().mean(10.0).count(1).build(),
            DateTime::UNIX_EPOCH,
        )
        .unwrap();
        let info = HashMap::from([("BOS".to_string(), old)]);
        let counters = CallCounters::default();
        let stats = UsageStatisticsBuilder {
            airports: &[],
            atmospheric_information: &info,
            counters: &counters,
            freshness_window: Duration::MAX,
        }
        .build_at(Utc::now());

        assert_eq!(stats.data_point_count(), 1);
    }

    #[test]
    fn test_serialized_shape() {
        let airports = vec![Airport::new("BOS", 42.364347, -71.005181).unwrap()];
        let mut counters = CallCounters::default();
        counters.record("BOS", Some(2.2), 1000);
        let info = HashMap::new();
        let stats = builder(&airports, &info, &counters).build_at(Utc::now());

        assert_eq!(
            serde_json::to_value(&stats).unwrap(),
            serde_json::json!({
                "datasize": 0,
                "iata_freq": {"BOS": 1.0},
                "radius_freq": [0, 0, 1]
            })
        );
    }
}
