//! Defines [`AtmosphericInformation`], the per-airport aggregate holding the latest
//! [`DataPoint`] of each [`DataPointType`].

use crate::types::data_point::{DataPoint, DataPointType};
use crate::types::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// The latest measurement of every category for one airport.
///
/// Each category slot holds at most one [`DataPoint`]; a newer point for the same
/// category replaces the previous one. `last_update_time` moves on every successful
/// update and is the Unix epoch for an aggregate that was never updated.
///
/// Serializes with camelCase keys, leaves out empty categories and writes
/// `lastUpdateTime` as epoch milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AtmosphericInformation {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<DataPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wind: Option<DataPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    humidity: Option<DataPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    precipitation: Option<DataPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pressure: Option<DataPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cloud_cover: Option<DataPoint>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    last_update_time: DateTime<Utc>,
}

impl AtmosphericInformation {
    /// Creates an aggregate with every category empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `data_point` for `data_type`, stores it and stamps the current time.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDataPoint`] if the point is not valid for the
    /// category. Nothing is modified in that case.
    pub fn update(
        &mut self,
        data_type: DataPointType,
        data_point: DataPoint,
    ) -> Result<(), ValidationError> {
        self.update_at(data_type, data_point, Utc::now())
    }

    /// Same as [`AtmosphericInformation::update`] with an explicit update time.
    pub fn update_at(
        &mut self,
        data_type: DataPointType,
        data_point: DataPoint,
        at: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        data_point.validate(data_type)?;
        *self.slot_mut(data_type) = Some(data_point);
        self.last_update_time = at;
        Ok(())
    }

    fn slot_mut(&mut self, data_type: DataPointType) -> &mut Option<DataPoint> {
        match data_type {
            DataPointType::Wind => &mut self.wind,
            DataPointType::Temperature => &mut self.temperature,
            DataPointType::Humidity => &mut self.humidity,
            DataPointType::Pressure => &mut self.pressure,
            DataPointType::CloudCover => &mut self.cloud_cover,
            DataPointType::Precipitation => &mut self.precipitation,
        }
    }

    /// Returns the current data point of `data_type`, if any.
    pub fn get(&self, data_type: DataPointType) -> Option<&DataPoint> {
        match data_type {
            DataPointType::Wind => self.wind.as_ref(),
            DataPointType::Temperature => self.temperature.as_ref(),
            DataPointType::Humidity => self.humidity.as_ref(),
            DataPointType::Pressure => self.pressure.as_ref(),
            DataPointType::CloudCover => self.cloud_cover.as_ref(),
            DataPointType::Precipitation => self.precipitation.as_ref(),
        }
    }

    pub fn wind(&self) -> Option<&DataPoint> {
        self.wind.as_ref()
    }

    pub fn temperature(&self) -> Option<&DataPoint> {
        self.temperature.as_ref()
    }

    pub fn humidity(&self) -> Option<&DataPoint> {
        self.humidity.as_ref()
    }

    pub fn pressure(&self) -> Option<&DataPoint> {
        self.pressure.as_ref()
    }

    pub fn cloud_cover(&self) -> Option<&DataPoint> {
        self.cloud_cover.as_ref()
    }

    pub fn precipitation(&self) -> Option<&DataPoint> {
        self.precipitation.as_ref()
    }

    pub fn last_update_time(&self) -> DateTime<Utc> {
        self.last_update_time
    }

    /// Number of populated category slots, between 0 and 6.
    pub fn not_null_count(&self) -> usize {
        DataPointType::ALL
            .iter()
            .filter(|data_type| self.get(**data_type).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.not_null_count() == 0
    }

    /// Compares the measurements only, ignoring when they were recorded.
    pub fn eq_ignoring_update_time(&self, other: &Self) -> bool {
        DataPointType::ALL
            .iter()
            .all(|data_type| self.get(*data_type) == other.get(*data_type))
    }
}

impl fmt::Display for AtmosphericInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for data_type in DataPointType::ALL {
            if let Some(point) = self.get(data_type) {
                write!(f, "{data_type}={point},")?;
            }
        }
        write!(f, "lastUpdateTime={}]", self.last_update_time.timestamp_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn point(mean: f64) -> DataPoint {
        DataPoint::builder()
            .first(10)
            .second(20)
            .third(30)
            .mean(mean)
            .count(10)
            .build()
    }

    #[test]
    fn test_new_aggregate_is_empty() {
        let info = AtmosphericInformation::new();
        assert_eq!(info.not_null_count(), 0);
        assert!(info.is_empty());
        assert_eq!(info.last_update_time().timestamp_millis(), 0);
        for data_type in DataPointType::ALL {
            assert!(info.get(data_type).is_none());
        }
    }

    #[test]
    fn test_update_replaces_category_and_stamps_time() {
        let mut info = AtmosphericInformation::new();
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 1, 1, 13, 0, 0).unwrap();

        info.update_at(DataPointType::Wind, point(5.0), t1).unwrap();
        info.update_at(DataPointType::Wind, point(7.0), t2).unwrap();

        assert_eq!(info.wind(), Some(&point(7.0)));
        assert_eq!(info.not_null_count(), 1);
        assert_eq!(info.last_update_time(), t2);
    }

    #[test]
    fn test_failed_update_changes_nothing() {
        let mut info = AtmosphericInformation::new();
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        info.update_at(DataPointType::Pressure, point(700.0), t1).unwrap();
        let before = info.clone();

        let err = info
            .update_at(DataPointType::Pressure, point(900.0), Utc::now())
            .unwrap_err();

        assert!(matches!(err, ValidationError::InvalidDataPoint { .. }));
        assert_eq!(info, before);
    }

    #[test]
    fn test_not_null_count_counts_every_category() {
        let mut info = AtmosphericInformation::new();
        let means = [
            (DataPointType::Wind, 3.0),
            (DataPointType::Temperature, 20.0),
            (DataPointType::Humidity, 50.0),
            (DataPointType::Pressure, 700.0),
            (DataPointType::CloudCover, 10.0),
            (DataPointType::Precipitation, 1.0),
        ];
        for (i, (data_type, mean)) in means.into_iter().enumerate() {
            info.update(data_type, point(mean)).unwrap();
            assert_eq!(info.not_null_count(), i + 1);
        }
    }

    #[test]
    fn test_eq_ignoring_update_time() {
        let mut a = AtmosphericInformation::new();
        let mut b = AtmosphericInformation::new();
        a.update_at(DataPointType::Humidity, point(40.0), Utc.timestamp_opt(1, 0).unwrap())
            .unwrap();
        b.update_at(DataPointType::Humidity, point(40.0), Utc.timestamp_opt(2, 0).unwrap())
            .unwrap();

        assert_ne!(a, b);
        assert!(a.eq_ignoring_update_time(&b));
    }

    #[test]
    fn test_serialized_shape() {
        let mut info = AtmosphericInformation::new();
        info.update_at(
            DataPointType::CloudCover,
            point(25.0),
            Utc.timestamp_millis_opt(1_500).unwrap(),
        )
        .unwrap();

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "cloudCover": {"first": 10, "second": 20, "third": 30, "mean": 25.0, "count": 10},
                "lastUpdateTime": 1500
            })
        );
    }
}
