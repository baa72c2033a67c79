//! Defines the [`DataPoint`] measurement summary and the [`DataPointType`] categories
//! with their validity ranges.

use crate::error::WeatherError;
use crate::types::error::ValidationError;
use bon::Builder;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// The atmospheric category a [`DataPoint`] describes.
///
/// Each category constrains the `mean` of a data point to a half-open range
/// `[min, max)`, see [`DataPointType::mean_range`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataPointType {
    Wind,
    Temperature,
    Humidity,
    Pressure,
    CloudCover,
    Precipitation,
}

impl DataPointType {
    /// Every category, in a stable order.
    pub const ALL: [DataPointType; 6] = [
        DataPointType::Wind,
        DataPointType::Temperature,
        DataPointType::Humidity,
        DataPointType::Pressure,
        DataPointType::CloudCover,
        DataPointType::Precipitation,
    ];

    /// Returns the inclusive minimum and the exclusive maximum allowed for the mean.
    /// `None` as maximum means unbounded.
    pub fn mean_range(&self) -> (f64, Option<f64>) {
        match self {
            DataPointType::Wind => (0.0, None),
            DataPointType::Temperature => (-50.0, Some(100.0)),
            DataPointType::Humidity => (0.0, Some(100.0)),
            DataPointType::Pressure => (650.0, Some(800.0)),
            DataPointType::CloudCover => (0.0, Some(100.0)),
            DataPointType::Precipitation => (0.0, Some(100.0)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataPointType::Wind => "wind",
            DataPointType::Temperature => "temperature",
            DataPointType::Humidity => "humidity",
            DataPointType::Pressure => "pressure",
            DataPointType::CloudCover => "cloud_cover",
            DataPointType::Precipitation => "precipitation",
        }
    }
}

impl fmt::Display for DataPointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a category name case-insensitively.
///
/// Besides the canonical names, the collectors' historical spellings `humidty` and
/// `cloudcover` are still accepted.
///
/// # Examples
///
/// ```
/// use airport_weather::DataPointType;
///
/// assert_eq!("WIND".parse::<DataPointType>().unwrap(), DataPointType::Wind);
/// assert_eq!("cloudcover".parse::<DataPointType>().unwrap(), DataPointType::CloudCover);
/// assert!("snow".parse::<DataPointType>().is_err());
/// ```
impl FromStr for DataPointType {
    type Err = WeatherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wind" => Ok(DataPointType::Wind),
            "temperature" => Ok(DataPointType::Temperature),
            "humidity" | "humidty" => Ok(DataPointType::Humidity),
            "pressure" => Ok(DataPointType::Pressure),
            "cloud_cover" | "cloudcover" => Ok(DataPointType::CloudCover),
            "precipitation" => Ok(DataPointType::Precipitation),
            _ => Err(WeatherError::UnknownDataPointType(s.to_string())),
        }
    }
}

/// A summary of observations for one category: three quartiles, the mean and the
/// number of samples.
///
/// A data point carries no category of its own; validity depends on the
/// [`DataPointType`] it is submitted for.
///
/// # Examples
///
/// ```
/// use airport_weather::{DataPoint, DataPointType};
///
/// let point = DataPoint::builder()
///     .first(10)
///     .second(20)
///     .third(30)
///     .mean(22.0)
///     .count(10)
///     .build();
///
/// assert!(point.validate(DataPointType::Temperature).is_ok());
/// assert!(point.validate(DataPointType::Pressure).is_err());
/// ```
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
pub struct DataPoint {
    #[builder(default)]
    #[serde(default)]
    first: i32,
    #[builder(default)]
    #[serde(default)]
    second: i32,
    #[builder(default)]
    #[serde(default)]
    third: i32,
    mean: f64,
    count: i32,
}

impl DataPoint {
    pub fn first(&self) -> i32 {
        self.first
    }

    pub fn second(&self) -> i32 {
        self.second
    }

    pub fn third(&self) -> i32 {
        self.third
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn count(&self) -> i32 {
        self.count
    }

    /// Checks this data point against the rules of `data_type`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDataPoint`] if `count <= 0`, or if `mean` is
    /// outside the category's `[min, max)` range. A NaN mean is never in range.
    pub fn validate(&self, data_type: DataPointType) -> Result<(), ValidationError> {
        if self.count <= 0 {
            return Err(self.invalid(
                data_type,
                format!("the count should be greater than 0 but was {}", self.count),
            ));
        }

        let (min, max) = data_type.mean_range();
        let in_range = self.mean >= min && max.map_or(true, |max| self.mean < max);
        if !in_range {
            let bounds = match max {
                Some(max) => format!("[{min} & {max})"),
                None => format!("[{min} & inf)"),
            };
            return Err(self.invalid(
                data_type,
                format!("the mean should be in {bounds} but was {}", self.mean),
            ));
        }
        Ok(())
    }

    fn invalid(&self, data_type: DataPointType, reason: String) -> ValidationError {
        ValidationError::InvalidDataPoint {
            data_point: self.clone(),
            data_type,
            reason,
        }
    }
}

impl PartialEq for DataPoint {
    fn eq(&self, other: &Self) -> bool {
        self.first == other.first
            && self.second == other.second
            && self.third == other.third
            && OrderedFloat(self.mean) == OrderedFloat(other.mean)
            && self.count == other.count
    }
}

impl Eq for DataPoint {}

impl Hash for DataPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.first.hash(state);
        self.second.hash(state);
        self.third.hash(state);
        OrderedFloat(self.mean).hash(state);
        self.count.hash(state);
    }
}

impl fmt::Display for DataPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[first={},second={},third={},mean={},count={}]",
            self.first, self.second, self.third, self.mean, self.count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(mean: f64, count: i32) -> DataPoint {
        DataPoint::builder()
            .first(1)
            .second(2)
            .third(3)
            .mean(mean)
            .count(count)
            .build()
    }

    fn assert_valid(data_type: DataPointType, mean: f64) {
        assert!(
            point(mean, 1).validate(data_type).is_ok(),
            "{data_type} mean {mean} should be valid"
        );
    }

    fn assert_invalid(data_type: DataPointType, mean: f64) {
        match point(mean, 1).validate(data_type) {
            Err(ValidationError::InvalidDataPoint {
                data_type: reported,
                ..
            }) => assert_eq!(reported, data_type),
            other => panic!("{data_type} mean {mean} should be invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_or_negative_count_is_invalid_for_every_type() {
        for data_type in DataPointType::ALL {
            let (min, _) = data_type.mean_range();
            assert!(point(min, 0).validate(data_type).is_err());
            assert!(point(min, -3).validate(data_type).is_err());
            assert!(point(min, 1).validate(data_type).is_ok());
        }
    }

    #[test]
    fn test_pressure_boundaries() {
        assert_valid(DataPointType::Pressure, 650.0);
        assert_invalid(DataPointType::Pressure, 649.999);
        assert_invalid(DataPointType::Pressure, 800.0);
        assert_valid(DataPointType::Pressure, 799.999);
    }

    #[test]
    fn test_temperature_boundaries() {
        assert_valid(DataPointType::Temperature, -50.0);
        assert_invalid(DataPointType::Temperature, -50.001);
        assert_invalid(DataPointType::Temperature, 100.0);
        assert_valid(DataPointType::Temperature, 99.999);
    }

    #[test]
    fn test_percentage_boundaries() {
        for data_type in [
            DataPointType::Humidity,
            DataPointType::CloudCover,
            DataPointType::Precipitation,
        ] {
            assert_valid(data_type, 0.0);
            assert_invalid(data_type, -0.001);
            assert_invalid(data_type, 100.0);
            assert_valid(data_type, 99.999);
        }
    }

    #[test]
    fn test_wind_has_no_upper_bound() {
        assert_valid(DataPointType::Wind, 0.0);
        assert_valid(DataPointType::Wind, 1.0e9);
        assert_invalid(DataPointType::Wind, -0.001);
    }

    #[test]
    fn test_nan_mean_is_invalid() {
        for data_type in DataPointType::ALL {
            assert_invalid(data_type, f64::NAN);
        }
    }

    #[test]
    fn test_parse_type_names() {
        assert_eq!("wind".parse::<DataPointType>().unwrap(), DataPointType::Wind);
        assert_eq!(
            "Temperature".parse::<DataPointType>().unwrap(),
            DataPointType::Temperature
        );
        assert_eq!("humidty".parse::<DataPointType>().unwrap(), DataPointType::Humidity);
        assert_eq!(
            "CLOUD_COVER".parse::<DataPointType>().unwrap(),
            DataPointType::CloudCover
        );
        assert!(matches!(
            "cloud cover".parse::<DataPointType>(),
            Err(WeatherError::UnknownDataPointType(name)) if name == "cloud cover"
        ));
        for data_type in DataPointType::ALL {
            assert_eq!(data_type.to_string().parse::<DataPointType>().unwrap(), data_type);
        }
    }

    #[test]
    fn test_builder_defaults_quartiles() {
        let p = DataPoint::builder().mean(5.0).count(2).build();
        assert_eq!((p.first(), p.second(), p.third()), (0, 0, 0));
        assert_eq!(p.mean(), 5.0);
        assert_eq!(p.count(), 2);
    }

    #[test]
    fn test_json_body() {
        let p: DataPoint = serde_json::from_str(
            r#"{"mean":22.0,"first":10,"second":20,"third":30,"count":10}"#,
        )
        .unwrap();
        assert_eq!(p, DataPoint::builder().first(10).second(20).third(30).mean(22.0).count(10).build());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            point(4.5, 7).to_string(),
            "[first=1,second=2,third=3,mean=4.5,count=7]"
        );
    }
}
