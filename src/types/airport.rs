//! Defines the [`Airport`] value object: a validated IATA code paired with a
//! geographical position, plus the great-circle distance used by radius queries.

use crate::types::error::{IataViolation, ValidationError};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Mean Earth radius, in kilometers, used for every distance calculation.
pub const EARTH_RADIUS_KM: f64 = 6372.8;

const IATA_CODE_LENGTH: usize = 3;
const MIN_LATITUDE: f64 = -90.0;
const MAX_LATITUDE: f64 = 90.0;
const MIN_LONGITUDE: f64 = -180.0;
const MAX_LONGITUDE: f64 = 180.0;

/// An airport known to the repository.
///
/// An `Airport` can only be obtained through [`Airport::new`] or by deserializing, and
/// both paths validate, so a value held by the repository always has a well-formed
/// IATA code and in-range coordinates.
///
/// Equality and hashing use the full `(iata, latitude, longitude)` triple.
///
/// # Examples
///
/// ```
/// use airport_weather::Airport;
///
/// let bos = Airport::new("BOS", 42.364347, -71.005181).unwrap();
/// assert_eq!(bos.iata(), "BOS");
/// assert!(Airport::new("bos", 42.364347, -71.005181).is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "UncheckedAirport")]
pub struct Airport {
    iata: String,
    latitude: f64,
    longitude: f64,
}

/// Wire shape of an [`Airport`] before validation.
#[derive(Deserialize)]
struct UncheckedAirport {
    iata: String,
    latitude: f64,
    longitude: f64,
}

impl TryFrom<UncheckedAirport> for Airport {
    type Error = ValidationError;

    fn try_from(raw: UncheckedAirport) -> Result<Self, Self::Error> {
        Airport::new(&raw.iata, raw.latitude, raw.longitude)
    }
}

impl Airport {
    /// Creates a validated airport.
    ///
    /// # Arguments
    ///
    /// * `iata` - Three upper-case ASCII letters (e.g. `"JFK"`).
    /// * `latitude` - Decimal degrees in `[-90, 90]`.
    /// * `longitude` - Decimal degrees in `[-180, 180]`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAirportData`] if the code or either coordinate
    /// is out of bounds. When the code is the culprit, the underlying
    /// [`ValidationError::InvalidCode`] is available through `source()`.
    pub fn new(iata: &str, latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        let airport = Self {
            iata: iata.to_string(),
            latitude,
            longitude,
        };
        airport.validate()?;
        Ok(airport)
    }

    /// Checks the code and coordinate bounds. Bounds are inclusive.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Err(err) = validate_iata(&self.iata) {
            return Err(self.invalid("the iata code is invalid", Some(err)));
        }
        // NaN fails both range checks.
        if !(MIN_LATITUDE..=MAX_LATITUDE).contains(&self.latitude) {
            return Err(self.invalid(
                format!("the latitude value {} is invalid", self.latitude),
                None,
            ));
        }
        if !(MIN_LONGITUDE..=MAX_LONGITUDE).contains(&self.longitude) {
            return Err(self.invalid(
                format!("the longitude value {} is invalid", self.longitude),
                None,
            ));
        }
        Ok(())
    }

    fn invalid(&self, reason: impl Into<String>, source: Option<ValidationError>) -> ValidationError {
        ValidationError::InvalidAirportData {
            iata: self.iata.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            reason: reason.into(),
            source: source.map(Box::new),
        }
    }

    pub fn iata(&self) -> &str {
        &self.iata
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance to `other`, in kilometers. See [`distance`].
    pub fn distance_to(&self, other: &Airport) -> f64 {
        distance(self, other)
    }
}

/// Validates an IATA code: exactly three characters, each in `A-Z`.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidCode`] describing whether the length or the
/// character set was wrong.
///
/// # Examples
///
/// ```
/// use airport_weather::validate_iata;
///
/// assert!(validate_iata("LGA").is_ok());
/// assert!(validate_iata("LG").is_err());
/// assert!(validate_iata("lga").is_err());
/// assert!(validate_iata("L6A").is_err());
/// ```
pub fn validate_iata(code: &str) -> Result<(), ValidationError> {
    let length = code.chars().count();
    if length != IATA_CODE_LENGTH {
        return Err(ValidationError::InvalidCode {
            code: Some(code.to_string()),
            reason: IataViolation::Length(length),
        });
    }
    if !code.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(ValidationError::InvalidCode {
            code: Some(code.to_string()),
            reason: IataViolation::Pattern,
        });
    }
    Ok(())
}

/// Same as [`validate_iata`] but for a code that may be absent, which is always invalid.
pub fn validate_optional_iata(code: Option<&str>) -> Result<&str, ValidationError> {
    match code {
        Some(code) => validate_iata(code).map(|_| code),
        None => Err(ValidationError::InvalidCode {
            code: None,
            reason: IataViolation::Missing,
        }),
    }
}

/// Haversine great-circle distance between two airports, in kilometers, using
/// [`EARTH_RADIUS_KM`].
///
/// The latitude/longitude deltas are converted to radians, but the `cos` terms are
/// applied to the latitudes in degrees. Every radius query in the system depends on
/// this exact output, so it is kept as-is; it differs from the textbook formula,
/// which would use radians for the `cos` terms as well.
///
/// `distance(a, a) == 0.0`. Because the degree cosines can be negative, the haversine
/// term can leave `[0, 1]` for far-apart pairs (JFK and SYD, for instance) and the
/// result is then NaN. A NaN distance compares false against every radius, so such a
/// pair never matches a radius query.
pub fn distance(a: &Airport, b: &Airport) -> f64 {
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();
    let h = (delta_lat / 2.0).sin().powi(2)
        + (delta_lon / 2.0).sin().powi(2) * a.latitude.cos() * b.latitude.cos();
    let c = 2.0 * h.sqrt().asin();
    EARTH_RADIUS_KM * c
}

impl PartialEq for Airport {
    fn eq(&self, other: &Self) -> bool {
        self.iata == other.iata
            && self.latitude == other.latitude
            && self.longitude == other.longitude
    }
}

// Coordinates are validated finite, so the float comparison above is total.
impl Eq for Airport {}

impl Hash for Airport {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.iata.hash(state);
        OrderedFloat(self.latitude).hash(state);
        OrderedFloat(self.longitude).hash(state);
    }
}

impl fmt::Display for Airport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[iata={},latitude={},longitude={}]",
            self.iata, self.latitude, self.longitude
        )
    }
}
