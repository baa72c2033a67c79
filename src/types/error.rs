use crate::types::data_point::{DataPoint, DataPointType};
use std::fmt;
use thiserror::Error;

/// What exactly was wrong with an IATA code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IataViolation {
    Missing,
    /// Holds the observed length in characters.
    Length(usize),
    Pattern,
}

impl fmt::Display for IataViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IataViolation::Missing => write!(f, "the code can not be absent"),
            IataViolation::Length(len) => {
                write!(f, "expected 3 characters but it has {len}")
            }
            IataViolation::Pattern => write!(f, "it must match [A-Z]{{3}}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid IATA code {code:?}: {reason}")]
    InvalidCode {
        code: Option<String>,
        reason: IataViolation,
    },

    #[error("Invalid airport data for '{iata}' ({latitude}, {longitude}): {reason}")]
    InvalidAirportData {
        iata: String,
        latitude: f64,
        longitude: f64,
        reason: String,
        #[source]
        source: Option<Box<ValidationError>>,
    },

    #[error("Invalid {data_type} data point {data_point}: {reason}")]
    InvalidDataPoint {
        data_point: DataPoint,
        data_type: DataPointType,
        reason: String,
    },
}
