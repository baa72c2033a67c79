use crate::airports::error::AirportLoadError;
use crate::types::error::ValidationError;
use std::num::ParseFloatError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("The airport '{iata}' was not found")]
    AirportNotFound { iata: String },

    #[error("The airport '{iata}' is already defined")]
    AirportAlreadyExists { iata: String },

    #[error("The data point type '{0}' does not exist")]
    UnknownDataPointType(String),

    #[error("Failed to parse {field} value '{value}'")]
    InvalidNumber {
        field: &'static str,
        value: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("Failed to parse data point JSON")]
    MalformedDataPoint(#[source] serde_json::Error),

    #[error("Failed to serialize usage statistics")]
    StatisticsEncoding(#[source] serde_json::Error),

    #[error(transparent)]
    AirportLoad(#[from] AirportLoadError),
}

impl WeatherError {
    pub(crate) fn not_found(iata: &str) -> Self {
        WeatherError::AirportNotFound {
            iata: iata.to_string(),
        }
    }
}
