mod airports;
mod error;
mod repository;
mod types;
mod weather;

pub use error::WeatherError;
pub use weather::*;

pub use airports::airport_loader::{AirportLoader, LoadedAirports, RejectedRow};
pub use airports::error::AirportLoadError;

pub use repository::config::*;
pub use repository::statistics::{radius_bucket, UsageStatistics};
pub use repository::weather_repository::WeatherRepository;

pub use types::airport::*;
pub use types::atmospheric_information::AtmosphericInformation;
pub use types::data_point::{DataPoint, DataPointType};
pub use types::error::{IataViolation, ValidationError};
