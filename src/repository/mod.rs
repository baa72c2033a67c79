pub mod config;
pub mod statistics;
pub mod weather_repository;
