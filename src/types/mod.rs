pub mod airport;
pub mod atmospheric_information;
pub mod data_point;
pub mod error;
