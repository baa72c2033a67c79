pub mod airport_loader;
pub mod error;
