pub mod adapters;
pub mod campaign;
pub mod config;
pub mod error;
