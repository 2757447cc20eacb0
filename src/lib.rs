pub mod classifier;
pub mod client;
pub mod config;
pub mod fetch_error;
pub mod importers;
pub mod models;
pub mod utils;
