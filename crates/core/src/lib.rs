pub mod cache;
pub mod common;
pub mod config;
pub mod query;
pub mod settings;
pub mod stock;
pub mod store;
