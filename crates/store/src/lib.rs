pub mod config;
pub mod local;
pub mod mem;
