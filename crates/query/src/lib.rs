pub mod client;
pub mod key;
pub mod stock;
