//! Fetching the raw forecast payload from Open-Meteo.

pub mod client;
pub mod error;
