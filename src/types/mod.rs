pub mod columns;
pub mod config;
pub mod response;
pub mod weather_series;
