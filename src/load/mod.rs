//! Persistence of the two output tables: flat CSV files and a SQLite store.

pub mod csv_writer;
pub mod error;
pub mod report;
pub mod sqlite_store;
