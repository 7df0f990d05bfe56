use crate::load::error::LoadError;
use std::fmt;
use std::str::FromStr;

/// What to do when a row's key already exists in the target table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictResolution {
    /// Keep the stored row (`ON CONFLICT DO NOTHING`).
    #[default]
    Ignore,
    /// Replace every non-key column with the incoming value.
    Overwrite,
}

impl FromStr for ConflictResolution {
    type Err = LoadError;

    /// Accepts `NOTHING`/`IGNORE` and `UPDATE`/`OVERWRITE`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NOTHING" | "IGNORE" => Ok(Self::Ignore),
            "UPDATE" | "OVERWRITE" => Ok(Self::Overwrite),
            _ => Err(LoadError::UnknownConflictResolution(s.to_string())),
        }
    }
}

impl fmt::Display for ConflictResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ignore => write!(f, "ignore"),
            Self::Overwrite => write!(f, "overwrite"),
        }
    }
}

/// A row the store rejected; the rest of the table was still written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    pub key: String,
    pub message: String,
}

/// Outcome of persisting one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub target: String,
    pub written: usize,
    /// Rows skipped because their key already existed (ignore mode only).
    pub ignored: usize,
    pub failures: Vec<RowFailure>,
}

impl LoadReport {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} written, {} ignored, {} failed",
            self.target,
            self.written,
            self.ignored,
            self.failures.len()
        )
    }
}
