use crate::extract::error::FetchError;
use crate::load::error::LoadError;
use crate::load::report::LoadReport;
use crate::transform::error::TransformError;
use std::fmt;
use thiserror::Error;

/// The pipeline step a run reached (or failed in).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtlStage {
    Extract,
    Transform,
    Load,
    Done,
}

impl fmt::Display for EtlStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EtlStage::Extract => "extract",
            EtlStage::Transform => "transform",
            EtlStage::Load => "load",
            EtlStage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum EtlError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

impl EtlError {
    pub fn stage(&self) -> EtlStage {
        match self {
            EtlError::Fetch(_) => EtlStage::Extract,
            EtlError::Transform(_) => EtlStage::Transform,
            EtlError::Load(_) => EtlStage::Load,
        }
    }

    /// Database loads that finished before the run failed.
    pub fn completed_loads(&self) -> &[LoadReport] {
        match self {
            EtlError::Load(LoadError::Incomplete { completed, .. }) => completed,
            _ => &[],
        }
    }
}
