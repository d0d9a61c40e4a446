use crate::operator::OperatorState;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("directory scan failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("busy: {0} is already in progress")]
    Busy(OperatorState),
}

impl PipelineError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| PipelineError::Io { op, path, source }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
