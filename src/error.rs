//! Error types.
//!
//! Every fallible operation of this crate returns [`Result`], an alias of `anyhow::Result`.
//! Conditions a caller may want to react to are raised as [`Error`] and can be recovered with
//! `err.downcast_ref::<Error>()`.
use std::path::PathBuf;

pub type Result<T, E = anyhow::Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("invalid buffer dimensions {0:?}: every axis must be strictly positive")]
  InvalidDimensions(Vec<usize>),

  #[error("invalid configuration: {0}")]
  InvalidConfig(String),

  #[error("degenerate geometry: {0}")]
  DegenerateGeometry(String),

  #[error("{}:{line}: {reason}", path.display())]
  MalformedFile {
    path: PathBuf,
    line: usize,
    reason: String
  },

  #[error("{}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error
  },

  #[error("no buffer named `{0}`")]
  UnknownBuffer(String),

  #[error("buffer holds {found:?} samples, {expected:?} requested")]
  TypeMismatch {
    expected: crate::buffer::DataType,
    found: crate::buffer::DataType
  },
}

impl Error {
  pub(crate) fn malformed(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
    Error::MalformedFile { path: path.into(), line, reason: reason.into() }
  }
}
