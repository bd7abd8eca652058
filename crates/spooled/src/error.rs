use std::io;

use thiserror::Error;

use crate::kind::Kind;

/// Result alias used throughout the crate.
pub type Result<T, E = SpoolError> = core::result::Result<T, E>;

/// Errors raised by [`SpooledBuffer`](crate::SpooledBuffer) operations.
#[derive(Debug, Error)]
pub enum SpoolError {
    /// A write supplied data of the wrong element kind.
    #[error("invalid type: expected {expected} data, got {found}")]
    InvalidType {
        /// Kind the buffer was constructed with.
        expected: Kind,
        /// Kind of the rejected data.
        found: Kind,
    },
    /// `truncate_args` received more arguments than it accepts.
    #[error("truncate takes at most {max} argument ({given} given)")]
    InvalidArgumentCount {
        /// Largest accepted argument count.
        max: usize,
        /// Number of arguments supplied.
        given: usize,
    },
    /// `truncate` was asked for a negative size.
    #[error("cannot truncate to negative size ({0})")]
    NegativeSize(i64),
    /// A seek resolved to a position before the start of the buffer.
    #[error("cannot seek to negative position ({0})")]
    NegativeSeek(i64),
    /// The buffer was already closed.
    #[error("I/O operation on closed buffer")]
    Closed,
    /// The backing store failed. Never retried.
    #[error("backing store error: {0}")]
    Io(#[from] io::Error),
}

impl SpoolError {
    /// Whether this error belongs to the I/O fault category: negative
    /// positions and backing-store failures.
    #[must_use]
    pub fn is_io_fault(&self) -> bool {
        matches!(
            self,
            SpoolError::NegativeSize(_) | SpoolError::NegativeSeek(_) | SpoolError::Io(_)
        )
    }
}

impl From<SpoolError> for io::Error {
    fn from(err: SpoolError) -> Self {
        match err {
            SpoolError::Io(inner) => inner,
            SpoolError::InvalidType { .. } => io::Error::new(io::ErrorKind::InvalidData, err),
            SpoolError::InvalidArgumentCount { .. }
            | SpoolError::NegativeSize(_)
            | SpoolError::NegativeSeek(_) => io::Error::new(io::ErrorKind::InvalidInput, err),
            SpoolError::Closed => io::Error::new(io::ErrorKind::BrokenPipe, err),
        }
    }
}
