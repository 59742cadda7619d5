//! Error type shared by all collectors.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that end a collector call.
///
/// A process exiting during a scan is not represented here; it is simply
/// absent from the result.
#[derive(Error, Debug)]
pub enum CollectError {
    /// A required kernel source could not be opened or read.
    #[error("source {} unavailable: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A source was read but its layout is not one we understand.
    #[error("malformed source {}: {reason}", path.display())]
    MalformedSource { path: PathBuf, reason: String },

    /// Caller-supplied policy or unit value is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The result would exceed a declared maximum.
    #[error("result exceeds capacity of {limit}")]
    CapacityExceeded { limit: usize },
}

impl CollectError {
    pub(crate) fn unavailable(path: &Path, source: io::Error) -> Self {
        CollectError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn malformed(path: &Path, reason: impl Into<String>) -> Self {
        CollectError::MalformedSource {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Returns true when an I/O error means the process behind a `/proc/[pid]`
/// path has exited.
pub(crate) fn is_process_gone(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound || err.raw_os_error() == Some(libc::ESRCH)
}
