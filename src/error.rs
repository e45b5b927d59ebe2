use std::path::PathBuf;

use crate::fsutil::FileReadError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid container id pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error("container id pattern `{pattern}` must have exactly one capture group, found {found}")]
    CaptureGroups { pattern: String, found: usize },
    #[error("not initialized")]
    NotInitialized,
    #[error("already initialized")]
    AlreadyInitialized,
    #[error("no tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
    #[error("error walking path `{path}`: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Read(#[from] FileReadError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Discards an error after recording it at trace level.
///
/// Used where failures are absorbed on purpose, e.g. a cgroup subtree that
/// vanished mid-scan.
pub trait ResultOkTraceExt<T, E> {
    fn ok_trace(self) -> Option<T>;
}

impl<T, E> ResultOkTraceExt<T, E> for std::result::Result<T, E>
where
    E: std::fmt::Display,
{
    fn ok_trace(self) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::trace!("ignoring error: {err}");
                None
            }
        }
    }
}
