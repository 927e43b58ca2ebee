use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to construct an absolute path from a directory and an entry name.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("path too long ({len} bytes, limit {max}): {}/{}", .dir.display(), .name.to_string_lossy())]
    TooLong {
        dir: PathBuf,
        name: std::ffi::OsString,
        len: usize,
        max: usize,
    },
}

/// A single filesystem mutation that did not happen.
///
/// These never escape the processing of the event that caused them; the
/// engine reports them and moves on.
#[derive(Debug, Error)]
pub enum OpError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("{} is not a symlink, refusing to remove it", .0.display())]
    NotALink(PathBuf),
    #[error(transparent)]
    Path(#[from] PathError),
}

/// Errors that stop the mirror loop.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to read notifications: {0}")]
    Read(#[source] io::Error),
    #[error("notification channel closed")]
    ChannelClosed,
}
