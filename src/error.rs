//! Error types for the Query 5 executor

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for executor operations
pub type Result<T> = std::result::Result<T, Q5Error>;

#[derive(Error, Debug)]
pub enum Q5Error {
    #[error("region not found: {0}")]
    RegionNotFound(String),

    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("partition {partition} of {} could not be reopened: {source}", path.display())]
    Partition {
        path: PathBuf,
        partition: usize,
        #[source]
        source: io::Error,
    },

    #[error("malformed {table} record at line {line}: {reason}")]
    Malformed {
        table: &'static str,
        line: usize,
        reason: String,
    },

    #[error("malformed lineitem record at byte {offset}: {reason}")]
    MalformedField { offset: usize, reason: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
