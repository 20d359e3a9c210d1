use std::time::SystemTime;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    // Timestamps must be strictly ascending; index is the first offending sample.
    #[error("series is not sorted by timestamp at index {index}")]
    Unordered { index: usize },

    #[error("line {line}: value {value:?} is not a number")]
    InvalidValue { line: u64, value: String },

    #[error("line {line}: {source}")]
    Decode {
        line: u64,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line}: {source}")]
    Record {
        line: u64,
        #[source]
        source: csv::Error,
    },

    // RFC 3339 output only covers instants from the Unix epoch on.
    #[error("timestamp {timestamp:?} is before the Unix epoch and cannot be encoded")]
    Unencodable { timestamp: SystemTime },

    #[error("unknown format: {0} (expected json or csv)")]
    UnknownFormat(String),

    #[error("invalid threshold: {0:?}")]
    InvalidThreshold(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
