use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unparseable timestamp: {0:?}")]
    UnparseableTimestamp(String),

    #[error("timestamp of {0} ms is outside the representable range")]
    TimestampOutOfRange(f64),

    #[error("invalid point record: {0}")]
    InvalidPoint(#[from] serde_json::Error),

    #[error("geometry is neither a point nor a line string")]
    UnsupportedGeometry,

    #[error("position has {0} coordinates, expected at least two")]
    ShortPosition(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
