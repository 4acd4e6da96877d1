use thiserror::Error;

pub type Result<T> = std::result::Result<T, NetError>;

/// Every failure the engine can surface. Nothing is retried internally.
#[derive(Error, Debug)]
pub enum NetError {
    /// A vector or matrix width disagrees with the configured width.
    #[error("shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// Non-positive batch size, empty batch, bad configuration value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A persisted or string-encoded value could not be accepted.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// A row label or index key with no known prefix.
    #[error("unrecognized key: {0}")]
    UnrecognizedKey(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NetError {
    pub fn shape(context: impl Into<String>, expected: usize, actual: usize) -> NetError {
        NetError::ShapeMismatch { context: context.into(), expected, actual }
    }
}

/// Parses one numeric cell and rejects infinities and NaN.
pub(crate) fn parse_finite(cell: &str, what: &str) -> Result<f64> {
    let value: f64 = cell.trim().parse().map_err(|_| {
        NetError::MalformedRecord(format!("{what}: '{}' is not a number", cell.trim()))
    })?;
    if !value.is_finite() {
        return Err(NetError::MalformedRecord(format!("{what}: value {value} is not finite")));
    }
    Ok(value)
}
