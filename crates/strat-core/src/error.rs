use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("fetch failed for {symbol} ({interval}): {reason}")]
    Fetch {
        symbol: String,
        interval: String,
        reason: String,
    },

    #[error("cache error for {symbol} ({interval}): {reason}")]
    Cache {
        symbol: String,
        interval: String,
        reason: String,
    },

    #[error("resample error: {0}")]
    Resample(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("reference data unavailable: {0}")]
    ReferenceData(String),

    #[error("snapshot write failed: {0}")]
    Snapshot(String),
}
