use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("upstream stream failed: {0:#}")]
    Upstream(#[from] anyhow::Error),

    #[error("malformed event frame: {0}")]
    Frame(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("interaction store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode interaction: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("interaction store unavailable: {0}")]
    Unavailable(String),
}
