use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("result cap of {0} reached")]
    ResourceCap(usize),
}

pub type Result<T> = std::result::Result<T, SearchError>;
