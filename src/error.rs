#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("Parse failed with: {0}")]
    Parse(String),

    #[error("Statement is missing {0}")]
    MissingField(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
