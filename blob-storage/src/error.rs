use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("an image named {0:?} already exists")]
    DuplicateName(String),

    #[error("no image named {0:?}")]
    NotFound(String),

    #[error("stored image {filename:?} is corrupted: {reason}")]
    Corrupted { filename: String, reason: String },

    #[error("storage engine unavailable: {0}")]
    Unavailable(String),

    #[error("invalid connection string {0:?}")]
    InvalidConnectionString(String),
}

impl StoreError {
    pub(crate) fn corrupted(filename: &str, reason: impl Into<String>) -> Self {
        StoreError::Corrupted {
            filename: filename.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<rocksdb::Error> for StoreError {
    fn from(e: rocksdb::Error) -> Self {
        StoreError::Unavailable(e.into_string())
    }
}
