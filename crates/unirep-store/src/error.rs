use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Encode(#[from] bincode::Error),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("transaction error: {0}")]
    Transaction(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for sled::transaction::ConflictableTransactionError<StoreError> {
    fn from(e: StoreError) -> Self {
        sled::transaction::ConflictableTransactionError::Abort(e)
    }
}

impl From<sled::transaction::UnabortableTransactionError> for StoreError {
    fn from(e: sled::transaction::UnabortableTransactionError) -> Self {
        StoreError::Transaction(e.to_string())
    }
}
