use giftcode_core::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IssuanceError {
    #[error("invalid issuance request: {0}")]
    Validation(String),
    #[error("record store error: {0}")]
    Store(#[from] StorageError),
}
