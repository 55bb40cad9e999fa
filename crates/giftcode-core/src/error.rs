use crate::code::RedemptionCode;
use crate::record::Expiry;
use jiff::Timestamp;
use thiserror::Error;

/// Errors raised by record-store backends.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("code already exists: {0}")]
    Conflict(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

/// Failure outcomes of a redemption attempt.
///
/// Every variant leaves the stored record untouched.
#[derive(Debug, Clone, Error)]
pub enum RedemptionError {
    #[error("invalid redemption request: {0}")]
    Validation(String),
    #[error("Code '{0}' not found in database.")]
    CodeNotFound(RedemptionCode),
    #[error("Code '{code}' has already been redeemed{}.", redeemed_on(.redeemed_at))]
    AlreadyRedeemed {
        code: RedemptionCode,
        redeemed_at: Option<Timestamp>,
    },
    #[error("Code '{code}' has expired {expiry}.")]
    CodeExpired { code: RedemptionCode, expiry: Expiry },
    #[error("record store error: {0}")]
    Store(#[from] StorageError),
}

fn redeemed_on(redeemed_at: &Option<Timestamp>) -> String {
    match redeemed_at {
        Some(ts) => format!(" on {}", ts.strftime("%B %d, %Y at %I:%M %p UTC")),
        None => String::new(),
    }
}
