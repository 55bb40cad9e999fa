use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FulfillmentError {
    #[error("vendor request failed: {0}")]
    Transport(String),
    #[error("vendor returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("vendor reply is not valid JSON: {0}")]
    Decode(String),
    #[error("failed to read funding accounts from {}: {source}", path.display())]
    AccountsFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<reqwest::Error> for FulfillmentError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FulfillmentError::Decode(err.to_string())
        } else {
            FulfillmentError::Transport(err.to_string())
        }
    }
}
