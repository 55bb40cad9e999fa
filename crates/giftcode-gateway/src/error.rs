use crate::model::RedeemResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use giftcode_core::RedemptionError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

pub const MISSING_FIELDS_MESSAGE: &str = "Missing code or recipient information";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{}", MISSING_FIELDS_MESSAGE)]
    MissingFields,
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Redemption(#[from] RedemptionError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingFields
            | AppError::BadRequest(_)
            | AppError::Redemption(RedemptionError::Validation(_)) => StatusCode::BAD_REQUEST,
            AppError::Redemption(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            AppError::Redemption(RedemptionError::Validation(_)) => self.to_string(),
            AppError::Redemption(err @ RedemptionError::Store(_)) => {
                tracing::error!(error = %err, "record store failure during redemption");
                format!("Server error: {err}")
            }
            AppError::Redemption(err) => format!("Server error: {err}"),
            other => other.to_string(),
        };

        (status, Json(RedeemResponse::failed(message))).into_response()
    }
}
