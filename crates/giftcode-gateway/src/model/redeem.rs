use giftcode_core::Metadata;
use serde::{Deserialize, Serialize};

/// Body of `POST /redeem`. Presence rules are enforced by the handler.
#[derive(Debug, Default, Deserialize)]
pub struct RedeemRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub recipient_email: Option<String>,
    #[serde(default)]
    pub recipient_phone: Option<String>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RedeemResponse {
    pub success: bool,
    pub message: String,
}

impl RedeemResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
