mod redeem;

pub use redeem::{RedeemRequest, RedeemResponse};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
