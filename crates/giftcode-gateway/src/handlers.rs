mod health;
mod redeem;

pub use health::health_handler;
pub use redeem::redeem_handler;
