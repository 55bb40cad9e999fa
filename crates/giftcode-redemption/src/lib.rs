//! Single-use redemption of gift codes.
//!
//! [`RedemptionService`] implements the [`giftcode_core::Redeemer`] contract
//! on top of any record store that supports the conditional redemption write.

pub mod service;

pub use service::RedemptionService;
