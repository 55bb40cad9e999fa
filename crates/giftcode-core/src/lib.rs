//! Core types and traits for the gift-code redemption service.
//!
//! This crate provides the domain model and the seams shared by the
//! redemption service, the record-store backends, the fulfillment
//! adapter and the HTTP gateway.

pub mod clock;
pub mod code;
pub mod error;
pub mod fulfillment;
pub mod record;
pub mod redeemer;
pub mod repository;

pub use clock::{Clock, FixedClock, SystemClock};
pub use code::RedemptionCode;
pub use error::{RedemptionError, StorageError};
pub use fulfillment::{FulfillmentNotifier, FulfillmentOutcome};
pub use record::{
    Expiry, Metadata, NewGiftCode, RecipientIdentity, Redemption, RedemptionRecord,
    RedemptionStatus,
};
pub use redeemer::{ExpiryPolicy, RedeemParams, Redeemer};
pub use repository::{AdminRepository, ReadRepository, Repository};
