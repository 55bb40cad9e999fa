//! Gift-card delivery after a successful redemption.
//!
//! [`GiftCardNotifier`] implements [`giftcode_core::FulfillmentNotifier`] by
//! probing a list of funding accounts against a [`GiftCardVendor`] until one
//! of them pays for the card. [`CleanCloudClient`] is the HTTP vendor.

pub mod accounts;
pub mod cleancloud;
pub mod error;
pub mod notifier;
pub mod vendor;

pub use accounts::FundingAccounts;
pub use cleancloud::{CleanCloudClient, CleanCloudConfig};
pub use error::FulfillmentError;
pub use notifier::{display_name, GiftCardNotifier};
pub use vendor::{GiftCardOrder, GiftCardVendor, NotifyBy, VendorReply};
