use crate::code::RedemptionCode;
use crate::error::StorageError;
use crate::record::{NewGiftCode, Redemption, RedemptionRecord};
use async_trait::async_trait;
use jiff::civil::Date;
use jiff::Timestamp;
use std::ops::RangeInclusive;

/// Result type for record-store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A read-only view of the record store.
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Retrieves the record for a given code.
    /// Returns `None` if the code was never issued.
    async fn get(&self, code: &RedemptionCode) -> Result<Option<RedemptionRecord>>;
}

/// The store operations the redemption flow depends on.
#[async_trait]
pub trait Repository: ReadRepository {
    /// Applies `redemption` only if the code exists and is still unredeemed.
    ///
    /// The predicate and the write must be a single atomic operation in the
    /// backing store. Returns the updated record, or `None` when no row
    /// matched (unknown code, or someone else redeemed it first).
    async fn redeem_if_unredeemed(
        &self,
        code: &RedemptionCode,
        redemption: Redemption,
    ) -> Result<Option<RedemptionRecord>>;
}

/// Batch administration of issued codes.
#[async_trait]
pub trait AdminRepository: Repository {
    /// Inserts new codes in one batch. Fails with `Conflict` if any code exists.
    async fn insert_many(&self, codes: Vec<NewGiftCode>) -> Result<Vec<RedemptionRecord>>;

    /// Sets the expiry date of unredeemed codes whose serial falls in `serials`.
    /// Returns the number of updated codes.
    async fn update_expiry(&self, serials: RangeInclusive<i64>, expiry_date: Date) -> Result<u64>;

    /// Records that unredeemed codes in `serials` were handed to `distributed_to`.
    async fn distribute(
        &self,
        serials: RangeInclusive<i64>,
        distributed_to: &str,
        distributed_at: Timestamp,
    ) -> Result<u64>;

    /// Returns a code to the unredeemed state. Meant for testing only.
    /// Returns `true` if the code existed.
    async fn reset(&self, code: &RedemptionCode) -> Result<bool>;
}
