use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use giftcode_core::repository::{AdminRepository, ReadRepository, Repository, Result};
use giftcode_core::{
    NewGiftCode, RecipientIdentity, Redemption, RedemptionCode, RedemptionRecord,
    RedemptionStatus, StorageError,
};
use jiff::civil::Date;
use jiff::Timestamp;
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::trace;

/// In-memory implementation of the record store using DashMap.
///
/// The conditional redemption write holds the shard write lock of the
/// entry for the whole check-and-set, which gives the same compare-and-swap
/// guarantee a database row predicate does.
#[derive(Debug)]
pub struct InMemoryRepository {
    storage: DashMap<String, RedemptionRecord>,
    next_serial: AtomicI64,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self {
            storage: DashMap::new(),
            next_serial: AtomicI64::new(1),
        }
    }

    /// Creates a new in-memory repository with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: DashMap::with_capacity(capacity),
            next_serial: AtomicI64::new(1),
        }
    }

    /// Stores `record` as-is, replacing any existing record with the same code.
    ///
    /// Useful for seeding fixtures with specific timestamps or states.
    pub fn seed(&self, record: RedemptionRecord) {
        if let Some(serial) = record.serial_number {
            self.next_serial.fetch_max(serial + 1, Ordering::SeqCst);
        }
        self.storage.insert(record.code.as_str().to_owned(), record);
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    fn update_unredeemed_in_range<F>(&self, serials: &RangeInclusive<i64>, mut apply: F) -> u64
    where
        F: FnMut(&mut RedemptionRecord),
    {
        let mut updated = 0;
        for mut entry in self.storage.iter_mut() {
            let record = entry.value_mut();
            let in_range = record
                .serial_number
                .is_some_and(|serial| serials.contains(&serial));
            if in_range && !record.is_redeemed() {
                apply(record);
                updated += 1;
            }
        }
        updated
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn get(&self, code: &RedemptionCode) -> Result<Option<RedemptionRecord>> {
        Ok(self.storage.get(code.as_str()).map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn redeem_if_unredeemed(
        &self,
        code: &RedemptionCode,
        redemption: Redemption,
    ) -> Result<Option<RedemptionRecord>> {
        // `get_mut` keeps the shard locked until the guard drops.
        let Some(mut entry) = self.storage.get_mut(code.as_str()) else {
            return Ok(None);
        };

        if entry.is_redeemed() {
            trace!(code = %code, "conditional update matched no unredeemed row");
            return Ok(None);
        }

        let record = entry.value_mut();
        record.status = RedemptionStatus::Redeemed;
        record.redeemed_at = Some(redemption.redeemed_at);
        record.recipient = redemption.recipient;
        record.metadata = redemption.metadata;

        Ok(Some(record.clone()))
    }
}

#[async_trait]
impl AdminRepository for InMemoryRepository {
    async fn insert_many(&self, codes: Vec<NewGiftCode>) -> Result<Vec<RedemptionRecord>> {
        let now = Timestamp::now();
        let mut inserted: Vec<RedemptionRecord> = Vec::with_capacity(codes.len());

        for new_code in codes {
            let conflict = match self.storage.entry(new_code.code.as_str().to_owned()) {
                Entry::Occupied(_) => true,
                Entry::Vacant(slot) => {
                    let mut record = RedemptionRecord::issued(new_code.code.clone(), now);
                    record.serial_number = Some(self.next_serial.fetch_add(1, Ordering::SeqCst));
                    record.card_value = new_code.card_value;
                    record.expiry_date = new_code.expiry_date;
                    record.metadata = new_code.metadata.clone();
                    slot.insert(record.clone());
                    inserted.push(record);
                    false
                }
            };

            if conflict {
                // All-or-nothing, like a single bulk INSERT.
                for record in &inserted {
                    self.storage.remove(record.code.as_str());
                }
                return Err(StorageError::Conflict(new_code.code.to_string()));
            }
        }

        Ok(inserted)
    }

    async fn update_expiry(&self, serials: RangeInclusive<i64>, expiry_date: Date) -> Result<u64> {
        Ok(self.update_unredeemed_in_range(&serials, |record| {
            record.expiry_date = Some(expiry_date);
        }))
    }

    async fn distribute(
        &self,
        serials: RangeInclusive<i64>,
        distributed_to: &str,
        distributed_at: Timestamp,
    ) -> Result<u64> {
        Ok(self.update_unredeemed_in_range(&serials, |record| {
            record.distributed_to = Some(distributed_to.to_owned());
            record.distributed_at = Some(distributed_at);
        }))
    }

    async fn reset(&self, code: &RedemptionCode) -> Result<bool> {
        let Some(mut entry) = self.storage.get_mut(code.as_str()) else {
            return Ok(false);
        };

        let record = entry.value_mut();
        record.status = RedemptionStatus::Unredeemed;
        record.redeemed_at = None;
        record.recipient = RecipientIdentity::default();
        Ok(true)
    }
}
