use crate::error::IssuanceError;
use giftcode_core::{AdminRepository, Metadata, NewGiftCode, RedemptionCode, RedemptionRecord};
use jiff::civil::Date;
use jiff::Timestamp;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::{info, warn};

type Result<T> = std::result::Result<T, IssuanceError>;

/// Batch administration of issued codes.
#[derive(Debug, Clone)]
pub struct IssuanceService<R> {
    repository: Arc<R>,
}

impl<R: AdminRepository> IssuanceService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Inserts `codes` as one all-or-nothing batch.
    ///
    /// Any code already present aborts the whole batch with
    /// [`giftcode_core::StorageError::Conflict`].
    pub async fn issue(
        &self,
        codes: Vec<RedemptionCode>,
        card_value: Option<f64>,
        metadata: Option<Metadata>,
    ) -> Result<Vec<RedemptionRecord>> {
        if let Some(value) = card_value {
            if !value.is_finite() || value <= 0.0 {
                return Err(IssuanceError::Validation(format!(
                    "card value must be positive, got {value}"
                )));
            }
        }
        if codes.is_empty() {
            return Ok(Vec::new());
        }

        let batch = codes
            .into_iter()
            .map(|code| NewGiftCode {
                code,
                card_value,
                expiry_date: None,
                metadata: metadata.clone(),
            })
            .collect();

        let issued = self.repository.insert_many(batch).await?;
        info!(count = issued.len(), "issued gift codes");
        Ok(issued)
    }

    /// Sets the expiry date of every unredeemed code in `serials`.
    pub async fn update_expiry(&self, serials: RangeInclusive<i64>, expiry_date: Date) -> Result<u64> {
        check_range(&serials)?;
        let updated = self.repository.update_expiry(serials.clone(), expiry_date).await?;
        info!(
            first = serials.start(),
            last = serials.end(),
            %expiry_date,
            updated,
            "updated expiry dates"
        );
        Ok(updated)
    }

    /// Records that the unredeemed codes in `serials` were handed to `distributed_to`.
    pub async fn distribute(
        &self,
        serials: RangeInclusive<i64>,
        distributed_to: &str,
        distributed_at: Timestamp,
    ) -> Result<u64> {
        check_range(&serials)?;
        let distributed_to = distributed_to.trim();
        if distributed_to.is_empty() {
            return Err(IssuanceError::Validation(
                "distribution target cannot be empty".to_string(),
            ));
        }

        let updated = self
            .repository
            .distribute(serials.clone(), distributed_to, distributed_at)
            .await?;
        info!(
            first = serials.start(),
            last = serials.end(),
            distributed_to,
            updated,
            "marked codes as distributed"
        );
        Ok(updated)
    }

    /// Returns a redeemed code to the unredeemed state. For testing only.
    pub async fn reset(&self, code: &RedemptionCode) -> Result<bool> {
        let reset = self.repository.reset(code).await?;
        if reset {
            warn!(code = %code, "code reset to unredeemed");
        }
        Ok(reset)
    }
}

fn check_range(serials: &RangeInclusive<i64>) -> Result<()> {
    if serials.is_empty() {
        return Err(IssuanceError::Validation(format!(
            "serial range {}..={} is empty",
            serials.start(),
            serials.end()
        )));
    }
    Ok(())
}
