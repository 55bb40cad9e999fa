use async_trait::async_trait;
use giftcode_core::{
    Clock, ExpiryPolicy, RedeemParams, Redeemer, Redemption, RedemptionCode, RedemptionError,
    RedemptionRecord, Repository, SystemClock,
};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// A concrete implementation of the `Redeemer` trait.
///
/// The read-side checks (existence, status, expiry) only produce precise
/// error messages. Whether a redemption wins is decided by the store's
/// conditional write alone, so concurrent callers on any number of service
/// instances see exactly one success per code.
#[derive(Debug, Clone)]
pub struct RedemptionService<R, C = SystemClock> {
    repository: Arc<R>,
    clock: C,
    expiry_policy: ExpiryPolicy,
}

impl<R: Repository> RedemptionService<R> {
    /// Creates a service that reads the wall clock and honours stored expiry dates only.
    pub fn new(repository: R) -> Self {
        Self::with_clock(repository, SystemClock)
    }
}

impl<R: Repository, C: Clock> RedemptionService<R, C> {
    pub fn with_clock(repository: R, clock: C) -> Self {
        Self {
            repository: Arc::new(repository),
            clock,
            expiry_policy: ExpiryPolicy::default(),
        }
    }

    /// Sets how codes without a stored expiry date age out.
    pub fn with_expiry_policy(mut self, expiry_policy: ExpiryPolicy) -> Self {
        self.expiry_policy = expiry_policy;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Best-effort read of the winner's timestamp after a lost conditional write.
    async fn redeemed_at_of(&self, code: &RedemptionCode) -> Option<jiff::Timestamp> {
        match self.repository.get(code).await {
            Ok(record) => record.and_then(|r| r.redeemed_at),
            Err(e) => {
                debug!(code = %code, error = %e, "could not re-read redeemed code");
                None
            }
        }
    }
}

#[async_trait]
impl<R: Repository, C: Clock> Redeemer for RedemptionService<R, C> {
    async fn redeem(&self, params: RedeemParams) -> Result<RedemptionRecord, RedemptionError> {
        let RedeemParams {
            code,
            recipient,
            metadata,
        } = params;

        if recipient.is_empty() {
            return Err(RedemptionError::Validation(
                "recipient contact information is required".to_string(),
            ));
        }

        let record = self
            .repository
            .get(&code)
            .await?
            .ok_or_else(|| RedemptionError::CodeNotFound(code.clone()))?;

        if record.is_redeemed() {
            return Err(RedemptionError::AlreadyRedeemed {
                code,
                redeemed_at: record.redeemed_at,
            });
        }

        let now = self.clock.now();
        if let Some(expiry) = record.expiry(self.expiry_policy.validity_window()) {
            if expiry.has_passed(now) {
                debug!(code = %code, %expiry, "rejecting expired code");
                return Err(RedemptionError::CodeExpired { code, expiry });
            }
        }

        let redemption = Redemption {
            redeemed_at: now,
            recipient,
            metadata,
        };

        match self.repository.redeem_if_unredeemed(&code, redemption).await? {
            Some(updated) => {
                info!(
                    code = %code,
                    email = ?updated.recipient.email,
                    phone = ?updated.recipient.phone,
                    "code redeemed"
                );
                Ok(updated)
            }
            None => {
                // Lost the race after the read-side checks passed.
                trace!(code = %code, "conditional update lost");
                let redeemed_at = self.redeemed_at_of(&code).await;
                Err(RedemptionError::AlreadyRedeemed { code, redeemed_at })
            }
        }
    }

    async fn lookup(
        &self,
        code: &RedemptionCode,
    ) -> Result<Option<RedemptionRecord>, RedemptionError> {
        Ok(self.repository.get(code).await?)
    }
}
