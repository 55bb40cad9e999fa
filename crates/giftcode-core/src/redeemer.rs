use crate::code::RedemptionCode;
use crate::error::RedemptionError;
use crate::record::{Metadata, RecipientIdentity, RedemptionRecord};
use async_trait::async_trait;
use jiff::SignedDuration;

type Result<T> = std::result::Result<T, RedemptionError>;

/// How long codes stay redeemable when no expiry date is stored with them.
#[derive(Debug, Clone, Copy, Default)]
pub enum ExpiryPolicy {
    /// Only stored expiry dates apply.
    #[default]
    StoredOnly,
    /// Codes without a stored date expire this long after issuance.
    ValidFor(SignedDuration),
}

impl ExpiryPolicy {
    pub fn validity_window(&self) -> Option<SignedDuration> {
        match self {
            ExpiryPolicy::StoredOnly => None,
            ExpiryPolicy::ValidFor(window) => Some(*window),
        }
    }
}

/// Parameters of a redemption attempt.
#[derive(Debug, Clone)]
pub struct RedeemParams {
    pub code: RedemptionCode,
    pub recipient: RecipientIdentity,
    pub metadata: Option<Metadata>,
}

#[async_trait]
pub trait Redeemer: Send + Sync + 'static {
    /// Consumes `params.code` on behalf of the recipient.
    ///
    /// Succeeds at most once per code; every later attempt fails with
    /// [`RedemptionError::AlreadyRedeemed`].
    async fn redeem(&self, params: RedeemParams) -> Result<RedemptionRecord>;

    /// Reads the current state of a code.
    async fn lookup(&self, code: &RedemptionCode) -> Result<Option<RedemptionRecord>>;
}
