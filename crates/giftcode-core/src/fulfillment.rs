use crate::record::RecipientIdentity;
use async_trait::async_trait;
use std::fmt::Display;

/// Result of a best-effort gift-card delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FulfillmentOutcome {
    /// A funding account accepted the purchase.
    Delivered { account: String },
    /// Every funding account rejected the purchase.
    Declined { reason: String },
    /// The vendor could not be reached, or no vendor is configured.
    Unavailable { reason: String },
}

impl FulfillmentOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, FulfillmentOutcome::Delivered { .. })
    }
}

impl Display for FulfillmentOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FulfillmentOutcome::Delivered { account } => write!(f, "delivered via account {account}"),
            FulfillmentOutcome::Declined { reason } => write!(f, "declined: {reason}"),
            FulfillmentOutcome::Unavailable { reason } => write!(f, "unavailable: {reason}"),
        }
    }
}

/// Triggers the downstream gift-card purchase after a redemption.
///
/// Implementations never fail: the code has already been consumed, so
/// problems are reported through the outcome and left for manual follow-up.
#[async_trait]
pub trait FulfillmentNotifier: Send + Sync + 'static {
    async fn notify(
        &self,
        recipient: &RecipientIdentity,
        amount: f64,
        message: &str,
    ) -> FulfillmentOutcome;
}
