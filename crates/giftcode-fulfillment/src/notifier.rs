use crate::accounts::FundingAccounts;
use crate::vendor::{GiftCardOrder, GiftCardVendor, NotifyBy};
use async_trait::async_trait;
use giftcode_core::{Clock, FulfillmentNotifier, FulfillmentOutcome, RecipientIdentity, SystemClock};
use std::sync::Arc;
use tracing::{info, warn};

const FALLBACK_NAME: &str = "Valued Customer";

/// Buys a gift card for the recipient, trying funding accounts in order.
///
/// The first account whose purchase the vendor confirms wins and the probe
/// stops. Cards are scheduled for immediate delivery, using the clock's
/// current UTC date and time.
#[derive(Debug, Clone)]
pub struct GiftCardNotifier<V, C = SystemClock> {
    vendor: Arc<V>,
    accounts: FundingAccounts,
    clock: C,
    notify_by: NotifyBy,
}

impl<V: GiftCardVendor> GiftCardNotifier<V> {
    pub fn new(vendor: V, accounts: FundingAccounts) -> Self {
        Self::with_clock(vendor, accounts, SystemClock)
    }
}

impl<V: GiftCardVendor, C: Clock> GiftCardNotifier<V, C> {
    pub fn with_clock(vendor: V, accounts: FundingAccounts, clock: C) -> Self {
        Self {
            vendor: Arc::new(vendor),
            accounts,
            clock,
            notify_by: NotifyBy::default(),
        }
    }

    pub fn with_notify_by(mut self, notify_by: NotifyBy) -> Self {
        self.notify_by = notify_by;
        self
    }

    fn order_for(&self, recipient: &RecipientIdentity, amount: f64, message: &str) -> GiftCardOrder {
        let now = self.clock.now();
        GiftCardOrder {
            to_name: display_name(recipient.email.as_deref()),
            to_email: recipient.email.clone(),
            to_tel: recipient.phone.clone(),
            send_date: now.strftime("%Y-%m-%d").to_string(),
            send_hour: now.strftime("%H:%M").to_string(),
            amount,
            message: message.to_owned(),
            notify_by: self.notify_by,
        }
    }
}

#[async_trait]
impl<V: GiftCardVendor, C: Clock> FulfillmentNotifier for GiftCardNotifier<V, C> {
    async fn notify(
        &self,
        recipient: &RecipientIdentity,
        amount: f64,
        message: &str,
    ) -> FulfillmentOutcome {
        if self.accounts.is_empty() {
            return FulfillmentOutcome::Unavailable {
                reason: "no funding accounts configured".to_string(),
            };
        }

        let order = self.order_for(recipient, amount, message);
        let mut last_reply = None;
        let mut last_error = None;

        for account in self.accounts.iter() {
            match self.vendor.buy_gift_card(account, &order).await {
                Ok(reply) if reply.is_success() => {
                    info!(account, amount, to = %order.to_name, "gift card purchased");
                    return FulfillmentOutcome::Delivered {
                        account: account.to_owned(),
                    };
                }
                Ok(reply) => {
                    warn!(account, %reply, "gift card purchase declined");
                    last_reply = Some(reply.to_string());
                }
                Err(e) => {
                    warn!(account, error = %e, "gift card purchase attempt failed");
                    last_error = Some(e.to_string());
                }
            }
        }

        match (last_reply, last_error) {
            (Some(reason), _) => FulfillmentOutcome::Declined { reason },
            (None, error) => FulfillmentOutcome::Unavailable {
                reason: error.unwrap_or_else(|| "vendor unreachable".to_string()),
            },
        }
    }
}

/// Addressee name derived from the e-mail local part, title-cased.
pub fn display_name(email: Option<&str>) -> String {
    let Some((local, _)) = email.and_then(|e| e.split_once('@')) else {
        return FALLBACK_NAME.to_string();
    };

    let mut name = String::with_capacity(local.len());
    let mut word_start = true;
    for ch in local.chars() {
        if ch.is_alphabetic() {
            if word_start {
                name.extend(ch.to_uppercase());
            } else {
                name.extend(ch.to_lowercase());
            }
            word_start = false;
        } else {
            name.push(ch);
            word_start = true;
        }
    }
    name
}
