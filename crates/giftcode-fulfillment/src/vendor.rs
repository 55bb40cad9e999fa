use crate::error::FulfillmentError;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Display;

/// How the vendor tells the recipient about the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotifyBy {
    Sms,
    #[default]
    Email,
    DoNotNotify,
    EmailAndSms,
}

impl NotifyBy {
    /// Numeric code used on the wire.
    pub fn code(self) -> u8 {
        match self {
            NotifyBy::Sms => 1,
            NotifyBy::Email => 2,
            NotifyBy::DoNotNotify => 3,
            NotifyBy::EmailAndSms => 4,
        }
    }
}

/// One gift-card purchase, independent of the paying account.
#[derive(Debug, Clone, PartialEq)]
pub struct GiftCardOrder {
    pub to_name: String,
    pub to_email: Option<String>,
    pub to_tel: Option<String>,
    /// `YYYY-MM-DD`
    pub send_date: String,
    /// `HH:MM`
    pub send_hour: String,
    pub amount: f64,
    pub message: String,
    pub notify_by: NotifyBy,
}

/// Decoded vendor reply.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorReply(pub Value);

impl VendorReply {
    /// The vendor signals a completed purchase by mentioning `Success`
    /// anywhere in its reply.
    pub fn is_success(&self) -> bool {
        self.0.to_string().contains("Success")
    }
}

impl Display for VendorReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GiftCardVendor: Send + Sync + 'static {
    /// Attempts to buy `order`, charging the card saved on `account`.
    async fn buy_gift_card(
        &self,
        account: &str,
        order: &GiftCardOrder,
    ) -> Result<VendorReply, FulfillmentError>;
}
