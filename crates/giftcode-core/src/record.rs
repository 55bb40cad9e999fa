use crate::code::RedemptionCode;
use jiff::civil::Date;
use jiff::tz::TimeZone;
use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Opaque key-value payload attached at redemption time.
///
/// Stored for audit purposes only; nothing in the redemption flow reads it back.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Lifecycle state of an issued code.
///
/// `Unredeemed -> Redeemed` is the only transition the redemption flow performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionStatus {
    Unredeemed,
    Redeemed,
}

impl RedemptionStatus {
    /// Maps the `is_redeemed` column onto a status.
    pub fn from_flag(is_redeemed: bool) -> Self {
        if is_redeemed {
            Self::Redeemed
        } else {
            Self::Unredeemed
        }
    }

    pub fn is_redeemed(self) -> bool {
        matches!(self, Self::Redeemed)
    }
}

/// Contact details of the person redeeming a code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientIdentity {
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl RecipientIdentity {
    /// Builds an identity, treating blank fields as absent.
    pub fn new(email: Option<String>, phone: Option<String>) -> Self {
        Self {
            email: non_blank(email),
            phone: non_blank(phone),
        }
    }

    /// Returns `true` when no contact field is present.
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.phone.is_none()
    }

    /// Returns `true` when both e-mail and phone are present.
    pub fn is_complete(&self) -> bool {
        self.email.is_some() && self.phone.is_some()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// When a code stops being redeemable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Stored per-code expiry date. The code stays valid for the whole day (UTC).
    OnDate(Date),
    /// Computed deadline, e.g. issuance time plus a validity window.
    At(Timestamp),
}

impl Expiry {
    /// The first instant at which the code is no longer redeemable.
    pub fn deadline(&self) -> Option<Timestamp> {
        match self {
            Expiry::OnDate(date) => date
                .tomorrow()
                .ok()?
                .to_zoned(TimeZone::UTC)
                .ok()
                .map(|zoned| zoned.timestamp()),
            Expiry::At(ts) => Some(*ts),
        }
    }

    /// Returns `true` if `now` is at or past the deadline.
    pub fn has_passed(&self, now: Timestamp) -> bool {
        self.deadline().is_some_and(|deadline| now >= deadline)
    }
}

impl Display for Expiry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expiry::OnDate(date) => write!(f, "on {date}"),
            Expiry::At(ts) => write!(f, "at {}", ts.strftime("%B %d, %Y %I:%M %p UTC")),
        }
    }
}

/// One issued code as held by the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedemptionRecord {
    pub code: RedemptionCode,
    pub status: RedemptionStatus,
    pub created_at: Timestamp,
    /// Stored per-code expiry, if any.
    pub expiry_date: Option<Date>,
    /// Set exactly once, by the successful conditional update.
    pub redeemed_at: Option<Timestamp>,
    pub recipient: RecipientIdentity,
    pub metadata: Option<Metadata>,
    pub serial_number: Option<i64>,
    /// Face value in dollars, recorded at issuance.
    pub card_value: Option<f64>,
    pub distributed_to: Option<String>,
    pub distributed_at: Option<Timestamp>,
}

impl RedemptionRecord {
    /// A freshly issued, unredeemed record with no batch information.
    pub fn issued(code: RedemptionCode, created_at: Timestamp) -> Self {
        Self {
            code,
            status: RedemptionStatus::Unredeemed,
            created_at,
            expiry_date: None,
            redeemed_at: None,
            recipient: RecipientIdentity::default(),
            metadata: None,
            serial_number: None,
            card_value: None,
            distributed_to: None,
            distributed_at: None,
        }
    }

    /// Resolves the effective expiry.
    ///
    /// A stored expiry date wins; otherwise the code expires `validity_window`
    /// after issuance, if a window is configured.
    pub fn expiry(&self, validity_window: Option<SignedDuration>) -> Option<Expiry> {
        if let Some(date) = self.expiry_date {
            return Some(Expiry::OnDate(date));
        }
        let window = validity_window?;
        self.created_at.checked_add(window).ok().map(Expiry::At)
    }

    pub fn is_redeemed(&self) -> bool {
        self.status.is_redeemed()
    }
}

/// The write applied by a successful redemption.
#[derive(Debug, Clone, PartialEq)]
pub struct Redemption {
    pub redeemed_at: Timestamp,
    pub recipient: RecipientIdentity,
    pub metadata: Option<Metadata>,
}

/// A code to be inserted by an issuance batch.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGiftCode {
    pub code: RedemptionCode,
    pub card_value: Option<f64>,
    pub expiry_date: Option<Date>,
    pub metadata: Option<Metadata>,
}

impl NewGiftCode {
    pub fn new(code: RedemptionCode) -> Self {
        Self {
            code,
            card_value: None,
            expiry_date: None,
            metadata: None,
        }
    }
}
