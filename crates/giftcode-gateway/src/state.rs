use giftcode_core::{FulfillmentNotifier, RecipientIdentity, Redeemer};
use std::sync::Arc;

pub const DEFAULT_GIFT_CARD_AMOUNT: f64 = 10.0;

/// Which contact fields a redemption request must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecipientRequirement {
    /// At least one of e-mail and phone.
    Any,
    /// Both e-mail and phone.
    #[default]
    Both,
}

impl RecipientRequirement {
    pub fn is_satisfied_by(self, recipient: &RecipientIdentity) -> bool {
        match self {
            RecipientRequirement::Any => !recipient.is_empty(),
            RecipientRequirement::Both => recipient.is_complete(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    redeemer: Arc<dyn Redeemer>,
    notifier: Option<Arc<dyn FulfillmentNotifier>>,
    gift_card_amount: f64,
    recipient_requirement: RecipientRequirement,
}

impl AppState {
    pub fn new(redeemer: Arc<dyn Redeemer>) -> Self {
        Self {
            redeemer,
            notifier: None,
            gift_card_amount: DEFAULT_GIFT_CARD_AMOUNT,
            recipient_requirement: RecipientRequirement::default(),
        }
    }

    /// Enables gift-card delivery after each successful redemption.
    pub fn with_notifier(mut self, notifier: Arc<dyn FulfillmentNotifier>, amount: f64) -> Self {
        self.notifier = Some(notifier);
        self.gift_card_amount = amount;
        self
    }

    pub fn with_recipient_requirement(mut self, requirement: RecipientRequirement) -> Self {
        self.recipient_requirement = requirement;
        self
    }

    pub fn redeemer(&self) -> &dyn Redeemer {
        self.redeemer.as_ref()
    }

    pub fn notifier(&self) -> Option<&dyn FulfillmentNotifier> {
        self.notifier.as_deref()
    }

    pub fn gift_card_amount(&self) -> f64 {
        self.gift_card_amount
    }

    pub fn recipient_requirement(&self) -> RecipientRequirement {
        self.recipient_requirement
    }
}
