use crate::error::{AppError, Result};
use crate::model::{RedeemRequest, RedeemResponse};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use giftcode_core::{FulfillmentOutcome, RecipientIdentity, RedeemParams, RedemptionCode};
use tracing::{debug, info, warn};

pub async fn redeem_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RedeemRequest>, JsonRejection>,
) -> Result<Json<RedeemResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        debug!(error = %rejection, "rejected redeem body");
        AppError::BadRequest(rejection.body_text())
    })?;

    let recipient = RecipientIdentity::new(request.recipient_email, request.recipient_phone);
    let code = request
        .code
        .as_deref()
        .and_then(RedemptionCode::lookup)
        .ok_or(AppError::MissingFields)?;
    if !state.recipient_requirement().is_satisfied_by(&recipient) {
        return Err(AppError::MissingFields);
    }

    let record = state
        .redeemer()
        .redeem(RedeemParams {
            code: code.clone(),
            recipient,
            metadata: request.metadata,
        })
        .await?;

    let Some(notifier) = state.notifier() else {
        return Ok(Json(RedeemResponse::ok(format!(
            "Code {code} redeemed successfully!"
        ))));
    };

    let amount = state.gift_card_amount();
    let outcome = notifier
        .notify(&record.recipient, amount, &gift_card_message(&code))
        .await;

    let message = match outcome {
        FulfillmentOutcome::Delivered { account } => {
            info!(code = %code, account = %account, amount, "gift card sent");
            format!(
                "Code {code} redeemed successfully! A ${amount:.2} gift card has been sent to your email."
            )
        }
        other => {
            warn!(
                code = %code,
                email = ?record.recipient.email,
                phone = ?record.recipient.phone,
                outcome = %other,
                "code redeemed but gift card was not sent; needs manual follow-up"
            );
            format!(
                "Code {code} redeemed successfully! However, there was an issue sending your gift card. Please contact support."
            )
        }
    };

    Ok(Json(RedeemResponse::ok(message)))
}

fn gift_card_message(code: &RedemptionCode) -> String {
    format!("Congratulations! Your redemption code {code} has been processed. Enjoy your gift card!")
}
