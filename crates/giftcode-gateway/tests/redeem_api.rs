use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use giftcode_core::{
    AdminRepository, FulfillmentNotifier, FulfillmentOutcome, NewGiftCode, ReadRepository,
    RecipientIdentity, RedemptionCode, RedemptionRecord, StorageError,
};
use giftcode_gateway::model::RedeemResponse;
use giftcode_gateway::{App, AppState, RecipientRequirement};
use giftcode_redemption::RedemptionService;
use giftcode_storage::InMemoryRepository;
use jiff::civil::date;
use serde_json::{json, Value};
use tower::ServiceExt;

/// Records every call and answers with a fixed outcome.
struct StubNotifier {
    outcome: FulfillmentOutcome,
    calls: Mutex<Vec<(RecipientIdentity, f64, String)>>,
}

impl StubNotifier {
    fn new(outcome: FulfillmentOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl FulfillmentNotifier for StubNotifier {
    async fn notify(
        &self,
        recipient: &RecipientIdentity,
        amount: f64,
        message: &str,
    ) -> FulfillmentOutcome {
        self.calls
            .lock()
            .unwrap()
            .push((recipient.clone(), amount, message.to_owned()));
        self.outcome.clone()
    }
}

async fn repository() -> Arc<InMemoryRepository> {
    let repo = InMemoryRepository::new();
    let mut expired = NewGiftCode::new(RedemptionCode::new("GFT-OLD").unwrap());
    expired.expiry_date = Some(date(2000, 1, 1));
    repo.insert_many(vec![
        NewGiftCode::new(RedemptionCode::new("GFT-ABC123").unwrap()),
        expired,
    ])
    .await
    .unwrap();
    Arc::new(repo)
}

fn app(repo: Arc<InMemoryRepository>, configure: impl FnOnce(AppState) -> AppState) -> Router {
    let service = RedemptionService::new(SharedRepository(repo));
    App::router(configure(AppState::new(Arc::new(service))))
}

/// Lets a test keep a handle on the store the service writes to.
struct SharedRepository(Arc<InMemoryRepository>);

#[async_trait]
impl ReadRepository for SharedRepository {
    async fn get(
        &self,
        code: &RedemptionCode,
    ) -> giftcode_core::repository::Result<Option<giftcode_core::RedemptionRecord>> {
        self.0.get(code).await
    }
}

#[async_trait]
impl giftcode_core::Repository for SharedRepository {
    async fn redeem_if_unredeemed(
        &self,
        code: &RedemptionCode,
        redemption: giftcode_core::Redemption,
    ) -> giftcode_core::repository::Result<Option<giftcode_core::RedemptionRecord>> {
        self.0.redeem_if_unredeemed(code, redemption).await
    }
}

/// A store whose backend is down.
struct UnavailableRepository;

#[async_trait]
impl ReadRepository for UnavailableRepository {
    async fn get(
        &self,
        _code: &RedemptionCode,
    ) -> giftcode_core::repository::Result<Option<RedemptionRecord>> {
        Err(StorageError::Unavailable("connection refused".into()))
    }
}

#[async_trait]
impl giftcode_core::Repository for UnavailableRepository {
    async fn redeem_if_unredeemed(
        &self,
        _code: &RedemptionCode,
        _redemption: giftcode_core::Redemption,
    ) -> giftcode_core::repository::Result<Option<RedemptionRecord>> {
        Err(StorageError::Unavailable("connection refused".into()))
    }
}

async fn post_redeem(app: Router, body: Body) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/redeem")
                .header(header::CONTENT_TYPE, "application/json")
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn redeem_body(value: Value) -> Body {
    Body::from(value.to_string())
}

fn abc123() -> Body {
    redeem_body(json!({
        "code": "GFT-ABC123",
        "recipient_email": "a@b.com",
        "recipient_phone": "555"
    }))
}

#[tokio::test]
async fn health() {
    let response = app(repository().await, |s| s)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(serde_json::from_slice::<Value>(&bytes).unwrap(), json!({ "status": "ok" }));
}

#[tokio::test]
async fn redeem_without_fulfillment() {
    let repo = repository().await;

    let (status, body) = post_redeem(app(repo.clone(), |s| s), abc123()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "success": true, "message": "Code GFT-ABC123 redeemed successfully!" })
    );
    let stored = repo
        .get(&RedemptionCode::new("GFT-ABC123").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(stored.is_redeemed());
    assert_eq!(stored.recipient.phone.as_deref(), Some("555"));
}

#[tokio::test]
async fn second_redeem_is_a_server_error() {
    let repo = repository().await;
    let router = app(repo, |s| s);

    let (status, _) = post_redeem(router.clone(), abc123()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_redeem(router, abc123()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let response: RedeemResponse = serde_json::from_value(body).unwrap();
    assert!(!response.success);
    assert!(response
        .message
        .starts_with("Server error: Code 'GFT-ABC123' has already been redeemed on "));
}

#[tokio::test]
async fn unknown_and_expired_codes() {
    let router = app(repository().await, |s| s);

    let (status, body) = post_redeem(
        router.clone(),
        redeem_body(json!({ "code": "GFT-NOPE", "recipient_email": "a@b.com", "recipient_phone": "555" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], json!("Server error: Code 'GFT-NOPE' not found in database."));

    let (status, body) = post_redeem(
        router,
        redeem_body(json!({ "code": "GFT-OLD", "recipient_email": "a@b.com", "recipient_phone": "555" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], json!("Server error: Code 'GFT-OLD' has expired on 2000-01-01."));
}

#[tokio::test]
async fn missing_fields_are_rejected() {
    let router = app(repository().await, |s| s);
    let expected = json!({ "success": false, "message": "Missing code or recipient information" });

    for body in [
        json!({ "recipient_email": "a@b.com", "recipient_phone": "555" }),
        json!({ "code": "  ", "recipient_email": "a@b.com", "recipient_phone": "555" }),
        json!({ "code": "GFT-ABC123", "recipient_email": "a@b.com" }),
        json!({ "code": "GFT-ABC123", "recipient_email": "", "recipient_phone": "555" }),
    ] {
        let (status, response) = post_redeem(router.clone(), redeem_body(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response, expected);
    }
}

#[tokio::test]
async fn any_requirement_accepts_a_single_contact_field() {
    let router = app(repository().await, |s| {
        s.with_recipient_requirement(RecipientRequirement::Any)
    });

    let (status, _) = post_redeem(
        router,
        redeem_body(json!({ "code": "GFT-ABC123", "recipient_email": "a@b.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let router = app(repository().await, |s| s);

    let (status, body) = post_redeem(router, Body::from("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn delivered_gift_card_is_reported() {
    let notifier = StubNotifier::new(FulfillmentOutcome::Delivered {
        account: "414".into(),
    });
    let router = app(repository().await, |s| s.with_notifier(notifier.clone(), 10.0));

    let (status, body) = post_redeem(router, abc123()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        json!("Code GFT-ABC123 redeemed successfully! A $10.00 gift card has been sent to your email.")
    );
    let calls = notifier.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0.email.as_deref(), Some("a@b.com"));
    assert_eq!(calls[0].1, 10.0);
    assert!(calls[0].2.contains("GFT-ABC123"));
}

#[tokio::test]
async fn failed_fulfillment_still_succeeds() {
    let notifier = StubNotifier::new(FulfillmentOutcome::Declined {
        reason: "card declined".into(),
    });
    let router = app(repository().await, |s| s.with_notifier(notifier, 10.0));

    let (status, body) = post_redeem(router, abc123()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(
        body["message"],
        json!("Code GFT-ABC123 redeemed successfully! However, there was an issue sending your gift card. Please contact support.")
    );
}

#[tokio::test]
async fn notifier_is_not_called_when_redemption_fails() {
    let notifier = StubNotifier::new(FulfillmentOutcome::Delivered {
        account: "414".into(),
    });
    let router = app(repository().await, |s| s.with_notifier(notifier.clone(), 10.0));

    let (status, _) = post_redeem(
        router,
        redeem_body(json!({ "code": "GFT-OLD", "recipient_email": "a@b.com", "recipient_phone": "555" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(notifier.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn cors_preflight_is_allowed() {
    let response = app(repository().await, |s| s)
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/redeem")
                .header(header::ORIGIN, "https://shop.example.com")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn unusual_unknown_codes_are_not_found() {
    let router = app(repository().await, |s| s);
    let long = "A".repeat(65);

    for code in ["GFT.ABC", "GFT ABC", long.as_str()] {
        let (status, body) = post_redeem(
            router.clone(),
            redeem_body(json!({ "code": code, "recipient_email": "a@b.com", "recipient_phone": "555" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({ "success": false, "message": format!("Server error: Code '{code}' not found in database.") })
        );
    }
}

#[tokio::test]
async fn stored_code_outside_the_generated_alphabet_is_redeemable() {
    let repo = repository().await;
    repo.seed(RedemptionRecord::issued(
        RedemptionCode::new_unchecked("PROMO.2025"),
        jiff::Timestamp::now(),
    ));

    let (status, body) = post_redeem(
        app(repo.clone(), |s| s),
        redeem_body(json!({ "code": " PROMO.2025 ", "recipient_email": "a@b.com", "recipient_phone": "555" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Code PROMO.2025 redeemed successfully!"));
    let stored = repo
        .get(&RedemptionCode::new_unchecked("PROMO.2025"))
        .await
        .unwrap()
        .unwrap();
    assert!(stored.is_redeemed());
}

#[tokio::test]
async fn store_outage_is_a_server_error() {
    let service = RedemptionService::new(UnavailableRepository);
    let router = App::router(AppState::new(Arc::new(service)));

    let (status, body) = post_redeem(router, abc123()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], json!(false));
    assert_eq!(
        body["message"],
        json!("Server error: record store error: storage backend unavailable: connection refused")
    );
}
