use std::sync::Arc;
use std::time::Duration;

use giftcode_core::{
    NewGiftCode, RecipientIdentity, Redemption, RedemptionCode, RedemptionStatus,
};
use giftcode_storage::{
    AdminRepository, PostgresRepository, ReadRepository, Repository, StorageError,
};
use giftcode_test_infra::postgres::PostgresServer;
use jiff::civil::date;
use jiff::Timestamp;
use sqlx::postgres::PgPoolOptions;

struct Fixture {
    _postgres: PostgresServer,
    repo: PostgresRepository,
}

impl Fixture {
    async fn start() -> Self {
        let postgres = PostgresServer::start()
            .await
            .expect("start postgres");
        let url = postgres.database_url().await.expect("postgres url");
        let pool = connect_with_retry(&url).await;

        let repo = PostgresRepository::new(pool);
        repo.ensure_schema().await.expect("create schema");

        Self {
            _postgres: postgres,
            repo,
        }
    }

    async fn issue(&self, codes: &[&str]) {
        self.repo
            .insert_many(codes.iter().map(|c| NewGiftCode::new(code(c))).collect())
            .await
            .unwrap();
    }
}

async fn connect_with_retry(url: &str) -> sqlx::PgPool {
    let mut last_error = None;

    for _ in 0..20 {
        match PgPoolOptions::new().max_connections(16).connect(url).await {
            Ok(pool) => return pool,
            Err(err) => {
                last_error = Some(err);
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }

    panic!("failed to connect postgres: {last_error:?}");
}

fn code(value: &str) -> RedemptionCode {
    RedemptionCode::new_unchecked(value)
}

fn redemption(email: &str) -> Redemption {
    let mut metadata = serde_json::Map::new();
    metadata.insert("source".into(), serde_json::json!("web"));
    Redemption {
        redeemed_at: "2025-07-04T22:10:00.123456Z".parse().unwrap(),
        recipient: RecipientIdentity::new(Some(email.to_owned()), Some("555".to_owned())),
        metadata: Some(metadata),
    }
}

#[tokio::test]
async fn insert_and_get_issued_code() {
    let fixture = Fixture::start().await;
    let mut new_code = NewGiftCode::new(code("GFT-ABC123"));
    new_code.card_value = Some(5.0);
    new_code.expiry_date = Some(date(2025, 12, 31));

    fixture.repo.insert_many(vec![new_code]).await.unwrap();

    let got = fixture.repo.get(&code("GFT-ABC123")).await.unwrap().unwrap();
    assert_eq!(got.status, RedemptionStatus::Unredeemed);
    assert_eq!(got.card_value, Some(5.0));
    assert_eq!(got.expiry_date, Some(date(2025, 12, 31)));
    assert!(got.serial_number.is_some());
    assert!(got.redeemed_at.is_none());
}

#[tokio::test]
async fn get_unknown_code_returns_none() {
    let fixture = Fixture::start().await;
    assert!(fixture.repo.get(&code("nope")).await.unwrap().is_none());
}

#[tokio::test]
async fn insert_conflicts_when_code_already_exists() {
    let fixture = Fixture::start().await;
    fixture.issue(&["GFT-1"]).await;

    let err = fixture
        .repo
        .insert_many(vec![NewGiftCode::new(code("GFT-2")), NewGiftCode::new(code("GFT-1"))])
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::Conflict(_)));
    assert!(fixture.repo.get(&code("GFT-2")).await.unwrap().is_none());
}

#[tokio::test]
async fn conditional_update_round_trips_redemption_fields() {
    let fixture = Fixture::start().await;
    fixture.issue(&["GFT-ABC123"]).await;

    let updated = fixture
        .repo
        .redeem_if_unredeemed(&code("GFT-ABC123"), redemption("a@b.com"))
        .await
        .unwrap()
        .unwrap();

    let stored = fixture.repo.get(&code("GFT-ABC123")).await.unwrap().unwrap();
    assert_eq!(stored, updated);
    assert_eq!(stored.status, RedemptionStatus::Redeemed);
    assert_eq!(
        stored.redeemed_at,
        Some("2025-07-04T22:10:00.123456Z".parse::<Timestamp>().unwrap())
    );
    assert_eq!(stored.recipient.email.as_deref(), Some("a@b.com"));
    assert_eq!(
        stored.metadata.unwrap().get("source"),
        Some(&serde_json::json!("web"))
    );
}

#[tokio::test]
async fn conditional_update_does_not_touch_redeemed_rows() {
    let fixture = Fixture::start().await;
    fixture.issue(&["GFT-1"]).await;

    let first = fixture
        .repo
        .redeem_if_unredeemed(&code("GFT-1"), redemption("a@b.com"))
        .await
        .unwrap()
        .unwrap();
    let second = fixture
        .repo
        .redeem_if_unredeemed(&code("GFT-1"), redemption("c@d.com"))
        .await
        .unwrap();

    assert!(second.is_none());
    let stored = fixture.repo.get(&code("GFT-1")).await.unwrap().unwrap();
    assert_eq!(stored.recipient.email.as_deref(), Some("a@b.com"));
    assert_eq!(stored.redeemed_at, first.redeemed_at);
}

#[tokio::test]
async fn concurrent_conditional_updates_have_one_winner() {
    let fixture = Fixture::start().await;
    fixture.issue(&["GFT-RACE"]).await;
    let repo = Arc::new(fixture.repo.clone());

    let mut handles = vec![];
    for i in 0..16 {
        let repo = Arc::clone(&repo);
        handles.push(tokio::spawn(async move {
            repo.redeem_if_unredeemed(&code("GFT-RACE"), redemption(&format!("u{i}@b.com")))
                .await
                .unwrap()
                .is_some()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn range_updates_only_touch_unredeemed_codes() {
    let fixture = Fixture::start().await;
    let issued = fixture
        .repo
        .insert_many(
            ["GFT-1", "GFT-2", "GFT-3"]
                .iter()
                .map(|c| NewGiftCode::new(code(c)))
                .collect(),
        )
        .await
        .unwrap();
    let first = issued[0].serial_number.unwrap();
    let last = issued[2].serial_number.unwrap();

    fixture
        .repo
        .redeem_if_unredeemed(&code("GFT-2"), redemption("a@b.com"))
        .await
        .unwrap();

    let updated = fixture
        .repo
        .update_expiry(first..=last, date(2026, 1, 31))
        .await
        .unwrap();
    assert_eq!(updated, 2);

    let distributed = fixture
        .repo
        .distribute(first..=last, "Seven-Eleven", Timestamp::now())
        .await
        .unwrap();
    assert_eq!(distributed, 2);

    let redeemed = fixture.repo.get(&code("GFT-2")).await.unwrap().unwrap();
    assert_eq!(redeemed.expiry_date, None);
    assert_eq!(redeemed.distributed_to, None);
}

#[tokio::test]
async fn reset_clears_redemption() {
    let fixture = Fixture::start().await;
    fixture.issue(&["GFT-1"]).await;
    fixture
        .repo
        .redeem_if_unredeemed(&code("GFT-1"), redemption("a@b.com"))
        .await
        .unwrap();

    assert!(fixture.repo.reset(&code("GFT-1")).await.unwrap());
    let stored = fixture.repo.get(&code("GFT-1")).await.unwrap().unwrap();
    assert_eq!(stored.status, RedemptionStatus::Unredeemed);
    assert!(stored.redeemed_at.is_none());
    assert!(stored.recipient.is_empty());

    assert!(!fixture.repo.reset(&code("nope")).await.unwrap());
}
