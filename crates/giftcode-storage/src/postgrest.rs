use async_trait::async_trait;
use giftcode_core::repository::{AdminRepository, ReadRepository, Repository, Result};
use giftcode_core::{
    Metadata, NewGiftCode, RecipientIdentity, Redemption, RedemptionCode, RedemptionRecord,
    RedemptionStatus, StorageError,
};
use jiff::civil::Date;
use jiff::Timestamp;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::ops::RangeInclusive;
use std::time::Duration;
use tracing::{debug, trace};

pub const DEFAULT_TABLE: &str = "gift_codes";

/// Settings for a PostgREST endpoint (e.g. a Supabase project).
#[derive(Debug, Clone)]
pub struct PostgrestConfig {
    /// Project URL, without the `/rest/v1` suffix.
    pub url: String,
    /// Service key sent as both `apikey` and bearer token.
    pub api_key: String,
    pub table: String,
    pub timeout: Duration,
}

impl PostgrestConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            table: DEFAULT_TABLE.to_owned(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Record store backed by a PostgREST HTTP API.
///
/// Redemption is issued as a filtered `PATCH` (`code=eq.X&is_redeemed=eq.false`)
/// with `Prefer: return=representation`; PostgREST turns it into a single
/// conditional `UPDATE`, and an empty representation means no row matched.
#[derive(Debug, Clone)]
pub struct PostgrestRepository {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

/// Row shape as returned by PostgREST.
#[derive(Debug, Deserialize)]
struct GiftCodeRow {
    code: String,
    #[serde(alias = "uploaded_at")]
    created_at: Timestamp,
    #[serde(default)]
    expiry_date: Option<Date>,
    #[serde(default)]
    is_redeemed: bool,
    #[serde(default)]
    redeemed_at: Option<Timestamp>,
    #[serde(default)]
    recipient_email: Option<String>,
    #[serde(default)]
    recipient_phone: Option<String>,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
    #[serde(default)]
    serial_number: Option<i64>,
    #[serde(default)]
    card_value: Option<f64>,
    #[serde(default)]
    distributed_to: Option<String>,
    #[serde(default)]
    distributed_at: Option<Timestamp>,
}

impl From<GiftCodeRow> for RedemptionRecord {
    fn from(row: GiftCodeRow) -> Self {
        let metadata = match row.metadata {
            Some(serde_json::Value::Object(map)) => Some(map),
            _ => None,
        };
        RedemptionRecord {
            code: RedemptionCode::new_unchecked(row.code),
            status: RedemptionStatus::from_flag(row.is_redeemed),
            created_at: row.created_at,
            expiry_date: row.expiry_date,
            redeemed_at: row.redeemed_at,
            recipient: RecipientIdentity {
                email: row.recipient_email,
                phone: row.recipient_phone,
            },
            metadata,
            serial_number: row.serial_number,
            card_value: row.card_value,
            distributed_to: row.distributed_to,
            distributed_at: row.distributed_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct RedeemPatch<'a> {
    is_redeemed: bool,
    redeemed_at: Timestamp,
    recipient_email: Option<&'a str>,
    recipient_phone: Option<&'a str>,
    metadata: Option<&'a Metadata>,
}

#[derive(Debug, Serialize)]
struct InsertRow<'a> {
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    card_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expiry_date: Option<Date>,
    metadata: Option<&'a Metadata>,
}

#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl PostgrestRepository {
    pub fn new(config: PostgrestConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(map_reqwest_error)?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/rest/v1/{}",
                config.url.trim_end_matches('/'),
                config.table
            ),
            api_key: config.api_key,
        })
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, &self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
    }

    async fn send(&self, request: RequestBuilder) -> Result<Vec<GiftCodeRow>> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<PostgrestErrorBody>(&body)
                .ok()
                .and_then(|parsed| parsed.message)
                .unwrap_or(body);
            return Err(map_status(status, message));
        }

        response
            .json::<Vec<GiftCodeRow>>()
            .await
            .map_err(|e| StorageError::InvalidData(format!("unexpected PostgREST response: {e}")))
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

fn map_status(status: StatusCode, message: String) -> StorageError {
    match status {
        StatusCode::CONFLICT => StorageError::Conflict(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => StorageError::Timeout(message),
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => {
            StorageError::Unavailable(message)
        }
        _ => StorageError::Query(format!("HTTP {status}: {message}")),
    }
}

fn map_reqwest_error(err: reqwest::Error) -> StorageError {
    let message = err.to_string();
    if err.is_timeout() {
        StorageError::Timeout(message)
    } else if err.is_connect() || err.is_request() {
        StorageError::Unavailable(message)
    } else if err.is_decode() {
        StorageError::InvalidData(message)
    } else {
        StorageError::Operation(message)
    }
}

#[async_trait]
impl ReadRepository for PostgrestRepository {
    async fn get(&self, code: &RedemptionCode) -> Result<Option<RedemptionRecord>> {
        let request = self
            .request(Method::GET)
            .query(&[("select", "*".to_owned()), ("code", eq(code))]);

        let rows = self.send(request).await?;
        Ok(rows.into_iter().next().map(RedemptionRecord::from))
    }
}

#[async_trait]
impl Repository for PostgrestRepository {
    async fn redeem_if_unredeemed(
        &self,
        code: &RedemptionCode,
        redemption: Redemption,
    ) -> Result<Option<RedemptionRecord>> {
        let patch = RedeemPatch {
            is_redeemed: true,
            redeemed_at: redemption.redeemed_at,
            recipient_email: redemption.recipient.email.as_deref(),
            recipient_phone: redemption.recipient.phone.as_deref(),
            metadata: redemption.metadata.as_ref(),
        };
        let request = self
            .request(Method::PATCH)
            .query(&[("code", eq(code)), ("is_redeemed", eq(false))])
            .json(&patch);

        let rows = self.send(request).await?;
        if rows.is_empty() {
            trace!(code = %code, "conditional update matched no unredeemed row");
        }
        Ok(rows.into_iter().next().map(RedemptionRecord::from))
    }
}

#[async_trait]
impl AdminRepository for PostgrestRepository {
    async fn insert_many(&self, codes: Vec<NewGiftCode>) -> Result<Vec<RedemptionRecord>> {
        let body: Vec<InsertRow<'_>> = codes
            .iter()
            .map(|new_code| InsertRow {
                code: new_code.code.as_str(),
                card_value: new_code.card_value,
                expiry_date: new_code.expiry_date,
                metadata: new_code.metadata.as_ref(),
            })
            .collect();

        let rows = self.send(self.request(Method::POST).json(&body)).await?;
        debug!(count = rows.len(), "inserted gift codes");
        Ok(rows.into_iter().map(RedemptionRecord::from).collect())
    }

    async fn update_expiry(&self, serials: RangeInclusive<i64>, expiry_date: Date) -> Result<u64> {
        let request = self
            .request(Method::PATCH)
            .query(&serial_range_filter(&serials))
            .json(&json!({ "expiry_date": expiry_date }));

        Ok(self.send(request).await?.len() as u64)
    }

    async fn distribute(
        &self,
        serials: RangeInclusive<i64>,
        distributed_to: &str,
        distributed_at: Timestamp,
    ) -> Result<u64> {
        let request = self
            .request(Method::PATCH)
            .query(&serial_range_filter(&serials))
            .json(&json!({
                "distributed_to": distributed_to,
                "distributed_at": distributed_at,
            }));

        Ok(self.send(request).await?.len() as u64)
    }

    async fn reset(&self, code: &RedemptionCode) -> Result<bool> {
        let request = self
            .request(Method::PATCH)
            .query(&[("code", eq(code))])
            .json(&json!({
                "is_redeemed": false,
                "recipient_email": null,
                "recipient_phone": null,
                "redeemed_at": null,
            }));

        Ok(!self.send(request).await?.is_empty())
    }
}

/// Filter for unredeemed codes whose serial falls in `serials`.
fn serial_range_filter(serials: &RangeInclusive<i64>) -> [(&'static str, String); 3] {
    [
        ("serial_number", format!("gte.{}", serials.start())),
        ("serial_number", format!("lte.{}", serials.end())),
        ("is_redeemed", eq(false)),
    ]
}
