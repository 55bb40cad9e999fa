use async_trait::async_trait;
use giftcode_core::repository::{AdminRepository, ReadRepository, Repository, Result};
use giftcode_core::{
    Metadata, NewGiftCode, RecipientIdentity, Redemption, RedemptionCode, RedemptionRecord,
    RedemptionStatus, StorageError,
};
use jiff::civil::Date;
use jiff::Timestamp;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use std::ops::RangeInclusive;
use tracing::{debug, trace};

/// DDL for the `gift_codes` table. Idempotent.
pub const SCHEMA: &str = include_str!("../ddl/postgres/gift_codes.sql");

/// Columns selected for every record, with timestamps flattened to epoch
/// microseconds and dates to ISO strings so they decode without extra
/// sqlx type features.
const RECORD_COLUMNS: &str = r#"
    code,
    serial_number,
    (EXTRACT(EPOCH FROM created_at) * 1000000)::BIGINT AS created_at_us,
    to_char(expiry_date, 'YYYY-MM-DD') AS expiry_date,
    is_redeemed,
    (EXTRACT(EPOCH FROM redeemed_at) * 1000000)::BIGINT AS redeemed_at_us,
    recipient_email,
    recipient_phone,
    metadata,
    card_value,
    distributed_to,
    (EXTRACT(EPOCH FROM distributed_at) * 1000000)::BIGINT AS distributed_at_us
"#;

/// Postgres implementation of the record store.
///
/// Redemption is a single `UPDATE ... WHERE is_redeemed = FALSE RETURNING`
/// statement, so the row predicate and the write are applied atomically by
/// the database even with many service instances sharing the table.
#[derive(Debug, Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a repository from an existing Postgres connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a repository by opening a new Postgres connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the `gift_codes` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn timestamp_to_micros(ts: Timestamp) -> i64 {
    ts.as_microsecond()
}

fn parse_timestamp(column: &str, micros: Option<i64>) -> Result<Option<Timestamp>> {
    micros
        .map(|value| {
            Timestamp::from_microsecond(value).map_err(|e| {
                StorageError::InvalidData(format!("invalid {column} timestamp '{value}': {e}"))
            })
        })
        .transpose()
}

fn parse_date(raw: Option<String>) -> Result<Option<Date>> {
    raw.map(|value| {
        value.parse::<Date>().map_err(|e| {
            StorageError::InvalidData(format!("invalid expiry_date '{value}': {e}"))
        })
    })
    .transpose()
}

fn metadata_from_json(value: Option<Json<serde_json::Value>>) -> Option<Metadata> {
    match value.map(|json| json.0) {
        Some(serde_json::Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn record_from_row(row: &PgRow) -> Result<RedemptionRecord> {
    let code: String = row.try_get("code").map_err(map_sqlx_error)?;
    let created_at = parse_timestamp(
        "created_at",
        row.try_get("created_at_us").map_err(map_sqlx_error)?,
    )?
    .ok_or_else(|| StorageError::InvalidData(format!("code '{code}' has no created_at")))?;
    let is_redeemed: bool = row.try_get("is_redeemed").map_err(map_sqlx_error)?;

    Ok(RedemptionRecord {
        status: RedemptionStatus::from_flag(is_redeemed),
        created_at,
        expiry_date: parse_date(row.try_get("expiry_date").map_err(map_sqlx_error)?)?,
        redeemed_at: parse_timestamp(
            "redeemed_at",
            row.try_get("redeemed_at_us").map_err(map_sqlx_error)?,
        )?,
        recipient: RecipientIdentity {
            email: row.try_get("recipient_email").map_err(map_sqlx_error)?,
            phone: row.try_get("recipient_phone").map_err(map_sqlx_error)?,
        },
        metadata: metadata_from_json(row.try_get("metadata").map_err(map_sqlx_error)?),
        serial_number: row.try_get("serial_number").map_err(map_sqlx_error)?,
        card_value: row.try_get("card_value").map_err(map_sqlx_error)?,
        distributed_to: row.try_get("distributed_to").map_err(map_sqlx_error)?,
        distributed_at: parse_timestamp(
            "distributed_at",
            row.try_get("distributed_at_us").map_err(map_sqlx_error)?,
        )?,
        code: RedemptionCode::new_unchecked(code),
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl ReadRepository for PostgresRepository {
    async fn get(&self, code: &RedemptionCode) -> Result<Option<RedemptionRecord>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM gift_codes WHERE code = $1 LIMIT 1");

        let row = sqlx::query(&sql)
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(record_from_row).transpose()
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn redeem_if_unredeemed(
        &self,
        code: &RedemptionCode,
        redemption: Redemption,
    ) -> Result<Option<RedemptionRecord>> {
        let sql = format!(
            r#"
            UPDATE gift_codes
            SET is_redeemed = TRUE,
                redeemed_at = TIMESTAMPTZ 'epoch' + $2 * INTERVAL '1 microsecond',
                recipient_email = $3,
                recipient_phone = $4,
                metadata = $5
            WHERE code = $1
              AND is_redeemed = FALSE
            RETURNING {RECORD_COLUMNS}
            "#
        );

        let row = sqlx::query(&sql)
            .bind(code.as_str())
            .bind(timestamp_to_micros(redemption.redeemed_at))
            .bind(redemption.recipient.email)
            .bind(redemption.recipient.phone)
            .bind(redemption.metadata.map(Json))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if row.is_none() {
            trace!(code = %code, "conditional update matched no unredeemed row");
        }

        row.as_ref().map(record_from_row).transpose()
    }
}

#[async_trait]
impl AdminRepository for PostgresRepository {
    async fn insert_many(&self, codes: Vec<NewGiftCode>) -> Result<Vec<RedemptionRecord>> {
        let sql = format!(
            r#"
            INSERT INTO gift_codes (code, card_value, expiry_date, metadata)
            VALUES ($1, $2, $3::DATE, $4)
            RETURNING {RECORD_COLUMNS}
            "#
        );

        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        let mut inserted = Vec::with_capacity(codes.len());

        for new_code in codes {
            let result = sqlx::query(&sql)
                .bind(new_code.code.as_str())
                .bind(new_code.card_value)
                .bind(new_code.expiry_date.map(|date| date.to_string()))
                .bind(new_code.metadata.map(Json))
                .fetch_one(&mut *tx)
                .await;

            match result {
                Ok(row) => inserted.push(record_from_row(&row)?),
                Err(err) if is_unique_violation(&err) => {
                    return Err(StorageError::Conflict(new_code.code.to_string()));
                }
                Err(err) => return Err(map_sqlx_error(err)),
            }
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        debug!(count = inserted.len(), "inserted gift codes");
        Ok(inserted)
    }

    async fn update_expiry(&self, serials: RangeInclusive<i64>, expiry_date: Date) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE gift_codes
            SET expiry_date = $1::DATE
            WHERE serial_number BETWEEN $2 AND $3
              AND is_redeemed = FALSE
            "#,
        )
        .bind(expiry_date.to_string())
        .bind(*serials.start())
        .bind(*serials.end())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn distribute(
        &self,
        serials: RangeInclusive<i64>,
        distributed_to: &str,
        distributed_at: Timestamp,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE gift_codes
            SET distributed_to = $1,
                distributed_at = TIMESTAMPTZ 'epoch' + $2 * INTERVAL '1 microsecond'
            WHERE serial_number BETWEEN $3 AND $4
              AND is_redeemed = FALSE
            "#,
        )
        .bind(distributed_to)
        .bind(timestamp_to_micros(distributed_at))
        .bind(*serials.start())
        .bind(*serials.end())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn reset(&self, code: &RedemptionCode) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE gift_codes
            SET is_redeemed = FALSE,
                redeemed_at = NULL,
                recipient_email = NULL,
                recipient_phone = NULL
            WHERE code = $1
            "#,
        )
        .bind(code.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_round_trip_through_micros() {
        let ts: Timestamp = "2025-07-04T22:10:00.123456Z".parse().unwrap();
        let micros = timestamp_to_micros(ts);
        assert_eq!(parse_timestamp("redeemed_at", Some(micros)).unwrap(), Some(ts));
        assert_eq!(parse_timestamp("redeemed_at", None).unwrap(), None);
    }

    #[test]
    fn malformed_dates_are_invalid_data() {
        let err = parse_date(Some("31/12/2025".to_owned())).unwrap_err();
        assert!(matches!(err, StorageError::InvalidData(_)));
        assert_eq!(
            parse_date(Some("2025-12-31".to_owned())).unwrap(),
            Some(jiff::civil::date(2025, 12, 31))
        );
    }

    #[test]
    fn only_json_objects_become_metadata() {
        let object = serde_json::json!({ "source": "web" });
        assert!(metadata_from_json(Some(Json(object))).is_some());
        assert!(metadata_from_json(Some(Json(serde_json::Value::Null))).is_none());
        assert!(metadata_from_json(None).is_none());
    }
}
