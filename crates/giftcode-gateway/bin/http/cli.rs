use clap::{Parser, ValueEnum};
use giftcode_fulfillment::cleancloud::DEFAULT_API_URL;
use giftcode_gateway::RecipientRequirement;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const LISTEN_ADDR_ENV: &str = "GIFTCODE_LISTEN_ADDR";
pub const STORAGE_BACKEND_ENV: &str = "GIFTCODE_STORAGE_BACKEND";
pub const DATABASE_URL_ENV: &str = "GIFTCODE_DATABASE_URL";
pub const SUPABASE_URL_ENV: &str = "SUPABASE_URL";
pub const SUPABASE_KEY_ENV: &str = "SUPABASE_KEY";
pub const TABLE_ENV: &str = "GIFTCODE_TABLE";
pub const VALIDITY_DAYS_ENV: &str = "GIFTCODE_VALIDITY_DAYS";
pub const RECIPIENT_REQUIREMENT_ENV: &str = "GIFTCODE_RECIPIENT_REQUIREMENT";
pub const CLEANCLOUD_API_TOKEN_ENV: &str = "CLEANCLOUD_API_TOKEN";
pub const CLEANCLOUD_API_URL_ENV: &str = "CLEANCLOUD_API_URL";
pub const GIFT_CARD_AMOUNT_ENV: &str = "GIFT_CARD_AMOUNT";
pub const SOURCE_ACCOUNTS_ENV: &str = "GIFT_CARD_SOURCE_ACCOUNTS";
pub const SOURCE_ACCOUNTS_FILE_ENV: &str = "GIFT_CARD_SOURCE_ACCOUNTS_FILE";
pub const STATIC_DIR_ENV: &str = "GIFTCODE_STATIC_DIR";
pub const LOG_JSON_ENV: &str = "GIFTCODE_LOG_JSON";

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_TABLE: &str = "gift_codes";
pub const DEFAULT_GIFT_CARD_AMOUNT: &str = "10.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "postgres")]
    Postgres,
    #[value(name = "postgrest")]
    Postgrest,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Postgres => write!(f, "postgres"),
            StorageBackendArg::Postgrest => write!(f, "postgrest"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RecipientRequirementArg {
    /// E-mail or phone.
    #[value(name = "any")]
    Any,
    /// E-mail and phone.
    #[value(name = "both")]
    Both,
}

impl From<RecipientRequirementArg> for RecipientRequirement {
    fn from(arg: RecipientRequirementArg) -> Self {
        match arg {
            RecipientRequirementArg::Any => RecipientRequirement::Any,
            RecipientRequirementArg::Both => RecipientRequirement::Both,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "giftcode-gateway")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = DATABASE_URL_ENV, required_if_eq("storage", "postgres"))]
    pub database_url: Option<String>,

    #[arg(long, env = SUPABASE_URL_ENV, required_if_eq("storage", "postgrest"))]
    pub supabase_url: Option<String>,

    #[arg(
        long,
        env = SUPABASE_KEY_ENV,
        hide_env_values = true,
        required_if_eq("storage", "postgrest")
    )]
    pub supabase_key: Option<String>,

    #[arg(long, env = TABLE_ENV, default_value = DEFAULT_TABLE)]
    pub table: String,

    /// Days a code without a stored expiry date stays redeemable after issuance.
    #[arg(long, env = VALIDITY_DAYS_ENV)]
    pub validity_days: Option<u32>,

    #[arg(
        long,
        env = RECIPIENT_REQUIREMENT_ENV,
        value_enum,
        default_value_t = RecipientRequirementArg::Both
    )]
    pub recipient_requirement: RecipientRequirementArg,

    /// Gift cards are only sent when a token is configured.
    #[arg(long, env = CLEANCLOUD_API_TOKEN_ENV, hide_env_values = true)]
    pub cleancloud_api_token: Option<String>,

    #[arg(long, env = CLEANCLOUD_API_URL_ENV, default_value = DEFAULT_API_URL)]
    pub cleancloud_api_url: String,

    /// Dollar value of each gift card sent.
    #[arg(
        long,
        env = GIFT_CARD_AMOUNT_ENV,
        default_value = DEFAULT_GIFT_CARD_AMOUNT,
        value_parser = parse_gift_card_amount
    )]
    pub gift_card_amount: f64,

    /// Comma-separated funding accounts, tried in order.
    #[arg(long, env = SOURCE_ACCOUNTS_ENV, conflicts_with = "gift_card_source_accounts_file")]
    pub gift_card_source_accounts: Option<String>,

    /// File with one funding account per line.
    #[arg(long, env = SOURCE_ACCOUNTS_FILE_ENV)]
    pub gift_card_source_accounts_file: Option<PathBuf>,

    /// Directory served for paths outside the API.
    #[arg(long, env = STATIC_DIR_ENV)]
    pub static_dir: Option<PathBuf>,

    #[arg(long, env = LOG_JSON_ENV)]
    pub log_json: bool,
}

fn parse_gift_card_amount(raw: &str) -> Result<f64, String> {
    let amount: f64 = raw
        .trim()
        .parse()
        .map_err(|e| format!("not a number: {e}"))?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(format!("must be a positive amount, got {raw}"));
    }
    Ok(amount)
}
