use anyhow::anyhow;
use clap::{Args, Parser, Subcommand, ValueEnum};
use giftcode_issuance::generator::random::{DEFAULT_LENGTH, DEFAULT_PREFIX};
use jiff::civil::Date;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const STORAGE_BACKEND_ENV: &str = "GIFTCODE_STORAGE_BACKEND";
pub const DATABASE_URL_ENV: &str = "GIFTCODE_DATABASE_URL";
pub const SUPABASE_URL_ENV: &str = "SUPABASE_URL";
pub const SUPABASE_KEY_ENV: &str = "SUPABASE_KEY";
pub const TABLE_ENV: &str = "GIFTCODE_TABLE";

pub const DEFAULT_TABLE: &str = "gift_codes";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "postgres")]
    Postgres,
    #[value(name = "postgrest")]
    Postgrest,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::Postgres => write!(f, "postgres"),
            StorageBackendArg::Postgrest => write!(f, "postgrest"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "giftcode-admin", about = "Issue and manage gift codes")]
pub struct CLI {
    /// Record store for `upload`, `set-expiry`, `distribute` and `reset`.
    #[arg(long, global = true, env = STORAGE_BACKEND_ENV, value_enum)]
    pub storage: Option<StorageBackendArg>,

    #[arg(long, global = true, env = DATABASE_URL_ENV)]
    pub database_url: Option<String>,

    #[arg(long, global = true, env = SUPABASE_URL_ENV)]
    pub supabase_url: Option<String>,

    #[arg(long, global = true, env = SUPABASE_KEY_ENV, hide_env_values = true)]
    pub supabase_key: Option<String>,

    #[arg(long, global = true, env = TABLE_ENV, default_value = DEFAULT_TABLE)]
    pub table: String,

    #[command(subcommand)]
    pub command: Command,
}

impl CLI {
    /// The backend store commands write to. There is no default.
    pub fn store_backend(&self) -> anyhow::Result<StorageBackendArg> {
        self.storage.ok_or_else(|| {
            anyhow!("--storage (or {STORAGE_BACKEND_ENV}) is required: postgres or postgrest")
        })
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate random codes into a file (or stdout).
    Generate(GenerateArgs),
    #[command(flatten)]
    Store(StoreCommand),
}

/// Commands that operate on the record store.
#[derive(Debug, Subcommand)]
pub enum StoreCommand {
    /// Insert codes from a file, one per line.
    Upload(UploadArgs),
    /// Set the expiry date of unredeemed codes in a serial range.
    SetExpiry(SetExpiryArgs),
    /// Record who a range of unredeemed codes was handed to.
    Distribute(DistributeArgs),
    /// Return a redeemed code to the unredeemed state (testing only).
    Reset(ResetArgs),
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    #[arg(long, default_value_t = 100)]
    pub count: usize,

    #[arg(long, default_value = DEFAULT_PREFIX)]
    pub prefix: String,

    #[arg(long, default_value_t = DEFAULT_LENGTH)]
    pub length: usize,

    /// Output file; codes are printed to stdout when omitted.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Append to the output file instead of truncating it.
    #[arg(long, requires = "output")]
    pub append: bool,
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// File with one code per line. Blank lines and `#` comments are skipped.
    pub file: PathBuf,

    /// Face value in dollars recorded on every code.
    #[arg(long)]
    pub card_value: Option<f64>,

    /// JSON object stored as metadata on every code.
    #[arg(long)]
    pub metadata: Option<String>,
}

#[derive(Debug, Args)]
pub struct SerialRangeArgs {
    /// First serial number, inclusive.
    #[arg(long)]
    pub first: i64,

    /// Last serial number, inclusive.
    #[arg(long)]
    pub last: i64,
}

#[derive(Debug, Args)]
pub struct SetExpiryArgs {
    #[command(flatten)]
    pub range: SerialRangeArgs,

    /// Last valid day, `YYYY-MM-DD`.
    #[arg(long)]
    pub date: Date,
}

#[derive(Debug, Args)]
pub struct DistributeArgs {
    #[command(flatten)]
    pub range: SerialRangeArgs,

    /// Shop, partner or person receiving the codes.
    #[arg(long = "to")]
    pub distributed_to: String,
}

#[derive(Debug, Args)]
pub struct ResetArgs {
    pub code: String,
}
