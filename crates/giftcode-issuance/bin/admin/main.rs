mod cli;

use crate::cli::{Command, GenerateArgs, StorageBackendArg, StoreCommand, UploadArgs, CLI};
use anyhow::{anyhow, bail, Context};
use clap::Parser;
use giftcode_core::{AdminRepository, Metadata, RedemptionCode};
use giftcode_issuance::{generate_batch, IssuanceService, RandomCodeGenerator};
use giftcode_storage::{PostgresRepository, PostgrestConfig, PostgrestRepository};
use jiff::Timestamp;
use std::io::Write;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = CLI::parse();

    let backend = config.store_backend();
    let command = match config.command {
        Command::Generate(args) => return generate(args),
        Command::Store(command) => command,
    };

    let backend = backend?;
    info!(storage_backend = %backend, "connecting to record store");

    match backend {
        StorageBackendArg::Postgres => {
            let database_url = config
                .database_url
                .ok_or_else(|| anyhow!("database url is required when storage backend is postgres"))?;
            let repository = PostgresRepository::connect(&database_url).await?;
            repository.ensure_schema().await?;
            run(repository, command).await
        }
        StorageBackendArg::Postgrest => {
            let (url, key) = config
                .supabase_url
                .zip(config.supabase_key)
                .ok_or_else(|| anyhow!("SUPABASE_URL and SUPABASE_KEY are required when storage backend is postgrest"))?;
            let mut postgrest = PostgrestConfig::new(url, key);
            postgrest.table = config.table;
            run(PostgrestRepository::new(postgrest)?, command).await
        }
    }
}

fn generate(args: GenerateArgs) -> anyhow::Result<()> {
    let generator = RandomCodeGenerator::new(args.prefix, args.length);
    let codes = generate_batch(&generator, args.count);

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .append(args.append)
                .truncate(!args.append)
                .open(path)
                .with_context(|| format!("failed to open {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };
    for code in &codes {
        writeln!(out, "{code}")?;
    }
    out.flush()?;

    info!(count = codes.len(), "generated codes");
    Ok(())
}

async fn run<R: AdminRepository>(repository: R, command: StoreCommand) -> anyhow::Result<()> {
    let service = IssuanceService::new(repository);

    match command {
        StoreCommand::Upload(args) => {
            let (codes, metadata) = read_upload(&args)?;
            let issued = service.issue(codes, args.card_value, metadata).await?;
            if let (Some(first), Some(last)) = (issued.first(), issued.last()) {
                info!(
                    count = issued.len(),
                    first_serial = ?first.serial_number,
                    last_serial = ?last.serial_number,
                    "uploaded codes"
                );
            }
        }
        StoreCommand::SetExpiry(args) => {
            service
                .update_expiry(args.range.first..=args.range.last, args.date)
                .await?;
        }
        StoreCommand::Distribute(args) => {
            service
                .distribute(
                    args.range.first..=args.range.last,
                    &args.distributed_to,
                    Timestamp::now(),
                )
                .await?;
        }
        StoreCommand::Reset(args) => {
            let code = RedemptionCode::lookup(&args.code)
                .ok_or_else(|| anyhow!("code must not be blank"))?;
            if !service.reset(&code).await? {
                bail!("code '{code}' not found");
            }
        }
    }

    Ok(())
}

fn read_upload(args: &UploadArgs) -> anyhow::Result<(Vec<RedemptionCode>, Option<Metadata>)> {
    let contents = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    let codes = contents
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line_no, line)| {
            RedemptionCode::new(line)
                .with_context(|| format!("{}:{line_no}", args.file.display()))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let metadata = args
        .metadata
        .as_deref()
        .map(|raw| match serde_json::from_str::<serde_json::Value>(raw)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(anyhow!("metadata must be a JSON object")),
        })
        .transpose()?;

    Ok((codes, metadata))
}
