mod cli;

use crate::cli::{StorageBackendArg, CLI};
use clap::Parser;
use giftcode_core::{ExpiryPolicy, FulfillmentNotifier, Repository};
use giftcode_fulfillment::{CleanCloudClient, CleanCloudConfig, FundingAccounts, GiftCardNotifier};
use giftcode_gateway::{App, AppState};
use giftcode_redemption::RedemptionService;
use giftcode_storage::{InMemoryRepository, PostgresRepository, PostgrestConfig, PostgrestRepository};
use jiff::SignedDuration;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CLI::try_parse()?;

    init_tracing(config.log_json);

    info!(
        listen_addr = %config.listen_addr,
        storage_backend = %config.storage,
        recipient_requirement = ?config.recipient_requirement,
        validity_days = ?config.validity_days,
        "starting gift-code gateway"
    );

    let notifier = build_notifier(&config)?;

    match config.storage {
        StorageBackendArg::InMemory => {
            warn!("in-memory storage: codes are lost on restart");
            run_server(&config, InMemoryRepository::new(), notifier).await?;
        }
        StorageBackendArg::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or("database url is required when storage backend is postgres")?;
            let repository = PostgresRepository::connect(database_url).await?;
            repository.ensure_schema().await?;
            run_server(&config, repository, notifier).await?;
        }
        StorageBackendArg::Postgrest => {
            let url = config
                .supabase_url
                .clone()
                .ok_or("supabase url is required when storage backend is postgrest")?;
            let key = config
                .supabase_key
                .clone()
                .ok_or("supabase key is required when storage backend is postgrest")?;
            let mut postgrest = PostgrestConfig::new(url, key);
            postgrest.table = config.table.clone();
            run_server(&config, PostgrestRepository::new(postgrest)?, notifier).await?;
        }
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_notifier(
    config: &CLI,
) -> Result<Option<Arc<dyn FulfillmentNotifier>>, Box<dyn std::error::Error>> {
    let Some(token) = config.cleancloud_api_token.as_deref() else {
        warn!("CLEANCLOUD_API_TOKEN not set; codes will be redeemed without sending gift cards");
        return Ok(None);
    };

    let accounts = match (
        &config.gift_card_source_accounts_file,
        &config.gift_card_source_accounts,
    ) {
        (Some(path), _) => FundingAccounts::from_file(path)?,
        (None, Some(list)) => FundingAccounts::from_list(list),
        (None, None) => FundingAccounts::default(),
    };
    if accounts.is_empty() {
        warn!("no gift card funding accounts configured; every delivery will be unavailable");
    } else {
        info!(accounts = accounts.len(), "loaded gift card funding accounts");
    }

    let client = CleanCloudClient::new(
        CleanCloudConfig::new(token).with_api_url(config.cleancloud_api_url.as_str()),
    )?;
    Ok(Some(Arc::new(GiftCardNotifier::new(client, accounts))))
}

async fn run_server<R: Repository>(
    config: &CLI,
    repository: R,
    notifier: Option<Arc<dyn FulfillmentNotifier>>,
) -> std::io::Result<()> {
    let expiry_policy = match config.validity_days {
        Some(days) => ExpiryPolicy::ValidFor(SignedDuration::from_hours(i64::from(days) * 24)),
        None => ExpiryPolicy::StoredOnly,
    };
    let service = RedemptionService::new(repository).with_expiry_policy(expiry_policy);

    let mut state = AppState::new(Arc::new(service))
        .with_recipient_requirement(config.recipient_requirement.into());
    if let Some(notifier) = notifier {
        state = state.with_notifier(notifier, config.gift_card_amount);
    }

    let router = match &config.static_dir {
        Some(dir) => App::router_with_static(state, dir),
        None => App::router(state),
    };

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "gateway listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for shutdown signal");
            }
        })
        .await
}
