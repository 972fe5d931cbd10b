//! isobridge - walkthrough of the continuation bridge and isolated domains
//!
//! # Overview
//!
//! This binary runs each piece of the library against the mock data source:
//! - Bridged lookups (found, not found) and their sequential and parallel
//!   composition ([`UserSourceExt`])
//! - A bank account whose balance lives in its own domain ([`BankAccount`])
//! - The UI domain and the three ways async work reaches it ([`UiBridge`])
//! - Debounced realtime search ([`SearchCoordinator`])
//!
//! The process uses two kinds of threads:
//! - **Tokio workers**: run every bridged operation and detached task
//! - **Domain executors**: one std::thread per isolated domain, named
//!   `domain-<name>`, owning that domain's state
//!
//! # Execution Flow
//!
//! 1. Load `isobridge.yaml` from `IsoBridge Data/`, apply `ISOBRIDGE__*` overrides
//! 2. Initialize logging → logs/isobridge.<date>
//! 3. Create tokio runtime with the configured worker threads
//! 4. Run the walkthrough
//! 5. Log metrics and shut down the runtime with a 5s timeout

use anyhow::Result;
use isobridge::metrics::BRIDGE_METRICS;
use isobridge::models::{Fixture, Settings};
use isobridge::services::{
    LegacyApiClient, MockSearchService, SearchCoordinator, UserSourceExt,
};
use isobridge::state::BankAccount;
use isobridge::ui::{UiBridge, patterns};
use isobridge::{APP_NAME, ConfigManager, VERSION};
use std::time::Duration;

fn main() -> Result<()> {
    let config_manager = ConfigManager::new("IsoBridge Data")?;
    let settings = config_manager.load_settings_with_env()?;

    // Hold the guard until exit so buffered log lines are flushed
    let _log_guard = isobridge::logging::setup_logging(&settings.logging)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(settings.runtime.worker_threads)
        .thread_name("isobridge-worker")
        .build()?;

    tracing::info!(
        "Tokio runtime initialized with {} worker threads",
        settings.runtime.worker_threads
    );

    let result = runtime.block_on(walkthrough(&settings));

    BRIDGE_METRICS.log_summary();

    // Give detached tasks a moment to finish
    runtime.shutdown_timeout(Duration::from_secs(5));

    if let Err(ref e) = result {
        tracing::error!("Walkthrough failed: {:#}", e);
    }

    tracing::info!("{} shutdown complete", APP_NAME);
    result
}

async fn walkthrough(settings: &Settings) -> Result<()> {
    let client = LegacyApiClient::new(
        Fixture::default(),
        settings.source.clone(),
        tokio::runtime::Handle::current(),
    );

    // Bridged lookups
    match client.fetch_user("user1").await {
        Ok(user) => tracing::info!("User found: {} <{}>", user.name, user.email),
        Err(e) => tracing::warn!("Lookup failed: {}", e),
    }
    match client.fetch_user("missing").await {
        Ok(user) => tracing::warn!("Unexpected user: {}", user.name),
        Err(e) => tracing::info!("Missing user: {}", e),
    }

    // Composition
    let (user, posts) = client.fetch_user_with_posts("user1").await?;
    tracing::info!("Sequential: {} has {} posts", user.name, posts.len());
    let (user, posts) = client.fetch_user_with_posts_parallel("user2").await?;
    tracing::info!("Parallel: {} has {} posts", user.name, posts.len());

    // Isolated account
    let account = BankAccount::with_capacity("account", 0, settings.runtime.queue_capacity)?;
    account.deposit(1000).await?;
    account.withdraw(300).await?;
    tracing::info!(
        "{}: balance {}",
        BankAccount::bank_info(),
        account.balance().await?
    );
    if let Err(e) = account.withdraw(5000).await {
        tracing::info!("Overdraft rejected: {}", e);
    }

    // UI domain
    let ui = UiBridge::with_capacity(
        tokio::runtime::Handle::current(),
        settings.runtime.queue_capacity,
    )?;
    let mut renders = ui.subscribe();

    patterns::hop_and_increment(&ui).await??;
    patterns::start_in_ui(&ui).await??;
    patterns::compute_then_apply(&ui).await??;
    patterns::load_user(&ui, &*client, "user3").await?;

    while let Ok(event) = renders.try_recv() {
        tracing::info!("Rendered {} #{}: {}", event.sink, event.frame, event.text);
    }

    // Realtime search
    let search = SearchCoordinator::with_capacity(
        MockSearchService::with_samples(settings.search.latency()),
        &settings.search,
        settings.runtime.queue_capacity,
    )?;
    let hits = search.search("swift").await?;
    for hit in &hits {
        tracing::info!("Search hit: {} ({})", hit.title, hit.category.label());
    }

    account.domain().metrics().log_summary(account.name());
    ui.domain().metrics().log_summary(ui.domain().name());

    Ok(())
}
