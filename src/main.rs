use clap::Parser;
use tracing::{info, warn};

use feedhook::cli::{Cli, Commands};
use feedhook::config::Config;
use feedhook::domain::Notification;
use feedhook::errors::AppResult;
use feedhook::logging;
use feedhook::services::{
    preview, stats_service, CheckService, Notifier, Scheduler, Shutdown, StatsService,
    WebhookNotifier,
};
use feedhook::sources::HttpFeedFetcher;
use feedhook::storage::JsonStateStore;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> AppResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;
    let _log_guard = logging::init(&config.logging);

    let store = JsonStateStore::new(&config.storage.state_file);

    match cli.command() {
        Commands::Run => cmd_run(&config, store),
        Commands::Once { dry_run: true } => cmd_dry_run(&config, &store),
        Commands::Once { dry_run: false } => cmd_once(&config, store),
        Commands::Test => cmd_test(&config),
        Commands::Stats => cmd_stats(store),
        Commands::Reset => cmd_reset(store),
    }
}

fn build_notifier(config: &Config) -> AppResult<WebhookNotifier> {
    let endpoint = config.webhook.endpoint()?;
    Ok(WebhookNotifier::new(&endpoint, &config.webhook, &config.http)?)
}

fn build_fetcher(config: &Config) -> HttpFeedFetcher {
    HttpFeedFetcher::new(config.http.timeout(), &config.http.user_agent)
}

fn build_scheduler(
    config: &Config,
    store: JsonStateStore,
    shutdown: Shutdown,
) -> AppResult<Scheduler<HttpFeedFetcher, WebhookNotifier, JsonStateStore>> {
    let service = CheckService::new(
        build_fetcher(config),
        build_notifier(config)?,
        store,
        config.feeds.clone(),
        config.schedule.max_items_per_check,
    )
    .with_retention_days(config.storage.retention_days);

    Ok(Scheduler::new(service, config.schedule.interval(), shutdown))
}

fn cmd_run(config: &Config, store: JsonStateStore) -> AppResult<()> {
    if config.feeds.is_empty() {
        warn!("No feeds configured, nothing will be checked");
    }

    let mut state = store.load_or_default();
    let shutdown = Shutdown::new();
    shutdown.listen_for_signals()?;

    let scheduler = build_scheduler(config, store, shutdown)?;
    scheduler.run_forever(&mut state);
    Ok(())
}

fn cmd_once(config: &Config, store: JsonStateStore) -> AppResult<()> {
    if config.feeds.is_empty() {
        println!("No feeds configured.");
        return Ok(());
    }

    let mut state = store.load_or_default();
    let scheduler = build_scheduler(config, store, Shutdown::new())?;
    let report = scheduler.run_once(&mut state);

    println!(
        "Checked {} feeds ({} failed): {} new, {} notified, {} failed, {} deferred.",
        report.feeds_checked + report.feeds_failed,
        report.feeds_failed,
        report.new_entries,
        report.notified,
        report.failed,
        report.deferred
    );
    Ok(())
}

fn cmd_dry_run(config: &Config, store: &JsonStateStore) -> AppResult<()> {
    if config.feeds.is_empty() {
        println!("No feeds configured.");
        return Ok(());
    }

    let state = store.load_or_default();
    let fetcher = build_fetcher(config);

    println!("Fetching feeds...\n");
    let results = preview(
        &fetcher,
        &config.feeds,
        &state,
        config.schedule.max_items_per_check,
    );

    if results.is_empty() {
        println!("No new listings to notify.");
        return Ok(());
    }

    let mut total = 0;
    for (feed, selection) in &results {
        println!("{} ({} new listings):", feed.name, selection.to_notify.len());
        for entry in &selection.to_notify {
            println!("  [DRY RUN] {}", Notification::from_entry(feed, entry).format());
        }
        if selection.deferred > 0 {
            println!("  ... {} older listings left for a later check", selection.deferred);
        }
        println!();
        total += selection.to_notify.len();
    }

    println!("Dry run complete. Would notify {} listings.", total);
    Ok(())
}

fn cmd_test(config: &Config) -> AppResult<()> {
    let notifier = build_notifier(config)?;

    println!("Testing webhook connection...");
    notifier.test_connection()?;
    println!("Webhook test succeeded.");
    Ok(())
}

fn cmd_stats(store: JsonStateStore) -> AppResult<()> {
    let stats = StatsService::new(store).stats()?;
    print!("{}", stats_service::render(&stats));
    Ok(())
}

fn cmd_reset(store: JsonStateStore) -> AppResult<()> {
    StatsService::new(store).reset()?;
    info!("Seen listings cleared");
    println!("State reset.");
    Ok(())
}
