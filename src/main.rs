//! Mint Watcher - new-token discovery and drawdown alerts for a Solana wallet

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use mint_watcher::adapters::cli::{ChatIdCmd, CheckConfigCmd, CliApp, Command, RunCmd};
use mint_watcher::adapters::helius::{HeliusClient, HeliusConfig};
use mint_watcher::adapters::market_data::{
    DexScreenerClient, DexScreenerConfig, JupiterPriceClient, JupiterPriceConfig,
};
use mint_watcher::adapters::solana::{parse_commitment, SolanaClient};
use mint_watcher::adapters::telegram::{TelegramConfig, TelegramNotifier};
use mint_watcher::adapters::LogNotifier;
use mint_watcher::application::{messages, AlertSink, DiscoveryLoop, PriceLoop, Watcher};
use mint_watcher::config::loader::{LoggingSection, TelegramSection};
use mint_watcher::config::{load_config, Config, ConfigError, DiscoveryProvider, LogFormat, PriceProvider};
use mint_watcher::domain::{MintDetector, TokenRegistry};
use mint_watcher::ports::{ActivityFeed, MessageFormat, Notifier, PriceSource};

/// Longest single getUpdates long-poll
const CHAT_ID_POLL: Duration = Duration::from_secs(25);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (secrets go here, not in watcher.toml)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();

    match app.command {
        Command::Run(cmd) => {
            let config = read_config(&cmd.config)?;
            init_logging(app.verbose, app.debug, &config.logging)?;
            run_command(cmd, config).await
        }
        Command::ChatId(cmd) => {
            init_logging(app.verbose, app.debug, &LoggingSection::default())?;
            chat_id_command(cmd).await
        }
        Command::CheckConfig(cmd) => {
            init_logging(app.verbose, app.debug, &LoggingSection::default())?;
            check_config_command(cmd)
        }
    }
}

fn init_logging(verbose: bool, debug: bool, logging: &LoggingSection) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&logging.level))
            .with_context(|| format!("Invalid logging.level: {}", logging.level))?
    };

    let builder = fmt().with_env_filter(filter).with_target(false);
    match logging.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    }
    .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}

/// Expand `~` in the configured path
fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref())
}

fn read_config(path: &Path) -> Result<Config> {
    let path = expand_path(path);
    load_config(&path).with_context(|| format!("Failed to load configuration from {}", path.display()))
}

fn build_feed(config: &Config) -> Result<Arc<dyn ActivityFeed>> {
    let timeout = config.request_timeout();
    let feed: Arc<dyn ActivityFeed> = match config.discovery.provider {
        DiscoveryProvider::Helius => Arc::new(
            HeliusClient::new(HeliusConfig {
                api_url: config.helius.api_url.clone(),
                api_key: config.helius.api_key.clone(),
                timeout,
            })
            .context("Failed to create Helius client")?,
        ),
        DiscoveryProvider::Rpc => {
            let commitment = parse_commitment(&config.solana.commitment)?;
            Arc::new(SolanaClient::new(config.solana.rpc_url.clone(), commitment, timeout))
        }
    };
    Ok(feed)
}

fn build_price_source(config: &Config) -> Result<Arc<dyn PriceSource>> {
    let timeout = config.request_timeout();
    let prices: Arc<dyn PriceSource> = match config.price.provider {
        PriceProvider::Dexscreener => Arc::new(
            DexScreenerClient::new(DexScreenerConfig {
                api_url: config.dexscreener.api_url.clone(),
                chain_id: config.dexscreener.chain_id.clone(),
                timeout,
            })
            .context("Failed to create DexScreener client")?,
        ),
        PriceProvider::Jupiter => Arc::new(
            JupiterPriceClient::new(JupiterPriceConfig {
                api_url: config.jupiter.api_url.clone(),
                api_key: config.jupiter.api_key(),
                timeout,
            })
            .context("Failed to create Jupiter price client")?,
        ),
    };
    Ok(prices)
}

fn telegram_client(section: &TelegramSection, timeout: Duration) -> Result<TelegramNotifier> {
    TelegramNotifier::new(TelegramConfig {
        api_url: section.api_url.clone(),
        bot_token: section.bot_token.clone(),
        timeout,
    })
    .context("Failed to create Telegram client")
}

fn build_notifier(config: &Config, dry_run: bool) -> Result<Arc<dyn Notifier>> {
    if dry_run {
        return Ok(Arc::new(LogNotifier::new()));
    }
    Ok(Arc::new(telegram_client(&config.telegram, config.request_timeout())?))
}

/// Resolves on Ctrl+C, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn run_command(cmd: RunCmd, config: Config) -> Result<()> {
    config.validate(cmd.dry_run).context("Invalid configuration")?;
    info!("Starting mint watcher...");

    let feed = build_feed(&config)?;
    let prices = build_price_source(&config)?;
    let notifier = build_notifier(&config, cmd.dry_run)?;
    let sink = AlertSink::new(notifier, config.telegram.chat_id.clone());

    let registry = TokenRegistry::new();
    let detector = MintDetector::with_extra(&config.discovery.extra_patterns);
    let discovery = DiscoveryLoop::new(
        feed.clone(),
        registry.clone(),
        detector,
        sink.clone(),
        config.discovery_config(),
    );
    let price = PriceLoop::new(prices.clone(), registry.clone(), sink.clone(), config.price_monitor_config());
    let watcher = Watcher::new(discovery, price, registry)
        .with_intervals(config.discovery_interval(), config.price_interval());

    info!(
        wallet = %config.wallet.address,
        feed = feed.name(),
        prices = prices.name(),
        threshold_pct = config.price.drawdown_threshold_pct,
        "Watcher configured"
    );
    if cmd.dry_run {
        warn!("DRY RUN - notifications are logged, not sent");
    }

    if config.telegram.announce_startup {
        let greeting = messages::watcher_started(&config.wallet.address, config.price.drawdown_threshold_pct);
        sink.deliver(&greeting).await;
    }

    let handle = watcher.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received");
        handle.stop();
    });

    watcher.run().await;

    let status = watcher.status().await;
    info!(
        tracked = status.tracked_tokens,
        alerted = status.alerted_tokens,
        "Mint watcher stopped"
    );
    Ok(())
}

/// Telegram settings for `chat-id`; a missing config file falls back to the environment
fn chat_id_settings(path: &Path) -> Result<TelegramSection> {
    let path = expand_path(path);
    match load_config(&path) {
        Ok(config) => Ok(config.telegram),
        Err(ConfigError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "Config file not found, using TELEGRAM_BOT_TOKEN");
            Ok(TelegramSection {
                bot_token: std::env::var("TELEGRAM_BOT_TOKEN").unwrap_or_default(),
                ..TelegramSection::default()
            })
        }
        Err(e) => Err(e).with_context(|| format!("Failed to load configuration from {}", path.display())),
    }
}

async fn chat_id_command(cmd: ChatIdCmd) -> Result<()> {
    let section = chat_id_settings(&cmd.config)?;
    let client = telegram_client(&section, Duration::from_secs(10))?;
    let deadline = (cmd.timeout > 0).then(|| Instant::now() + Duration::from_secs(cmd.timeout));

    println!("Listening for messages. Send anything to the bot from the chat you want alerts in.");

    let mut offset: Option<i64> = None;
    loop {
        let poll = match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    break;
                }
                remaining.min(CHAT_ID_POLL)
            }
            None => CHAT_ID_POLL,
        };

        let updates = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            result = client.get_updates(offset, poll) => result,
        };

        match updates {
            Ok(updates) => {
                for update in updates {
                    offset = Some(update.update_id + 1);
                    let Some(message) = update.message else { continue };

                    let chat_id = message.chat.id.to_string();
                    println!("Chat ID: {} ({})", chat_id, message.chat.label());

                    let reply = format!("Your chat ID is: {}", chat_id);
                    if let Err(e) = client.send(&chat_id, &reply, MessageFormat::Plain).await {
                        warn!(chat_id = %chat_id, error = %e, "Failed to reply with chat id");
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "getUpdates failed, retrying");
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }

    Ok(())
}

fn check_config_command(cmd: CheckConfigCmd) -> Result<()> {
    let config = read_config(&cmd.config)?;
    config.validate(cmd.dry_run).context("Invalid configuration")?;

    println!("Configuration OK: {}", expand_path(&cmd.config).display());
    println!("  Wallet:     {}", config.wallet.address);
    println!(
        "  Discovery:  {:?} every {}s ({} per page, up to {} pages)",
        config.discovery.provider,
        config.discovery.poll_interval_secs,
        config.discovery.page_size,
        config.discovery.max_pages_per_cycle
    );
    println!(
        "  Prices:     {:?} every {}s ({} concurrent)",
        config.price.provider, config.price.poll_interval_secs, config.price.max_concurrent_fetches
    );
    println!("  Threshold:  {:.1}%", config.price.drawdown_threshold_pct);
    println!("  Patterns:   {} extra", config.discovery.extra_patterns.len());
    println!(
        "  Telegram:   {}",
        if config.telegram.bot_token.is_empty() { "not configured" } else { "configured" }
    );
    Ok(())
}
