// Signal engine entry point: bootstrap, then run the aggregator on a fixed interval.
use anyhow::{bail, Context};
use clap::Parser;
use engine::config::{ExchangeSettings, RetrySettings, SignalSettings, TelegramSettings};
use engine::data::csv_source::CsvOhlcvSource;
use engine::data::kucoin::KucoinClient;
use engine::data::OhlcvSource;
use engine::services::{MessageSender, Notifier, SignalAggregator, TelegramClient};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing::info;
use tracing_subscriber::EnvFilter;

const TEST_MESSAGE: &str = "This is a test message from your Crypto Signals Bot!";

#[derive(Parser, Debug)]
#[command(name = "signal-engine", about = "Computes crypto trading signals and posts them to Telegram")]
struct Cli {
    /// JSON file with trading pairs, risk parameters and indicator windows
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Run a single pass instead of scheduling
    #[arg(long)]
    once: bool,

    /// Read candles from <DIR>/<BASE>_<QUOTE>.csv instead of the exchange
    #[arg(long, value_name = "DIR")]
    replay_dir: Option<PathBuf>,

    /// Send a test message to the configured chat and exit. Uses the config file's
    /// notify retry settings when it can be read.
    #[arg(long)]
    test_message: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    info!("Starting signal engine...");

    let telegram = TelegramSettings::from_env().context("Telegram is not configured")?;
    let sender: Arc<dyn MessageSender> =
        Arc::new(TelegramClient::new(&telegram).context("Failed to create Telegram client")?);

    if cli.test_message {
        let retry = RetrySettings::from_file_or_default(&cli.config);
        let notifier = Notifier::new(sender, telegram.chat_id, retry.notify_retries, retry.notify_delay());
        if !notifier.send(TEST_MESSAGE).await.is_delivered() {
            bail!("Failed to send test message");
        }
        info!("Test message sent successfully.");
        return Ok(());
    }

    let settings = SignalSettings::from_file(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    settings.validate().context("Invalid configuration")?;
    info!(
        pairs = ?settings.trading_pairs,
        interval_secs = settings.signal_check_interval,
        "Loaded configuration"
    );

    let notifier = Notifier::new(
        sender,
        telegram.chat_id.clone(),
        settings.retry.notify_retries,
        settings.retry.notify_delay(),
    );
    let source: Arc<dyn OhlcvSource> = match &cli.replay_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "Replaying candles from CSV files");
            Arc::new(CsvOhlcvSource::new(dir))
        }
        None => {
            let exchange = ExchangeSettings::from_env();
            Arc::new(KucoinClient::new(&exchange).context("Failed to create KuCoin client")?)
        }
    };

    let interval = settings.check_interval();
    let aggregator = SignalAggregator::new(settings, source, notifier);

    if cli.once {
        let outcome = aggregator.run().await;
        info!(?outcome, "Run finished");
        return Ok(());
    }

    // Each run is awaited before the next tick, so runs never overlap.
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let outcome = aggregator.run().await;
                info!(?outcome, "Run finished");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down signal engine");
                break;
            }
        }
    }

    Ok(())
}
