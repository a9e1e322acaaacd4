use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use homework_bot::config;
use homework_bot::notifier::TelegramNotifier;
use homework_bot::poller::Poller;
use homework_bot::practicum::PracticumClient;

#[derive(Debug, Parser)]
#[command(author, version, about = "Notify a Telegram chat when a homework review status changes")]
struct Args {
    /// Optional YAML settings file; secrets may also come from the environment
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log file, truncated on start
    #[arg(long, default_value = "homework.log")]
    log_file: PathBuf,
}

fn init_tracing(log_file: &Path) -> Result<()> {
    let file = File::create(log_file)
        .with_context(|| format!("failed to create log file {}", log_file.display()))?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("homework_bot=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .init();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_file)?;

    let cfg = match config::load(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(%err, "cannot start without configuration, exiting");
            std::process::exit(1);
        }
    };

    let api = PracticumClient::new(
        cfg.practicum.token.clone(),
        &cfg.practicum.endpoint,
        cfg.request_timeout(),
    )?;
    let notifier = TelegramNotifier::new(cfg.telegram.bot_token.clone());
    let poller = Poller::new(
        Box::new(api),
        Box::new(notifier),
        cfg.telegram.chat_id.clone(),
        cfg.retry_period(),
        chrono::Utc::now().timestamp(),
    );

    poller.run().await;
    Ok(())
}
