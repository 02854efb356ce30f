//! docrelay gateway: receives documents over Telegram and relays their
//! converted text back into the chat as it is produced.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use docrelay_core::config::{ConverterMode, DocrelayConfig};
use docrelay_relay::ChunkSource;
use docrelay_telegram::TelegramAdapter;

#[derive(Parser, Debug)]
#[command(name = "docrelay-gateway")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "DOCRELAY_CONFIG")]
    config: Option<String>,

    /// Relay canned text instead of calling the conversion service
    #[arg(long)]
    synthetic: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "docrelay_gateway=info,docrelay_relay=info,docrelay_telegram=info".into()
            }),
        )
        .init();

    // load config: --config > DOCRELAY_CONFIG env > ~/.docrelay/docrelay.toml
    let args = Args::parse();
    let mut config =
        DocrelayConfig::extract(args.config.as_deref()).context("failed to load configuration")?;
    if args.synthetic {
        config.converter.mode = ConverterMode::Synthetic;
    }
    config.validate().context("invalid configuration")?;

    let source: Arc<dyn ChunkSource> = Arc::from(
        docrelay_convert::build_source(&config.converter)
            .context("failed to set up document converter")?,
    );
    info!(
        source = source.name(),
        limit = config.relay.limit,
        download_dir = %config.storage.download_dir,
        "docrelay starting"
    );

    let adapter = TelegramAdapter::new(&config.telegram, &config.relay, &config.storage, source)
        .context("failed to start Telegram adapter")?;
    adapter.run().await;

    info!("docrelay stopped");
    Ok(())
}
