use std::sync::Arc;

use {
    secrecy::{ExposeSecret, Secret},
    serenity::Client,
    tokio::sync::mpsc,
    tracing::{info, warn},
};

use connecty_relay::{self as relay, RelayService};

use crate::handler::RelayHandler;

/// Connect to the Discord gateway and relay until Ctrl-C.
///
/// Returns early with an error if the service's setup routine fails on the
/// first ready event (for example when a configured channel does not exist or
/// the bot lacks Manage Webhooks there).
pub async fn run(
    token: &Secret<String>,
    service: Arc<RelayService>,
    legacy_discriminator_filter: bool,
) -> anyhow::Result<()> {
    if token.expose_secret().is_empty() {
        anyhow::bail!("discord bot token is required");
    }

    let (setup_tx, mut setup_rx) = mpsc::unbounded_channel();
    let handler = RelayHandler::new(service)
        .with_legacy_discriminator_filter(legacy_discriminator_filter)
        .with_setup_failures(setup_tx);

    let mut client = Client::builder(token.expose_secret(), RelayHandler::intents())
        .event_handler(handler)
        .await?;
    let shard_manager = Arc::clone(&client.shard_manager);

    info!("connecting to discord gateway");
    tokio::select! {
        result = client.start() => result?,
        Some(err) = setup_rx.recv() => {
            shard_manager.shutdown_all().await;
            return Err(setup_failed(err));
        },
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!(error = %e, "failed to listen for ctrl-c");
            }
            info!("shutting down discord gateway");
            shard_manager.shutdown_all().await;
        },
    }

    Ok(())
}

/// Keeps the typed relay error and its sources in the chain.
fn setup_failed(err: relay::Error) -> anyhow::Error {
    anyhow::Error::new(err).context("relay setup failed")
}
