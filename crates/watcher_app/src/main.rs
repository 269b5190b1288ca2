mod cli;
mod logging;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use engine_logging::{engine_error, engine_info, engine_warn};
use watcher_core::{fatal_message, NetworkExtractor};
use watcher_engine::{
    ChromeRenderer, ContentFetcher, HttpRenderer, HttpSettings, LogChannel, Monitor,
    NotificationChannel, Notifier, Renderer, SnapshotFile, StartupError, TelegramChannel,
};

use cli::{Cli, RendererKind};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::initialize(logging::parse_level(&cli.log_level), cli.log_file.as_deref());
    engine_info!("Watching {} every {} ms", cli.url, cli.interval_ms);

    let mut notifier = Notifier::new(build_channel(&cli), cli.notifier_settings());

    let (fetcher, extractor) = match prepare(&cli).await {
        Ok(parts) => parts,
        Err(err) => {
            engine_error!("Cannot start: {}", err);
            notifier.send(&fatal_message(&err.to_string())).await;
            return Err(err).context("startup failed");
        }
    };
    let settings = cli.monitor_settings();
    let fetch = cli.fetch_settings();
    if !settings.covers(&fetch) {
        engine_warn!(
            "Cycle timeout {:?} is shorter than the fetch retry budget {:?}; slow pages will report a cycle timeout instead of a fetch error",
            settings.cycle_timeout,
            fetch.worst_case()
        );
    }
    let monitor = Monitor::new(Box::new(fetcher), extractor, notifier, settings);
    let monitor = match &cli.state_file {
        Some(path) => monitor.with_persistence(SnapshotFile::new(path)),
        None => monitor,
    };

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            shutdown.cancel();
        }
    });

    monitor.run(shutdown).await;
    Ok(())
}

fn build_channel(cli: &Cli) -> Box<dyn NotificationChannel> {
    let Some(settings) = cli.telegram_settings() else {
        engine_warn!("Telegram token or chat id missing; notifications go to the log only");
        return Box::new(LogChannel);
    };
    match TelegramChannel::new(settings) {
        Ok(channel) => Box::new(channel),
        Err(err) => {
            engine_warn!("Telegram unavailable ({}); notifications go to the log only", err);
            Box::new(LogChannel)
        }
    }
}

/// Validates configuration and checks the rendering engine can run at all.
async fn prepare(cli: &Cli) -> Result<(ContentFetcher, NetworkExtractor), StartupError> {
    let renderer: Arc<dyn Renderer> = match cli.renderer {
        RendererKind::Chrome => Arc::new(ChromeRenderer::new(cli.chrome_settings())),
        RendererKind::Http => Arc::new(HttpRenderer::new(HttpSettings::default())?),
    };
    renderer.probe().await?;

    let fetcher = ContentFetcher::new(renderer, cli.fetch_settings())?;
    let extractor = NetworkExtractor::new(cli.extraction_rules())?;
    Ok((fetcher, extractor))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            engine_warn!("Ctrl+C handler unavailable: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                engine_warn!("SIGTERM handler unavailable: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => engine_info!("Received Ctrl+C, shutting down"),
        _ = terminate => engine_info!("Received terminate signal, shutting down"),
    }
}
