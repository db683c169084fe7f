use anyhow::{Context, Result};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use league_notification_client::config::{LogFormat, LoggingConfig, Settings};
use league_notification_client::consumers::badge_label;
use league_notification_client::metrics::encode_metrics;
use league_notification_client::NotificationSession;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    // Initialize tracing
    init_tracing(&settings.logging);

    tracing::info!(
        api = %settings.api.base_url,
        push = %settings.push.base_url,
        "Configuration loaded"
    );

    let token = settings
        .auth
        .token
        .clone()
        .context("No access token configured (set LEAGUE__AUTH__TOKEN)")?;

    let mut session = NotificationSession::create(&settings, token)?;

    session.client().on_notification(|event| {
        tracing::info!(
            id = %event.id,
            notification_type = %event.notification_type,
            title = %event.title,
            message = %event.message,
            "New notification"
        );
    });

    let mut unread = session.unread().subscribe();
    let badge_task = tokio::spawn(async move {
        while unread.changed().await.is_ok() {
            let count = *unread.borrow_and_update();
            match badge_label(count) {
                Some(label) => tracing::info!(unread = count, badge = %label, "Unread notifications"),
                None => tracing::info!("No unread notifications"),
            }
        }
    });

    shutdown_signal().await;

    session.dispose();
    badge_task.abort();

    match encode_metrics() {
        Ok(text) => tracing::debug!(metrics = %text, "Final metrics snapshot"),
        Err(e) => tracing::warn!(error = %e, "Failed to encode metrics"),
    }

    tracing::info!("Client shutdown complete");
    Ok(())
}

fn init_tracing(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // JSON output for log aggregation, plain text otherwise
    let (json_layer, text_layer) = match config.format {
        LogFormat::Json => (
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            ),
            None,
        ),
        LogFormat::Text => (None, Some(tracing_subscriber::fmt::layer())),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, shutting down");
        }
    }
}
