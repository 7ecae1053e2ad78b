use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{body::Bytes, extract::State, http::StatusCode, routing::post, Router};
use teloxide::prelude::*;
use teloxide::types::Update;
use teloxide::update_listeners::Polling;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::bot::Session;
use crate::config::{Mode, RunConfig};
use crate::dispatch::UpdateRouter;
use crate::error::{ConfigError, TransportError};
use crate::handlers;

/// Long-poll wait per getUpdates request.
pub const POLL_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the session and routes, then block in the configured run mode
/// until shut down.
pub async fn serve(config: RunConfig) -> Result<()> {
    let table = handlers::dispatch_table()?;
    info!("Registered {} handlers", table.len());

    let session = Arc::new(Session::create(&config).await?);
    let router = Arc::new(UpdateRouter::new(
        table,
        session.clone(),
        session.username(),
        config.admin_id,
    ));

    if let Some(admin_id) = config.admin_id {
        session
            .notify_admin(admin_id, &format!("Bot started in {} mode.", config.mode))
            .await;
    }

    match config.mode {
        Mode::Polling => run_polling(session.bot().clone(), router)
            .await
            .context("polling stopped with an error")?,
        Mode::Webhook => {
            let url = config
                .webhook_url
                .clone()
                .ok_or(ConfigError::MissingWebhookUrl)?;
            run_webhook(&config.bind_addr(), url, session.bot(), router)
                .await
                .context("webhook server stopped with an error")?
        }
    }

    Ok(())
}

/// Pull updates until Ctrl-C. Updates from one chat are handled in order.
pub async fn run_polling(bot: Bot, router: Arc<UpdateRouter>) -> Result<(), TransportError> {
    // getUpdates is refused while a webhook is registered
    bot.delete_webhook().await.map_err(TransportError::Polling)?;

    let listener = Polling::builder(bot.clone()).timeout(POLL_TIMEOUT).build();

    info!("Bot started in polling mode.");

    Dispatcher::builder(bot, dptree::entry().endpoint(route_update))
        .dependencies(dptree::deps![router])
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    info!("Polling stopped");
    Ok(())
}

async fn route_update(update: Update, router: Arc<UpdateRouter>) -> ResponseResult<()> {
    router.dispatch(&update).await;
    Ok(())
}

/// Serve the webhook endpoint until Ctrl-C or SIGTERM, then let in-flight
/// requests finish.
pub async fn run_webhook(
    addr: &str,
    url: Url,
    bot: &Bot,
    router: Arc<UpdateRouter>,
) -> Result<(), TransportError> {
    let path = webhook_path(&url);
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| TransportError::Bind {
            addr: addr.to_string(),
            source,
        })?;

    bot.set_webhook(url.clone())
        .await
        .map_err(TransportError::RegisterWebhook)?;

    info!(
        "Bot webhook listening on {}{} (public: {})",
        addr, path, url
    );

    axum::serve(listener, webhook_app(router, &path))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(TransportError::Serve)?;

    info!("Webhook server stopped");
    Ok(())
}

/// The HTTP path Telegram will POST to, taken from the public URL.
pub fn webhook_path(url: &Url) -> String {
    match url.path() {
        "" => "/".to_string(),
        path => path.to_string(),
    }
}

pub fn webhook_app(router: Arc<UpdateRouter>, path: &str) -> Router {
    Router::new()
        .route(path, post(receive_update))
        .with_state(router)
}

/// Always answers 200: a malformed payload would only be redelivered.
async fn receive_update(State(router): State<Arc<UpdateRouter>>, body: Bytes) -> StatusCode {
    match serde_json::from_slice::<Update>(&body) {
        Ok(update) => {
            let outcome = router.dispatch(&update).await;
            if let Some(classifier) = outcome.classifier() {
                debug!("Webhook update {} handled by {}", update.id.0, classifier);
            }
        }
        Err(e) => warn!("Discarding malformed update: {}", e),
    }
    StatusCode::OK
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
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

    info!("Shutdown signal received");
}
