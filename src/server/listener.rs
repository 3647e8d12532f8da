use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{Instrument, info, warn};

use crate::config::Config;
use crate::http::connection::Connection;
use crate::server::router::Router;
use crate::storage::FileStore;

/// Pause after a failed accept so a descriptor shortage does not spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Prepares the web root and serves until the task is dropped.
pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let store = FileStore::from_config(&cfg.storage);
    store
        .ensure_root()
        .await
        .context("failed to prepare web root")?;

    let listener = bind(cfg).await?;
    info!(
        root = %store.root().display(),
        "Listening on {}",
        listener.local_addr()?
    );

    let router = Arc::new(
        Router::new(store, cfg.server.body_mode).with_idle_timeout(cfg.read_timeout()),
    );
    serve(listener, router, cfg.read_timeout()).await
}

pub async fn bind(cfg: &Config) -> anyhow::Result<TcpListener> {
    let addr = cfg.listen_addr();
    TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))
}

/// Accept loop: every connection gets its own task and is never shared.
///
/// A failing connection only ends its own task.
pub async fn serve(
    listener: TcpListener,
    router: Arc<Router>,
    read_timeout: Option<Duration>,
) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "Failed to accept connection");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };
        tracing::debug!("Accepted connection from {}", peer);

        let router = Arc::clone(&router);
        let span = tracing::info_span!("conn", %peer);
        tokio::spawn(
            async move {
                let mut conn = Connection::new(socket, router, read_timeout);
                if let Err(e) = conn.run().await {
                    warn!("Connection error: {:#}", e);
                }
            }
            .instrument(span),
        );
    }
}
