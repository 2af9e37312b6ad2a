use std::net::SocketAddr;

use axum::{Router, routing::get};

use crate::{config::AppConfig, handlers};

pub struct PipecovServer {
    addr: SocketAddr,
    app: Router,
}

pub fn build_app() -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
}

pub struct ServerBuilder {
    addr: SocketAddr,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            addr: AppConfig::default().addr(),
        }
    }

    pub fn with_config(mut self, cfg: &AppConfig) -> Self {
        self.addr = cfg.addr();
        self
    }

    pub fn build(self) -> PipecovServer {
        PipecovServer {
            addr: self.addr,
            app: build_app(),
        }
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PipecovServer {
    /// Serves until a shutdown signal is received.
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
