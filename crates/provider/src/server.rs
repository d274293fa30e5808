//! HTTP surface of the provider
//!
//! `GET /latest_block` answers 200 with the snapshot, 404 when nothing has
//! been persisted yet and a server error when the store cannot be read.
//! Error bodies are `{"error": "..."}` and never carry internal details.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use blockview_config::ServerConfig;
use serde::Serialize;
use serde_json::json;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::ProviderError;
use crate::provider::SnapshotProvider;

/// Builds the provider router.
pub fn router(provider: SnapshotProvider, cors_enabled: bool) -> Router {
    let router = Router::new()
        .route("/latest_block", get(latest_block))
        .route("/healthz", get(healthz))
        .with_state(provider)
        .layer(TraceLayer::new_for_http());

    if cors_enabled {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

async fn latest_block(State(provider): State<SnapshotProvider>) -> Response {
    match provider.get_latest_snapshot().await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(err) => err.into_response(),
    }
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    version: &'static str,
    backend: &'static str,
}

async fn healthz(State(provider): State<SnapshotProvider>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        backend: provider.backend_name(),
    })
}

impl IntoResponse for ProviderError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ProviderError::NotFound => (StatusCode::NOT_FOUND, "No data found"),
            ProviderError::UpstreamUnavailable { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "Datastore unavailable")
            }
            ProviderError::InvalidRecord(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "An error occurred")
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Bound provider server
pub struct ProviderServer {
    listener: TcpListener,
    router: Router,
}

impl ProviderServer {
    /// Binds the configured address.
    pub async fn bind(config: &ServerConfig, provider: SnapshotProvider) -> io::Result<Self> {
        let listener = TcpListener::bind(config.listen_address()).await?;
        Ok(Self {
            listener,
            router: router(provider, config.cors_enabled),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let address = self.local_addr()?;
        info!(target: "blockview", %address, "snapshot provider listening");
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;
        info!(target: "blockview", "snapshot provider stopped");
        Ok(())
    }
}
