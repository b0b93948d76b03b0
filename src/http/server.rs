//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout)
//! - Hold the hot-swappable service state
//! - Apply configuration updates without dropping the listener
//! - Serve until the shutdown signal fires

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{routing::get, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServiceConfig;
use crate::delivery::ImageDelivery;
use crate::http::handlers::{demo_handler, image_handler, passthrough_handler};
use crate::http::request::{request_span, UuidRequestId};
use crate::lifecycle::shutdown::wait_for;
use crate::origin::OriginError;
use crate::variant::{RasterDeriver, VariantDeriver};

/// Errors starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build service state: {0}")]
    State(#[from] OriginError),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything a request needs, rebuilt on every config reload.
pub struct ServiceState {
    pub config: ServiceConfig,
    pub delivery: ImageDelivery,
    passthrough: HashMap<String, String>,
}

impl ServiceState {
    pub fn build(config: ServiceConfig, deriver: Arc<dyn VariantDeriver>) -> Result<Self, OriginError> {
        let delivery = ImageDelivery::from_config(&config, deriver)?;
        let passthrough = config
            .passthrough
            .iter()
            .map(|route| (route.path.clone(), route.identifier.clone()))
            .collect();

        Ok(Self {
            config,
            delivery,
            passthrough,
        })
    }

    /// Identifier proxied for a fixed path, if any.
    pub fn passthrough_identifier(&self, path: &str) -> Option<&str> {
        self.passthrough.get(path).map(String::as_str)
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<ArcSwap<ServiceState>>,
}

impl AppState {
    pub fn new(state: ServiceState) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(state)),
        }
    }

    /// Snapshot of the current state; stays valid across reloads.
    pub fn current(&self) -> Arc<ServiceState> {
        self.inner.load_full()
    }

    pub fn replace(&self, state: ServiceState) {
        self.inner.store(Arc::new(state));
    }
}

/// HTTP server for the image edge service.
pub struct HttpServer {
    router: Router,
    state: AppState,
    deriver: Arc<dyn VariantDeriver>,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a server using the built-in raster deriver.
    pub fn new(config: ServiceConfig) -> Result<Self, ServerError> {
        Self::with_deriver(config, Arc::new(RasterDeriver::new()))
    }

    /// Create a server with a custom variant deriver.
    pub fn with_deriver(config: ServiceConfig, deriver: Arc<dyn VariantDeriver>) -> Result<Self, ServerError> {
        let state = AppState::new(ServiceState::build(config.clone(), deriver.clone())?);
        let router = Self::build_router(&config, state.clone());

        Ok(Self {
            router,
            state,
            deriver,
            config,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        Router::new()
            .route("/", get(demo_handler))
            .route("/images/{id}", get(image_handler))
            .fallback(passthrough_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                    .layer(TraceLayer::new_for_http().make_span_with(request_span))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configuration updates received on `config_updates` replace the
    /// service state; a config that fails to build keeps the current one.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ServiceConfig>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            origin = %self.config.origin.base_url,
            "HTTP server starting"
        );

        let state = self.state.clone();
        let deriver = self.deriver.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                let base_url = config.origin.base_url.clone();
                match ServiceState::build(config, deriver.clone()) {
                    Ok(next) => {
                        state.replace(next);
                        tracing::info!(origin = %base_url, "Configuration reloaded");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Rejected configuration update, keeping current state");
                    }
                }
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(wait_for(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
