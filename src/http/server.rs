//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the authenticator and mode handler from a validated config
//! - Create the Axum router with a catch-all route
//! - Wire up middleware (request ID, tracing)
//! - Serve over plain TCP or TLS with graceful shutdown

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::auth::{Authenticator, HmacAuthenticator};
use crate::config::{Mode, ProxyConfig};
use crate::http::dispatch::{self, DispatchError, Handler};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};

/// Time allowed for in-flight TLS connections to finish on shutdown.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors raised while building or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    mode: Mode,
    description: String,
}

impl HttpServer {
    /// Create a server using HMAC authentication as configured.
    pub fn new(config: &ProxyConfig) -> Result<Self, ServerError> {
        let auth = HmacAuthenticator::new(
            config.digest,
            config.secret.clone(),
            config.sign_header.clone(),
            config.headers.clone(),
        );
        Self::with_authenticator(config, Arc::new(auth))
    }

    /// Create a server around any authenticator.
    pub fn with_authenticator(
        config: &ProxyConfig,
        auth: Arc<dyn Authenticator>,
    ) -> Result<Self, ServerError> {
        let (handler, description) = dispatch::build_from_config(config, auth)?;
        let mode = handler.mode();
        let router = Self::build_router(Arc::new(handler));
        Ok(Self {
            router,
            mode,
            description,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(handler: Arc<Handler>) -> Router {
        Router::new()
            .fallback(gateway_handler)
            .with_state(handler)
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// One-line description of what this server does.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The router, for embedding or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve plain HTTP on `listener` until `shutdown` completes.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, mode = %self.mode, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on `addr` until `shutdown` completes.
    pub async fn run_tls<F>(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        shutdown: F,
    ) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!(address = %addr, mode = %self.mode, "HTTPS server starting");

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            shutdown.await;
            drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(app)
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Catch-all handler: every method and path goes to the mode handler.
async fn gateway_handler(State(handler): State<Arc<Handler>>, request: Request<Body>) -> Response {
    handler.handle(request).await
}
