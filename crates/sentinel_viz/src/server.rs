//! HTTP server for explanation artifacts and the story view.
//!
//! [`VizServer`] serves the backend documents (`/graph`, `/explain`, `/story`),
//! the derived views under `/api` and the web UI, all built on
//! [axum](https://docs.rs/axum).
//!
//! # Examples
//!
//! ```rust,ignore
//! use sentinel_viz::{ArtifactStore, VizConfig, VizServer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = VizServer::new(VizConfig::default(), ArtifactStore::default());
//!
//!     let shutdown = async {
//!         tokio::signal::ctrl_c().await.ok();
//!     };
//!
//!     server.start_with_shutdown(shutdown).await?;
//!     Ok(())
//! }
//! ```

use crate::api::{create_router, ApiState};
use crate::error::{Error, Result};
use crate::store::ArtifactStore;

use axum::Router;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Configuration for the visualization server.
///
/// # Examples
///
/// ```
/// use sentinel_viz::VizConfig;
///
/// let config = VizConfig::default();
/// assert_eq!(config.host, "127.0.0.1");
/// assert_eq!(config.port, 8000);
///
/// let prod = VizConfig::production();
/// assert!(!prod.enable_cors);
/// ```
#[derive(Debug, Clone)]
pub struct VizConfig {
    /// The host address to bind the server to.
    ///
    /// `"127.0.0.1"` serves localhost only, `"0.0.0.0"` every interface.
    pub host: String,

    /// The port to listen on. Default is `8000`.
    pub port: u16,

    /// Whether to send permissive Cross-Origin Resource Sharing headers.
    ///
    /// The web UI may be opened from another origin than the API, so this
    /// defaults to `true`.
    pub enable_cors: bool,

    /// Whether to log every HTTP request. Default is `true`.
    pub enable_tracing: bool,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            enable_cors: true,
            enable_tracing: true,
        }
    }
}

impl VizConfig {
    /// Binds to all interfaces with CORS and request tracing on.
    pub fn development() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            ..Self::default()
        }
    }

    /// Localhost only, without CORS or request tracing.
    pub fn production() -> Self {
        Self {
            enable_cors: false,
            enable_tracing: false,
            ..Self::default()
        }
    }

    /// Converts the host and port into a [`SocketAddr`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the host is not a valid IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))
    }
}

/// The visualization server.
pub struct VizServer {
    config: VizConfig,
    state: ApiState,
}

impl VizServer {
    /// Creates a server reading artifacts from `store`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_viz::{ArtifactStore, VizConfig, VizServer};
    ///
    /// let server = VizServer::new(VizConfig::default(), ArtifactStore::new("g", "e"));
    /// assert_eq!(server.config().port, 8000);
    /// ```
    pub fn new(config: VizConfig, store: ArtifactStore) -> Self {
        Self {
            config,
            state: ApiState::new(store),
        }
    }

    /// Creates a server over prepared [`ApiState`].
    pub fn with_state(config: VizConfig, state: ApiState) -> Self {
        Self { config, state }
    }

    /// The server settings.
    pub fn config(&self) -> &VizConfig {
        &self.config
    }

    /// The shared handler state.
    pub fn state(&self) -> &ApiState {
        &self.state
    }

    /// Builds the router with the configured middleware.
    pub fn router(&self) -> Router {
        let mut app = create_router(self.state.clone());

        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            app = app.layer(cors);
        }

        if self.config.enable_tracing {
            app = app.layer(TraceLayer::new_for_http());
        }

        app
    }

    /// Starts the server and runs it until the process ends.
    ///
    /// # Errors
    ///
    /// Fails when the address is invalid, cannot be bound, or the server stops with an error.
    pub async fn start(self) -> Result<()> {
        self.start_with_shutdown(std::future::pending()).await
    }

    /// Starts the server and stops it gracefully when `shutdown_signal` completes.
    ///
    /// # Errors
    ///
    /// Fails when the address is invalid, cannot be bound, or the server stops with an error.
    pub async fn start_with_shutdown<F>(self, shutdown_signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.socket_addr()?;
        let app = self.router();

        log::info!("Starting Sentinel server on http://{}", addr);
        log::info!("  - Web UI:  http://{}/", addr);
        log::info!("  - Status:  http://{}/status", addr);
        log::info!("  - Stories: http://{}/api/story/{{id}}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Server(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| Error::Server(format!("Server error: {}", e)))?;

        log::info!("Server shutdown complete");
        Ok(())
    }
}
