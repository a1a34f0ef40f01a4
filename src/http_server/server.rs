//! # HTTP Server
//!
//! Wraps the users router with CORS and binds it to a TCP listener.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use super::config::HttpServerConfig;
use super::user_routes::{user_routes, UsersState};
use crate::driver::Driver;
use crate::observability::SharedLogger;

/// HTTP server for the users service
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
    logger: SharedLogger,
}

impl HttpServer {
    /// Create a server over an open driver
    pub fn new(config: HttpServerConfig, driver: Arc<Driver>, logger: SharedLogger) -> Self {
        let state = Arc::new(UsersState::new(driver, Arc::clone(&logger)));
        let router = Self::build_router(&config, state);
        Self {
            config,
            router,
            logger,
        }
    }

    fn build_router(config: &HttpServerConfig, state: Arc<UsersState>) -> Router {
        let cors = if config.allows_any_origin() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        user_routes(state).layer(cors)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Bind and serve until the listener fails
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid socket address {}: {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        self.logger
            .info("HTTP_SERVER_LISTENING", &[("addr", &addr.to_string())]);
        axum::serve(listener, self.router).await
    }
}
