//! API server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::routes::create_router;
use crate::state::ApiState;

/// Listen address of the API server.
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    pub host: String,
    pub port: u16,
}

impl ApiServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self::new("127.0.0.1", 8080)
    }
}

/// HTTP front end for the job control service.
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<ApiState>,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, state: Arc<ApiState>) -> Self {
        Self { config, state }
    }

    /// Get the server address.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(&self, shutdown: F) -> Result<(), Box<dyn std::error::Error>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = create_router(self.state.clone());

        let addr: SocketAddr = self.addr().parse()?;
        let listener = TcpListener::bind(addr).await?;

        info!("API server listening on {}", addr);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("API server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ApiServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_server_addr_format() {
        let config = ApiServerConfig::new("0.0.0.0", 9000);
        assert_eq!(format!("{}:{}", config.host, config.port), "0.0.0.0:9000");
    }
}
