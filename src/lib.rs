//! Frontend API gateway
//!
//! HTTP/JSON surface for the trading platform's front end, translated into
//! gRPC calls against the backend cluster:
//! - JWT session auth with role-based access control
//! - Cross-service orchestration (order creation provisions its wallet,
//!   OAuth registration falls back to login)
//! - Hosted-checkout payments with a background reconciliation loop

use anyhow::Result;

pub mod config;
pub mod error;
pub mod grpc_clients;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod oauth;
pub mod processor;
pub mod scheduler;
pub mod server;
pub mod token;
pub mod utils;

pub use config::{AuthConfig, CorsConfig, GatewayConfig, ServerConfig, ServiceEndpoints};
pub use error::ApiError;
pub use server::{ApiGatewayServer, AppState, build_router};

/// Start the gateway server with the given configuration.
pub async fn start_server(config: GatewayConfig) -> Result<()> {
    let server = ApiGatewayServer::new(config).await?;
    server.start().await
}
