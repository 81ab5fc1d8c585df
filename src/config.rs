//! Configuration for the frontend API gateway

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Gateway configuration, loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// gRPC backend endpoints
    pub services: ServiceEndpoints,
    /// Session token configuration
    pub auth: AuthConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Payment processor configuration
    pub payments: PaymentsConfig,
    /// Payment reconciliation scheduler configuration
    pub scheduler: SchedulerConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

/// gRPC backend endpoints, one long-lived channel per domain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEndpoints {
    pub user_service: String,
    pub wallet_service: String,
    pub order_service: String,
    pub payment_service: String,
    pub currency_service: String,
    pub price_service: String,
    pub secret_service: String,
    pub password_service: String,
    pub blog_service: String,
}

/// Session token configuration. The signing secret itself is fetched from
/// the secret backend at startup, never from this file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Token lifetime in minutes
    pub token_ttl_minutes: i64,
    /// Secret-store entry holding the JWT signing key
    pub jwt_secret_name: String,
    /// Secret-store entry holding the OAuth client id
    pub oauth_client_id_name: String,
    /// OAuth provider token-verification endpoint
    pub tokeninfo_url: String,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Enable CORS
    pub enabled: bool,
    /// Allowed origins
    pub allowed_origins: Vec<String>,
    /// Allowed methods
    pub allowed_methods: Vec<String>,
    /// Allowed headers
    pub allowed_headers: Vec<String>,
    /// Allow credentials
    pub allow_credentials: bool,
    /// Max age for preflight requests
    pub max_age_seconds: u64,
}

/// Payment processor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsConfig {
    /// Currencies accepted for checkout sessions
    pub supported_currencies: Vec<String>,
    /// Redirect origin used when the request carries no Origin/Referer header
    pub default_origin: String,
    /// Payment processor REST base URL
    pub processor_url: String,
    /// Secret-store entry holding the processor API key
    pub api_key_name: String,
}

/// Reconciliation scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Enable the background reconciliation loop
    pub enabled: bool,
    /// Polling interval in seconds
    pub interval_seconds: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                timeout_seconds: 30,
                max_body_size: 1024 * 1024, // 1MB
            },
            services: ServiceEndpoints {
                user_service: "http://127.0.0.1:50051".to_string(),
                wallet_service: "http://127.0.0.1:50052".to_string(),
                order_service: "http://127.0.0.1:50053".to_string(),
                payment_service: "http://127.0.0.1:50054".to_string(),
                currency_service: "http://127.0.0.1:50055".to_string(),
                price_service: "http://127.0.0.1:50056".to_string(),
                secret_service: "http://127.0.0.1:50057".to_string(),
                password_service: "http://127.0.0.1:50058".to_string(),
                blog_service: "http://127.0.0.1:50059".to_string(),
            },
            auth: AuthConfig {
                token_ttl_minutes: 60,
                jwt_secret_name: "SECRET_KEY".to_string(),
                oauth_client_id_name: "GOOGLE_CLIENT_ID".to_string(),
                tokeninfo_url: "https://oauth2.googleapis.com/tokeninfo".to_string(),
            },
            cors: CorsConfig {
                enabled: true,
                allowed_origins: vec!["*".to_string()],
                allowed_methods: vec![
                    "GET".to_string(),
                    "POST".to_string(),
                    "PUT".to_string(),
                    "DELETE".to_string(),
                    "OPTIONS".to_string(),
                ],
                allowed_headers: vec![
                    "Authorization".to_string(),
                    "Content-Type".to_string(),
                    "X-Requested-With".to_string(),
                ],
                allow_credentials: true,
                max_age_seconds: 86400, // 24 hours
            },
            payments: PaymentsConfig {
                supported_currencies: vec![
                    "USD".to_string(),
                    "EUR".to_string(),
                    "GBP".to_string(),
                    "PLN".to_string(),
                ],
                default_origin: "http://localhost:4200".to_string(),
                processor_url: "https://api.stripe.com".to_string(),
                api_key_name: "STRIPE_SECRET_KEY".to_string(),
            },
            scheduler: SchedulerConfig {
                enabled: true,
                interval_seconds: 60,
            },
        }
    }
}

impl GatewayConfig {
    /// Load configuration from file with environment overrides
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("GATEWAY"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Get server address
    #[must_use]
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
