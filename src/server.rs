//! API gateway server assembly

use anyhow::Result;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderMap, HeaderValue},
    routing::{get, post, put},
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::{
    config::GatewayConfig,
    error::ApiError,
    grpc_clients::BackendClients,
    handlers::{auth, blog, crypto_data, currency, health, order, payment, statistics, user, wallet},
    middleware::{self, Identity},
    oauth::OauthVerifier,
    processor::{PaymentProcessor, StripeProcessor},
    scheduler::PaymentReconciler,
    token::TokenCodec,
};

/// Shared application state: connection handles and read-only configuration,
/// established once at startup and never mutated.
#[derive(Clone)]
pub struct AppState {
    pub clients: BackendClients,
    pub codec: Arc<TokenCodec>,
    pub processor: Arc<dyn PaymentProcessor>,
    pub oauth: Arc<OauthVerifier>,
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    /// Verify the request's bearer token against the session codec.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<Identity, ApiError> {
        middleware::authorize(headers, &self.codec)
    }
}

/// API gateway server
pub struct ApiGatewayServer {
    config: GatewayConfig,
    state: AppState,
}

impl ApiGatewayServer {
    /// Connect to every backend and fetch startup secrets. Any failure here
    /// is fatal; the gateway does not start degraded.
    pub async fn new(config: GatewayConfig) -> Result<Self> {
        info!("Initializing API gateway");

        let clients = match BackendClients::new(&config.services).await {
            Ok(clients) => clients,
            Err(e) => {
                error!("Failed to connect to backend services: {}", e);
                return Err(e);
            }
        };

        let signing_secret = clients.fetch_secret(&config.auth.jwt_secret_name).await?;
        let processor_key = clients.fetch_secret(&config.payments.api_key_name).await?;
        let oauth_client_id = clients
            .fetch_secret(&config.auth.oauth_client_id_name)
            .await?;
        info!("Startup secrets loaded from secret backend");

        let state = AppState {
            clients,
            codec: Arc::new(TokenCodec::new(&signing_secret, config.auth.token_ttl_minutes)),
            processor: Arc::new(StripeProcessor::new(
                &config.payments.processor_url,
                &processor_key,
            )),
            oauth: Arc::new(OauthVerifier::new(
                &config.auth.tokeninfo_url,
                &oauth_client_id,
            )),
            config: Arc::new(config.clone()),
        };

        info!("API gateway initialized");
        Ok(Self { config, state })
    }

    /// Bind, spawn the reconciliation loop, and serve until a fatal error.
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .server_address()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid server address: {}", e))?;

        if self.config.scheduler.enabled {
            let reconciler = PaymentReconciler::new(
                self.state.clients.payment.clone(),
                Arc::clone(&self.state.processor),
                self.config.scheduler.interval_seconds,
            );
            tokio::spawn(reconciler.run());
        } else {
            info!("Payment reconciliation scheduler is disabled");
        }

        let app = build_router(self.state, &self.config);
        info!("Starting API gateway on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", addr, e))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))
    }
}

/// Assemble the full route table with middleware layers.
pub fn build_router(state: AppState, config: &GatewayConfig) -> Router {
    let mut router = Router::new()
        .route("/healthcheck", get(health::healthcheck))
        // Session endpoints (no auth)
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/auth-google", post(auth::oauth_google))
        .route("/auth/refresh", post(auth::refresh))
        // Account
        .route(
            "/user",
            get(user::get_details)
                .put(user::update_details)
                .delete(user::delete_user),
        )
        .route("/user/update-password", put(user::update_password))
        .route("/user/list-users", get(user::list_users))
        .route("/user/change-user-type", put(user::change_user_type))
        // Wallets
        .route(
            "/wallets",
            post(wallet::create_wallet)
                .get(wallet::list_wallets)
                .put(wallet::update_wallet)
                .delete(wallet::delete_wallet),
        )
        .route("/wallets/wallet", get(wallet::get_wallet))
        // Orders
        .route(
            "/order",
            post(order::create_order)
                .get(order::get_order)
                .delete(order::delete_order),
        )
        .route("/order/orders", get(order::list_orders))
        // Payments
        .route(
            "/payments",
            post(payment::create_payment).get(payment::get_payment),
        )
        .route("/payments/payments", get(payment::list_payments))
        .route("/payments/payment/cancel", put(payment::cancel_payment))
        // Currency classification (public)
        .route("/currency", get(currency::get_currency_type))
        .route("/currency/currencies", get(currency::get_currencies_by_type))
        // Coin market data
        .route("/details", get(crypto_data::get_coin_details))
        // Statistics
        .route(
            "/statistics/portfolio-diversity",
            get(statistics::portfolio_diversity),
        )
        // Blog
        .route(
            "/blog",
            post(blog::add_blog)
                .put(blog::update_blog)
                .get(blog::get_blog)
                .delete(blog::delete_blog),
        )
        .route("/blog/blogs", get(blog::list_blogs))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(TimeoutLayer::new(std::time::Duration::from_secs(
            config.server.timeout_seconds,
        )))
        .layer(TraceLayer::new_for_http());

    if config.cors.enabled {
        router = router.layer(create_cors_layer(config));
    }
    router
}

fn create_cors_layer(config: &GatewayConfig) -> CorsLayer {
    let mut cors =
        CorsLayer::new().max_age(std::time::Duration::from_secs(config.cors.max_age_seconds));

    // A wildcard origin cannot be combined with credentials.
    if config.cors.allowed_origins.contains(&"*".to_string()) {
        cors = cors.allow_origin(tower_http::cors::Any);
    } else {
        let origins: Vec<HeaderValue> = config
            .cors
            .allowed_origins
            .iter()
            .filter_map(|origin| HeaderValue::from_str(origin).ok())
            .collect();
        cors = cors
            .allow_origin(origins)
            .allow_credentials(config.cors.allow_credentials);
    }

    let methods: Result<Vec<axum::http::Method>, _> = config
        .cors
        .allowed_methods
        .iter()
        .map(|method| method.parse())
        .collect();
    if let Ok(methods) = methods {
        cors = cors.allow_methods(methods);
    }

    let headers: Result<Vec<axum::http::HeaderName>, _> = config
        .cors
        .allowed_headers
        .iter()
        .map(|header| header.parse())
        .collect();
    if let Ok(headers) = headers {
        cors = cors.allow_headers(headers);
    }

    cors
}
