//! Frontend API gateway - main entry point

use anyhow::Result;
use clap::{Arg, Command};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use frontend_api::{GatewayConfig, start_server};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "frontend_api=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let matches = Command::new("frontend-api")
        .version(env!("CARGO_PKG_VERSION"))
        .about("HTTP/JSON gateway in front of the trading platform's backend services")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("gateway.toml"),
        )
        .get_matches();

    let default_config = "gateway.toml".to_string();
    let config_path = matches
        .get_one::<String>("config")
        .unwrap_or(&default_config);
    let config = match GatewayConfig::from_file(config_path) {
        Ok(config) => {
            info!("Loaded configuration from: {}", config_path);
            config
        }
        Err(e) => {
            error!("Failed to load config from {}: {}", config_path, e);
            info!("Using default configuration");
            GatewayConfig::default()
        }
    };

    info!("Starting frontend API gateway v{}", env!("CARGO_PKG_VERSION"));
    info!("Server will bind to: {}", config.server_address());
    info!("Backend services:");
    info!("  User: {}", config.services.user_service);
    info!("  Wallet: {}", config.services.wallet_service);
    info!("  Order: {}", config.services.order_service);
    info!("  Payment: {}", config.services.payment_service);
    info!("  Currency: {}", config.services.currency_service);
    info!("  Price: {}", config.services.price_service);
    info!("  Secret: {}", config.services.secret_service);
    info!("  Password policy: {}", config.services.password_service);
    info!("  Blog: {}", config.services.blog_service);

    if let Err(e) = start_server(config).await {
        error!("Gateway terminated with error: {}", e);
        return Err(e);
    }

    Ok(())
}
