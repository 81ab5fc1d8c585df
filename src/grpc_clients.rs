//! gRPC client connections and management
//!
//! One long-lived logical channel per backend domain, constructed once at
//! process start and cloned into handlers cheaply.

use anyhow::{Result, anyhow};
use tonic::transport::{Channel, Endpoint};
use tracing::{error, info, warn};

// Generated gRPC contract code
pub mod user {
    tonic::include_proto!("platform.user.v1");
}

pub mod wallet {
    tonic::include_proto!("platform.wallet.v1");
}

pub mod order {
    tonic::include_proto!("platform.order.v1");
}

pub mod payment {
    tonic::include_proto!("platform.payment.v1");
}

pub mod currency {
    tonic::include_proto!("platform.currency.v1");
}

pub mod price {
    tonic::include_proto!("platform.price.v1");
}

pub mod secret {
    tonic::include_proto!("platform.secret.v1");
}

pub mod password {
    tonic::include_proto!("platform.password.v1");
}

pub mod blog {
    tonic::include_proto!("platform.blog.v1");
}

use blog::blog_service_client::BlogServiceClient;
use currency::currency_service_client::CurrencyServiceClient;
use order::order_service_client::OrderServiceClient;
use password::password_policy_service_client::PasswordPolicyServiceClient;
use payment::payment_service_client::PaymentServiceClient;
use price::price_service_client::PriceServiceClient;
use secret::secret_service_client::SecretServiceClient;
use user::user_service_client::UserServiceClient;
use wallet::wallet_service_client::WalletServiceClient;

use crate::config::ServiceEndpoints;

/// Typed clients for every backend domain
#[derive(Clone)]
pub struct BackendClients {
    pub user: UserServiceClient<Channel>,
    pub wallet: WalletServiceClient<Channel>,
    pub order: OrderServiceClient<Channel>,
    pub payment: PaymentServiceClient<Channel>,
    pub currency: CurrencyServiceClient<Channel>,
    pub price: PriceServiceClient<Channel>,
    pub secret: SecretServiceClient<Channel>,
    pub password: PasswordPolicyServiceClient<Channel>,
    pub blog: BlogServiceClient<Channel>,
}

impl BackendClients {
    /// Connect to every backend named in the endpoint configuration.
    pub async fn new(endpoints: &ServiceEndpoints) -> Result<Self> {
        info!("Connecting to backend gRPC services...");

        let user = UserServiceClient::new(Self::create_channel(&endpoints.user_service, "user").await?);
        let wallet =
            WalletServiceClient::new(Self::create_channel(&endpoints.wallet_service, "wallet").await?);
        let order =
            OrderServiceClient::new(Self::create_channel(&endpoints.order_service, "order").await?);
        let payment =
            PaymentServiceClient::new(Self::create_channel(&endpoints.payment_service, "payment").await?);
        let currency = CurrencyServiceClient::new(
            Self::create_channel(&endpoints.currency_service, "currency").await?,
        );
        let price =
            PriceServiceClient::new(Self::create_channel(&endpoints.price_service, "price").await?);
        let secret =
            SecretServiceClient::new(Self::create_channel(&endpoints.secret_service, "secret").await?);
        let password = PasswordPolicyServiceClient::new(
            Self::create_channel(&endpoints.password_service, "password-policy").await?,
        );
        let blog = BlogServiceClient::new(Self::create_channel(&endpoints.blog_service, "blog").await?);

        info!("Successfully connected to all backend services");

        Ok(Self {
            user,
            wallet,
            order,
            payment,
            currency,
            price,
            secret,
            password,
            blog,
        })
    }

    /// Create a gRPC channel with retry and timeout configuration
    async fn create_channel(endpoint: &str, service_name: &str) -> Result<Channel> {
        info!("Connecting to {} service at {}", service_name, endpoint);

        let endpoint = Endpoint::from_shared(endpoint.to_string())
            .map_err(|e| anyhow!("Invalid {} endpoint: {}", service_name, e))?
            .timeout(std::time::Duration::from_secs(30))
            .connect_timeout(std::time::Duration::from_secs(10))
            .tcp_keepalive(Some(std::time::Duration::from_secs(30)))
            .http2_keep_alive_interval(std::time::Duration::from_secs(30))
            .keep_alive_timeout(std::time::Duration::from_secs(5))
            .keep_alive_while_idle(true);

        for attempt in 1..=3 {
            match endpoint.connect().await {
                Ok(channel) => {
                    info!("Connected to {} service (attempt {})", service_name, attempt);
                    return Ok(channel);
                }
                Err(e) => {
                    warn!(
                        "Failed to connect to {} service (attempt {}): {}",
                        service_name, attempt, e
                    );
                    if attempt < 3 {
                        tokio::time::sleep(std::time::Duration::from_secs(1 << attempt)).await;
                    } else {
                        error!("Failed to connect to {} service after 3 attempts", service_name);
                        return Err(anyhow!(
                            "Failed to connect to {} service: {}",
                            service_name,
                            e
                        ));
                    }
                }
            }
        }

        unreachable!()
    }

    /// Fetch one named secret from the secret backend.
    pub async fn fetch_secret(&self, name: &str) -> Result<String> {
        let mut client = self.secret.clone();
        let response = client
            .get_secret(secret::SecretName {
                name: name.to_string(),
            })
            .await
            .map_err(|e| anyhow!("Failed to fetch secret {}: {}", name, e))?
            .into_inner();

        if response.value.is_empty() {
            return Err(anyhow!("Secret store returned no value for {}", name));
        }
        Ok(response.value)
    }
}
