//! Shared test harness: an in-process gRPC backend implementing every
//! service the gateway depends on, plus a fake payment processor.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::Value;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{Request as GrpcRequest, Response as GrpcResponse, Status};
use tower::ServiceExt;

use frontend_api::grpc_clients::{
    BackendClients, blog, currency, order, password, payment, price, secret, user, wallet,
};
use frontend_api::middleware::Role;
use frontend_api::processor::{CheckoutRequest, CheckoutSession, PaymentProcessor, SessionStatus};
use frontend_api::token::TokenCodec;
use frontend_api::{AppState, GatewayConfig, ServiceEndpoints, build_router};

const TEST_SIGNING_SECRET: &str = "integration-test-secret";

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub user_type: i32,
    pub name: String,
    pub surname: String,
}

#[derive(Default)]
pub struct BackendState {
    pub users: Vec<UserRecord>,
    pub next_user_id: u64,
    pub wallets: Vec<wallet::Wallet>,
    pub next_wallet_id: u64,
    pub orders: Vec<order::OrderDetails>,
    pub next_order_id: u64,
    pub payments: Vec<payment::PaymentDetails>,
    pub blogs: Vec<blog::BlogContent>,
    pub common_passwords: HashSet<String>,
    pub secrets: HashMap<String, String>,
}

impl BackendState {
    fn seeded() -> Self {
        let mut state = Self {
            next_user_id: 1,
            next_wallet_id: 1,
            next_order_id: 1,
            ..Self::default()
        };
        state.common_passwords.insert("password12345".to_string());
        state
            .secrets
            .insert("SECRET_KEY".to_string(), TEST_SIGNING_SECRET.to_string());
        state
            .secrets
            .insert("STRIPE_SECRET_KEY".to_string(), "sk_test_abc".to_string());
        state
            .secrets
            .insert("GOOGLE_CLIENT_ID".to_string(), "test-client-id".to_string());
        state
    }
}

#[derive(Clone)]
pub struct MockBackend {
    pub state: Arc<Mutex<BackendState>>,
}

impl MockBackend {
    fn lock(&self) -> std::sync::MutexGuard<'_, BackendState> {
        self.state.lock().unwrap()
    }
}

fn classify_name(name: &str) -> currency::CurrencyType {
    match name.to_ascii_uppercase().as_str() {
        "USD" | "EUR" | "GBP" | "PLN" => currency::CurrencyType::Fiat,
        "BTC" | "ETH" => currency::CurrencyType::Crypto,
        _ => currency::CurrencyType::NotSupported,
    }
}

#[tonic::async_trait]
impl user::user_service_server::UserService for MockBackend {
    async fn authenticate(
        &self,
        request: GrpcRequest<user::Credentials>,
    ) -> Result<GrpcResponse<user::AuthResult>, Status> {
        let credentials = request.into_inner();
        let state = self.lock();
        let found = state.users.iter().find(|u| {
            (u.username == credentials.login || u.email == credentials.login)
                && u.password_hash == credentials.password_hash
        });
        let result = match found {
            Some(u) => user::AuthResult {
                success: true,
                id: u.id.clone(),
                username: u.username.clone(),
                email: u.email.clone(),
                user_type: u.user_type,
            },
            None => user::AuthResult::default(),
        };
        Ok(GrpcResponse::new(result))
    }

    async fn register(
        &self,
        request: GrpcRequest<user::RegisterRequest>,
    ) -> Result<GrpcResponse<user::RegisterResult>, Status> {
        let registration = request.into_inner();
        let mut state = self.lock();
        let occupied = state
            .users
            .iter()
            .any(|u| u.username == registration.username || u.email == registration.email);
        if occupied {
            return Ok(GrpcResponse::new(user::RegisterResult {
                success: false,
                occupied: true,
            }));
        }
        let id = state.next_user_id.to_string();
        state.next_user_id += 1;
        state.users.push(UserRecord {
            id,
            username: registration.username,
            email: registration.email,
            password_hash: registration.password_hash,
            user_type: user::UserType::Standard as i32,
            name: registration.name,
            surname: registration.surname,
        });
        Ok(GrpcResponse::new(user::RegisterResult {
            success: true,
            occupied: false,
        }))
    }

    async fn get_user_details(
        &self,
        request: GrpcRequest<user::UserId>,
    ) -> Result<GrpcResponse<user::UserDetails>, Status> {
        let id = request.into_inner().id;
        let state = self.lock();
        let details = state
            .users
            .iter()
            .find(|u| u.id == id)
            .map(|u| user::UserDetails {
                id: u.id.clone(),
                username: u.username.clone(),
                email: u.email.clone(),
                name: u.name.clone(),
                surname: u.surname.clone(),
                user_type: u.user_type,
                ..user::UserDetails::default()
            })
            .unwrap_or_default();
        Ok(GrpcResponse::new(details))
    }

    async fn update_user(
        &self,
        request: GrpcRequest<user::UpdateUserRequest>,
    ) -> Result<GrpcResponse<user::ResultResponse>, Status> {
        let update = request.into_inner();
        let mut state = self.lock();
        let Some(record) = state.users.iter_mut().find(|u| u.id == update.id) else {
            return Ok(GrpcResponse::new(user::ResultResponse::default()));
        };
        record.email = update.email;
        record.name = update.name;
        record.surname = update.surname;
        record.user_type = update.user_type;
        Ok(GrpcResponse::new(user::ResultResponse {
            success: true,
            id: update.id,
        }))
    }

    async fn change_password(
        &self,
        request: GrpcRequest<user::ChangePasswordRequest>,
    ) -> Result<GrpcResponse<user::ResultResponse>, Status> {
        let change = request.into_inner();
        let mut state = self.lock();
        let Some(record) = state.users.iter_mut().find(|u| {
            (u.username == change.login || u.email == change.login)
                && u.password_hash == change.old_password_hash
        }) else {
            return Ok(GrpcResponse::new(user::ResultResponse::default()));
        };
        record.password_hash = change.new_password_hash;
        let id = record.id.clone();
        Ok(GrpcResponse::new(user::ResultResponse { success: true, id }))
    }

    async fn delete_user(
        &self,
        request: GrpcRequest<user::UserId>,
    ) -> Result<GrpcResponse<user::ResultResponse>, Status> {
        let id = request.into_inner().id;
        let mut state = self.lock();
        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        Ok(GrpcResponse::new(user::ResultResponse {
            success: state.users.len() < before,
            id,
        }))
    }

    async fn list_users(
        &self,
        _request: GrpcRequest<user::ListUsersRequest>,
    ) -> Result<GrpcResponse<user::UserList>, Status> {
        let state = self.lock();
        let users = state
            .users
            .iter()
            .map(|u| user::UserDetails {
                id: u.id.clone(),
                username: u.username.clone(),
                email: u.email.clone(),
                name: u.name.clone(),
                surname: u.surname.clone(),
                user_type: u.user_type,
                ..user::UserDetails::default()
            })
            .collect();
        Ok(GrpcResponse::new(user::UserList { users }))
    }
}

#[tonic::async_trait]
impl wallet::wallet_service_server::WalletService for MockBackend {
    async fn create_wallet(
        &self,
        request: GrpcRequest<wallet::Wallet>,
    ) -> Result<GrpcResponse<wallet::Wallet>, Status> {
        let mut new_wallet = request.into_inner();
        let mut state = self.lock();
        new_wallet.id = state.next_wallet_id.to_string();
        state.next_wallet_id += 1;
        state.wallets.push(new_wallet.clone());
        Ok(GrpcResponse::new(new_wallet))
    }

    async fn get_wallet(
        &self,
        request: GrpcRequest<wallet::WalletId>,
    ) -> Result<GrpcResponse<wallet::Wallet>, Status> {
        let id = request.into_inner().id;
        let state = self.lock();
        let found = state
            .wallets
            .iter()
            .find(|w| w.id == id)
            .cloned()
            .unwrap_or_default();
        Ok(GrpcResponse::new(found))
    }

    async fn update_wallet(
        &self,
        request: GrpcRequest<wallet::Wallet>,
    ) -> Result<GrpcResponse<wallet::Wallet>, Status> {
        let update = request.into_inner();
        let mut state = self.lock();
        let Some(record) = state.wallets.iter_mut().find(|w| w.id == update.id) else {
            return Ok(GrpcResponse::new(wallet::Wallet::default()));
        };
        *record = update.clone();
        Ok(GrpcResponse::new(update))
    }

    async fn delete_wallet(
        &self,
        request: GrpcRequest<wallet::WalletId>,
    ) -> Result<GrpcResponse<wallet::Wallet>, Status> {
        let id = request.into_inner().id;
        let mut state = self.lock();
        let Some(index) = state.wallets.iter().position(|w| w.id == id) else {
            return Ok(GrpcResponse::new(wallet::Wallet::default()));
        };
        Ok(GrpcResponse::new(state.wallets.remove(index)))
    }

    async fn get_user_wallets(
        &self,
        request: GrpcRequest<wallet::UserId>,
    ) -> Result<GrpcResponse<wallet::WalletList>, Status> {
        let user_id = request.into_inner().id;
        let state = self.lock();
        let wallets = state
            .wallets
            .iter()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect();
        Ok(GrpcResponse::new(wallet::WalletList { wallets }))
    }
}

#[tonic::async_trait]
impl order::order_service_server::OrderService for MockBackend {
    async fn create_order(
        &self,
        request: GrpcRequest<order::OrderDetails>,
    ) -> Result<GrpcResponse<order::OrderDetails>, Status> {
        let mut new_order = request.into_inner();
        let mut state = self.lock();
        new_order.id = state.next_order_id.to_string();
        state.next_order_id += 1;
        state.orders.push(new_order.clone());
        Ok(GrpcResponse::new(new_order))
    }

    async fn get_order(
        &self,
        request: GrpcRequest<order::OrderId>,
    ) -> Result<GrpcResponse<order::OrderDetails>, Status> {
        let id = request.into_inner().id;
        let state = self.lock();
        let found = state
            .orders
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .unwrap_or_default();
        Ok(GrpcResponse::new(found))
    }

    async fn delete_order(
        &self,
        request: GrpcRequest<order::OrderId>,
    ) -> Result<GrpcResponse<order::OrderDetails>, Status> {
        let id = request.into_inner().id;
        let mut state = self.lock();
        let Some(index) = state.orders.iter().position(|o| o.id == id) else {
            return Ok(GrpcResponse::new(order::OrderDetails::default()));
        };
        Ok(GrpcResponse::new(state.orders.remove(index)))
    }

    async fn list_orders(
        &self,
        request: GrpcRequest<order::OrderFilter>,
    ) -> Result<GrpcResponse<order::OrderList>, Status> {
        let filter = request.into_inner();
        let state = self.lock();
        let orders = state
            .orders
            .iter()
            .filter(|o| o.user_id == filter.user_id)
            .filter(|o| {
                filter.wallet_id.is_empty()
                    || o.crypto_wallet_id == filter.wallet_id
                    || o.fiat_wallet_id == filter.wallet_id
            })
            .filter(|o| filter.status == 0 || o.status == filter.status)
            .filter(|o| filter.order_type == 0 || o.order_type == filter.order_type)
            .filter(|o| filter.side == 0 || o.side == filter.side)
            .cloned()
            .collect();
        Ok(GrpcResponse::new(order::OrderList { orders }))
    }
}

#[tonic::async_trait]
impl payment::payment_service_server::PaymentService for MockBackend {
    async fn create_payment(
        &self,
        request: GrpcRequest<payment::PaymentDetails>,
    ) -> Result<GrpcResponse<payment::PaymentDetails>, Status> {
        let details = request.into_inner();
        self.lock().payments.push(details.clone());
        Ok(GrpcResponse::new(details))
    }

    async fn get_payment(
        &self,
        request: GrpcRequest<payment::PaymentId>,
    ) -> Result<GrpcResponse<payment::PaymentDetails>, Status> {
        let id = request.into_inner().id;
        let state = self.lock();
        let found = state
            .payments
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .unwrap_or_default();
        Ok(GrpcResponse::new(found))
    }

    async fn get_user_payments(
        &self,
        request: GrpcRequest<payment::UserId>,
    ) -> Result<GrpcResponse<payment::PaymentList>, Status> {
        let user_id = request.into_inner().id;
        let state = self.lock();
        let payments = state
            .payments
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        Ok(GrpcResponse::new(payment::PaymentList { payments }))
    }

    async fn get_unpaid_payments(
        &self,
        _request: GrpcRequest<payment::UnpaidFilter>,
    ) -> Result<GrpcResponse<payment::PaymentList>, Status> {
        let state = self.lock();
        let payments = state
            .payments
            .iter()
            .filter(|p| p.state == payment::PaymentState::Pending as i32)
            .cloned()
            .collect();
        Ok(GrpcResponse::new(payment::PaymentList { payments }))
    }

    async fn update_payment(
        &self,
        request: GrpcRequest<payment::PaymentDetails>,
    ) -> Result<GrpcResponse<payment::PaymentDetails>, Status> {
        let update = request.into_inner();
        let mut state = self.lock();
        let Some(record) = state.payments.iter_mut().find(|p| p.id == update.id) else {
            return Ok(GrpcResponse::new(payment::PaymentDetails::default()));
        };
        // Terminal states are frozen; reapplying an update is a no-op.
        let terminal = [
            payment::PaymentState::Accepted as i32,
            payment::PaymentState::Cancelled as i32,
        ];
        if !terminal.contains(&record.state) {
            record.state = update.state;
        }
        Ok(GrpcResponse::new(record.clone()))
    }
}

#[tonic::async_trait]
impl currency::currency_service_server::CurrencyService for MockBackend {
    async fn get_currency_type(
        &self,
        request: GrpcRequest<currency::CurrencyName>,
    ) -> Result<GrpcResponse<currency::CurrencyClass>, Status> {
        let name = request.into_inner().name;
        Ok(GrpcResponse::new(currency::CurrencyClass {
            currency_type: classify_name(&name) as i32,
        }))
    }

    async fn get_supported_currencies(
        &self,
        request: GrpcRequest<currency::CurrencyClass>,
    ) -> Result<GrpcResponse<currency::CurrencyList>, Status> {
        let class = request.into_inner().currency_type;
        let names: &[&str] = if class == currency::CurrencyType::Fiat as i32 {
            &["USD", "EUR", "GBP", "PLN"]
        } else if class == currency::CurrencyType::Crypto as i32 {
            &["BTC", "ETH"]
        } else {
            &[]
        };
        Ok(GrpcResponse::new(currency::CurrencyList {
            currencies: names
                .iter()
                .map(|n| currency::CurrencyName {
                    name: (*n).to_string(),
                })
                .collect(),
        }))
    }
}

#[tonic::async_trait]
impl price::price_service_server::PriceService for MockBackend {
    async fn get_all_coin_prices(
        &self,
        _request: GrpcRequest<price::CoinPricesRequest>,
    ) -> Result<GrpcResponse<price::CoinPricesResponse>, Status> {
        let btc_quotes: HashMap<String, String> = [
            ("usd".to_string(), "50000.0".to_string()),
            ("pln".to_string(), "200000.0".to_string()),
        ]
        .into_iter()
        .collect();
        let eth_quotes: HashMap<String, String> =
            [("usd".to_string(), "2500.0".to_string())].into_iter().collect();
        Ok(GrpcResponse::new(price::CoinPricesResponse {
            coins: vec![
                price::CoinQuotes {
                    coin: "btc".to_string(),
                    quotes: btc_quotes,
                },
                price::CoinQuotes {
                    coin: "eth".to_string(),
                    quotes: eth_quotes,
                },
            ],
        }))
    }

    async fn get_coin_data(
        &self,
        request: GrpcRequest<price::CoinDataRequest>,
    ) -> Result<GrpcResponse<price::CoinDataResponse>, Status> {
        let request = request.into_inner();
        let response = match (request.coin_id.as_str(), request.fiat_currency.as_str()) {
            ("BTC", "usd") => price::CoinDataResponse {
                status: "success".to_string(),
                error_message: String::new(),
                data: Some(price::CoinMarketData {
                    coin_id: "BTC".to_string(),
                    name: "Bitcoin".to_string(),
                    current_price: "50000.0".to_string(),
                    market_cap: "1000000000.0".to_string(),
                    total_volume: "35000000.0".to_string(),
                    price_change_percentage_24h: "2.5".to_string(),
                    high_24h: "51000.0".to_string(),
                    low_24h: "48500.0".to_string(),
                }),
            },
            _ => price::CoinDataResponse {
                status: "error".to_string(),
                error_message: "no market data".to_string(),
                data: None,
            },
        };
        Ok(GrpcResponse::new(response))
    }
}

#[tonic::async_trait]
impl secret::secret_service_server::SecretService for MockBackend {
    async fn get_secret(
        &self,
        request: GrpcRequest<secret::SecretName>,
    ) -> Result<GrpcResponse<secret::SecretValue>, Status> {
        let name = request.into_inner().name;
        let value = self.lock().secrets.get(&name).cloned().unwrap_or_default();
        Ok(GrpcResponse::new(secret::SecretValue { value }))
    }
}

#[tonic::async_trait]
impl password::password_policy_service_server::PasswordPolicyService for MockBackend {
    async fn check_password(
        &self,
        request: GrpcRequest<password::PasswordCheckRequest>,
    ) -> Result<GrpcResponse<password::PasswordCheckResponse>, Status> {
        let candidate = request.into_inner().password;
        let is_common = self.lock().common_passwords.contains(&candidate);
        Ok(GrpcResponse::new(password::PasswordCheckResponse {
            is_common,
        }))
    }
}

#[tonic::async_trait]
impl blog::blog_service_server::BlogService for MockBackend {
    async fn add_blog(
        &self,
        request: GrpcRequest<blog::BlogContent>,
    ) -> Result<GrpcResponse<blog::BlogContent>, Status> {
        let mut content = request.into_inner();
        if content.title.is_empty() {
            content.path = "*".to_string();
            return Ok(GrpcResponse::new(content));
        }
        content.path = content.title.to_lowercase().replace(' ', "-");
        self.lock().blogs.push(content.clone());
        Ok(GrpcResponse::new(content))
    }

    async fn update_blog(
        &self,
        request: GrpcRequest<blog::BlogContent>,
    ) -> Result<GrpcResponse<blog::BlogContent>, Status> {
        let update = request.into_inner();
        let mut state = self.lock();
        let Some(record) = state
            .blogs
            .iter_mut()
            .find(|b| b.language == update.language && b.path == update.path)
        else {
            return Ok(GrpcResponse::new(blog::BlogContent {
                path: "*".to_string(),
                ..update
            }));
        };
        record.title = update.title.clone();
        record.content = update.content.clone();
        Ok(GrpcResponse::new(record.clone()))
    }

    async fn get_blog(
        &self,
        request: GrpcRequest<blog::BlogRef>,
    ) -> Result<GrpcResponse<blog::BlogContent>, Status> {
        let reference = request.into_inner();
        let state = self.lock();
        let found = state
            .blogs
            .iter()
            .find(|b| b.language == reference.language && b.path == reference.path)
            .cloned()
            .unwrap_or_default();
        Ok(GrpcResponse::new(found))
    }

    async fn list_blogs(
        &self,
        request: GrpcRequest<blog::BlogListRequest>,
    ) -> Result<GrpcResponse<blog::BlogList>, Status> {
        let language = request.into_inner().language;
        let state = self.lock();
        let blogs = state
            .blogs
            .iter()
            .filter(|b| b.language == language)
            .cloned()
            .collect();
        Ok(GrpcResponse::new(blog::BlogList { blogs }))
    }

    async fn delete_blog(
        &self,
        request: GrpcRequest<blog::BlogRef>,
    ) -> Result<GrpcResponse<blog::BlogDeleteResult>, Status> {
        let reference = request.into_inner();
        let mut state = self.lock();
        let before = state.blogs.len();
        state
            .blogs
            .retain(|b| !(b.language == reference.language && b.path == reference.path));
        Ok(GrpcResponse::new(blog::BlogDeleteResult {
            success: state.blogs.len() < before,
        }))
    }
}

/// Fake processor recording sessions in memory. Tests drive session state
/// through `set_status` to simulate payment and expiry events.
pub struct FakeProcessor {
    pub sessions: Mutex<HashMap<String, SessionStatus>>,
    counter: Mutex<u64>,
}

impl FakeProcessor {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            counter: Mutex::new(0),
        }
    }

    pub fn set_status(&self, session_id: &str, payment_status: &str, session_status: &str) {
        self.sessions.lock().unwrap().insert(
            session_id.to_string(),
            SessionStatus {
                payment_status: payment_status.to_string(),
                session_status: session_status.to_string(),
            },
        );
    }
}

#[async_trait]
impl PaymentProcessor for FakeProcessor {
    async fn create_session(&self, _request: CheckoutRequest) -> Result<CheckoutSession> {
        let mut counter = self.counter.lock().unwrap();
        *counter += 1;
        let id = format!("cs_test_{counter}");
        self.sessions.lock().unwrap().insert(
            id.clone(),
            SessionStatus {
                payment_status: "unpaid".to_string(),
                session_status: "open".to_string(),
            },
        );
        Ok(CheckoutSession {
            url: format!("https://checkout.example/{id}"),
            id,
        })
    }

    async fn session_status(&self, session_id: &str) -> Result<SessionStatus> {
        self.sessions
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or_else(|| anyhow!("unknown session {session_id}"))
    }

    async fn expire_session(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.sessions.lock().unwrap();
        let status = sessions
            .get_mut(session_id)
            .ok_or_else(|| anyhow!("unknown session {session_id}"))?;
        status.session_status = "expired".to_string();
        Ok(())
    }
}

pub struct TestHarness {
    pub router: Router,
    pub state: AppState,
    pub backend: Arc<Mutex<BackendState>>,
    pub processor: Arc<FakeProcessor>,
}

impl TestHarness {
    /// Spawn the mock backend and assemble a gateway router against it.
    pub async fn new() -> Self {
        Self::with_tokeninfo("http://127.0.0.1:9/tokeninfo").await
    }

    pub async fn with_tokeninfo(tokeninfo_url: &str) -> Self {
        let backend = MockBackend {
            state: Arc::new(Mutex::new(BackendState::seeded())),
        };
        let addr = spawn_backend(backend.clone()).await;
        let endpoint = format!("http://{addr}");

        let mut config = GatewayConfig::default();
        config.services = ServiceEndpoints {
            user_service: endpoint.clone(),
            wallet_service: endpoint.clone(),
            order_service: endpoint.clone(),
            payment_service: endpoint.clone(),
            currency_service: endpoint.clone(),
            price_service: endpoint.clone(),
            secret_service: endpoint.clone(),
            password_service: endpoint.clone(),
            blog_service: endpoint.clone(),
        };
        config.auth.tokeninfo_url = tokeninfo_url.to_string();

        let clients = BackendClients::new(&config.services)
            .await
            .expect("mock backend must accept connections");
        let processor = Arc::new(FakeProcessor::new());
        let state = AppState {
            clients,
            codec: Arc::new(TokenCodec::new(TEST_SIGNING_SECRET, 60)),
            processor: Arc::clone(&processor) as Arc<dyn PaymentProcessor>,
            oauth: Arc::new(frontend_api::oauth::OauthVerifier::new(
                &config.auth.tokeninfo_url,
                "test-client-id",
            )),
            config: Arc::new(config.clone()),
        };

        Self {
            router: build_router(state.clone(), &config),
            state,
            backend: backend.state,
            processor,
        }
    }

    /// Issue one HTTP request against the router and decode the JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Register a user through the HTTP surface and return their token.
    pub async fn register_user(&self, username: &str, email: &str) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/auth/register",
                None,
                Some(serde_json::json!({
                    "username": username,
                    "password": "a-long-enough-password",
                    "email": email,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "registration failed: {body}");
        body["accessToken"].as_str().unwrap().to_string()
    }

    /// Mint a SuperAdmin token directly against the shared signing secret.
    pub fn admin_token(&self) -> String {
        self.state
            .codec
            .issue("999", "admin", "admin@example.com", Role::SuperAdmin)
            .unwrap()
    }
}

async fn spawn_backend(backend: MockBackend) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let incoming = TcpListenerStream::new(listener);

    tokio::spawn(async move {
        tonic::transport::Server::builder()
            .add_service(user::user_service_server::UserServiceServer::new(
                backend.clone(),
            ))
            .add_service(wallet::wallet_service_server::WalletServiceServer::new(
                backend.clone(),
            ))
            .add_service(order::order_service_server::OrderServiceServer::new(
                backend.clone(),
            ))
            .add_service(payment::payment_service_server::PaymentServiceServer::new(
                backend.clone(),
            ))
            .add_service(
                currency::currency_service_server::CurrencyServiceServer::new(backend.clone()),
            )
            .add_service(price::price_service_server::PriceServiceServer::new(
                backend.clone(),
            ))
            .add_service(secret::secret_service_server::SecretServiceServer::new(
                backend.clone(),
            ))
            .add_service(
                password::password_policy_service_server::PasswordPolicyServiceServer::new(
                    backend.clone(),
                ),
            )
            .add_service(blog::blog_service_server::BlogServiceServer::new(backend))
            .serve_with_incoming(incoming)
            .await
            .unwrap();
    });

    addr
}
