//! Payment processor client
//!
//! The gateway talks to the processor's hosted-checkout REST API for session
//! creation, status queries and expiry. The trait seam exists so the payment
//! handler and the reconciliation scheduler can run against a fake in tests.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

/// Parameters for a hosted checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    /// Lowercase currency code
    pub currency: String,
    /// Amount in minor units (cents)
    pub unit_amount: i64,
    /// Line-item label shown on the checkout page
    pub product_name: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// A created checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// The processor's two independent status signals for a session.
#[derive(Debug, Clone)]
pub struct SessionStatus {
    /// Line-item payment status: "unpaid", "paid", "payment_failed", ...
    pub payment_status: String,
    /// Session lifecycle: "open", "complete", "expired"
    pub session_status: String,
}

impl SessionStatus {
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.session_status == "open"
    }
}

/// External payment processor operations the gateway depends on.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn create_session(&self, request: CheckoutRequest) -> Result<CheckoutSession>;
    async fn session_status(&self, session_id: &str) -> Result<SessionStatus>;
    async fn expire_session(&self, session_id: &str) -> Result<()>;
}

/// Stripe checkout-session client over its form-encoded REST API.
pub struct StripeProcessor {
    http: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl StripeProcessor {
    #[must_use]
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    async fn post_form(&self, path: &str, form: &[(String, String)]) -> Result<SessionResponse> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .form(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Processor rejected {}: {} {}", path, status, body);
            return Err(anyhow!("Processor returned {} for {}", status, path));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl PaymentProcessor for StripeProcessor {
    async fn create_session(&self, request: CheckoutRequest) -> Result<CheckoutSession> {
        let form = vec![
            ("mode".to_string(), "payment".to_string()),
            (
                "payment_method_types[0]".to_string(),
                "card".to_string(),
            ),
            (
                "line_items[0][price_data][currency]".to_string(),
                request.currency,
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                request.product_name,
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                request.unit_amount.to_string(),
            ),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("success_url".to_string(), request.success_url),
            ("cancel_url".to_string(), request.cancel_url),
        ];

        let session = self.post_form("/v1/checkout/sessions", &form).await?;
        let url = session
            .url
            .ok_or_else(|| anyhow!("Processor session {} carries no checkout URL", session.id))?;

        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    async fn session_status(&self, session_id: &str) -> Result<SessionStatus> {
        let response = self
            .http
            .get(format!(
                "{}/v1/checkout/sessions/{}",
                self.base_url, session_id
            ))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Processor returned {} for session {}",
                response.status(),
                session_id
            ));
        }

        let session: SessionResponse = response.json().await?;
        Ok(SessionStatus {
            payment_status: session.payment_status.unwrap_or_default(),
            session_status: session.status.unwrap_or_default(),
        })
    }

    async fn expire_session(&self, session_id: &str) -> Result<()> {
        self.post_form(
            &format!("/v1/checkout/sessions/{session_id}/expire"),
            &[],
        )
        .await?;
        Ok(())
    }
}
