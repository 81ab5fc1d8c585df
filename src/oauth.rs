//! Third-party identity-provider token verification

use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use crate::error::ApiError;

/// Claims the gateway needs from a verified provider token.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderIdentity {
    /// Audience: must match our configured client id
    pub aud: String,
    /// Stable provider subject id
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
}

/// Verifies OAuth id-tokens against the provider's tokeninfo endpoint.
pub struct OauthVerifier {
    http: Client,
    tokeninfo_url: String,
    client_id: String,
}

impl OauthVerifier {
    #[must_use]
    pub fn new(tokeninfo_url: &str, client_id: &str) -> Self {
        Self {
            http: Client::new(),
            tokeninfo_url: tokeninfo_url.to_string(),
            client_id: client_id.to_string(),
        }
    }

    /// Verify the token and return its identity claims. Any provider-side
    /// rejection or audience mismatch surfaces as a bad request to our callers.
    pub async fn verify(&self, token: &str) -> Result<ProviderIdentity, ApiError> {
        let response = self
            .http
            .get(&self.tokeninfo_url)
            .query(&[("id_token", token)])
            .send()
            .await
            .map_err(|e| {
                warn!("Provider verification request failed: {}", e);
                ApiError::InvalidProviderToken
            })?;

        if !response.status().is_success() {
            warn!("Provider rejected token: {}", response.status());
            return Err(ApiError::InvalidProviderToken);
        }

        let identity: ProviderIdentity = response.json().await.map_err(|e| {
            warn!("Provider verification response unreadable: {}", e);
            ApiError::InvalidProviderToken
        })?;

        if identity.aud != self.client_id {
            warn!("Provider token audience mismatch");
            return Err(ApiError::InvalidProviderToken);
        }

        Ok(identity)
    }
}
