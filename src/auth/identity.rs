use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use url::Url;

use super::{AuthError, Claims, TokenVerifier};
use crate::config::IdentityConfig;

const USER_PATH: &str = "auth/v1/user";

/// Verifies tokens against the provider's current-user endpoint
#[derive(Debug, Clone)]
pub struct IdentityClient {
    http: Client,
    user_url: Url,
    api_key: String,
}

impl IdentityClient {
    pub fn new(config: &IdentityConfig) -> Result<Self, AuthError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        let user_url = config
            .base_url
            .join(USER_PATH)
            .map_err(|e| AuthError::InvalidPayload(format!("bad identity URL: {}", e)))?;

        Ok(Self {
            http,
            user_url,
            api_key: config.anon_key.clone(),
        })
    }
}

#[async_trait]
impl TokenVerifier for IdentityClient {
    async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        tracing::debug!("Verifying bearer token against {}", self.user_url);

        let response = self
            .http
            .get(self.user_url.clone())
            .bearer_auth(token)
            .header("apikey", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!("Identity provider rejected token with {}", status);
            return Err(AuthError::Rejected(status.as_u16()));
        }

        let payload: Value = response.json().await?;
        if !payload.is_object() {
            return Err(AuthError::InvalidPayload("expected a JSON object".to_string()));
        }
        serde_json::from_value(payload).map_err(|e| AuthError::InvalidPayload(e.to_string()))
    }
}
