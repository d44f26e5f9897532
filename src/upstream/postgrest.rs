use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use super::{NewsStore, Page, UpstreamBody, UpstreamError};
use crate::auth::Claims;
use crate::config::UpstreamConfig;
use crate::models::{NewsCreate, NewsOut, NewsUpdate};

/// HTTP client for a PostgREST collection endpoint
#[derive(Debug, Clone)]
pub struct PostgrestClient {
    http: Client,
    collection_url: Url,
    api_key: String,
    list_timeout: Duration,
}

impl PostgrestClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        let collection_url = config
            .rest_url
            .join(&config.table)
            .map_err(|e| UpstreamError::InvalidUrl(e.to_string()))?;

        Ok(Self {
            http,
            collection_url,
            api_key: config.anon_key.clone(),
            list_timeout: config.list_timeout,
        })
    }

    pub fn collection_url(&self) -> &Url {
        &self.collection_url
    }

    /// Attach the API key and, when the claims carry one, the caller's
    /// forwardable token. Nothing else is ever sent as a bearer.
    fn authorize(&self, request: RequestBuilder, claims: &Claims) -> RequestBuilder {
        let request = request
            .header("apikey", &self.api_key)
            .header("Accept", "application/json");

        match claims.forwardable_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn id_filter(id: Uuid) -> [(&'static str, String); 1] {
        [("id", format!("eq.{}", id))]
    }
}

/// Turn any non-2xx response into an error carrying status and body
async fn ensure_success(response: Response) -> Result<Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!("Upstream responded {}: {}", status, body);
    Err(UpstreamError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Decode through `Value` so a bad row reports the offending field
async fn decode_rows(response: Response) -> Result<UpstreamBody<NewsOut>, UpstreamError> {
    let value: Value = response.json().await?;
    UpstreamBody::from_value(value).map_err(|e| UpstreamError::Decode(e.to_string()))
}

#[async_trait]
impl NewsStore for PostgrestClient {
    async fn list(&self, claims: &Claims, page: Page) -> Result<Vec<NewsOut>, UpstreamError> {
        tracing::debug!("Listing news limit={} offset={}", page.limit, page.offset);

        let request = self
            .http
            .get(self.collection_url.clone())
            .query(&[
                ("select", "*".to_string()),
                ("order", "created_at.desc".to_string()),
                ("limit", page.limit.to_string()),
                ("offset", page.offset.to_string()),
            ])
            .timeout(self.list_timeout);

        let response = ensure_success(self.authorize(request, claims).send().await?).await?;
        let body = decode_rows(response).await?;
        Ok(body.into_vec())
    }

    async fn get(&self, claims: &Claims, id: Uuid) -> Result<Option<NewsOut>, UpstreamError> {
        tracing::debug!("Fetching news {}", id);

        let request = self
            .http
            .get(self.collection_url.clone())
            .query(&Self::id_filter(id))
            .query(&[("select", "*")]);

        let response = self.authorize(request, claims).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = ensure_success(response).await?;
        let body = decode_rows(response).await?;
        Ok(body.into_single())
    }

    async fn create(&self, claims: &Claims, draft: &NewsCreate) -> Result<NewsOut, UpstreamError> {
        tracing::debug!("Creating news '{}'", draft.title);

        let request = self
            .http
            .post(self.collection_url.clone())
            .header("Prefer", "return=representation")
            .json(draft);

        let response = ensure_success(self.authorize(request, claims).send().await?).await?;
        let body = decode_rows(response).await?;
        body.into_single().ok_or(UpstreamError::EmptyRepresentation)
    }

    async fn update(&self, claims: &Claims, id: Uuid, patch: &NewsUpdate) -> Result<(), UpstreamError> {
        tracing::debug!("Updating news {}", id);

        let request = self
            .http
            .patch(self.collection_url.clone())
            .query(&Self::id_filter(id))
            .header("Prefer", "return=minimal")
            .json(patch);

        ensure_success(self.authorize(request, claims).send().await?).await?;
        Ok(())
    }

    async fn delete(&self, claims: &Claims, id: Uuid) -> Result<(), UpstreamError> {
        tracing::debug!("Deleting news {}", id);

        let request = self
            .http
            .delete(self.collection_url.clone())
            .query(&Self::id_filter(id))
            .header("Prefer", "return=minimal");

        ensure_success(self.authorize(request, claims).send().await?).await?;
        Ok(())
    }
}
