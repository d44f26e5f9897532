pub mod postgrest;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::Claims;
use crate::models::{NewsCreate, NewsOut, NewsUpdate};

pub use postgrest::PostgrestClient;

/// Errors from the data backend
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Upstream request timed out")]
    Timeout,

    #[error("Upstream request failed: {0}")]
    Transport(reqwest::Error),

    #[error("Upstream response could not be decoded: {0}")]
    Decode(String),

    #[error("Upstream returned no representation for the write")]
    EmptyRepresentation,

    #[error("Invalid upstream URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else if err.is_decode() {
            UpstreamError::Decode(err.to_string())
        } else {
            UpstreamError::Transport(err)
        }
    }
}

/// PostgREST answers with either a bare object or an array depending on the
/// `Accept`/`Prefer` headers in play
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamBody<T> {
    Many(Vec<T>),
    One(T),
}

impl<T: DeserializeOwned> UpstreamBody<T> {
    /// Pick the variant from the JSON shape, then decode. Errors carry the
    /// path of the offending field, e.g. `[1].title: invalid type ...`.
    pub fn from_value(value: Value) -> Result<Self, serde_path_to_error::Error<serde_json::Error>> {
        match value {
            rows @ Value::Array(_) => serde_path_to_error::deserialize(rows).map(UpstreamBody::Many),
            other => serde_path_to_error::deserialize(other).map(UpstreamBody::One),
        }
    }
}

impl<T> UpstreamBody<T> {
    /// First element of a sequence, or the object itself
    pub fn into_single(self) -> Option<T> {
        match self {
            UpstreamBody::One(item) => Some(item),
            UpstreamBody::Many(items) => items.into_iter().next(),
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            UpstreamBody::One(item) => vec![item],
            UpstreamBody::Many(items) => items,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

/// CRUD over the news collection. Claims are passed through so
/// implementations can forward the caller's credentials.
#[async_trait]
pub trait NewsStore: Send + Sync {
    /// Newest first
    async fn list(&self, claims: &Claims, page: Page) -> Result<Vec<NewsOut>, UpstreamError>;

    async fn get(&self, claims: &Claims, id: Uuid) -> Result<Option<NewsOut>, UpstreamError>;

    async fn create(&self, claims: &Claims, draft: &NewsCreate) -> Result<NewsOut, UpstreamError>;

    /// Applies the supplied fields only. Callers re-fetch to observe the result.
    async fn update(&self, claims: &Claims, id: Uuid, patch: &NewsUpdate) -> Result<(), UpstreamError>;

    async fn delete(&self, claims: &Claims, id: Uuid) -> Result<(), UpstreamError>;
}
