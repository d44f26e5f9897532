#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use news_gateway::auth::{AuthError, Claims, TokenVerifier};
use news_gateway::config::ApiConfig;
use news_gateway::models::{NewsCreate, NewsOut, NewsUpdate};
use news_gateway::upstream::{NewsStore, Page, UpstreamError};
use news_gateway::{create_router, AppState};

pub const TOKEN: &str = "valid-token";

/// Accepts exactly one token
#[derive(Default)]
pub struct StaticVerifier {
    pub calls: AtomicUsize,
}

#[async_trait]
impl TokenVerifier for StaticVerifier {
    async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if token == TOKEN {
            Ok(Claims {
                id: Some("user-1".to_string()),
                access_token: Some(token.to_string()),
                ..Default::default()
            })
        } else {
            Err(AuthError::Rejected(401))
        }
    }
}

/// In-memory collection behaving like the PostgREST table
#[derive(Default)]
pub struct MemoryStore {
    pub items: Mutex<Vec<NewsOut>>,
    pub calls: AtomicUsize,
    /// Simulates another request deleting the row between update and re-fetch
    pub vanish_on_update: AtomicBool,
    /// Status and body the next create should fail with
    pub reject_create: Mutex<Option<(u16, String)>>,
}

impl MemoryStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl NewsStore for MemoryStore {
    async fn list(&self, _claims: &Claims, page: Page) -> Result<Vec<NewsOut>, UpstreamError> {
        self.hit();
        let mut items = self.items.lock().unwrap().clone();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect())
    }

    async fn get(&self, _claims: &Claims, id: Uuid) -> Result<Option<NewsOut>, UpstreamError> {
        self.hit();
        Ok(self.items.lock().unwrap().iter().find(|n| n.id == id).cloned())
    }

    async fn create(&self, _claims: &Claims, draft: &NewsCreate) -> Result<NewsOut, UpstreamError> {
        self.hit();
        if let Some((status, body)) = self.reject_create.lock().unwrap().take() {
            return Err(UpstreamError::Status { status, body });
        }

        let mut items = self.items.lock().unwrap();
        let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
            + Duration::seconds(items.len() as i64);
        let item = NewsOut {
            id: Uuid::new_v4(),
            title: draft.title.clone(),
            summary: draft.summary.clone(),
            content: draft.content.clone(),
            author: draft.author.clone(),
            image_url: draft.image_url.clone(),
            created_at: Some(created_at),
            updated_at: Some(created_at),
        };
        items.push(item.clone());
        Ok(item)
    }

    async fn update(&self, _claims: &Claims, id: Uuid, patch: &NewsUpdate) -> Result<(), UpstreamError> {
        self.hit();
        let mut items = self.items.lock().unwrap();
        if let Some(item) = items.iter_mut().find(|n| n.id == id) {
            apply_patch(item, patch);
        }
        if self.vanish_on_update.load(Ordering::SeqCst) {
            items.retain(|n| n.id != id);
        }
        Ok(())
    }

    async fn delete(&self, _claims: &Claims, id: Uuid) -> Result<(), UpstreamError> {
        self.hit();
        self.items.lock().unwrap().retain(|n| n.id != id);
        Ok(())
    }
}

/// Overlay the supplied fields of a patch, the way PostgREST applies a PATCH
pub fn apply_patch(item: &mut NewsOut, patch: &NewsUpdate) {
    if let Some(title) = &patch.title {
        item.title = title.clone();
    }
    if let Some(summary) = &patch.summary {
        item.summary = Some(summary.clone());
    }
    if let Some(content) = &patch.content {
        item.content = content.clone();
    }
    if let Some(author) = &patch.author {
        item.author = Some(author.clone());
    }
    if let Some(image_url) = &patch.image_url {
        item.image_url = Some(image_url.clone());
    }
}

/// Accepts connections and never answers; returns its base URL
pub async fn silent_upstream() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{}", addr)
}

pub struct TestApp {
    pub router: Router,
    pub verifier: Arc<StaticVerifier>,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_api(ApiConfig::default())
    }

    pub fn with_api(api: ApiConfig) -> Self {
        let verifier = Arc::new(StaticVerifier::default());
        let store = Arc::new(MemoryStore::default());
        let state = AppState::new(verifier.clone(), store.clone(), api);
        Self {
            router: create_router(state),
            verifier,
            store,
        }
    }

    /// Send a request carrying the valid bearer token
    pub async fn call(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.call_with_auth(method, uri, Some(&format!("Bearer {}", TOKEN)), body)
            .await
    }

    pub async fn call_with_auth(
        &self,
        method: &str,
        uri: &str,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        send(self.router.clone(), request).await
    }
}

/// Drive the router once; empty bodies come back as `Value::Null`
pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
