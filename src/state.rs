use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::config::ApiConfig;
use crate::upstream::NewsStore;

/// Shared, immutable per-process state handed to every request
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<dyn TokenVerifier>,
    pub store: Arc<dyn NewsStore>,
    pub api: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(verifier: Arc<dyn TokenVerifier>, store: Arc<dyn NewsStore>, api: ApiConfig) -> Self {
        Self {
            verifier,
            store,
            api: Arc::new(api),
        }
    }
}
