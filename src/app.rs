use axum::{
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::middleware::identity_auth_middleware;
use crate::state::AppState;

/// Full application router: public health check plus the protected news API
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/health", get(handlers::health))
        // Protected
        .merge(news_routes(state.clone()))
        // Global middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

fn news_routes(state: AppState) -> Router<AppState> {
    use handlers::news;

    Router::new()
        .route("/news", get(news::list).post(news::create))
        .route(
            "/news/:id",
            get(news::get).patch(news::patch).delete(news::delete),
        )
        .route_layer(from_fn_with_state(state, identity_auth_middleware))
}
