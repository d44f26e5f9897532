pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;
pub mod upstream;

pub use app::create_router;
pub use config::AppConfig;
pub use state::AppState;

#[cfg(test)]
pub mod testing;
