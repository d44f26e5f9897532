// handlers/mod.rs - Public (no auth) and protected (bearer token) endpoints
pub mod health;
pub mod news;

pub use health::health;
