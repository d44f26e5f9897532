pub mod auth;
pub mod response;

pub use auth::identity_auth_middleware;
pub use response::{ApiResponse, ApiResult};
