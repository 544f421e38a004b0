pub mod auth;

pub use auth::api_secret_middleware;
