//! HTTP API handlers for pagemill

pub mod articles;
pub mod health;

pub use articles::article_routes;
pub use health::health_routes;
