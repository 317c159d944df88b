//! HTTP API handlers for ariadne-resolver

pub mod health;
pub mod resolve;

pub use health::health_routes;
pub use resolve::{resolve, run_isolated};
