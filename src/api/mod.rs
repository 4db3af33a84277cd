//! HTTP surface: key handlers and request middleware.

pub mod middleware;
pub mod services;
