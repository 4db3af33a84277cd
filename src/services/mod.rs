//! Service layer for business logic
//!
//! Key lifecycle, the outbound shortener gateway and the expiry sweeper.
//! HTTP handlers and the CLI both go through these.

pub mod gateway;
mod key_service;
mod sweeper;

pub use gateway::{LinkShortener, MonetizzyGateway};
pub use key_service::*;
pub use sweeper::ExpirySweeper;
