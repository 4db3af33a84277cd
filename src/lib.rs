//! Keygate - single-use access keys behind a link shortener
//!
//! Keys are issued after a successful call to an external link-shortening
//! API and can be redeemed exactly once. Unused keys expire after a fixed
//! window and are pruned by a background sweeper.
//!
//! # Architecture
//! - `storage`: `KeyRecord` and the file-backed `KeyStore`
//! - `services`: key lifecycle, shortener gateway, expiry sweeper
//! - `api`: HTTP handlers and middleware
//! - `config`: static configuration (TOML + environment)
//! - `runtime`: startup, shutdown and execution modes
//! - `system`: logging

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
