pub mod keys;
pub mod types;

pub use keys::{ApiSettings, KeyApi, PAYLOAD_TOO_LARGE_CODE, json_config, key_routes};
