pub mod file;
pub mod models;

pub use file::{KeyStore, Outcome};
pub use models::{KeyRecord, KeyStats};
