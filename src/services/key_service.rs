//! Key lifecycle
//!
//! Issues keys, redeems them at most once and reports counters. Per record
//! the state machine is `Unused -> Used`; expiry is evaluated lazily, only
//! while a record is still unused.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use super::gateway::LinkShortener;
use crate::errors::{KeygateError, Result};
use crate::storage::{KeyRecord, KeyStats, KeyStore, Outcome};
use crate::utils::generate_key_id;
use crate::utils::url_validator::validate_url;

/// Attempts at drawing an id not already present in the collection.
const MAX_ID_ATTEMPTS: usize = 8;

/// Outcome of a redemption attempt on an existing key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redemption {
    /// The key was unused and is now consumed.
    Valid { used_at: DateTime<Utc> },
    /// The key had already been consumed; nothing changed.
    AlreadyUsed { used_at: Option<DateTime<Utc>> },
    /// The key aged out before use; left in place for the sweeper.
    Expired,
}

impl Redemption {
    pub fn is_valid(&self) -> bool {
        matches!(self, Redemption::Valid { .. })
    }

    pub fn message(&self) -> &'static str {
        match self {
            Redemption::Valid { .. } => "Chave válida! Acesso liberado.",
            Redemption::AlreadyUsed { .. } => "Esta chave já foi utilizada",
            Redemption::Expired => "Esta chave expirou",
        }
    }
}

/// Service for key lifecycle operations
pub struct KeyService {
    store: Arc<KeyStore>,
    shortener: Arc<dyn LinkShortener>,
    expiry: Duration,
}

impl KeyService {
    pub fn new(store: Arc<KeyStore>, shortener: Arc<dyn LinkShortener>, expiry: Duration) -> Self {
        Self {
            store,
            shortener,
            expiry,
        }
    }

    pub fn store(&self) -> &Arc<KeyStore> {
        &self.store
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    /// Validate `link`, shorten it through the gateway, then issue a key.
    ///
    /// The gateway round trip happens before the store is touched, so a slow
    /// or failing upstream never holds the mutation lock and never leaves a
    /// record behind.
    pub async fn create_key(&self, link: &str) -> Result<KeyRecord> {
        validate_url(link)?;
        // the gateway sees exactly the link that gets stored
        let original_link = link.trim();

        let short_link = self.shortener.shorten(original_link).await?;
        debug!("{} shortened {}", self.shortener.name(), original_link);

        self.issue(original_link, &short_link)
    }

    /// Create and persist a new unused key for an already-shortened link.
    pub fn issue(&self, original_link: &str, short_link: &str) -> Result<KeyRecord> {
        self.issue_at(original_link, short_link, Utc::now())
    }

    pub fn issue_at(
        &self,
        original_link: &str,
        short_link: &str,
        now: DateTime<Utc>,
    ) -> Result<KeyRecord> {
        validate_url(original_link)?;

        let record = self.store.mutate(|records| {
            let id = (0..MAX_ID_ATTEMPTS)
                .map(|_| generate_key_id())
                .find(|candidate| !records.iter().any(|r| &r.id == candidate))
                .ok_or_else(|| {
                    warn!("Could not draw an unused key id in {} attempts", MAX_ID_ATTEMPTS);
                    KeygateError::storage("falha ao gerar identificador único")
                })?;

            let record = KeyRecord::new(id, original_link.trim(), short_link, now);
            records.push(record.clone());
            Ok(Outcome::Changed(record))
        })?;

        info!("Issued key {}", mask_id(&record.id));
        Ok(record)
    }

    /// Consume the key `id` if it is unused and unexpired.
    ///
    /// `id` is matched exactly; callers are expected to have normalized it.
    pub fn redeem(&self, id: &str) -> Result<Redemption> {
        self.redeem_at(id, Utc::now())
    }

    pub fn redeem_at(&self, id: &str, now: DateTime<Utc>) -> Result<Redemption> {
        let expiry = self.expiry;

        let outcome = self.store.mutate(|records| {
            let record = records
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| KeygateError::not_found("Chave não encontrada"))?;

            if record.used {
                return Ok(Outcome::Unchanged(Redemption::AlreadyUsed {
                    used_at: record.used_at,
                }));
            }

            if record.is_expired(now, expiry) {
                return Ok(Outcome::Unchanged(Redemption::Expired));
            }

            let used_at = record.mark_used(now);
            Ok(Outcome::Changed(Redemption::Valid { used_at }))
        });

        match &outcome {
            Ok(Redemption::Valid { .. }) => info!("Redeemed key {}", mask_id(id)),
            Ok(Redemption::AlreadyUsed { .. }) => {
                info!("Rejected reuse of key {}", mask_id(id))
            }
            Ok(Redemption::Expired) => info!("Rejected expired key {}", mask_id(id)),
            Err(KeygateError::NotFound(_)) => debug!("Unknown key {}", mask_id(id)),
            Err(e) => warn!("Redemption of key {} failed: {}", mask_id(id), e),
        }

        outcome
    }

    /// Counters over the current collection. Expired-but-unused keys count
    /// as available until the sweeper removes them.
    pub fn status(&self) -> KeyStats {
        self.store.stats()
    }
}

/// Keep only a short prefix of a credential for logs.
fn mask_id(id: &str) -> String {
    let prefix: String = id.chars().take(6).collect();
    format!("{}***", prefix)
}
