use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A single-use access key.
///
/// Persisted as camelCase JSON. Records written by older deployments may
/// lack `createdAt`; such records never expire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRecord {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub used: bool,
    #[serde(default)]
    pub used_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub short_link: String,
    #[serde(default)]
    pub original_link: String,
}

impl KeyRecord {
    pub fn new(
        id: impl Into<String>,
        original_link: impl Into<String>,
        short_link: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            created_at: Some(now),
            used: false,
            used_at: None,
            short_link: short_link.into(),
            original_link: original_link.into(),
        }
    }

    /// Unused, dated, and older than `window`.
    ///
    /// Used records and records without a creation time are never expired.
    pub fn is_expired(&self, now: DateTime<Utc>, window: Duration) -> bool {
        if self.used {
            return false;
        }
        match self.created_at {
            Some(created_at) => now - created_at > window,
            None => false,
        }
    }

    /// Transition `Unused -> Used`. `usedAt` never precedes `createdAt`,
    /// even if the clock stepped backwards between issue and redeem.
    pub fn mark_used(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let used_at = match self.created_at {
            Some(created_at) if now < created_at => created_at,
            _ => now,
        };
        self.used = true;
        self.used_at = Some(used_at);
        used_at
    }
}

/// Aggregate counters over the whole collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyStats {
    pub total: usize,
    pub used: usize,
    pub available: usize,
}

impl KeyStats {
    pub fn from_records(records: &[KeyRecord]) -> Self {
        let total = records.len();
        let used = records.iter().filter(|r| r.used).count();
        Self {
            total,
            used,
            available: total - used,
        }
    }
}
