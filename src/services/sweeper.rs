//! Expiry sweeper
//!
//! Periodically prunes unused keys older than the expiry window. Runs under
//! the same store lock as issue and redeem, so a redemption that lands first
//! makes its record sweep-immune and a sweep that lands first turns a later
//! redemption into not-found.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, info};

use crate::errors::Result;
use crate::storage::{KeyStore, Outcome};

#[derive(Clone)]
pub struct ExpirySweeper {
    store: Arc<KeyStore>,
    expiry: Duration,
    period: StdDuration,
}

impl ExpirySweeper {
    pub fn new(store: Arc<KeyStore>, expiry: Duration, period: StdDuration) -> Self {
        Self {
            store,
            expiry,
            period,
        }
    }

    /// Remove every expired record; persists only when something was removed.
    pub fn run_once(&self) -> Result<usize> {
        self.run_once_at(Utc::now())
    }

    pub fn run_once_at(&self, now: DateTime<Utc>) -> Result<usize> {
        let expiry = self.expiry;
        self.store.mutate(|records| {
            let before = records.len();
            records.retain(|r| !r.is_expired(now, expiry));
            let removed = before - records.len();

            if removed > 0 {
                Ok(Outcome::Changed(removed))
            } else {
                Ok(Outcome::Unchanged(0))
            }
        })
    }

    /// Start the periodic loop. The first sweep happens one period after
    /// start; each sweep runs on the blocking pool.
    pub fn spawn(self) -> JoinHandle<()> {
        info!(
            "Expiry sweeper started: every {}s, window {}h",
            self.period.as_secs(),
            self.expiry.num_hours()
        );

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + self.period, self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                // the sweep writes the keys file while holding the store lock
                let sweeper = self.clone();
                match tokio::task::spawn_blocking(move || sweeper.run_once()).await {
                    Ok(Ok(0)) => debug!("Expiry sweep: nothing to remove"),
                    Ok(Ok(removed)) => info!("Expiry sweep removed {} expired keys", removed),
                    Ok(Err(e)) => error!("Expiry sweep failed: {}", e),
                    Err(e) => error!("Expiry sweep task failed: {}", e),
                }
            }
        })
    }
}
