//! Background retention sweep.
//!
//! Deletes conversation rows and sessions older than the retention horizon.
//! The sweep is idempotent: running it twice with the same horizon deletes
//! nothing the second time.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use soma_types::config::RetentionConfig;
use soma_types::error::StorageError;
use soma_types::stats::PurgeReport;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::store::repository::MaintenanceRepository;

/// Purges records older than `retention_days`.
pub struct RetentionSweeper<S> {
    store: Arc<S>,
    retention_days: u32,
    warmup: Duration,
    interval: Option<Duration>,
}

impl<S> Clone for RetentionSweeper<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            retention_days: self.retention_days,
            warmup: self.warmup,
            interval: self.interval,
        }
    }
}

impl<S: MaintenanceRepository + 'static> RetentionSweeper<S> {
    pub fn new(store: Arc<S>, retention_days: u32, schedule: &RetentionConfig) -> Self {
        Self {
            store,
            retention_days,
            warmup: Duration::from_secs(schedule.warmup_secs),
            interval: schedule
                .interval_hours
                .filter(|h| *h > 0)
                .map(|h| Duration::from_secs(h.saturating_mul(3600))),
        }
    }

    pub fn retention_days(&self) -> u32 {
        self.retention_days
    }

    /// Oldest timestamp that survives a sweep run at `now`.
    ///
    /// Periods reaching past the representable range clamp to the earliest
    /// instant, so nothing is deleted.
    pub fn horizon(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        TimeDelta::try_days(i64::from(self.retention_days))
            .and_then(|period| now.checked_sub_signed(period))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Run one sweep against the current time.
    pub async fn run_once(&self) -> Result<PurgeReport, StorageError> {
        self.run_at(Utc::now()).await
    }

    /// Run one sweep as if the current time were `now`.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<PurgeReport, StorageError> {
        let horizon = self.horizon(now);
        let report = self.store.purge_older_than(horizon).await?;
        info!(
            retention_days = self.retention_days,
            messages_deleted = report.messages_deleted,
            sessions_deleted = report.sessions_deleted,
            "retention sweep complete"
        );
        Ok(report)
    }

    /// Spawn the sweep on its own task.
    ///
    /// Waits out the warm-up delay, sweeps, then repeats at the configured
    /// interval (or exits after the first run when none is set). Cancelling
    /// `shutdown` stops the task at its next wait point.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut delay = self.warmup;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        info!("retention sweep cancelled");
                        return;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }

                if let Err(e) = self.run_once().await {
                    warn!(error = %e, "retention sweep failed");
                }

                match self.interval {
                    Some(every) => delay = every,
                    None => return,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;
    use crate::store::repository::{ConversationLog, MaintenanceRepository};
    use soma_types::message::{Message, MessageRole};

    fn schedule(warmup_secs: u64, interval_hours: Option<u64>) -> RetentionConfig {
        RetentionConfig {
            warmup_secs,
            interval_hours,
        }
    }

    async fn seed(store: &InMemoryStore, now: DateTime<Utc>, days_ago: &[i64]) {
        for (i, d) in days_ago.iter().enumerate() {
            let msg = Message::now(format!("s{i}"), MessageRole::User, "hello")
                .at(now - TimeDelta::days(*d));
            store.append_message(&msg).await.unwrap();
        }
    }

    #[test]
    fn test_horizon() {
        let sweeper = RetentionSweeper::new(Arc::new(InMemoryStore::new()), 30, &schedule(5, None));
        let now = Utc::now();
        assert_eq!(now - sweeper.horizon(now), TimeDelta::days(30));
    }

    #[tokio::test]
    async fn test_huge_retention_clamps_horizon_and_keeps_everything() {
        let store = Arc::new(InMemoryStore::new());
        let now = Utc::now();
        seed(&store, now, &[45, 10]).await;

        let sweeper = RetentionSweeper::new(store.clone(), u32::MAX, &schedule(5, Some(u64::MAX)));
        assert_eq!(sweeper.horizon(now), DateTime::<Utc>::MIN_UTC);
        assert!(sweeper.run_at(now).await.unwrap().is_empty());
        assert_eq!(store.stats().await.unwrap().messages, 2);
    }

    #[test]
    fn test_zero_interval_means_run_once() {
        let sweeper = RetentionSweeper::new(Arc::new(InMemoryStore::new()), 30, &schedule(5, Some(0)));
        assert!(sweeper.interval.is_none());
    }

    #[tokio::test]
    async fn test_run_deletes_only_expired_and_is_idempotent() {
        let store = Arc::new(InMemoryStore::new());
        let now = Utc::now();
        seed(&store, now, &[45, 10]).await;

        let sweeper = RetentionSweeper::new(store.clone(), 30, &schedule(5, None));
        let report = sweeper.run_at(now).await.unwrap();
        assert_eq!(report.messages_deleted, 1);
        assert_eq!(report.sessions_deleted, 1);
        assert_eq!(store.stats().await.unwrap().messages, 1);

        let again = sweeper.run_at(now).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_waits_for_warmup() {
        let store = Arc::new(InMemoryStore::new());
        seed(&store, Utc::now(), &[45]).await;

        let sweeper = RetentionSweeper::new(store.clone(), 30, &schedule(5, None));
        let handle = sweeper.spawn(CancellationToken::new());

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(store.message_count(), 1);

        handle.await.unwrap();
        assert_eq!(store.message_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_cancelled_before_warmup() {
        let store = Arc::new(InMemoryStore::new());
        seed(&store, Utc::now(), &[45]).await;

        let token = CancellationToken::new();
        let sweeper = RetentionSweeper::new(store.clone(), 30, &schedule(5, None));
        let handle = sweeper.spawn(token.clone());
        token.cancel();
        handle.await.unwrap();
        assert_eq!(store.message_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_repeats_on_interval() {
        let store = Arc::new(InMemoryStore::new());
        let token = CancellationToken::new();
        let sweeper = RetentionSweeper::new(store.clone(), 30, &schedule(1, Some(1)));
        let handle = sweeper.spawn(token.clone());

        tokio::time::sleep(Duration::from_secs(2)).await;
        seed(&store, Utc::now(), &[45]).await;
        assert_eq!(store.message_count(), 1);

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(store.message_count(), 0);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_sweep_does_not_panic() {
        let store = Arc::new(InMemoryStore::new());
        store.set_failing(true);
        let sweeper = RetentionSweeper::new(store, 30, &schedule(0, None));
        assert!(sweeper.run_once().await.is_err());
        sweeper.spawn(CancellationToken::new()).await.unwrap();
    }
}
