//! Background eviction of expired charges
//!
//! The sweeper wakes up once per interval and asks the [`ChargeService`] to
//! drop every charge older than the retention window, whatever its status.

use super::config::{MAX_SWEEPER_SECONDS, SweeperConfig};
use super::service::ChargeService;
use chrono::Utc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// Periodic expiry sweeper
pub struct ExpirySweeper {
    service: ChargeService,
    interval: Duration,
    retention: chrono::Duration,
}

impl ExpirySweeper {
    pub fn new(service: ChargeService, interval: Duration, retention: chrono::Duration) -> Self {
        Self {
            service,
            interval: interval.min(Duration::from_secs(MAX_SWEEPER_SECONDS)),
            retention,
        }
    }

    pub fn from_config(service: ChargeService, config: &SweeperConfig) -> Self {
        Self::new(service, config.interval(), config.retention())
    }

    /// Spawn the sweep loop on its own task
    ///
    /// The first sweep runs one full interval after this call.
    pub fn spawn(self) -> SweeperHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let task = tokio::spawn(self.run(shutdown_rx));
        SweeperHandle { shutdown_tx, task }
    }

    async fn run(self, mut shutdown_rx: mpsc::Receiver<()>) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            retention_secs = self.retention.num_seconds(),
            "Expiry sweeper started"
        );

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Shutdown signal received, stopping expiry sweeper");
                    break;
                }
                _ = ticker.tick() => self.tick().await,
            }
        }

        tracing::info!("Expiry sweeper stopped");
    }

    /// Run one sweep now. Errors are logged, never returned.
    pub async fn tick(&self) {
        match self.service.sweep(Utc::now(), self.retention).await {
            Ok(report) => tracing::info!(
                scanned = report.scanned,
                evicted = report.evicted,
                pruned = report.pruned,
                skipped = report.skipped,
                "Expiry sweep finished"
            ),
            Err(e) => tracing::error!(error = %e, "Expiry sweep failed"),
        }
    }
}

/// Handle to a running sweeper
pub struct SweeperHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the loop and wait for the current sweep to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charges::{ChargesConfig, NewCharge, Origin, StoredCharge};
    use crate::store::InMemoryChargeStore;
    use crate::traits::store::ChargeStoreExt;
    use std::sync::Arc;

    async fn service_with_stale_charge() -> (ChargeService, InMemoryChargeStore) {
        let store = InMemoryChargeStore::new();
        let service = ChargeService::new(Arc::new(store.clone()), ChargesConfig::default());
        let charge = service
            .create(
                None,
                &Origin::new("http", "localhost"),
                NewCharge {
                    name: "Old".to_string(),
                    price: Some(1.0),
                    return_url: "https://x.test".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let key = service.keys().record(charge.id);
        let mut stored: StoredCharge = store.get(&key).await.unwrap();
        stored.charge.created_at -= chrono::Duration::days(2);
        store.set(&key, &stored).await.unwrap();

        (service, store)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_sweep_waits_one_interval() {
        let (service, _) = service_with_stale_charge().await;
        let handle = ExpirySweeper::new(
            service.clone(),
            Duration::from_secs(60),
            chrono::Duration::hours(24),
        )
        .spawn();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(service.list(None).await.unwrap().len(), 1);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(service.list(None).await.unwrap().is_empty());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_tick_evicts() {
        let (service, store) = service_with_stale_charge().await;
        let sweeper = ExpirySweeper::new(
            service.clone(),
            Duration::from_secs(3600),
            chrono::Duration::hours(24),
        );

        sweeper.tick().await;

        assert!(service.list(None).await.unwrap().is_empty());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_shutdown_stops_loop() {
        let (service, _) = service_with_stale_charge().await;
        let handle = ExpirySweeper::from_config(service.clone(), &SweeperConfig::default()).spawn();

        tokio::time::timeout(Duration::from_secs(1), handle.shutdown())
            .await
            .unwrap();
        assert_eq!(service.list(None).await.unwrap().len(), 1);
    }
}
