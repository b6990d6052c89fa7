//! Recurring background drains.
//!
//! [`SyncEngine::start_background`] spawns a tokio task that drains the
//! queue immediately and then on every interval tick.  The returned
//! [`SyncTaskHandle`] stops future invocations; a drain already in flight is
//! allowed to finish.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::engine::SyncEngine;
use crate::error::SyncError;

/// Stop handle for the background sync loop.
///
/// An inert handle (auto-sync disabled) is returned with no task behind it;
/// stopping it is a no-op.  Dropping an active handle also signals the loop
/// to stop.
pub struct SyncTaskHandle {
    stop_tx: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl SyncTaskHandle {
    fn inert() -> Self {
        Self {
            stop_tx: None,
            task: None,
        }
    }

    /// Whether a background loop is running behind this handle.
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop future scheduled drains and wait for the loop to wind down.
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(true);
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for SyncTaskHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(true);
        }
    }
}

impl SyncEngine {
    /// Start the recurring background drain loop.
    ///
    /// Returns an inert handle without doing any work when auto-sync is
    /// disabled.  Otherwise the loop drains once immediately, then on every
    /// `interval` tick.  Drain errors are logged and never stop the loop.
    pub async fn start_background(
        self: &Arc<Self>,
        interval: Duration,
    ) -> Result<SyncTaskHandle, SyncError> {
        let settings = self.settings().await?;
        if !settings.auto_sync {
            info!("auto-sync disabled, background loop not started");
            return Ok(SyncTaskHandle::inert());
        }

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let engine = Arc::clone(self);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = engine.drain().await {
                            warn!(error = %e, "scheduled drain failed");
                        }
                    }
                }
            }

            debug!("background sync loop stopped");
        });

        info!(interval_ms = interval.as_millis() as u64, "background sync loop started");
        Ok(SyncTaskHandle {
            stop_tx: Some(stop_tx),
            task: Some(task),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use liftlog_shared::{AnonymousDataPayload, BodyProfile, WorkoutRecord, WorkoutSet};
    use liftlog_store::{Database, QueueCounts, SyncSettingsUpdate};
    use tokio::sync::Mutex;

    use crate::transport::{Transport, TransportError};

    struct CountingTransport {
        sent: AtomicUsize,
    }

    #[async_trait]
    impl Transport for CountingTransport {
        async fn send(&self, _payload: &AnonymousDataPayload) -> Result<(), TransportError> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn test_engine() -> (tempfile::TempDir, Arc<SyncEngine>, Arc<CountingTransport>) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        let transport = Arc::new(CountingTransport {
            sent: AtomicUsize::new(0),
        });
        let engine = Arc::new(SyncEngine::new(
            Arc::new(Mutex::new(db)),
            transport.clone(),
        ));
        (dir, engine, transport)
    }

    fn sample_inputs() -> (BodyProfile, Vec<WorkoutRecord>) {
        let profile = BodyProfile {
            name: "Alex".into(),
            height_cm: 181.0,
            weight_kg: 82.5,
            weekly_frequency: 4,
            goals: None,
        };
        let records = vec![WorkoutRecord {
            user_id: "user-42".into(),
            date: Utc.with_ymd_and_hms(2025, 6, 1, 18, 30, 0).unwrap(),
            body_part: "chest".into(),
            exercise_name: "bench press".into(),
            sets: vec![WorkoutSet { weight: 80.0, reps: 8 }],
            notes: None,
            image_paths: vec![],
        }];
        (profile, records)
    }

    #[tokio::test]
    async fn disabled_auto_sync_yields_an_inert_handle() {
        let (_dir, engine, transport) = test_engine();
        engine.set_sharing_enabled(true).await.unwrap();

        let handle = engine
            .start_background(Duration::from_millis(5))
            .await
            .unwrap();
        assert!(!handle.is_active());

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(transport.sent.load(Ordering::SeqCst), 0);

        handle.stop().await;
    }

    #[tokio::test]
    async fn background_loop_drains_and_stops() {
        let (_dir, engine, transport) = test_engine();
        engine
            .apply_settings(&SyncSettingsUpdate {
                enabled: Some(true),
                auto_sync: Some(true),
                retry_delay_ms: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();

        let (profile, records) = sample_inputs();
        engine.queue("user-42", &profile, &records).await.unwrap();

        let handle = engine
            .start_background(Duration::from_millis(10))
            .await
            .unwrap();
        assert!(handle.is_active());

        // The first drain fires immediately; give it a moment to land.
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            if engine.queue_counts().await.unwrap() == QueueCounts::default() {
                break;
            }
            assert!(tokio::time::Instant::now() < deadline, "queue never drained");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        handle.stop().await;
        assert!(transport.sent.load(Ordering::SeqCst) >= 1);
    }
}
