//! Availability monitor — probes the health endpoint on a fixed interval and
//! publishes the latest [`StatusSnapshot`] through a watch channel.
//!
//! The loop runs on its own task. It probes once immediately and then once per
//! interval, strictly one probe at a time. Tearing the handle down (explicit
//! [`MonitorHandle::stop`] or drop) cancels the loop; a probe that is still in
//! flight is dropped and its outcome is never published.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::TransportError;
use crate::models::status::{AvailabilityGate, BackendStatus, StatusSnapshot};

/// Source of health checks. `ApiClient` probes `GET health/`.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self) -> Result<(), TransportError>;
}

pub struct AvailabilityMonitor {
    probe: Arc<dyn HealthProbe>,
    interval: Duration,
}

impl AvailabilityMonitor {
    /// A zero interval is raised to 1ms; tokio intervals cannot be zero.
    pub fn new(probe: Arc<dyn HealthProbe>, interval: Duration) -> Self {
        Self {
            probe,
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    /// Spawns the polling loop. Must be called inside a tokio runtime.
    pub fn start(self) -> MonitorHandle {
        let (tx, rx) = watch::channel(StatusSnapshot::unknown());
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(self.probe, self.interval, tx, cancel.clone()));
        info!("Availability monitor started (interval: {}ms)", self.interval.as_millis());
        MonitorHandle {
            state: rx,
            cancel,
            task: Some(task),
        }
    }
}

async fn run(
    probe: Arc<dyn HealthProbe>,
    interval: Duration,
    tx: watch::Sender<StatusSnapshot>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            outcome = probe.probe() => outcome,
        };
        if cancel.is_cancelled() {
            break;
        }

        let snapshot = StatusSnapshot::from_probe(&outcome, Utc::now());
        let previous = tx.send_replace(snapshot.clone());
        if previous.status != snapshot.status {
            match snapshot.status {
                BackendStatus::Available => info!("Backend available"),
                _ => warn!("Backend unavailable: {}", snapshot.message),
            }
        } else {
            debug!("Backend status unchanged: {:?}", snapshot.status);
        }
    }

    debug!("Availability monitor loop exited");
}

/// Live handle to a running monitor. Dropping it tears the monitor down.
pub struct MonitorHandle {
    state: watch::Receiver<StatusSnapshot>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    pub fn snapshot(&self) -> StatusSnapshot {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> BackendStatus {
        self.state.borrow().status
    }

    /// A receiver that wakes on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.state.clone()
    }

    /// Waits until the first probe has completed and returns its snapshot.
    pub async fn ready(&self) -> StatusSnapshot {
        let mut rx = self.state.clone();
        if rx
            .wait_for(|s| s.status != BackendStatus::Unknown)
            .await
            .is_err()
        {
            debug!("Monitor loop ended before the first probe completed");
        }
        let snapshot = rx.borrow().clone();
        snapshot
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Cancels the timer and waits for the loop to exit.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!("Availability monitor task failed: {e}");
                }
            }
        }
        info!("Availability monitor stopped");
    }
}

impl AvailabilityGate for MonitorHandle {
    fn backend_status(&self) -> BackendStatus {
        self.status()
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use axum::{routing::get, Router};
    use tokio::sync::Notify;

    use super::*;
    use crate::errors::{BACKEND_UNREACHABLE_MESSAGE, SERVER_ERROR_MESSAGE};
    use crate::models::status::BACKEND_RUNNING_MESSAGE;
    use crate::testing::{client_for, spawn_backend};

    const INTERVAL: Duration = Duration::from_millis(30_000);

    /// Replays queued outcomes, then keeps succeeding.
    #[derive(Default)]
    struct ScriptedProbe {
        outcomes: Mutex<VecDeque<Result<(), TransportError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedProbe {
        fn with(outcomes: Vec<Result<(), TransportError>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HealthProbe for ScriptedProbe {
        async fn probe(&self) -> Result<(), TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes.lock().unwrap().pop_front().unwrap_or(Ok(()))
        }
    }

    /// Blocks every probe until released.
    #[derive(Default)]
    struct GatedProbe {
        release: Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HealthProbe for GatedProbe {
        async fn probe(&self) -> Result<(), TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_starts_unknown_then_probes_immediately() {
        let probe = ScriptedProbe::with(vec![]);
        let handle = AvailabilityMonitor::new(probe.clone(), INTERVAL).start();
        assert_eq!(handle.status(), BackendStatus::Unknown);

        let snap = handle.ready().await;
        assert_eq!(snap.status, BackendStatus::Available);
        assert_eq!(snap.message, BACKEND_RUNNING_MESSAGE);
        assert_eq!(probe.calls(), 1);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_probes_on_every_interval() {
        let probe = ScriptedProbe::with(vec![]);
        let handle = AvailabilityMonitor::new(probe.clone(), INTERVAL).start();

        // Probes at t = 0s, 30s, 60s.
        tokio::time::sleep(Duration::from_millis(61_000)).await;
        assert_eq!(probe.calls(), 3);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_transitions_are_unconditional() {
        let probe = ScriptedProbe::with(vec![
            Ok(()),
            Err(TransportError::ServerError { status: 500 }),
            Ok(()),
            Err(TransportError::BackendUnreachable),
        ]);
        let handle = AvailabilityMonitor::new(probe.clone(), INTERVAL).start();
        let mut rx = handle.subscribe();

        let mut seen = Vec::new();
        for _ in 0..4 {
            rx.changed().await.unwrap();
            let snap = rx.borrow_and_update().clone();
            seen.push((snap.status, snap.message));
        }

        assert_eq!(
            seen,
            vec![
                (BackendStatus::Available, BACKEND_RUNNING_MESSAGE.to_string()),
                (BackendStatus::Unavailable, SERVER_ERROR_MESSAGE.to_string()),
                (BackendStatus::Available, BACKEND_RUNNING_MESSAGE.to_string()),
                (BackendStatus::Unavailable, BACKEND_UNREACHABLE_MESSAGE.to_string()),
            ]
        );
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_probe_after_stop() {
        let probe = ScriptedProbe::with(vec![]);
        let handle = AvailabilityMonitor::new(probe.clone(), INTERVAL).start();
        handle.ready().await;
        handle.stop().await;

        let calls = probe.calls();
        tokio::time::sleep(INTERVAL * 5).await;
        assert_eq!(probe.calls(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_timer() {
        let probe = ScriptedProbe::with(vec![]);
        let handle = AvailabilityMonitor::new(probe.clone(), INTERVAL).start();
        handle.ready().await;
        drop(handle);

        let calls = probe.calls();
        tokio::time::sleep(INTERVAL * 5).await;
        assert_eq!(probe.calls(), calls);
    }

    #[tokio::test]
    async fn test_stale_probe_result_is_ignored_after_stop() {
        let probe = Arc::new(GatedProbe::default());
        let handle = AvailabilityMonitor::new(probe.clone(), INTERVAL).start();
        let rx = handle.subscribe();

        while probe.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        handle.stop().await;
        probe.release.notify_waiters();
        tokio::task::yield_now().await;

        assert_eq!(rx.borrow().status, BackendStatus::Unknown);
    }

    #[tokio::test]
    async fn test_health_timeout_marks_backend_unavailable() {
        let app = Router::new().route(
            "/health/",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "ok"
            }),
        );
        let base = spawn_backend(app).await;
        let client = client_for(&base, Duration::from_millis(150));
        let handle = AvailabilityMonitor::new(Arc::new(client), INTERVAL).start();

        let snap = handle.ready().await;
        assert_eq!(snap.status, BackendStatus::Unavailable);
        assert_eq!(snap.message, BACKEND_UNREACHABLE_MESSAGE);
        assert!(!handle.is_available());
        handle.stop().await;
    }
}
