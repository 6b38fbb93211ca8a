//! Opt-in proactive health checking (see `SPEC_FULL.md`'s expansion
//! notes on the supervisor). Not wired into [`super::node::Supervisor::decide`]
//! by default — a caller that wants health-driven restarts feeds a
//! failed check into the supervisor itself via its `on_failure` hook.

// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use tokio::sync::oneshot;
use tokio::time::interval;

// Layer 3: Internal module imports
use pipeline_core::ActorPath;

/// Result of one health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded(String),
    Failed(String),
}

/// A synchronous, non-blocking probe of one actor's health.
pub type HealthCheck = Arc<dyn Fn() -> HealthStatus + Send + Sync>;

/// Spawns a background task that polls `checks` on `interval` and calls
/// `on_failed` for every path whose check reports [`HealthStatus::Failed`].
/// Returns a handle and a shutdown sender; dropping or firing the sender
/// stops the loop.
pub fn spawn_health_monitor(
    checks: Vec<(ActorPath, HealthCheck)>,
    interval_duration: Duration,
    on_failed: impl Fn(&ActorPath, &str) + Send + 'static,
) -> (tokio::task::JoinHandle<()>, oneshot::Sender<()>) {
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

    let handle = tokio::spawn(async move {
        let mut ticker = interval(interval_duration);
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => break,
                _ = ticker.tick() => {
                    for (path, check) in &checks {
                        if let HealthStatus::Failed(reason) = check() {
                            on_failed(path, &reason);
                        }
                    }
                }
            }
        }
    });

    (handle, shutdown_tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;

    #[tokio::test]
    async fn failed_checks_invoke_the_callback() {
        let failures = Arc::new(AtomicUsize::new(0));
        let failures_clone = failures.clone();
        let path = ActorPath::root("worker");
        let check: HealthCheck = Arc::new(|| HealthStatus::Failed("stuck".to_string()));

        let (handle, shutdown_tx) = spawn_health_monitor(
            vec![(path, check)],
            StdDuration::from_millis(10),
            move |_path, _reason| {
                failures_clone.fetch_add(1, Ordering::SeqCst);
            },
        );

        tokio::time::sleep(StdDuration::from_millis(35)).await;
        let _ = shutdown_tx.send(());
        let _ = handle.await;

        assert!(failures.load(Ordering::SeqCst) >= 2);
    }
}
