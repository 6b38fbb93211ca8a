//! The shared task dispatcher (spec §4.2).
//!
//! "`Dispatch(task)` submits a zero-argument task. `Start(n)` spins up n
//! worker threads; `Stop()` waits for all in-flight tasks to complete
//! then releases workers." In an async runtime a worker thread becomes a
//! worker task and a zero-argument task becomes a boxed future; the
//! queue-full fallback becomes `tokio::spawn` rather than `thread::spawn`.

// Layer 1: Standard library imports
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

// Layer 3: Internal module imports
// (none)

/// A boxed, type-erased unit of dispatcher work.
pub type Task = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Per-worker queue capacity multiplier (spec §4.2: "capacity `n × 100`").
const CAPACITY_PER_WORKER: usize = 100;

struct Shared {
    sender: AsyncMutex<Option<mpsc::Sender<Task>>>,
    receiver: Arc<AsyncMutex<mpsc::Receiver<Task>>>,
}

/// A shared worker pool with an overflow fallback (spec §4.2).
///
/// `Dispatch` tries a non-blocking send into the shared queue; if that
/// queue is full the task is spawned directly rather than blocking the
/// caller — "converts throughput pressure into memory pressure, which is
/// cheaper to observe than a deadlock."
pub struct Dispatcher {
    shared: Arc<Shared>,
    workers: AsyncMutex<Vec<JoinHandle<()>>>,
}

impl Dispatcher {
    /// Builds a dispatcher with no workers started yet. Call [`Dispatcher::start`]
    /// before dispatching, or rely entirely on the spawn fallback.
    pub fn new(worker_count: usize) -> Self {
        let capacity = (worker_count.max(1)) * CAPACITY_PER_WORKER;
        let (sender, receiver) = mpsc::channel(capacity);
        let shared = Arc::new(Shared {
            sender: AsyncMutex::new(Some(sender)),
            receiver: Arc::new(AsyncMutex::new(receiver)),
        });
        Self {
            shared,
            workers: AsyncMutex::new(Vec::new()),
        }
    }

    /// Spins up `n` worker tasks pulling from the shared queue.
    pub async fn start(&self, n: usize) {
        let mut workers = self.workers.lock().await;
        for _ in 0..n {
            let receiver = Arc::clone(&self.shared.receiver);
            workers.push(tokio::spawn(async move {
                loop {
                    let next = {
                        let mut receiver = receiver.lock().await;
                        receiver.recv().await
                    };
                    match next {
                        Some(task) => task.await,
                        None => break,
                    }
                }
            }));
        }
    }

    /// Submits a task. Tries the shared queue first; if it is full, spawns
    /// the task directly so the caller never blocks.
    pub async fn dispatch(&self, task: Task) {
        let sender = self.shared.sender.lock().await.clone();
        let Some(sender) = sender else {
            tokio::spawn(task);
            return;
        };
        match sender.try_send(task) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(task)) => {
                tracing::warn!("dispatcher queue full; spawning overflow task");
                tokio::spawn(task);
            }
            Err(mpsc::error::TrySendError::Closed(task)) => {
                tokio::spawn(task);
            }
        }
    }

    /// Closes the shared queue and waits for every in-flight task and
    /// every worker to finish.
    pub async fn stop(&self) {
        self.shared.sender.lock().await.take();
        let mut workers = self.workers.lock().await;
        for worker in workers.drain(..) {
            let _ = worker.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn dispatched_tasks_run_on_worker_pool() {
        let dispatcher = Dispatcher::new(2);
        dispatcher.start(2).await;

        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..10 {
            let counter = Arc::clone(&counter);
            dispatcher
                .dispatch(Box::pin(async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                }))
                .await;
        }

        dispatcher.stop().await;
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn dispatch_after_stop_falls_back_to_direct_spawn() {
        let dispatcher = Dispatcher::new(1);
        dispatcher.start(1).await;
        dispatcher.stop().await;

        let counter = Arc::new(AtomicUsize::new(0));
        let counter2 = Arc::clone(&counter);
        dispatcher
            .dispatch(Box::pin(async move {
                counter2.fetch_add(1, Ordering::SeqCst);
            }))
            .await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
