// Layer 1: Standard library imports
use std::collections::VecDeque;

// Layer 2: Third-party crate imports
use parking_lot::Mutex;
use tokio::sync::Notify;

// Layer 3: Internal module imports
use super::policy::OverflowPolicy;
use super::{MailboxError, TryPopError};

struct State<T> {
    queue: VecDeque<T>,
    closed: bool,
}

/// A bounded, overflow-policy-aware message queue, one-to-one with an
/// actor (spec §3, §4.1).
///
/// # Concurrency
///
/// Multiple producers may [`push`](Mailbox::push) concurrently; multiple
/// consumers may [`pop`](Mailbox::pop). [`close`](Mailbox::close) is
/// exclusive with itself and observed by any in-flight push.
///
/// # Examples
///
/// ```
/// use pipeline_core::mailbox::{Mailbox, OverflowPolicy};
///
/// # tokio_test::block_on(async {
/// let mailbox: Mailbox<u32> = Mailbox::new(2, OverflowPolicy::Backpressure);
/// mailbox.push(1).await.unwrap();
/// mailbox.push(2).await.unwrap();
/// assert_eq!(mailbox.pop().await, Some(1));
/// # });
/// ```
pub struct Mailbox<T> {
    state: Mutex<State<T>>,
    capacity: usize,
    policy: OverflowPolicy,
    not_empty: Notify,
    not_full: Notify,
}

impl<T> Mailbox<T> {
    /// Creates a new mailbox with the given capacity and overflow policy.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero — a mailbox that can never hold a
    /// message is a configuration error, not a runtime one.
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        assert!(capacity > 0, "mailbox capacity must be > 0");
        Self {
            state: Mutex::new(State {
                queue: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            capacity,
            policy,
            not_empty: Notify::new(),
            not_full: Notify::new(),
        }
    }

    /// Creates a mailbox with the default capacity (10,000, spec §3) and
    /// backpressure overflow policy.
    pub fn with_default_capacity() -> Self {
        Self::new(super::super::DEFAULT_MAILBOX_CAPACITY, OverflowPolicy::Backpressure)
    }

    /// The configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The configured overflow policy.
    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Number of messages currently queued.
    pub fn len(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Whether the mailbox is currently empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether [`close`](Mailbox::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Enqueues a message, applying the configured overflow policy when
    /// full.
    ///
    /// Under [`OverflowPolicy::Backpressure`] this may await until a
    /// consumer makes room. Under [`OverflowPolicy::DropOldest`] the
    /// oldest queued message is silently discarded to make room. Under
    /// [`OverflowPolicy::DropNewest`] a full mailbox rejects `item` with
    /// [`MailboxError::Full`].
    pub async fn push(&self, item: T) -> Result<(), MailboxError> {
        loop {
            {
                let mut state = self.state.lock();
                if state.closed {
                    return Err(MailboxError::Closed);
                }
                if state.queue.len() < self.capacity {
                    state.queue.push_back(item);
                    drop(state);
                    self.not_empty.notify_one();
                    return Ok(());
                }
                match self.policy {
                    OverflowPolicy::DropOldest => {
                        state.queue.pop_front();
                        state.queue.push_back(item);
                        drop(state);
                        self.not_empty.notify_one();
                        return Ok(());
                    }
                    OverflowPolicy::DropNewest => {
                        return Err(MailboxError::Full {
                            capacity: self.capacity,
                        });
                    }
                    OverflowPolicy::Backpressure => {
                        // fall through to wait below; `item` untouched.
                    }
                }
            }
            // `item` was never moved in the Backpressure branch above, so
            // it's still ours to retry with once a consumer frees space.
            self.not_full.notified().await;
        }
    }

    /// Non-blocking pop: returns the oldest queued message, or an error if
    /// the mailbox is empty (open or closed).
    pub fn try_pop(&self) -> Result<T, TryPopError> {
        let mut state = self.state.lock();
        if let Some(item) = state.queue.pop_front() {
            drop(state);
            self.not_full.notify_one();
            return Ok(item);
        }
        if state.closed {
            Err(TryPopError::Closed)
        } else {
            Err(TryPopError::Empty)
        }
    }

    /// Blocks until a message is available or the mailbox closes and
    /// drains empty.
    pub async fn pop(&self) -> Option<T> {
        loop {
            {
                let mut state = self.state.lock();
                if let Some(item) = state.queue.pop_front() {
                    drop(state);
                    self.not_full.notify_one();
                    return Some(item);
                }
                if state.closed {
                    return None;
                }
            }
            self.not_empty.notified().await;
        }
    }

    /// Returns all currently enqueued messages, in FIFO order, leaving the
    /// mailbox empty (but not closed).
    pub fn drain(&self) -> Vec<T> {
        let mut state = self.state.lock();
        let drained: Vec<T> = state.queue.drain(..).collect();
        drop(state);
        self.not_full.notify_waiters();
        drained
    }

    /// Closes the mailbox. Idempotent: further calls are no-ops. Already
    /// enqueued messages remain drainable via [`pop`](Mailbox::pop),
    /// [`try_pop`](Mailbox::try_pop), or [`drain`](Mailbox::drain); no
    /// further pushes are accepted.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        drop(state);
        self.not_empty.notify_waiters();
        self.not_full.notify_waiters();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn push_then_pop_is_fifo() {
        let mailbox = Mailbox::new(10, OverflowPolicy::Backpressure);
        mailbox.push(1).await.unwrap();
        mailbox.push(2).await.unwrap();
        mailbox.push(3).await.unwrap();

        assert_eq!(mailbox.pop().await, Some(1));
        assert_eq!(mailbox.pop().await, Some(2));
        assert_eq!(mailbox.pop().await, Some(3));
    }

    #[tokio::test]
    async fn drop_newest_rejects_excess_pushes() {
        let mailbox = Mailbox::new(3, OverflowPolicy::DropNewest);
        for i in 0..3 {
            mailbox.push(i).await.unwrap();
        }
        let overflow = mailbox.push(99).await;
        assert_eq!(overflow, Err(MailboxError::Full { capacity: 3 }));
        assert_eq!(mailbox.len(), 3);
        assert_eq!(mailbox.drain(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn drop_oldest_discards_oldest_on_overflow() {
        let mailbox = Mailbox::new(3, OverflowPolicy::DropOldest);
        mailbox.push(1).await.unwrap(); // m1
        mailbox.push(2).await.unwrap(); // m2
        mailbox.push(3).await.unwrap(); // m3
        mailbox.push(4).await.unwrap(); // m4, overflow: drops m1

        // next Pop returns m2, not m1
        assert_eq!(mailbox.pop().await, Some(2));
        assert_eq!(mailbox.pop().await, Some(3));
        assert_eq!(mailbox.pop().await, Some(4));
    }

    #[tokio::test]
    async fn backpressure_blocks_until_consumer_makes_room() {
        use std::sync::Arc;
        use std::time::Duration;

        let mailbox = Arc::new(Mailbox::new(1, OverflowPolicy::Backpressure));
        mailbox.push(1).await.unwrap();

        let producer = {
            let mailbox = Arc::clone(&mailbox);
            tokio::spawn(async move {
                mailbox.push(2).await.unwrap();
            })
        };

        // give the blocked push a chance to actually block
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!producer.is_finished());

        assert_eq!(mailbox.pop().await, Some(1));
        producer.await.unwrap();
        assert_eq!(mailbox.pop().await, Some(2));
    }

    #[tokio::test]
    async fn close_rejects_further_pushes_but_drains_existing() {
        let mailbox = Mailbox::new(10, OverflowPolicy::Backpressure);
        mailbox.push(1).await.unwrap();
        mailbox.close();
        mailbox.close(); // idempotent

        let result = mailbox.push(2).await;
        assert_eq!(result, Err(MailboxError::Closed));

        assert_eq!(mailbox.pop().await, Some(1));
        assert_eq!(mailbox.pop().await, None);
    }

    #[tokio::test]
    async fn try_pop_reports_empty_then_closed() {
        let mailbox: Mailbox<u32> = Mailbox::new(10, OverflowPolicy::Backpressure);
        assert_eq!(mailbox.try_pop(), Err(TryPopError::Empty));

        mailbox.close();
        assert_eq!(mailbox.try_pop(), Err(TryPopError::Closed));
    }

    #[tokio::test]
    async fn drain_returns_fifo_order_and_empties_queue() {
        let mailbox = Mailbox::new(10, OverflowPolicy::Backpressure);
        for i in 0..5 {
            mailbox.push(i).await.unwrap();
        }
        assert_eq!(mailbox.drain(), vec![0, 1, 2, 3, 4]);
        assert!(mailbox.is_empty());
    }
}
