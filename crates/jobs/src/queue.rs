// crates/jobs/src/queue.rs
//! Unbounded FIFO with async blocking pop.
//!
//! A popped item is removed for every consumer: two consumers draining the
//! same queue each see a disjoint part of the stream.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use tokio::sync::Notify;

/// Outcome of [`EventQueue::pop_blocking`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pop<T> {
    Item(T),
    /// The cancel signal fired before an item arrived.
    Cancelled,
    /// The queue is empty and closed; nothing more will be pushed.
    Closed,
}

pub struct EventQueue<T> {
    items: Mutex<VecDeque<T>>,
    closed: AtomicBool,
    notify: Notify,
}

impl<T> EventQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            closed: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    // A panicking holder cannot leave the deque half-modified, so a poisoned
    // lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append to the tail and wake blocked consumers. Never blocks.
    pub fn push(&self, item: T) {
        self.lock().push_back(item);
        self.notify.notify_waiters();
    }

    pub fn try_pop(&self) -> Option<T> {
        self.lock().pop_front()
    }

    /// Remove the head, waiting for a push if the queue is empty.
    ///
    /// Returns [`Pop::Cancelled`] if `cancel` resolves first and
    /// [`Pop::Closed`] once the queue is both empty and closed. Items pushed
    /// before [`close`](Self::close) are always returned before `Closed`.
    pub async fn pop_blocking<C>(&self, cancel: C) -> Pop<T>
    where
        C: Future<Output = ()>,
    {
        tokio::pin!(cancel);
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register as a waiter before looking at the queue so a push
            // landing between the check and the await still wakes us.
            notified.as_mut().enable();

            if let Some(item) = self.try_pop() {
                return Pop::Item(item);
            }
            if self.is_closed() {
                // A push may have raced with close; drain it first.
                return match self.try_pop() {
                    Some(item) => Pop::Item(item),
                    None => Pop::Closed,
                };
            }

            tokio::select! {
                biased;
                _ = &mut cancel => return Pop::Cancelled,
                _ = &mut notified => {}
            }
        }
    }

    /// Mark the queue closed and wake every blocked consumer.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::pending;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_try_pop_drains_in_order_then_empty() {
        let queue = EventQueue::new();
        for i in 0..5 {
            queue.push(i);
        }
        assert_eq!(queue.len(), 5);

        let drained: Vec<_> = std::iter::from_fn(|| queue.try_pop()).collect();
        assert_eq!(drained, vec![0, 1, 2, 3, 4]);
        assert_eq!(queue.try_pop(), None);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_pop_blocking_returns_buffered_item() {
        let queue = EventQueue::new();
        queue.push("ready");
        assert_eq!(queue.pop_blocking(pending()).await, Pop::Item("ready"));
    }

    #[tokio::test]
    async fn test_pop_blocking_waits_for_push() {
        let queue = Arc::new(EventQueue::new());

        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.pop_blocking(pending()).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!consumer.is_finished());

        queue.push(42);
        let popped = tokio::time::timeout(Duration::from_secs(1), consumer)
            .await
            .expect("consumer should wake on push")
            .unwrap();
        assert_eq!(popped, Pop::Item(42));
    }

    #[tokio::test]
    async fn test_pop_blocking_cancelled() {
        let queue: EventQueue<u32> = EventQueue::new();
        let popped = queue
            .pop_blocking(tokio::time::sleep(Duration::from_millis(10)))
            .await;
        assert_eq!(popped, Pop::Cancelled);
    }

    #[tokio::test]
    async fn test_close_wakes_blocked_consumer() {
        let queue: Arc<EventQueue<u32>> = Arc::new(EventQueue::new());

        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.pop_blocking(pending()).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.close();

        let popped = tokio::time::timeout(Duration::from_secs(1), consumer)
            .await
            .expect("consumer should wake on close")
            .unwrap();
        assert_eq!(popped, Pop::Closed);
    }

    #[tokio::test]
    async fn test_closed_queue_still_yields_remaining_items() {
        let queue = EventQueue::new();
        queue.push("last");
        queue.close();

        assert_eq!(queue.pop_blocking(pending()).await, Pop::Item("last"));
        assert_eq!(queue.pop_blocking(pending()).await, Pop::Closed);
    }
}
