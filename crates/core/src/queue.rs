//! Bounded admission queue between upload sessions and the worker pool.
//!
//! Enqueue never waits: when the queue is at capacity the item is handed back
//! and the caller sheds it. Dequeue waits until an item arrives or the queue is
//! closed; after close the remaining items are still drained in order.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

/// Why an item was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnqueueRejection {
    /// The queue is at capacity.
    Full,
    /// The queue has been shut down.
    Closed,
}

/// A rejected enqueue, carrying the item back to the caller.
pub struct EnqueueError<T> {
    pub reason: EnqueueRejection,
    pub item: T,
}

impl<T> EnqueueError<T> {
    pub fn into_inner(self) -> T {
        self.item
    }
}

impl<T> fmt::Debug for EnqueueError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnqueueError")
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for EnqueueError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            EnqueueRejection::Full => write!(f, "Admission queue is full"),
            EnqueueRejection::Closed => write!(f, "Admission queue is closed"),
        }
    }
}

impl<T> std::error::Error for EnqueueError<T> {}

/// Point-in-time view of the queue.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QueueStatus {
    /// Items waiting for a worker.
    pub depth: usize,
    /// Fixed capacity.
    pub capacity: usize,
    /// Whether the queue has been shut down.
    pub closed: bool,
}

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Fixed-capacity FIFO with non-blocking enqueue and waiting dequeue.
pub struct AdmissionQueue<T> {
    state: Mutex<QueueState<T>>,
    capacity: usize,
    available: Notify,
}

impl<T> AdmissionQueue<T> {
    /// Creates a queue holding at most `capacity` items.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            capacity,
            available: Notify::new(),
        }
    }

    /// Adds `item` to the back of the queue without waiting.
    ///
    /// Returns the queue depth after insertion.
    pub fn try_enqueue(&self, item: T) -> Result<usize, EnqueueError<T>> {
        let depth = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.closed {
                return Err(EnqueueError {
                    reason: EnqueueRejection::Closed,
                    item,
                });
            }
            if state.items.len() >= self.capacity {
                return Err(EnqueueError {
                    reason: EnqueueRejection::Full,
                    item,
                });
            }
            state.items.push_back(item);
            state.items.len()
        };

        self.available.notify_one();
        Ok(depth)
    }

    /// Takes the oldest item, waiting while the queue is empty.
    ///
    /// Returns `None` once the queue is closed and fully drained.
    pub async fn dequeue(&self) -> Option<T> {
        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            // Register interest before looking at the state so a concurrent
            // enqueue or close between the check and the await is not lost.
            notified.as_mut().enable();

            {
                let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
                if let Some(item) = state.items.pop_front() {
                    if !state.items.is_empty() {
                        self.available.notify_one();
                    }
                    return Some(item);
                }
                if state.closed {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Shuts the queue down. Pending items remain available to `dequeue`.
    pub fn close(&self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .closed = true;
        self.available.notify_waiters();
    }

    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .items
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_closed(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .closed
    }

    pub fn status(&self) -> QueueStatus {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        QueueStatus {
            depth: state.items.len(),
            capacity: self.capacity,
            closed: state.closed,
        }
    }
}
