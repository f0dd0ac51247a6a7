//! # Bounded Concurrency Executor
//!
//! Runs async tasks with at most `max_concurrency` in flight. Tasks waiting for
//! a slot are admitted in FIFO order (tokio's semaphore is fair), and each task
//! runs as its own tokio task so a failure or panic in one never reaches its
//! siblings.

use crate::config::{ConfigResult, ConfigurationError};
use crate::error::ExecutorError;
use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug)]
struct ExecutorState {
    semaphore: Arc<Semaphore>,
    max_concurrency: usize,
    active: AtomicUsize,
    queued: AtomicUsize,
    completed: AtomicU64,
}

/// Cloneable handle to a shared concurrency bound
#[derive(Debug, Clone)]
pub struct BoundedExecutor {
    state: Arc<ExecutorState>,
}

impl BoundedExecutor {
    pub fn new(max_concurrency: usize) -> ConfigResult<Self> {
        if max_concurrency == 0 {
            return Err(ConfigurationError::invalid_value(
                "max_concurrency",
                "0",
                "executor requires at least one slot",
            ));
        }

        Ok(Self {
            state: Arc::new(ExecutorState {
                semaphore: Arc::new(Semaphore::new(max_concurrency)),
                max_concurrency,
                active: AtomicUsize::new(0),
                queued: AtomicUsize::new(0),
                completed: AtomicU64::new(0),
            }),
        })
    }

    pub fn max_concurrency(&self) -> usize {
        self.state.max_concurrency
    }

    /// Tasks currently holding a slot
    pub fn active(&self) -> usize {
        self.state.active.load(Ordering::Acquire)
    }

    /// Tasks waiting for a slot
    pub fn queued(&self) -> usize {
        self.state.queued.load(Ordering::Acquire)
    }

    /// Tasks that have released their slot, successfully or not
    pub fn completed(&self) -> u64 {
        self.state.completed.load(Ordering::Acquire)
    }

    /// Stop admitting tasks; waiting and future submissions fail with `Closed`
    pub fn close(&self) {
        self.state.semaphore.close();
    }

    pub fn is_closed(&self) -> bool {
        self.state.semaphore.is_closed()
    }

    /// Run one task under the concurrency bound and wait for its result
    pub async fn execute<F, T>(&self, task: F) -> Result<T, ExecutorError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let mut ticket = QueueTicket::enqueue(&self.state, 1);
        let handle = self.admit(task, &mut ticket).await?;
        handle.await.map_err(ExecutorError::from_join)
    }

    /// Run every task under the concurrency bound.
    ///
    /// The returned vector is indexed by submission position, independent of
    /// the order in which tasks finish.
    pub async fn execute_all<I, F, T>(&self, tasks: I) -> Vec<Result<T, ExecutorError>>
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let tasks: Vec<F> = tasks.into_iter().collect();
        let total = tasks.len();
        let mut slots: Vec<Option<Result<T, ExecutorError>>> =
            std::iter::repeat_with(|| None).take(total).collect();

        debug!(
            total,
            max_concurrency = self.state.max_concurrency,
            "Dispatching task batch"
        );

        let mut ticket = QueueTicket::enqueue(&self.state, total);
        let mut running = FuturesUnordered::new();

        for (index, task) in tasks.into_iter().enumerate() {
            match self.admit(task, &mut ticket).await {
                Ok(handle) => running.push(async move {
                    (index, handle.await.map_err(ExecutorError::from_join))
                }),
                Err(error) => slots[index] = Some(Err(error)),
            }
        }
        drop(ticket);

        while let Some((index, result)) = running.next().await {
            slots[index] = Some(result);
        }

        slots
            .into_iter()
            .map(|slot| slot.unwrap_or(Err(ExecutorError::TaskCancelled)))
            .collect()
    }

    /// Wait for a slot in FIFO order, then spawn `task` holding it
    async fn admit<F, T>(
        &self,
        task: F,
        ticket: &mut QueueTicket<'_>,
    ) -> Result<JoinHandle<T>, ExecutorError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.state.semaphore).acquire_owned().await;
        ticket.admit_one();
        let permit = permit.map_err(|_| ExecutorError::Closed)?;

        self.state.active.fetch_add(1, Ordering::AcqRel);
        let slot = SlotGuard {
            state: Arc::clone(&self.state),
            _permit: permit,
        };

        Ok(tokio::spawn(async move {
            let _slot = slot;
            task.await
        }))
    }
}

/// Releases the slot when the task finishes, including by panic
struct SlotGuard {
    state: Arc<ExecutorState>,
    _permit: OwnedSemaphorePermit,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.state.active.fetch_sub(1, Ordering::AcqRel);
        self.state.completed.fetch_add(1, Ordering::AcqRel);
    }
}

/// Tracks submissions that have not yet been given a slot
struct QueueTicket<'a> {
    state: &'a ExecutorState,
    remaining: usize,
}

impl<'a> QueueTicket<'a> {
    fn enqueue(state: &'a ExecutorState, count: usize) -> Self {
        state.queued.fetch_add(count, Ordering::AcqRel);
        Self {
            state,
            remaining: count,
        }
    }

    fn admit_one(&mut self) {
        if self.remaining > 0 {
            self.remaining -= 1;
            self.state.queued.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

impl Drop for QueueTicket<'_> {
    fn drop(&mut self) {
        self.state.queued.fetch_sub(self.remaining, Ordering::AcqRel);
    }
}
