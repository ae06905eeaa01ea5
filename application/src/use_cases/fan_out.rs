//! Bounded fan-out for independent, order-insensitive model calls.
//!
//! At most `limit` tasks hold a permit at once; the rest wait on the
//! semaphore. Results come back in input order regardless of completion
//! order, so callers can zip them with their inputs.

use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

#[derive(Error, Debug)]
pub enum FanOutError {
    #[error("Task failed to complete: {0}")]
    Join(String),

    #[error("Concurrency gate closed")]
    GateClosed,
}

/// Semaphore-gated worker pool
#[derive(Debug, Clone)]
pub struct BoundedFanOut {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl BoundedFanOut {
    /// A limit of 0 is treated as 1
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run `task` over every input; `on_complete(index, &output)` fires as
    /// each task finishes (completion order).
    pub async fn run<I, T, F, Fut, C>(
        &self,
        inputs: Vec<I>,
        task: F,
        mut on_complete: C,
    ) -> Vec<Result<T, FanOutError>>
    where
        I: Send + 'static,
        T: Send + 'static,
        F: Fn(I) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
        C: FnMut(usize, &T),
    {
        let count = inputs.len();
        let mut join_set = JoinSet::new();

        for (index, input) in inputs.into_iter().enumerate() {
            let semaphore = Arc::clone(&self.semaphore);
            let fut = task(input);
            join_set.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (index, Err(FanOutError::GateClosed));
                };
                (index, Ok(fut.await))
            });
        }

        let mut slots: Vec<Option<Result<T, FanOutError>>> = (0..count).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, result)) => {
                    if let Ok(output) = &result {
                        on_complete(index, output);
                    }
                    slots[index] = Some(result);
                }
                Err(e) => warn!("Fan-out task join error: {}", e),
            }
        }

        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    Err(FanOutError::Join("task panicked or was cancelled".to_string()))
                })
            })
            .collect()
    }
}
