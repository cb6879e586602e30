use std::fmt::Display;
use std::future::Future;

use futures::future::join_all;

use crate::outcome::Outcome;
use crate::progress::{NoProgress, Progress};

pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Runs a per-item operation over a list in consecutive slices of at most
/// `batch_size` items.
///
/// Every item of a slice is started together and the slice is awaited until
/// each operation has settled, successfully or not, before the next slice
/// begins. Failures are captured into [`Outcome::Failure`]; nothing an item
/// does can abort its siblings or the run.
#[derive(Debug, Clone, Copy)]
pub struct BatchRunner {
    batch_size: usize,
}

impl Default for BatchRunner {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl BatchRunner {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub async fn run<I, T, E, F, Fut>(&self, items: Vec<I>, op: F) -> Vec<Outcome<I, T>>
    where
        I: Clone,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.run_with_progress(items, op, &NoProgress).await
    }

    /// Same as [`BatchRunner::run`], calling `progress.advance()` once per
    /// settled item.
    pub async fn run_with_progress<I, T, E, F, Fut, P>(
        &self,
        items: Vec<I>,
        op: F,
        progress: &P,
    ) -> Vec<Outcome<I, T>>
    where
        I: Clone,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: Progress + ?Sized,
    {
        let mut outcomes = Vec::with_capacity(items.len());
        let mut remaining = items.into_iter().peekable();
        let mut batch_index = 0usize;

        while remaining.peek().is_some() {
            let batch: Vec<I> = remaining.by_ref().take(self.batch_size).collect();
            tracing::debug!(batch = batch_index, size = batch.len(), "starting batch");

            let pending = batch.iter().cloned().map(|item| {
                let fut = op(item);
                async move {
                    let res = fut.await;
                    progress.advance();
                    res
                }
            });
            let settled = join_all(pending).await;

            outcomes.extend(
                batch
                    .into_iter()
                    .zip(settled)
                    .map(|(item, res)| match res {
                        Ok(value) => Outcome::Success { item, value },
                        Err(err) => Outcome::Failure {
                            item,
                            error: err.to_string(),
                        },
                    }),
            );
            batch_index += 1;
        }

        progress.finish();
        outcomes
    }
}

/// Shorthand for `BatchRunner::new(batch_size).run(items, op)`.
pub async fn batch_process<I, T, E, F, Fut>(
    items: Vec<I>,
    batch_size: usize,
    op: F,
) -> Vec<Outcome<I, T>>
where
    I: Clone,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    BatchRunner::new(batch_size).run(items, op).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::CountingProgress;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::{Instant, sleep};

    /// Tracks how many operations are running at once.
    #[derive(Default)]
    struct InFlight {
        current: AtomicUsize,
        peak: AtomicUsize,
        started: AtomicUsize,
    }

    impl InFlight {
        async fn enter(&self, latency: Duration) {
            self.started.fetch_add(1, Ordering::SeqCst);
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            sleep(latency).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_concurrency_and_batch_timing() {
        let tracker = InFlight::default();
        let latency = Duration::from_millis(100);
        let items: Vec<u32> = (0..25).collect();
        let start = Instant::now();

        let outcomes = batch_process(items, 10, |n| {
            let tracker = &tracker;
            async move {
                tracker.enter(latency).await;
                Ok::<_, String>(n * 2)
            }
        })
        .await;

        assert_eq!(outcomes.len(), 25);
        assert_eq!(tracker.peak.load(Ordering::SeqCst), 10);
        // ceil(25 / 10) = 3 slices
        assert_eq!(start.elapsed(), latency * 3);
        for (i, outcome) in outcomes.iter().enumerate() {
            assert_eq!(*outcome.item(), i as u32);
            assert_eq!(outcome.value(), Some(&(i as u32 * 2)));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_size_one_runs_sequentially() {
        let tracker = InFlight::default();
        let latency = Duration::from_millis(50);
        let start = Instant::now();

        let outcomes = batch_process(vec!["a", "b", "c", "d"], 1, |s| {
            let tracker = &tracker;
            async move {
                tracker.enter(latency).await;
                Ok::<_, String>(s.len())
            }
        })
        .await;

        assert_eq!(outcomes.len(), 4);
        assert_eq!(tracker.peak.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), latency * 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_batch_covers_all_items() {
        let tracker = InFlight::default();
        let latency = Duration::from_millis(50);
        let start = Instant::now();

        let outcomes = BatchRunner::new(6)
            .run((0..6).collect::<Vec<u8>>(), |n| {
                let tracker = &tracker;
                async move {
                    tracker.enter(latency).await;
                    Ok::<_, String>(n)
                }
            })
            .await;

        assert_eq!(outcomes.len(), 6);
        assert_eq!(tracker.peak.load(Ordering::SeqCst), 6);
        assert_eq!(start.elapsed(), latency);
    }

    #[tokio::test]
    async fn test_empty_items_launches_nothing() {
        let tracker = InFlight::default();
        let outcomes = batch_process(Vec::<u32>::new(), 4, |n| {
            let tracker = &tracker;
            async move {
                tracker.enter(Duration::ZERO).await;
                Ok::<_, String>(n)
            }
        })
        .await;

        assert!(outcomes.is_empty());
        assert_eq!(tracker.started.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_isolated() {
        let items: Vec<u32> = (0..7).collect();
        let outcomes = batch_process(items, 3, |n| async move {
            // Odd items fail late so siblings are still running when they do.
            if n % 2 == 1 {
                sleep(Duration::from_millis(10)).await;
                Err(format!("item {n} failed"))
            } else {
                sleep(Duration::from_millis(20)).await;
                Ok(n)
            }
        })
        .await;

        assert_eq!(outcomes.len(), 7);
        let failed: Vec<u32> = outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(|o| *o.item())
            .collect();
        assert_eq!(failed, vec![1, 3, 5]);
        assert_eq!(outcomes[3].error(), Some("item 3 failed"));
        assert!(outcomes[6].is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_later_batch_waits_for_slow_sibling() {
        let order = std::sync::Mutex::new(Vec::new());
        let outcomes = batch_process(vec![0u32, 1, 2], 2, |n| {
            let order = &order;
            async move {
                let latency = if n == 0 { 300 } else { 10 };
                sleep(Duration::from_millis(latency)).await;
                order.lock().unwrap().push(n);
                Ok::<_, String>(())
            }
        })
        .await;

        assert_eq!(outcomes.len(), 3);
        // Item 2 belongs to the second slice and cannot finish before item 0.
        assert_eq!(*order.lock().unwrap(), vec![1, 0, 2]);
    }

    #[tokio::test]
    async fn test_progress_advanced_once_per_item() {
        let progress = CountingProgress::new(5);
        let outcomes = BatchRunner::new(2)
            .run_with_progress(
                (0..5).collect::<Vec<u32>>(),
                |n| async move {
                    if n == 4 { Err("last one fails") } else { Ok(n) }
                },
                &progress,
            )
            .await;

        assert_eq!(outcomes.len(), 5);
        assert_eq!(progress.current(), 5);
        assert!(progress.is_finished());
    }

    #[test]
    fn test_zero_batch_size_clamped() {
        assert_eq!(BatchRunner::new(0).batch_size(), 1);
    }
}
