//! Bounded-concurrency batch execution

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::error::{Error, Result};

/// Run independent operations with a cap on in-flight concurrency
///
/// At most `max_concurrent` operations run at once; admission is a counting
/// semaphore whose permit is held for the full operation and released on
/// every exit path. Items fail independently: one item's error lands in its
/// own result slot and does not cancel siblings. Results come back in input
/// order. A cap of zero is treated as one.
pub async fn run_bounded<T, U, F, Fut>(items: Vec<T>, max_concurrent: usize, op: F) -> Vec<Result<U>>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<U>>,
{
    let gate = Arc::new(Semaphore::new(max_concurrent.max(1)));
    let op = &op;

    let tasks: Vec<_> = items
        .into_iter()
        .map(|item| {
            let gate = Arc::clone(&gate);
            async move {
                let _permit = gate
                    .acquire()
                    .await
                    .map_err(|_| Error::Internal("admission gate closed".to_string()))?;
                op(item).await
            }
        })
        .collect();

    join_all(tasks).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_results_in_input_order_with_failure_isolation() {
        let results = run_bounded(vec![1, 2, 3, 4, 5], 2, |n| async move {
            if n == 3 {
                Err(Error::ProviderApi("simulated failure".to_string()))
            } else {
                Ok(n * 10)
            }
        })
        .await;

        assert_eq!(results.len(), 5);
        assert_eq!(*results[0].as_ref().expect("item 1"), 10);
        assert_eq!(*results[1].as_ref().expect("item 2"), 20);
        assert!(results[2].is_err());
        assert_eq!(*results[3].as_ref().expect("item 4"), 40);
        assert_eq!(*results[4].as_ref().expect("item 5"), 50);
    }

    #[tokio::test]
    async fn test_concurrency_never_exceeds_cap() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let results = run_bounded(vec![(); 8], 2, |_| {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await;

        assert_eq!(results.len(), 8);
        assert!(results.iter().all(|r| r.is_ok()));
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_zero_cap_still_makes_progress() {
        let results = run_bounded(vec![1, 2], 0, |n| async move { Ok(n) }).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.is_ok()));
    }
}
