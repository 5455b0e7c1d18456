//! Bounded concurrent mapper: fan-out with ordered results.
//!
//! Both fan-out tiers of the pipeline (repositories, and releases within one
//! repository) run through [`map_bounded`] with their own caps; nesting the
//! two bounds total probe concurrency at the product of the caps.

use std::future::Future;

use futures::stream::{self, StreamExt};

/// Maps `items` through `f` with at most `limit` invocations in flight at
/// any instant. The output preserves input order regardless of completion
/// order: `output[i]` is the result for the i-th input.
///
/// Per-item failures must be carried in the item result type (`Result`
/// outputs); one failing item never aborts its peers. A `limit` of zero is
/// treated as one.
pub async fn map_bounded<I, F, Fut, R>(items: I, limit: usize, f: F) -> Vec<R>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = R>,
{
    stream::iter(items)
        .map(f)
        .buffered(limit.max(1))
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn preserves_input_order_despite_completion_order() {
        // Earlier items sleep longer, so they complete last.
        let results = map_bounded(0..16u64, 16, |i| async move {
            tokio::time::sleep(Duration::from_millis(16 - i)).await;
            i * 10
        })
        .await;
        let expected: Vec<u64> = (0..16).map(|i| i * 10).collect();
        assert_eq!(results, expected);
    }

    #[tokio::test]
    async fn never_exceeds_the_concurrency_cap() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let results = map_bounded(0..40usize, 4, |i| {
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(3)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                i
            }
        })
        .await;

        assert_eq!(results.len(), 40);
        assert!(peak.load(Ordering::SeqCst) <= 4, "cap exceeded");
        assert!(peak.load(Ordering::SeqCst) > 1, "no concurrency observed");
    }

    #[tokio::test]
    async fn per_item_failures_do_not_abort_peers() {
        let results: Vec<Result<usize, String>> = map_bounded(0..6usize, 2, |i| async move {
            if i == 3 {
                Err(format!("item {i} failed"))
            } else {
                Ok(i)
            }
        })
        .await;

        assert_eq!(results.len(), 6);
        assert!(results[3].is_err());
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 5);
    }

    #[tokio::test]
    async fn zero_cap_is_treated_as_one() {
        let results = map_bounded(0..3usize, 0, |i| async move { i }).await;
        assert_eq!(results, vec![0, 1, 2]);
    }
}
