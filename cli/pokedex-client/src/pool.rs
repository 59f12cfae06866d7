//! Bounded-concurrency fan-out.
//!
//! Both helpers run at most `limit` futures at a time and yield results in
//! input order. They differ only in what happens when a fetch fails.

use std::future::Future;
use std::num::NonZeroUsize;

use futures::stream::{self, StreamExt, TryStreamExt};

/// Run `fetch` for every item; the first failure aborts the whole batch.
///
/// In-flight fetches are dropped as soon as an error is observed.
pub async fn fetch_all<I, T, E, F, Fut>(items: I, limit: NonZeroUsize, fetch: F) -> Result<Vec<T>, E>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    stream::iter(items)
        .map(fetch)
        .buffered(limit.get())
        .try_collect()
        .await
}

/// Run `fetch` for every item and keep whatever succeeded.
///
/// Failures are passed to `on_error` and otherwise dropped.
pub async fn fetch_partial<I, T, E, F, Fut>(
    items: I,
    limit: NonZeroUsize,
    fetch: F,
    mut on_error: impl FnMut(E),
) -> Vec<T>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let results: Vec<Result<T, E>> = stream::iter(items)
        .map(fetch)
        .buffered(limit.get())
        .collect()
        .await;

    results
        .into_iter()
        .filter_map(|result| match result {
            Ok(value) => Some(value),
            Err(err) => {
                on_error(err);
                None
            },
        })
        .collect()
}
