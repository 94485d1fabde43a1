//! Fixed-arity concurrent join with per-branch deadlines
//!
//! All branches are polled inside the caller's task, so dropping the returned
//! future cancels every branch still in flight. Unlike `try_join!`, every
//! branch runs to completion (or to its deadline) and every failure is kept.

use crate::error::ReaderError;
use futures::future::join_all as join_branches;
use std::future::Future;
use tokio::time::{timeout_at, Duration, Instant};
use tracing::{debug, warn};

/// Run `N` labelled branches concurrently.
///
/// Each branch gets its own deadline of `now + per_call_timeout`, capped at
/// `deadline`. Succeeds only if every branch succeeds; otherwise returns the
/// failures of all failed branches, combined.
pub async fn join_all<T, F, const N: usize>(
    deadline: Instant,
    per_call_timeout: Duration,
    branches: [(&'static str, F); N],
) -> Result<[T; N], ReaderError>
where
    F: Future<Output = Result<T, ReaderError>>,
{
    let started = Instant::now();
    let branch_deadline = deadline.min(started + per_call_timeout);

    let outcomes = join_branches(branches.into_iter().map(|(label, branch)| async move {
        match timeout_at(branch_deadline, branch).await {
            Ok(Ok(value)) => {
                debug!("{} completed in {:?}", label, started.elapsed());
                Ok(value)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ReaderError::Timeout {
                method: label,
                timeout_ms: branch_deadline.saturating_duration_since(started).as_millis() as u64,
            }),
        }
    }))
    .await;

    let mut values = Vec::with_capacity(N);
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(value) => values.push(value),
            Err(e) => failures.push(e),
        }
    }

    if !failures.is_empty() {
        warn!("{}/{} concurrent calls failed", failures.len(), N);
        return Err(ReaderError::combine(failures));
    }

    Ok(values
        .try_into()
        .unwrap_or_else(|_| unreachable!("one outcome per branch")))
}
