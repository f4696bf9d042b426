//! Spawns fetches and hands their results back one at a time.
//!
//! Results come back in completion order, not dispatch order. Dropping a
//! [`Fetcher`] aborts whatever is still in flight.

use crate::core::query::RequestId;
use std::collections::HashMap;
use std::future::Future;
use tokio::task::{Id, JoinError, JoinSet};
use tracing::{error, warn};

/// Owns the in-flight fetches of one view model
pub struct Fetcher<M> {
    tasks: JoinSet<M>,
    requests: HashMap<Id, RequestId>,
    next_id: u64,
}

impl<M: Send + 'static> Default for Fetcher<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Send + 'static> Fetcher<M> {
    /// Creates a fetcher with nothing in flight.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
            requests: HashMap::new(),
            next_id: 0,
        }
    }

    /// Spawns `fetch` on the runtime and returns its request id.
    pub fn spawn<F>(&mut self, fetch: F) -> RequestId
    where
        F: Future<Output = M> + Send + 'static,
    {
        self.next_id += 1;
        let id = RequestId(self.next_id);
        let handle = self.tasks.spawn(fetch);
        self.requests.insert(handle.id(), id);
        id
    }

    /// Number of fetches not yet returned by [`Fetcher::next`]
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Waits for the next fetch to finish. `None` once nothing is in flight.
    ///
    /// A task that panicked or was cancelled still yields its request id, with the
    /// [`JoinError`] in place of the result.
    pub async fn next(&mut self) -> Option<(RequestId, Result<M, JoinError>)> {
        while let Some(joined) = self.tasks.join_next_with_id().await {
            let (task, outcome) = match joined {
                Ok((task, result)) => (task, Ok(result)),
                Err(e) => (e.id(), Err(e)),
            };
            let Some(request) = self.requests.remove(&task) else {
                warn!(%task, "Finished task has no request id");
                continue;
            };
            if let Err(e) = &outcome {
                error!(?request, "Fetch task did not complete: {}", e);
            }
            return Some((request, outcome));
        }
        None
    }
}
