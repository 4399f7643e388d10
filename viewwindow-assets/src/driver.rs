use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use bytes::Bytes;
use futures::future::LocalBoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};

use crate::{
    AssetCoordinator, AssetError, AssetId, AssetResolver, BatchLoader, FetchRequest,
    RequestToken, SourceRegistry, Stage,
};

/// The outcome of one dispatched [`FetchRequest`].
#[derive(Debug)]
pub struct Completion {
    pub token: RequestToken,
    pub id: AssetId,
    pub stage: Stage,
    pub result: Result<Bytes, AssetError>,
}

/// Runs fetches concurrently on the current task and yields their completions.
///
/// One driver serves one coordinator or batch loader; tokens are only meaningful to the
/// consumer that issued them. Dropping the driver, or calling [`FetchDriver::abort_all`],
/// drops every in-flight future.
pub struct FetchDriver {
    resolver: Rc<dyn AssetResolver>,
    in_flight: FuturesUnordered<LocalBoxFuture<'static, Completion>>,
}

impl FetchDriver {
    pub fn new(resolver: impl AssetResolver + 'static) -> Self {
        Self::from_rc(Rc::new(resolver))
    }

    pub fn from_rc(resolver: Rc<dyn AssetResolver>) -> Self {
        Self {
            resolver,
            in_flight: FuturesUnordered::new(),
        }
    }

    pub fn dispatch(&mut self, requests: impl IntoIterator<Item = FetchRequest>) {
        for request in requests {
            let resolver = Rc::clone(&self.resolver);
            self.in_flight.push(
                async move {
                    let result = resolver.resolve(&request.id).await;
                    Completion {
                        token: request.token,
                        id: request.id,
                        stage: request.stage,
                        result,
                    }
                }
                .boxed_local(),
            );
        }
    }

    /// Waits for the next fetch to finish. `None` once nothing is in flight.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.in_flight.next().await
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Drops every in-flight fetch. Returns how many were aborted.
    pub fn abort_all(&mut self) -> usize {
        let aborted = self.in_flight.len();
        self.in_flight = FuturesUnordered::new();
        if aborted > 0 {
            adebug!(aborted, "in-flight fetches aborted");
        }
        aborted
    }

    /// Feeds `coordinator` until it has nothing left in flight.
    ///
    /// Returns how many completions were applied.
    pub async fn run_coordinator<K, R>(&mut self, coordinator: &mut AssetCoordinator<K, R>) -> usize
    where
        K: Eq + Hash + Clone,
        R: SourceRegistry,
    {
        let mut applied = 0;
        loop {
            self.dispatch(coordinator.take_requests());
            let Some(done) = self.next_completion().await else {
                break;
            };
            if coordinator.complete(done.token, done.result) {
                applied += 1;
            }
        }
        applied
    }

    /// Feeds `batch` until the whole batch has settled.
    pub async fn run_batch(&mut self, batch: &mut BatchLoader) -> usize {
        let mut applied = 0;
        loop {
            self.dispatch(batch.take_requests());
            let Some(done) = self.next_completion().await else {
                break;
            };
            if batch.complete(done.token, done.result) {
                applied += 1;
            }
        }
        applied
    }
}

impl fmt::Debug for FetchDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchDriver")
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}
