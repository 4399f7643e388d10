use std::collections::{HashMap, HashSet, VecDeque};

use bytes::Bytes;

use crate::request::Outbox;
use crate::{
    AssetError, AssetId, AssetState, DEFAULT_CONCURRENCY_LIMIT, FetchRequest, LoaderOptions,
    RequestToken, Stage,
};

/// Loads a set of assets with at most `concurrency_limit` fetches outstanding.
///
/// Identifiers start in the order they were supplied (FIFO); duplicates are fetched once.
/// Each completion frees its slot before the next queued identifier is issued, inside the same
/// `complete` call, so the outstanding count never exceeds the limit.
#[derive(Debug)]
pub struct BatchLoader {
    limit: usize,
    outbox: Outbox,
    queue: VecDeque<AssetId>,
    states: HashMap<AssetId, AssetState>,
    loaded: HashSet<AssetId>,
    failed: HashMap<AssetId, AssetError>,
}

impl Default for BatchLoader {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY_LIMIT)
    }
}

impl BatchLoader {
    /// A `limit` of 0 is treated as 1.
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            outbox: Outbox::default(),
            queue: VecDeque::new(),
            states: HashMap::new(),
            loaded: HashSet::new(),
            failed: HashMap::new(),
        }
    }

    pub fn from_options(options: &LoaderOptions) -> Self {
        Self::new(options.effective_concurrency_limit())
    }

    pub fn concurrency_limit(&self) -> usize {
        self.limit
    }

    /// Changes the limit. Raising it starts queued identifiers right away; lowering it lets
    /// outstanding fetches drain first.
    pub fn set_concurrency_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        self.pump();
    }

    /// Replaces the current batch with `ids`.
    ///
    /// Results of the previous batch are discarded and its outstanding tokens become stale.
    pub fn load_batch<I>(&mut self, ids: I)
    where
        I: IntoIterator,
        I::Item: Into<AssetId>,
    {
        self.outbox.clear();
        self.queue.clear();
        self.states.clear();
        self.loaded.clear();
        self.failed.clear();

        for id in ids {
            let id = id.into();
            if self.states.contains_key(&id) {
                continue;
            }
            self.states.insert(id.clone(), AssetState::Idle);
            self.queue.push_back(id);
        }
        adebug!(ids = self.states.len(), limit = self.limit, "batch loading");
        self.pump();
    }

    /// Moves a queued identifier to the front of the queue.
    ///
    /// Returns `false` if it is not queued (unknown, outstanding or settled).
    pub fn prioritize(&mut self, id: &str) -> bool {
        let Some(pos) = self.queue.iter().position(|q| q.as_str() == id) else {
            return false;
        };
        if let Some(id) = self.queue.remove(pos) {
            self.queue.push_front(id);
        }
        true
    }

    /// Applies the result of `token`. Returns `false` for stale or unknown tokens.
    pub fn complete(&mut self, token: RequestToken, result: Result<Bytes, AssetError>) -> bool {
        let Some(id) = self.outbox.settle(token) else {
            atrace!(token = token.get(), "stale batch completion ignored");
            return false;
        };
        match result {
            Ok(_) => {
                self.states.insert(id.clone(), AssetState::Loaded);
                self.loaded.insert(id);
            }
            Err(err) => {
                awarn!(id = id.as_str(), error = %err, "batch asset failed");
                self.states.insert(id.clone(), AssetState::Error);
                self.failed.insert(id, err);
            }
        }
        self.pump();
        true
    }

    /// Stops the batch: queued identifiers are dropped and outstanding tokens become stale.
    /// Settled results are kept.
    pub fn cancel(&mut self) {
        self.outbox.clear();
        self.queue.clear();
        self.states.retain(|_, state| state.is_terminal());
    }

    pub fn take_requests(&mut self) -> Vec<FetchRequest> {
        self.outbox.drain()
    }

    /// Identifiers that resolved successfully.
    pub fn loaded_images(&self) -> &HashSet<AssetId> {
        &self.loaded
    }

    pub fn failed(&self) -> &HashMap<AssetId, AssetError> {
        &self.failed
    }

    pub fn is_loaded(&self, id: &str) -> bool {
        self.loaded.contains(id)
    }

    /// `true` while anything is outstanding or queued.
    pub fn is_loading(&self) -> bool {
        self.outbox.in_flight() > 0 || !self.queue.is_empty()
    }

    pub fn outstanding(&self) -> usize {
        self.outbox.in_flight()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Distinct identifiers in the current batch.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self, id: &str) -> Option<AssetState> {
        self.states.get(id).copied()
    }

    fn pump(&mut self) {
        while self.outbox.in_flight() < self.limit {
            let Some(id) = self.queue.pop_front() else {
                break;
            };
            self.outbox.issue(&id, &id, Stage::Single);
            self.states.insert(id, AssetState::Loading);
        }
    }
}
