use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use bytes::Bytes;
use viewwindow::{Bounds, ProximityObserver};

use crate::request::Outbox;
use crate::{
    AssetError, AssetId, AssetRecord, AssetState, FetchRequest, LoadPolicy, LoaderOptions,
    ObjectUrls, OwnedSource, RequestToken, SourceRegistry, Stage,
};

/// Drives lazy and progressive asset records for one consuming view.
///
/// The coordinator never performs I/O. It queues [`FetchRequest`]s (drained with
/// [`AssetCoordinator::take_requests`]) and is told about results through
/// [`AssetCoordinator::complete`]. A completion is applied only if its token is still the
/// record's current request and the coordinator is mounted; anything else is dropped
/// without touching state.
///
/// View slots (`K`, e.g. a row index or widget id) bind to asset identifiers. Several slots
/// may share one identifier, which is then fetched once. A record and its sources live until
/// the last slot bound to it is released or rebound, or until [`AssetCoordinator::unmount`].
pub struct AssetCoordinator<K = u64, R = ObjectUrls>
where
    K: Eq + Hash + Clone,
    R: SourceRegistry,
{
    options: LoaderOptions,
    registry: R,
    records: HashMap<AssetId, AssetRecord>,
    slots: HashMap<K, AssetId>,
    observer: ProximityObserver<AssetId>,
    outbox: Outbox,
    mounted: bool,
}

impl<K, R> AssetCoordinator<K, R>
where
    K: Eq + Hash + Clone,
    R: SourceRegistry + Default,
{
    pub fn new(options: LoaderOptions) -> Self {
        Self::with_registry(options, R::default())
    }
}

impl<K, R> AssetCoordinator<K, R>
where
    K: Eq + Hash + Clone,
    R: SourceRegistry,
{
    pub fn with_registry(options: LoaderOptions, registry: R) -> Self {
        let observer = ProximityObserver::new(options.proximity());
        Self {
            options,
            registry,
            records: HashMap::new(),
            slots: HashMap::new(),
            observer,
            outbox: Outbox::default(),
            mounted: true,
        }
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&self, id: &str) -> Option<&AssetRecord> {
        self.records.get(id)
    }

    /// The record currently bound to `slot`.
    pub fn slot(&self, slot: &K) -> Option<&AssetRecord> {
        self.slots.get(slot).and_then(|id| self.records.get(id))
    }

    pub fn records(&self) -> impl Iterator<Item = &AssetRecord> {
        self.records.values()
    }

    /// Fetches issued so far and not yet taken, oldest first.
    pub fn take_requests(&mut self) -> Vec<FetchRequest> {
        self.outbox.drain()
    }

    /// Outstanding fetch tokens (taken or not).
    pub fn in_flight(&self) -> usize {
        self.outbox.in_flight()
    }

    /// Binds `slot` to a single-resolution asset.
    ///
    /// The record stays `Idle` until it comes near the viewport, unless `preload` is set.
    /// Re-requesting the identifier a slot already shows is a no-op.
    pub fn request_lazy(&mut self, slot: K, id: impl Into<AssetId>) -> AssetState {
        let id = id.into();
        if !self.mounted {
            atrace!(id = id.as_str(), "request on unmounted coordinator ignored");
            return AssetState::Idle;
        }
        if let Some(state) = self.bind(slot, &id) {
            return state;
        }

        let mut record = AssetRecord::new(
            id.clone(),
            LoadPolicy::Lazy,
            None,
            self.options.placeholder.clone(),
        );
        if self.options.preload && is_fetchable(&self.options, &id) {
            record.transition(AssetState::Loading, &self.options);
            record.pending = Some(self.outbox.issue(&id, &id, Stage::Single));
        }
        let state = record.state;
        self.records.insert(id, record);
        state
    }

    /// Binds `slot` to a two-stage asset: `low` is fetched right away, then `high`.
    ///
    /// The record is keyed by `high`.
    pub fn request_progressive(
        &mut self,
        slot: K,
        low: impl Into<AssetId>,
        high: impl Into<AssetId>,
    ) -> AssetState {
        let low = low.into();
        let high = high.into();
        if !self.mounted {
            atrace!(id = high.as_str(), "request on unmounted coordinator ignored");
            return AssetState::Idle;
        }
        if let Some(state) = self.bind(slot, &high) {
            return state;
        }

        let mut record = AssetRecord::new(
            high.clone(),
            LoadPolicy::Progressive,
            Some(low.clone()),
            self.options.placeholder.clone(),
        );
        record.transition(AssetState::LoadingLow, &self.options);
        record.pending = Some(self.outbox.issue(&high, &low, Stage::Low));
        let state = record.state;
        self.records.insert(high, record);
        state
    }

    /// Feeds a boolean proximity signal for `id` from any source.
    ///
    /// A `true` edge starts an idle lazy record. Returns whether a fetch was issued.
    pub fn on_proximity(&mut self, id: &str, near: bool) -> bool {
        if !self.mounted || !near {
            return false;
        }
        let Some(record) = self.records.get_mut(id) else {
            return false;
        };
        record.in_view = true;
        if record.policy != LoadPolicy::Lazy
            || record.state != AssetState::Idle
            || !is_fetchable(&self.options, &record.id)
        {
            return false;
        }
        record.transition(AssetState::Loading, &self.options);
        record.pending = Some(self.outbox.issue(&record.id, &record.id, Stage::Single));
        true
    }

    /// Tracks `id` at `bounds` with the built-in proximity observer.
    ///
    /// Call [`AssetCoordinator::set_viewport`] or [`AssetCoordinator::refresh_proximity`]
    /// afterwards to evaluate it.
    pub fn observe(&mut self, id: impl Into<AssetId>, bounds: Bounds) {
        if self.mounted {
            self.observer.observe(id.into(), bounds);
        }
    }

    pub fn unobserve(&mut self, id: &AssetId) -> bool {
        self.observer.unobserve(id)
    }

    /// Moves the viewport and applies the resulting proximity edges.
    ///
    /// Returns how many fetches were issued.
    pub fn set_viewport(&mut self, viewport: Bounds) -> usize {
        self.observer.set_root(viewport);
        self.refresh_proximity()
    }

    pub fn refresh_proximity(&mut self) -> usize {
        if !self.mounted {
            return 0;
        }
        let mut edges = Vec::new();
        self.observer.evaluate(|id, near| edges.push((id.clone(), near)));

        let mut started = 0;
        for (id, near) in edges {
            if self.on_proximity(id.as_str(), near) {
                started += 1;
            }
        }
        started
    }

    /// Applies the result of the fetch identified by `token`.
    ///
    /// Returns `false` (leaving every record untouched) when the coordinator is unmounted or
    /// the token is no longer current.
    pub fn complete(&mut self, token: RequestToken, result: Result<Bytes, AssetError>) -> bool {
        if !self.mounted {
            atrace!(token = token.get(), "completion after unmount ignored");
            return false;
        }
        let Some(owner) = self.outbox.settle(token) else {
            atrace!(token = token.get(), "stale completion ignored");
            return false;
        };
        let Some(record) = self.records.get_mut(&owner) else {
            return false;
        };
        if record.pending != Some(token) {
            return false;
        }
        record.pending = None;

        let fetched = match (&record.state, &record.low_res) {
            (AssetState::LoadingLow, Some(low)) => low,
            _ => &record.id,
        };
        let created = result.and_then(|bytes| self.registry.create(fetched, bytes));

        match (record.state, created) {
            (AssetState::Loading, Ok(src)) => {
                record.current_src = Some(src.clone());
                record.transition(AssetState::Loaded, &self.options);
                self.options.emit_load(&record.id, &src);
                record.source = Some(OwnedSource::new(src));
            }
            (AssetState::Loading, Err(err)) => {
                let shown = self.options.fallback.clone();
                record.fail(err, shown, &self.options);
            }
            (AssetState::LoadingLow, Ok(src)) => {
                record.current_src = Some(src.clone());
                record.low_source = Some(OwnedSource::new(src));
                record.transition(AssetState::LoadedLow, &self.options);
                record.transition(AssetState::LoadingHigh, &self.options);
                record.pending = Some(self.outbox.issue(&record.id, &record.id, Stage::High));
            }
            (AssetState::LoadingLow, Err(err)) => {
                let shown = self
                    .options
                    .fallback
                    .clone()
                    .or_else(|| self.options.placeholder.clone());
                record.fail(err, shown, &self.options);
            }
            (AssetState::LoadingHigh, Ok(src)) => {
                record.current_src = Some(src.clone());
                if let Some(mut low) = record.low_source.take() {
                    low.release(&mut self.registry);
                }
                record.transition(AssetState::LoadedHigh, &self.options);
                self.options.emit_load(&record.id, &src);
                record.source = Some(OwnedSource::new(src));
            }
            (AssetState::LoadingHigh, Err(err)) => {
                awarn!(id = record.id.as_str(), "high-res fetch failed, keeping low-res");
                let shown = record.current_src.take();
                record.fail(err, shown, &self.options);
            }
            (_, Ok(src)) => {
                // Not expecting a result in this state; do not leak the new source.
                self.registry.revoke(&src);
                return false;
            }
            (_, Err(_)) => return false,
        }
        true
    }

    /// Explicitly restarts `id` from scratch, releasing whatever it holds.
    ///
    /// This is the only way a terminal record loads again within one mount.
    pub fn reload(&mut self, id: &str) -> bool {
        if !self.mounted {
            return false;
        }
        let Some(record) = self.records.get_mut(id) else {
            return false;
        };
        if let Some(token) = record.pending.take() {
            self.outbox.forget(token);
        }
        record.release_sources(&mut self.registry);
        record.reset(self.options.placeholder.clone());
        self.options.emit_state(&record.id, AssetState::Idle);
        adebug!(id, "asset reload");

        match (record.policy, record.low_res.clone()) {
            (LoadPolicy::Progressive, Some(low)) => {
                record.transition(AssetState::LoadingLow, &self.options);
                record.pending = Some(self.outbox.issue(&record.id, &low, Stage::Low));
            }
            _ => {
                if !is_fetchable(&self.options, &record.id) {
                    return false;
                }
                record.transition(AssetState::Loading, &self.options);
                record.pending = Some(self.outbox.issue(&record.id, &record.id, Stage::Single));
            }
        }
        true
    }

    /// Unbinds `slot`. The record goes away with its last slot.
    pub fn release_slot(&mut self, slot: &K) -> bool {
        let Some(id) = self.slots.remove(slot) else {
            return false;
        };
        self.unref(&id);
        true
    }

    /// Releases every record and source; later completions are ignored.
    ///
    /// Also runs on drop.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        for record in self.records.values_mut() {
            record.release_sources(&mut self.registry);
        }
        adebug!(records = self.records.len(), "coordinator unmounted");
        self.records.clear();
        self.slots.clear();
        self.observer.disconnect();
        self.outbox.clear();
    }

    /// Starts a new mount. Tokens from the previous mount stay stale.
    pub fn remount(&mut self) {
        self.mounted = true;
    }

    /// Returns the state to report if `slot` needs no new record, `None` if the caller
    /// must create one.
    fn bind(&mut self, slot: K, id: &AssetId) -> Option<AssetState> {
        if let Some(bound) = self.slots.get(&slot) {
            if bound == id {
                return self.records.get(id).map(AssetRecord::state);
            }
            if let Some(previous) = self.slots.remove(&slot) {
                self.unref(&previous);
            }
        }
        self.slots.insert(slot, id.clone());
        let record = self.records.get_mut(id)?;
        record.slots += 1;
        Some(record.state)
    }

    fn unref(&mut self, id: &AssetId) {
        let Some(record) = self.records.get_mut(id) else {
            return;
        };
        record.slots = record.slots.saturating_sub(1);
        if record.slots > 0 {
            return;
        }
        if let Some(mut record) = self.records.remove(id) {
            if let Some(token) = record.pending.take() {
                self.outbox.forget(token);
            }
            record.release_sources(&mut self.registry);
            self.observer.unobserve(id);
            atrace!(id = id.as_str(), "asset record dropped");
        }
    }
}

impl<K, R> Drop for AssetCoordinator<K, R>
where
    K: Eq + Hash + Clone,
    R: SourceRegistry,
{
    fn drop(&mut self) {
        self.unmount();
    }
}

impl<K, R> fmt::Debug for AssetCoordinator<K, R>
where
    K: Eq + Hash + Clone,
    R: SourceRegistry,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetCoordinator")
            .field("mounted", &self.mounted)
            .field("records", &self.records.len())
            .field("slots", &self.slots.len())
            .field("in_flight", &self.outbox.in_flight())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Empty identifiers and the placeholder/fallback themselves are never fetched.
fn is_fetchable(options: &LoaderOptions, id: &AssetId) -> bool {
    !id.is_empty()
        && options.placeholder.as_deref() != Some(id.as_str())
        && options.fallback.as_deref() != Some(id.as_str())
}
