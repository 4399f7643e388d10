use std::fmt;
use std::sync::Arc;

use viewwindow::{DEFAULT_THRESHOLD, ParseMarginError, ProximityOptions, RootMargin};

use crate::{AssetError, AssetId, AssetState};

pub const DEFAULT_CONCURRENCY_LIMIT: usize = 4;

/// Grey "Loading..." tile, for callers that want a visible placeholder.
pub const DEFAULT_PLACEHOLDER: &str = "data:image/svg+xml;base64,PHN2ZyB3aWR0aD0iMjAwIiBoZWlnaHQ9IjIwMCIgeG1sbnM9Imh0dHA6Ly93d3cudzMub3JnLzIwMDAvc3ZnIj48cmVjdCB3aWR0aD0iMTAwJSIgaGVpZ2h0PSIxMDAlIiBmaWxsPSIjZjNmNGY2Ii8+PHRleHQgeD0iNTAlIiB5PSI1MCUiIGZvbnQtZmFtaWx5PSJBcmlhbCIgZm9udC1zaXplPSIxNCIgZmlsbD0iIzk5YWFhYSIgdGV4dC1hbmNob3I9Im1pZGRsZSIgZHk9Ii4zZW0iPkxvYWRpbmcuLi48L3RleHQ+PC9zdmc+";

/// Red "Error" tile, for callers that want a visible fallback.
pub const DEFAULT_FALLBACK: &str = "data:image/svg+xml;base64,PHN2ZyB3aWR0aD0iMjAwIiBoZWlnaHQ9IjIwMCIgeG1sbnM9Imh0dHA6Ly93d3cudzMub3JnLzIwMDAvc3ZnIj48cmVjdCB3aWR0aD0iMTAwJSIgaGVpZ2h0PSIxMDAlIiBmaWxsPSIjZmVlMmUyIi8+PHRleHQgeD0iNTAlIiB5PSI1MCUiIGZvbnQtZmFtaWx5PSJBcmlhbCIgZm9udC1zaXplPSIxNCIgZmlsbD0iI2QzMGEwYSIgdGV4dC1hbmNob3I9Im1pZGRsZSIgZHk9Ii4zZW0iPkVycm9yPC90ZXh0Pjwvc3ZnPg==";

/// Called with the record id and its final source once an asset is fully loaded.
pub type OnLoadCallback = Arc<dyn Fn(&AssetId, &str) + Send + Sync>;
pub type OnErrorCallback = Arc<dyn Fn(&AssetId, &AssetError) + Send + Sync>;
pub type OnStateChangeCallback = Arc<dyn Fn(&AssetId, AssetState) + Send + Sync>;

/// Configuration for [`crate::AssetCoordinator`] and [`crate::BatchLoader`].
pub struct LoaderOptions {
    /// Minimum intersection fraction for a target to count as near.
    pub threshold: f32,
    pub root_margin: RootMargin,
    /// Shown while a record is idle or loading.
    pub placeholder: Option<String>,
    /// Shown once a record ends in `Error`.
    pub fallback: Option<String>,
    /// Start lazy fetches immediately instead of waiting for proximity.
    pub preload: bool,
    /// Maximum outstanding fetches of a batch loader (at least 1).
    pub concurrency_limit: usize,

    pub on_load: Option<OnLoadCallback>,
    pub on_error: Option<OnErrorCallback>,
    pub on_state_change: Option<OnStateChangeCallback>,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            root_margin: RootMargin::default(),
            placeholder: None,
            fallback: None,
            preload: false,
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            on_load: None,
            on_error: None,
            on_state_change: None,
        }
    }
}

impl Clone for LoaderOptions {
    fn clone(&self) -> Self {
        Self {
            threshold: self.threshold,
            root_margin: self.root_margin,
            placeholder: self.placeholder.clone(),
            fallback: self.fallback.clone(),
            preload: self.preload,
            concurrency_limit: self.concurrency_limit,
            on_load: self.on_load.clone(),
            on_error: self.on_error.clone(),
            on_state_change: self.on_state_change.clone(),
        }
    }
}

impl fmt::Debug for LoaderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderOptions")
            .field("threshold", &self.threshold)
            .field("root_margin", &self.root_margin)
            .field("placeholder", &self.placeholder.as_ref().map(String::len))
            .field("fallback", &self.fallback.as_ref().map(String::len))
            .field("preload", &self.preload)
            .field("concurrency_limit", &self.concurrency_limit)
            .field("on_load", &self.on_load.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_state_change", &self.on_state_change.is_some())
            .finish()
    }
}

impl LoaderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_root_margin(mut self, root_margin: RootMargin) -> Self {
        self.root_margin = root_margin;
        self
    }

    /// Parses a CSS-style margin such as `"50px"` or `"10% 0px"`.
    pub fn try_with_root_margin(mut self, root_margin: &str) -> Result<Self, ParseMarginError> {
        self.root_margin = root_margin.parse()?;
        Ok(self)
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    pub fn with_preload(mut self, preload: bool) -> Self {
        self.preload = preload;
        self
    }

    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    pub fn with_on_load(
        mut self,
        on_load: Option<impl Fn(&AssetId, &str) + Send + Sync + 'static>,
    ) -> Self {
        self.on_load = on_load.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_on_error(
        mut self,
        on_error: Option<impl Fn(&AssetId, &AssetError) + Send + Sync + 'static>,
    ) -> Self {
        self.on_error = on_error.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_on_state_change(
        mut self,
        on_state_change: Option<impl Fn(&AssetId, AssetState) + Send + Sync + 'static>,
    ) -> Self {
        self.on_state_change = on_state_change.map(|f| Arc::new(f) as _);
        self
    }

    /// Proximity settings for the coordinator's observer. Targets are dropped after entry.
    pub fn proximity(&self) -> ProximityOptions {
        ProximityOptions::default()
            .with_threshold(self.threshold)
            .with_root_margin(self.root_margin)
            .with_once(true)
    }

    pub(crate) fn effective_concurrency_limit(&self) -> usize {
        self.concurrency_limit.max(1)
    }

    pub(crate) fn emit_state(&self, id: &AssetId, state: AssetState) {
        if let Some(cb) = &self.on_state_change {
            cb(id, state);
        }
    }

    pub(crate) fn emit_load(&self, id: &AssetId, src: &str) {
        if let Some(cb) = &self.on_load {
            cb(id, src);
        }
    }

    pub(crate) fn emit_error(&self, id: &AssetId, err: &AssetError) {
        if let Some(cb) = &self.on_error {
            cb(id, err);
        }
    }
}
