use crate::{
    AssetError, AssetId, AssetState, LoadPolicy, LoaderOptions, OwnedSource, RequestToken,
    SourceRegistry,
};

/// One asset as seen by the views bound to it.
#[derive(Debug)]
pub struct AssetRecord {
    pub(crate) id: AssetId,
    pub(crate) policy: LoadPolicy,
    pub(crate) low_res: Option<AssetId>,
    pub(crate) state: AssetState,
    pub(crate) current_src: Option<String>,
    pub(crate) last_error: Option<AssetError>,
    pub(crate) in_view: bool,
    pub(crate) pending: Option<RequestToken>,
    pub(crate) low_source: Option<OwnedSource>,
    pub(crate) source: Option<OwnedSource>,
    /// Number of view slots bound to this record.
    pub(crate) slots: usize,
}

impl AssetRecord {
    pub(crate) fn new(
        id: AssetId,
        policy: LoadPolicy,
        low_res: Option<AssetId>,
        placeholder: Option<String>,
    ) -> Self {
        Self {
            id,
            policy,
            low_res,
            state: AssetState::Idle,
            current_src: placeholder,
            last_error: None,
            in_view: false,
            pending: None,
            low_source: None,
            source: None,
            slots: 1,
        }
    }

    pub fn id(&self) -> &AssetId {
        &self.id
    }

    pub fn policy(&self) -> LoadPolicy {
        self.policy
    }

    /// The low-resolution identifier of a progressive record.
    pub fn low_res_id(&self) -> Option<&AssetId> {
        self.low_res.as_ref()
    }

    pub fn state(&self) -> AssetState {
        self.state
    }

    /// What the view should paint right now.
    pub fn current_src(&self) -> Option<&str> {
        self.current_src.as_deref()
    }

    pub fn last_error(&self) -> Option<&AssetError> {
        self.last_error.as_ref()
    }

    pub fn is_in_view(&self) -> bool {
        self.in_view
    }

    pub fn pending_token(&self) -> Option<RequestToken> {
        self.pending
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, AssetState::Loaded | AssetState::LoadedHigh)
    }

    pub fn is_high_res_loaded(&self) -> bool {
        self.state == AssetState::LoadedHigh
    }

    /// The low-resolution image is (still) what is painted.
    pub fn is_low_res_loaded(&self) -> bool {
        match self.state {
            AssetState::LoadedLow | AssetState::LoadingHigh => true,
            AssetState::Error => self.low_source.is_some(),
            _ => false,
        }
    }

    pub fn has_error(&self) -> bool {
        self.state == AssetState::Error
    }

    pub(crate) fn transition(&mut self, to: AssetState, options: &LoaderOptions) {
        debug_assert!(
            self.policy.allows(self.state, to),
            "illegal {:?} transition {} -> {}",
            self.policy,
            self.state,
            to
        );
        atrace!(id = self.id.as_str(), from = %self.state, to = %to, "asset state");
        self.state = to;
        options.emit_state(&self.id, to);
    }

    /// Lands in `Error` showing `shown`, and reports `err`.
    pub(crate) fn fail(&mut self, err: AssetError, shown: Option<String>, options: &LoaderOptions) {
        awarn!(id = self.id.as_str(), error = %err, "asset failed to load");
        self.current_src = shown;
        self.last_error = Some(err.clone());
        self.transition(AssetState::Error, options);
        options.emit_error(&self.id, &err);
    }

    pub(crate) fn release_sources<R: SourceRegistry + ?Sized>(&mut self, registry: &mut R) {
        if let Some(mut low) = self.low_source.take() {
            low.release(registry);
        }
        if let Some(mut source) = self.source.take() {
            source.release(registry);
        }
    }

    /// Back to a fresh `Idle` record. Sources must have been released.
    pub(crate) fn reset(&mut self, placeholder: Option<String>) {
        self.state = AssetState::Idle;
        self.current_src = placeholder;
        self.last_error = None;
        self.pending = None;
    }
}
