use core::fmt;

/// Where an asset record is in its loading lifecycle.
///
/// Lazy records use `Idle -> Loading -> {Loaded | Error}`. Progressive records use
/// `Idle -> LoadingLow -> LoadedLow -> LoadingHigh -> {LoadedHigh | Error}`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum AssetState {
    #[default]
    Idle,
    Loading,
    Loaded,
    LoadingLow,
    LoadedLow,
    LoadingHigh,
    LoadedHigh,
    Error,
}

impl AssetState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Loaded | Self::LoadedHigh | Self::Error)
    }

    pub fn is_loading(self) -> bool {
        matches!(self, Self::Loading | Self::LoadingLow | Self::LoadingHigh)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::LoadingLow => "loading-low",
            Self::LoadedLow => "loaded-low",
            Self::LoadingHigh => "loading-high",
            Self::LoadedHigh => "loaded-high",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for AssetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoadPolicy {
    /// Single resolution, gated on viewport proximity unless preloading.
    Lazy,
    /// Low resolution first, then high resolution, without proximity gating.
    Progressive,
}

impl LoadPolicy {
    /// Whether `from -> to` is a legal step for this policy.
    ///
    /// A failed low-resolution fetch ends a progressive record in `Error` directly.
    pub fn allows(self, from: AssetState, to: AssetState) -> bool {
        use AssetState::*;
        match self {
            Self::Lazy => matches!(
                (from, to),
                (Idle, Loading) | (Loading, Loaded) | (Loading, Error)
            ),
            Self::Progressive => matches!(
                (from, to),
                (Idle, LoadingLow)
                    | (LoadingLow, LoadedLow)
                    | (LoadingLow, Error)
                    | (LoadedLow, LoadingHigh)
                    | (LoadingHigh, LoadedHigh)
                    | (LoadingHigh, Error)
            ),
        }
    }
}
