//! Viewport proximity plumbing.
//!
//! A [`ProximityObserver`] turns target/root geometry into per-key boolean edges ("entered
//! the margin-expanded viewport" / "left it"). It mirrors what a platform visibility observer
//! reports, so the loading state machines on top of it do not depend on any platform API.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::str::FromStr;

use crate::key::{KeyMap, ObserverKey};

pub const DEFAULT_THRESHOLD: f32 = 0.1;
pub const DEFAULT_ROOT_MARGIN_PX: f32 = 50.0;
pub const DEFAULT_REVEAL_DELAY_MS: u64 = 100;

/// An axis-aligned rectangle in list coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    fn right(&self) -> i64 {
        self.x.saturating_add(self.width as i64)
    }

    fn bottom(&self) -> i64 {
        self.y.saturating_add(self.height as i64)
    }

    /// Fraction of `self` covered by `root`, or `None` when they do not touch.
    ///
    /// Edge-adjacent rectangles touch (ratio 0). A zero-area target inside `root` has ratio 1.
    pub fn intersection_ratio(&self, root: &Bounds) -> Option<f32> {
        let left = self.x.max(root.x);
        let right = self.right().min(root.right());
        let top = self.y.max(root.y);
        let bottom = self.bottom().min(root.bottom());
        if right < left || bottom < top {
            return None;
        }
        let target_area = self.area();
        if target_area == 0 {
            return Some(1.0);
        }
        let covered = (right - left) as u64 * (bottom - top) as u64;
        Some((covered as f64 / target_area as f64) as f32)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MarginValue {
    Px(f32),
    /// Percentage of the root size along the same axis.
    Percent(f32),
}

impl MarginValue {
    pub fn resolve(self, root_len: u32) -> i64 {
        match self {
            Self::Px(v) => v as i64,
            Self::Percent(p) => (root_len as f32 * p / 100.0) as i64,
        }
    }
}

impl FromStr for MarginValue {
    type Err = ParseMarginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseMarginError::InvalidValue(s.to_string());
        if s == "0" {
            return Ok(Self::Px(0.0));
        }
        let (number, make): (&str, fn(f32) -> Self) = if let Some(n) = s.strip_suffix("px") {
            (n, Self::Px)
        } else if let Some(n) = s.strip_suffix('%') {
            (n, Self::Percent)
        } else {
            return Err(invalid());
        };
        let value: f32 = number.parse().map_err(|_| invalid())?;
        if !value.is_finite() {
            return Err(invalid());
        }
        Ok(make(value))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseMarginError {
    #[error("root margin is empty")]
    Empty,
    #[error("root margin has {0} values, expected 1 to 4")]
    TooManyValues(usize),
    #[error("invalid root margin value `{0}`: expected pixels or percent")]
    InvalidValue(String),
}

/// Margin that grows (or, when negative, shrinks) the root before intersection tests.
///
/// Parsed like the CSS `margin` shorthand: `"50px"`, `"10px 0px"`, `"10% 0px 20px"`,
/// `"1px 2px 3px 4px"` (top, right, bottom, left).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RootMargin {
    pub top: MarginValue,
    pub right: MarginValue,
    pub bottom: MarginValue,
    pub left: MarginValue,
}

impl RootMargin {
    pub fn uniform(value: MarginValue) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    pub fn px(value: f32) -> Self {
        Self::uniform(MarginValue::Px(value))
    }

    /// Expands `root` by this margin, resolving percentages against the root's own size.
    pub fn expand(&self, root: &Bounds) -> Bounds {
        let top = self.top.resolve(root.height);
        let bottom = self.bottom.resolve(root.height);
        let left = self.left.resolve(root.width);
        let right = self.right.resolve(root.width);
        let width = (root.width as i64).saturating_add(left).saturating_add(right);
        let height = (root.height as i64).saturating_add(top).saturating_add(bottom);
        Bounds {
            x: root.x.saturating_sub(left),
            y: root.y.saturating_sub(top),
            width: clamp_len(width),
            height: clamp_len(height),
        }
    }
}

impl Default for RootMargin {
    fn default() -> Self {
        Self::px(DEFAULT_ROOT_MARGIN_PX)
    }
}

impl FromStr for RootMargin {
    type Err = ParseMarginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split_whitespace()
            .map(MarginValue::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        match values.as_slice() {
            [] => Err(ParseMarginError::Empty),
            [all] => Ok(Self::uniform(*all)),
            [vertical, horizontal] => Ok(Self {
                top: *vertical,
                right: *horizontal,
                bottom: *vertical,
                left: *horizontal,
            }),
            [top, horizontal, bottom] => Ok(Self {
                top: *top,
                right: *horizontal,
                bottom: *bottom,
                left: *horizontal,
            }),
            [top, right, bottom, left] => Ok(Self {
                top: *top,
                right: *right,
                bottom: *bottom,
                left: *left,
            }),
            more => Err(ParseMarginError::TooManyValues(more.len())),
        }
    }
}

fn clamp_len(v: i64) -> u32 {
    u32::try_from(v.max(0)).unwrap_or(u32::MAX)
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProximityOptions {
    /// Minimum covered fraction of a target for it to count as near (clamped to `0..=1`).
    pub threshold: f32,
    pub root_margin: RootMargin,
    /// Stop observing a target after its first `near == true` edge.
    pub once: bool,
}

impl Default for ProximityOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            root_margin: RootMargin::default(),
            once: true,
        }
    }
}

impl ProximityOptions {
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_root_margin(mut self, root_margin: RootMargin) -> Self {
        self.root_margin = root_margin;
        self
    }

    pub fn with_once(mut self, once: bool) -> Self {
        self.once = once;
        self
    }

    fn effective_threshold(&self) -> f32 {
        if self.threshold.is_nan() {
            return 0.0;
        }
        self.threshold.clamp(0.0, 1.0)
    }
}

#[derive(Clone, Copy, Debug)]
struct Target {
    bounds: Bounds,
    near: bool,
}

/// Produces boolean proximity edges for registered targets.
///
/// Nothing happens until [`ProximityObserver::evaluate`] is called; adapters call it after
/// scroll/resize events or after moving targets. Only state changes are emitted; every target
/// starts out "not near".
#[derive(Clone, Debug)]
pub struct ProximityObserver<K: ObserverKey> {
    options: ProximityOptions,
    root: Bounds,
    targets: KeyMap<K, Target>,
}

impl<K: ObserverKey> ProximityObserver<K> {
    pub fn new(options: ProximityOptions) -> Self {
        Self {
            options,
            root: Bounds::default(),
            targets: KeyMap::new(),
        }
    }

    pub fn options(&self) -> &ProximityOptions {
        &self.options
    }

    pub fn root(&self) -> Bounds {
        self.root
    }

    pub fn set_root(&mut self, root: Bounds) {
        self.root = root;
    }

    /// Starts observing `key`, or moves it if it is already observed.
    pub fn observe(&mut self, key: K, bounds: Bounds) {
        match self.targets.get_mut(&key) {
            Some(target) => target.bounds = bounds,
            None => {
                self.targets.insert(
                    key,
                    Target {
                        bounds,
                        near: false,
                    },
                );
            }
        }
    }

    pub fn set_target(&mut self, key: &K, bounds: Bounds) -> bool {
        let Some(target) = self.targets.get_mut(key) else {
            return false;
        };
        target.bounds = bounds;
        true
    }

    pub fn unobserve(&mut self, key: &K) -> bool {
        self.targets.remove(key).is_some()
    }

    pub fn disconnect(&mut self) {
        self.targets.clear();
    }

    pub fn is_observing(&self, key: &K) -> bool {
        self.targets.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Whether `target` is within the margin-expanded root at the configured threshold.
    pub fn is_near(&self, target: &Bounds) -> bool {
        let area = self.options.root_margin.expand(&self.root);
        let threshold = self.options.effective_threshold();
        match target.intersection_ratio(&area) {
            Some(ratio) => ratio >= threshold,
            None => false,
        }
    }

    /// Re-evaluates every target and emits `(key, near)` for each one whose state changed.
    pub fn evaluate(&mut self, mut emit: impl FnMut(&K, bool)) {
        let area = self.options.root_margin.expand(&self.root);
        let threshold = self.options.effective_threshold();
        let mut finished = Vec::new();

        for (key, target) in self.targets.iter_mut() {
            let near = match target.bounds.intersection_ratio(&area) {
                Some(ratio) => ratio >= threshold,
                None => false,
            };
            if near == target.near {
                continue;
            }
            target.near = near;
            wtrace!(near, "proximity edge");
            emit(key, near);
            if near && self.options.once {
                finished.push(key.clone());
            }
        }

        for key in finished {
            self.targets.remove(&key);
        }
    }
}

impl<K: ObserverKey> Default for ProximityObserver<K> {
    fn default() -> Self {
        Self::new(ProximityOptions::default())
    }
}

/// Reveal gate for arbitrary lazily shown content.
///
/// The gate opens `reveal_delay_ms` after the first `near` signal and then stays open.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LazyGate {
    reveal_delay_ms: u64,
    visible_at_ms: Option<u64>,
    revealed: bool,
}

impl LazyGate {
    pub fn new(reveal_delay_ms: u64) -> Self {
        Self {
            reveal_delay_ms,
            visible_at_ms: None,
            revealed: false,
        }
    }

    pub fn on_proximity(&mut self, near: bool, now_ms: u64) {
        if near && self.visible_at_ms.is_none() {
            self.visible_at_ms = Some(now_ms);
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible_at_ms.is_some()
    }

    /// Advances the gate; returns whether the content should be shown.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if !self.revealed {
            if let Some(at) = self.visible_at_ms {
                self.revealed = now_ms.saturating_sub(at) >= self.reveal_delay_ms;
            }
        }
        self.revealed
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }
}

impl Default for LazyGate {
    fn default() -> Self {
        Self::new(DEFAULT_REVEAL_DELAY_MS)
    }
}
