use alloc::sync::Arc;

use crate::Rect;
use crate::window::Windower;

/// A callback fired when the windower's state changes.
///
/// The second argument is `is_scrolling`.
pub type OnChangeCallback = Arc<dyn Fn(&Windower, bool) + Send + Sync>;

pub const DEFAULT_OVERSCAN: usize = 2;
pub const DEFAULT_IS_SCROLLING_RESET_DELAY_MS: u64 = 150;

/// Configuration for [`crate::Windower`].
///
/// Cheap to clone: the callback is stored in an `Arc`, so adapters can tweak a field and call
/// `Windower::set_options` without reallocating closures.
pub struct WindowOptions {
    pub count: usize,
    /// Uniform row height in the scroll axis. Values below 1 are treated as 1.
    pub item_height: u32,
    /// Rows rendered beyond each edge of the visible range.
    pub overscan: usize,

    /// The initial viewport size, if known before the first resize event.
    pub initial_rect: Option<Rect>,
    pub initial_offset: u64,

    /// Optional callback fired when the windower's state changes.
    pub on_change: Option<OnChangeCallback>,

    /// Idle time after the last scroll event before `is_scrolling` resets.
    pub is_scrolling_reset_delay_ms: u64,
}

impl Clone for WindowOptions {
    fn clone(&self) -> Self {
        Self {
            count: self.count,
            item_height: self.item_height,
            overscan: self.overscan,
            initial_rect: self.initial_rect,
            initial_offset: self.initial_offset,
            on_change: self.on_change.clone(),
            is_scrolling_reset_delay_ms: self.is_scrolling_reset_delay_ms,
        }
    }
}

impl WindowOptions {
    pub fn new(count: usize, item_height: u32) -> Self {
        Self {
            count,
            item_height: item_height.max(1),
            overscan: DEFAULT_OVERSCAN,
            initial_rect: None,
            initial_offset: 0,
            on_change: None,
            is_scrolling_reset_delay_ms: DEFAULT_IS_SCROLLING_RESET_DELAY_MS,
        }
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    pub fn with_initial_rect(mut self, initial_rect: Option<Rect>) -> Self {
        self.initial_rect = initial_rect;
        self
    }

    pub fn with_initial_offset(mut self, initial_offset: u64) -> Self {
        self.initial_offset = initial_offset;
        self
    }

    pub fn with_on_change(
        mut self,
        on_change: Option<impl Fn(&Windower, bool) + Send + Sync + 'static>,
    ) -> Self {
        self.on_change = on_change.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_is_scrolling_reset_delay_ms(mut self, delay_ms: u64) -> Self {
        self.is_scrolling_reset_delay_ms = delay_ms;
        self
    }
}

impl core::fmt::Debug for WindowOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WindowOptions")
            .field("count", &self.count)
            .field("item_height", &self.item_height)
            .field("overscan", &self.overscan)
            .field("initial_rect", &self.initial_rect)
            .field("initial_offset", &self.initial_offset)
            .field(
                "is_scrolling_reset_delay_ms",
                &self.is_scrolling_reset_delay_ms,
            )
            .finish_non_exhaustive()
    }
}
