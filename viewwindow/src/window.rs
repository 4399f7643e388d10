use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::Cell;
use core::cmp;

use crate::options::WindowOptions;
use crate::{Align, Bounds, Rect, RowWindow, ScrollDirection, VirtualRow};

/// Fixed-row-height windowing engine.
///
/// This type holds no UI objects. Your adapter drives it with viewport geometry and scroll
/// offsets and reads back the index window to mount. Every query is pure index arithmetic, so
/// it is fine to call on every scroll tick.
#[derive(Clone, Debug)]
pub struct Windower {
    options: WindowOptions,
    viewport: Rect,
    scroll_offset: u64,
    is_scrolling: bool,
    scroll_direction: Option<ScrollDirection>,
    last_scroll_event_ms: Option<u64>,

    notify_depth: Cell<usize>,
    notify_pending: Cell<bool>,
}

impl Windower {
    pub fn new(mut options: WindowOptions) -> Self {
        options.item_height = options.item_height.max(1);
        wdebug!(
            count = options.count,
            item_height = options.item_height,
            overscan = options.overscan,
            "Windower::new"
        );
        Self {
            viewport: options.initial_rect.unwrap_or_default(),
            scroll_offset: options.initial_offset,
            is_scrolling: false,
            scroll_direction: None,
            last_scroll_event_ms: None,
            options,
            notify_depth: Cell::new(0),
            notify_pending: Cell::new(false),
        }
    }

    pub fn options(&self) -> &WindowOptions {
        &self.options
    }

    pub fn set_options(&mut self, mut options: WindowOptions) {
        options.item_height = options.item_height.max(1);
        self.options = options;
        wtrace!(
            count = self.options.count,
            item_height = self.options.item_height,
            overscan = self.options.overscan,
            "Windower::set_options"
        );
        self.notify();
    }

    /// Clones the current options, applies `f`, then delegates to `set_options`.
    pub fn update_options(&mut self, f: impl FnOnce(&mut WindowOptions)) {
        let mut next = self.options.clone();
        f(&mut next);
        self.set_options(next);
    }

    pub fn set_on_change(
        &mut self,
        on_change: Option<impl Fn(&Windower, bool) + Send + Sync + 'static>,
    ) {
        self.options.on_change = on_change.map(|f| Arc::new(f) as _);
        self.notify();
    }

    fn notify_now(&self) {
        if let Some(cb) = &self.options.on_change {
            cb(self, self.is_scrolling);
        }
    }

    fn notify(&self) {
        if self.notify_depth.get() > 0 {
            self.notify_pending.set(true);
            return;
        }
        self.notify_now();
    }

    /// Batches multiple updates into a single `on_change` notification.
    ///
    /// A scroll event typically carries both the viewport rect and the new offset; without
    /// batching each setter would fire `on_change` on its own.
    pub fn batch_update(&mut self, f: impl FnOnce(&mut Self)) {
        let depth = self.notify_depth.get();
        self.notify_depth.set(depth.saturating_add(1));

        f(self);

        let depth = self.notify_depth.get();
        debug_assert!(depth > 0, "notify_depth underflow");
        let next = depth.saturating_sub(1);
        self.notify_depth.set(next);

        if next == 0 && self.notify_pending.replace(false) {
            self.notify_now();
        }
    }

    pub fn count(&self) -> usize {
        self.options.count
    }

    pub fn set_count(&mut self, count: usize) {
        if self.options.count == count {
            return;
        }
        wtrace!(prev = self.options.count, count, "set_count");
        self.options.count = count;
        self.notify();
    }

    pub fn item_height(&self) -> u32 {
        self.options.item_height
    }

    pub fn set_item_height(&mut self, item_height: u32) {
        let item_height = item_height.max(1);
        if self.options.item_height == item_height {
            return;
        }
        self.options.item_height = item_height;
        self.notify();
    }

    pub fn overscan(&self) -> usize {
        self.options.overscan
    }

    pub fn set_overscan(&mut self, overscan: usize) {
        if self.options.overscan == overscan {
            return;
        }
        self.options.overscan = overscan;
        self.notify();
    }

    pub fn is_scrolling(&self) -> bool {
        self.is_scrolling
    }

    pub fn scroll_direction(&self) -> Option<ScrollDirection> {
        self.scroll_direction
    }

    pub fn set_is_scrolling(&mut self, is_scrolling: bool) {
        if self.is_scrolling == is_scrolling {
            return;
        }
        self.is_scrolling = is_scrolling;
        if !is_scrolling {
            self.scroll_direction = None;
            self.last_scroll_event_ms = None;
        }
        self.notify();
    }

    pub fn notify_scroll_event(&mut self, now_ms: u64) {
        self.last_scroll_event_ms = Some(now_ms);
        self.set_is_scrolling(true);
    }

    /// Resets `is_scrolling` once no scroll event arrived for `is_scrolling_reset_delay_ms`.
    pub fn update_scrolling(&mut self, now_ms: u64) {
        if !self.is_scrolling {
            return;
        }
        let Some(last) = self.last_scroll_event_ms else {
            return;
        };
        if now_ms.saturating_sub(last) >= self.options.is_scrolling_reset_delay_ms {
            self.set_is_scrolling(false);
        }
    }

    pub fn viewport_size(&self) -> u32 {
        self.viewport.main
    }

    pub fn viewport_rect(&self) -> Rect {
        self.viewport
    }

    pub fn set_viewport_size(&mut self, size: u32) {
        if self.viewport.main == size {
            return;
        }
        self.viewport.main = size;
        self.notify();
    }

    pub fn set_viewport_rect(&mut self, rect: Rect) {
        if self.viewport == rect {
            return;
        }
        self.viewport = rect;
        self.notify();
    }

    pub fn scroll_offset(&self) -> u64 {
        self.scroll_offset
    }

    pub fn set_scroll_offset(&mut self, offset: u64) {
        if self.scroll_offset == offset {
            return;
        }
        let prev = self.scroll_offset;
        self.scroll_offset = offset;
        self.scroll_direction = match offset.cmp(&prev) {
            cmp::Ordering::Greater => Some(ScrollDirection::Forward),
            cmp::Ordering::Less => Some(ScrollDirection::Backward),
            cmp::Ordering::Equal => self.scroll_direction,
        };
        self.notify();
    }

    pub fn set_scroll_offset_clamped(&mut self, offset: u64) {
        let clamped = self.clamp_scroll_offset(offset);
        self.set_scroll_offset(clamped);
    }

    /// Applies a scroll offset reported by the UI (wheel/drag) and marks the list as scrolling.
    pub fn apply_scroll_offset_event(&mut self, offset: u64, now_ms: u64) {
        wtrace!(offset, now_ms, "apply_scroll_offset_event");
        self.batch_update(|w| {
            w.set_scroll_offset(offset);
            w.notify_scroll_event(now_ms);
        });
    }

    /// Applies a resize (or auto-size) event from the UI.
    pub fn apply_resize_event(&mut self, rect: Rect) {
        wtrace!(main = rect.main, cross = rect.cross, "apply_resize_event");
        self.batch_update(|w| {
            w.set_viewport_rect(rect);
            let clamped = w.clamp_scroll_offset(w.scroll_offset);
            w.set_scroll_offset(clamped);
        });
    }

    /// Applies viewport rect and scroll offset in a single coalesced update.
    pub fn apply_scroll_frame(&mut self, rect: Rect, scroll_offset: u64, now_ms: u64) {
        wtrace!(
            main = rect.main,
            cross = rect.cross,
            scroll_offset,
            now_ms,
            "apply_scroll_frame"
        );
        self.batch_update(|w| {
            w.set_viewport_rect(rect);
            w.set_scroll_offset(scroll_offset);
            w.notify_scroll_event(now_ms);
        });
    }

    /// Height of the whole scrollable area, regardless of how many rows are mounted.
    pub fn total_size(&self) -> u64 {
        (self.options.count as u64).saturating_mul(self.options.item_height as u64)
    }

    pub fn max_scroll_offset(&self) -> u64 {
        self.max_scroll_offset_for(self.viewport.main)
    }

    fn max_scroll_offset_for(&self, viewport_size: u32) -> u64 {
        self.total_size().saturating_sub(viewport_size as u64)
    }

    pub fn clamp_scroll_offset(&self, offset: u64) -> u64 {
        offset.min(self.max_scroll_offset())
    }

    /// Rows intersecting the viewport, without overscan.
    pub fn visible_range(&self) -> RowWindow {
        self.visible_range_for(self.scroll_offset, self.viewport.main)
    }

    pub fn visible_range_for(&self, scroll_offset: u64, viewport_size: u32) -> RowWindow {
        let count = self.options.count;
        let item_height = self.options.item_height;
        if count == 0 || viewport_size == 0 {
            return RowWindow::empty(item_height, count);
        }

        let h = item_height as u64;
        let offset = scroll_offset.min(self.max_scroll_offset_for(viewport_size));
        let end_offset = offset.saturating_add(viewport_size as u64);

        let start = to_index(offset / h).min(count);
        let end = to_index(end_offset.div_ceil(h)).min(count);

        RowWindow {
            start_index: start,
            end_index: end,
            item_height,
            total_count: count,
        }
    }

    /// The window to render: the visible range widened by `overscan` on each side.
    pub fn row_window(&self) -> RowWindow {
        self.row_window_for(self.scroll_offset, self.viewport.main)
    }

    pub fn row_window_for(&self, scroll_offset: u64, viewport_size: u32) -> RowWindow {
        let mut window = self.visible_range_for(scroll_offset, viewport_size);
        if window.is_empty() {
            return window;
        }
        let overscan = self.options.overscan;
        window.start_index = window.start_index.saturating_sub(overscan);
        window.end_index = cmp::min(window.total_count, window.end_index.saturating_add(overscan));
        wtrace!(
            scroll_offset,
            viewport_size,
            start = window.start_index,
            end = window.end_index,
            "row_window"
        );
        window
    }

    pub fn for_each_row(&self, f: impl FnMut(VirtualRow)) {
        self.for_each_row_for(self.scroll_offset, self.viewport.main, f);
    }

    pub fn for_each_row_for(
        &self,
        scroll_offset: u64,
        viewport_size: u32,
        mut f: impl FnMut(VirtualRow),
    ) {
        let window = self.row_window_for(scroll_offset, viewport_size);
        let size = self.options.item_height;
        for index in window.indices() {
            f(VirtualRow {
                index,
                start: window.row_offset(index),
                size,
            });
        }
    }

    /// Collects the rows to render into `out` (clears `out` first).
    ///
    /// Prefer `for_each_row` with a reused scratch buffer in hot paths.
    pub fn collect_rows(&self, out: &mut Vec<VirtualRow>) {
        out.clear();
        self.for_each_row(|row| out.push(row));
    }

    pub fn item_start(&self, index: usize) -> Option<u64> {
        (index < self.options.count)
            .then(|| (index as u64).saturating_mul(self.options.item_height as u64))
    }

    pub fn index_at_offset(&self, offset: u64) -> Option<usize> {
        let count = self.options.count;
        if count == 0 {
            return None;
        }
        let index = to_index(offset / self.options.item_height as u64);
        Some(index.min(count - 1))
    }

    /// Programmatically scrolls to an index (no animation, not marked as scrolling).
    ///
    /// Returns the applied (clamped) offset.
    pub fn scroll_to_index(&mut self, index: usize, align: Align) -> u64 {
        let offset = self.scroll_to_index_offset(index, align);
        self.set_scroll_offset(offset);
        offset
    }

    pub fn scroll_to_index_offset(&self, index: usize, align: Align) -> u64 {
        let count = self.options.count;
        if count == 0 {
            return 0;
        }
        let index = index.min(count - 1);
        let h = self.options.item_height as u64;
        let start = (index as u64).saturating_mul(h);
        let end = start.saturating_add(h);
        let view = self.viewport.main as u64;

        let target = match align {
            Align::Start => start,
            Align::End => end.saturating_sub(view),
            Align::Center => start.saturating_add(h / 2).saturating_sub(view / 2),
            Align::Auto => {
                let cur = self.scroll_offset;
                let cur_end = cur.saturating_add(view);
                if start >= cur && end <= cur_end {
                    cur
                } else if start < cur {
                    start
                } else {
                    end.saturating_sub(view)
                }
            }
        };

        self.clamp_scroll_offset(target)
    }

    /// The visible area as bounds in list coordinates, for proximity observation.
    pub fn viewport_bounds(&self) -> Bounds {
        Bounds::new(
            0,
            to_coord(self.scroll_offset),
            self.viewport.cross,
            self.viewport.main,
        )
    }

    /// A row's rectangle in list coordinates, for proximity observation.
    pub fn row_bounds(&self, index: usize) -> Option<Bounds> {
        let start = self.item_start(index)?;
        Some(Bounds::new(
            0,
            to_coord(start),
            self.viewport.cross,
            self.options.item_height,
        ))
    }
}

fn to_index(v: u64) -> usize {
    usize::try_from(v).unwrap_or(usize::MAX)
}

fn to_coord(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}
