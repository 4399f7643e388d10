use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::{Rect, RowWindow, WindowOptions, Windower};

pub const DEFAULT_LIST_HEIGHT: u32 = 400;
pub const DEFAULT_ITEM_HEIGHT: u32 = 60;
pub const DEFAULT_EMPTY_MESSAGE: &str = "No items";

/// One mounted row: the caller's view plus its absolute placement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedRow<V> {
    pub index: usize,
    /// Absolute offset inside the scroll area (`index * item_height`).
    pub top: u64,
    pub height: u32,
    pub view: V,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowedRows<V> {
    /// Scrollable height of the full logical list.
    pub total_height: u64,
    pub window: RowWindow,
    pub rows: Vec<RenderedRow<V>>,
}

/// Output of [`VirtualizedList::render`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListView<V> {
    /// The list has no items; show a message instead of a scroll container.
    Empty { message: String, height: u32 },
    Rows(WindowedRows<V>),
}

impl<V> ListView<V> {
    pub fn is_empty_state(&self) -> bool {
        matches!(self, Self::Empty { .. })
    }

    pub fn rows(&self) -> &[RenderedRow<V>] {
        match self {
            Self::Empty { .. } => &[],
            Self::Rows(rows) => &rows.rows,
        }
    }

    pub fn total_height(&self) -> u64 {
        match self {
            Self::Empty { .. } => 0,
            Self::Rows(rows) => rows.total_height,
        }
    }
}

/// A fixed-row-height list that only renders the rows near the viewport.
///
/// Items are shared (`Arc<[T]>`); ordering is whatever the caller supplies.
#[derive(Clone, Debug)]
pub struct VirtualizedList<T> {
    items: Arc<[T]>,
    window: Windower,
    empty_message: String,
}

impl<T> VirtualizedList<T> {
    pub fn new(items: impl Into<Arc<[T]>>) -> Self {
        let items = items.into();
        let options = WindowOptions::new(items.len(), DEFAULT_ITEM_HEIGHT)
            .with_initial_rect(Some(Rect::new(DEFAULT_LIST_HEIGHT, 0)));
        Self {
            window: Windower::new(options),
            items,
            empty_message: String::from(DEFAULT_EMPTY_MESSAGE),
        }
    }

    pub fn with_height(mut self, height: u32) -> Self {
        self.window.set_viewport_size(height);
        self
    }

    pub fn with_item_height(mut self, item_height: u32) -> Self {
        self.window.set_item_height(item_height);
        self
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.window.set_overscan(overscan);
        self
    }

    pub fn with_empty_message(mut self, message: impl Into<String>) -> Self {
        self.empty_message = message.into();
        self
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replaces the items. A pointer-identical `Arc` is a no-op.
    pub fn set_items(&mut self, items: impl Into<Arc<[T]>>) {
        let items = items.into();
        if Arc::ptr_eq(&self.items, &items) {
            return;
        }
        self.window.set_count(items.len());
        self.items = items;
    }

    pub fn window(&self) -> &Windower {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut Windower {
        &mut self.window
    }

    pub fn on_scroll(&mut self, offset: u64, now_ms: u64) {
        self.window.apply_scroll_offset_event(offset, now_ms);
    }

    pub fn on_resize(&mut self, rect: Rect) {
        self.window.apply_resize_event(rect);
    }

    /// Renders the current window.
    ///
    /// `render_item` runs once per mounted row. A panic inside it is not caught here.
    pub fn render<V>(&self, mut render_item: impl FnMut(&T, usize) -> V) -> ListView<V> {
        if self.items.is_empty() {
            return ListView::Empty {
                message: self.empty_message.clone(),
                height: self.window.viewport_size(),
            };
        }

        let window = self.window.row_window();
        let height = self.window.item_height();
        let rows = window
            .indices()
            .filter_map(|index| {
                let item = self.items.get(index)?;
                Some(RenderedRow {
                    index,
                    top: window.row_offset(index),
                    height,
                    view: render_item(item, index),
                })
            })
            .collect();

        ListView::Rows(WindowedRows {
            total_height: self.window.total_size(),
            window,
            rows,
        })
    }
}
