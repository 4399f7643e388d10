//! Headless windowed list rendering.
//!
//! This crate computes which rows of a large, fixed-row-height list intersect a scroll
//! viewport (plus an overscan margin) and renders only those, while reporting the full
//! scrollable height so the container scrolls as if every row existed.
//!
//! It is UI-agnostic. A TUI/GUI layer is expected to provide:
//! - viewport size (height/width)
//! - scroll offset
//! - a per-row render callback
//!
//! On top of the windowing math it offers a sortable table wrapper, viewport proximity
//! observation for lazy content, and a clock-driven debouncer.
//!
//! For on-demand image loading, see the `viewwindow-assets` crate.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod debounce;
mod key;
mod list;
mod options;
mod proximity;
mod table;
mod types;
mod window;


pub use debounce::{DEFAULT_DEBOUNCE_MS, Debouncer};
pub use list::{
    DEFAULT_EMPTY_MESSAGE, DEFAULT_ITEM_HEIGHT, DEFAULT_LIST_HEIGHT, ListView, RenderedRow,
    VirtualizedList, WindowedRows,
};
pub use options::{
    DEFAULT_IS_SCROLLING_RESET_DELAY_MS, DEFAULT_OVERSCAN, OnChangeCallback, WindowOptions,
};
pub use proximity::{
    Bounds, DEFAULT_REVEAL_DELAY_MS, DEFAULT_ROOT_MARGIN_PX, DEFAULT_THRESHOLD, LazyGate,
    MarginValue, ParseMarginError, ProximityObserver, ProximityOptions, RootMargin,
};
pub use table::{
    CellRenderer, Column, Comparator, DEFAULT_HEADER_HEIGHT, DEFAULT_ROW_HEIGHT,
    DEFAULT_TABLE_EMPTY_MESSAGE, DEFAULT_TABLE_HEIGHT, HeaderCell, OnSortCallback,
    OptimizedTable, SortSpec, TableCell, TableRow, TableView,
};
pub use types::{Align, Rect, RowWindow, ScrollDirection, SortDirection, VirtualRow};
pub use window::Windower;

#[doc(hidden)]
pub use key::ObserverKey;
