use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::list::{ListView, VirtualizedList};
use crate::{Rect, SortDirection};

pub const DEFAULT_TABLE_HEIGHT: u32 = 400;
pub const DEFAULT_ROW_HEIGHT: u32 = 50;
pub const DEFAULT_HEADER_HEIGHT: u32 = 50;
pub const DEFAULT_TABLE_EMPTY_MESSAGE: &str = "No data";

pub type CellRenderer<T, V> = Arc<dyn Fn(&T) -> V + Send + Sync>;
pub type Comparator<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Receives the key of a clicked sortable column. The caller owns the sort state.
pub type OnSortCallback = Arc<dyn Fn(&str) + Send + Sync>;

pub struct Column<T, V> {
    /// Unique per table.
    pub key: String,
    pub header: String,
    pub render: CellRenderer<T, V>,
    pub sortable: bool,
    /// Fixed width; `None` lets the cell flex.
    pub width: Option<u32>,
    /// Ordering used when this column is the sort key.
    pub compare: Option<Comparator<T>>,
}

impl<T, V> Column<T, V> {
    pub fn new(
        key: impl Into<String>,
        header: impl Into<String>,
        render: impl Fn(&T) -> V + Send + Sync + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            header: header.into(),
            render: Arc::new(render),
            sortable: false,
            width: None,
            compare: None,
        }
    }

    pub fn sortable_by(
        mut self,
        compare: impl Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.sortable = true;
        self.compare = Some(Arc::new(compare));
        self
    }

    pub fn sortable_by_key<Q: Ord>(
        self,
        key_of: impl Fn(&T) -> Q + Send + Sync + 'static,
    ) -> Self {
        self.sortable_by(move |a, b| key_of(a).cmp(&key_of(b)))
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }
}

impl<T, V> Clone for Column<T, V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            header: self.header.clone(),
            render: Arc::clone(&self.render),
            sortable: self.sortable,
            width: self.width,
            compare: self.compare.clone(),
        }
    }
}

impl<T, V> core::fmt::Debug for Column<T, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("header", &self.header)
            .field("sortable", &self.sortable)
            .field("width", &self.width)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SortSpec {
    pub key: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }

    pub fn ascending(key: impl Into<String>) -> Self {
        Self::new(key, SortDirection::Ascending)
    }

    pub fn descending(key: impl Into<String>) -> Self {
        Self::new(key, SortDirection::Descending)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderCell {
    pub key: String,
    pub header: String,
    pub sortable: bool,
    /// Set on the column currently used for sorting.
    pub sorted: Option<SortDirection>,
    pub width: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableCell<V> {
    pub key: String,
    pub width: Option<u32>,
    pub view: V,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableRow<V> {
    /// Index of the record in the unsorted data.
    pub source_index: usize,
    pub cells: Vec<TableCell<V>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TableView<V> {
    Loading { height: u32 },
    Ready {
        header: Vec<HeaderCell>,
        body: ListView<TableRow<V>>,
    },
}

struct SortMemo<T> {
    data: Arc<[T]>,
    sort: Option<SortSpec>,
    columns_rev: u64,
}

/// A sortable table on top of [`VirtualizedList`].
///
/// The header is produced once per render, outside the windowed body. Sorting is stable and is
/// recomputed only when the data `Arc`, the columns or the sort spec change.
pub struct OptimizedTable<T, V> {
    data: Arc<[T]>,
    columns: Vec<Column<T, V>>,
    columns_rev: u64,
    sort: Option<SortSpec>,
    on_sort: Option<OnSortCallback>,
    loading: bool,
    height: u32,
    header_height: u32,
    body: VirtualizedList<usize>,
    memo: Option<SortMemo<T>>,
}

impl<T, V> OptimizedTable<T, V> {
    pub fn new(data: impl Into<Arc<[T]>>, columns: Vec<Column<T, V>>) -> Self {
        let body = VirtualizedList::new(Vec::<usize>::new())
            .with_height(DEFAULT_TABLE_HEIGHT.saturating_sub(DEFAULT_HEADER_HEIGHT))
            .with_item_height(DEFAULT_ROW_HEIGHT)
            .with_empty_message(DEFAULT_TABLE_EMPTY_MESSAGE);
        Self {
            data: data.into(),
            columns,
            columns_rev: 0,
            sort: None,
            on_sort: None,
            loading: false,
            height: DEFAULT_TABLE_HEIGHT,
            header_height: DEFAULT_HEADER_HEIGHT,
            body,
            memo: None,
        }
    }

    pub fn with_height(mut self, height: u32) -> Self {
        self.set_height(height);
        self
    }

    pub fn with_header_height(mut self, header_height: u32) -> Self {
        self.header_height = header_height;
        self.set_height(self.height);
        self
    }

    pub fn with_item_height(mut self, item_height: u32) -> Self {
        self.body.window_mut().set_item_height(item_height);
        self
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.body.window_mut().set_overscan(overscan);
        self
    }

    pub fn with_empty_message(mut self, message: impl Into<String>) -> Self {
        self.body = self.body.with_empty_message(message);
        self
    }

    pub fn with_sort(mut self, sort: Option<SortSpec>) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_on_sort(mut self, on_sort: Option<impl Fn(&str) + Send + Sync + 'static>) -> Self {
        self.on_sort = on_sort.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn set_data(&mut self, data: impl Into<Arc<[T]>>) {
        self.data = data.into();
    }

    pub fn columns(&self) -> &[Column<T, V>] {
        &self.columns
    }

    pub fn set_columns(&mut self, columns: Vec<Column<T, V>>) {
        self.columns = columns;
        self.columns_rev = self.columns_rev.wrapping_add(1);
    }

    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    /// Applies the caller's sort choice (typically after an `on_sort` notification).
    pub fn set_sort(&mut self, sort: Option<SortSpec>) {
        self.sort = sort;
    }

    pub fn set_on_sort(&mut self, on_sort: Option<impl Fn(&str) + Send + Sync + 'static>) {
        self.on_sort = on_sort.map(|f| Arc::new(f) as _);
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn set_height(&mut self, height: u32) {
        self.height = height;
        self.body
            .window_mut()
            .set_viewport_size(height.saturating_sub(self.header_height));
    }

    pub fn body(&self) -> &VirtualizedList<usize> {
        &self.body
    }

    pub fn on_scroll(&mut self, offset: u64, now_ms: u64) {
        self.body.on_scroll(offset, now_ms);
    }

    /// Resizes the whole table; the body gets what is left below the header.
    pub fn on_resize(&mut self, rect: Rect) {
        self.height = rect.main;
        self.body.on_resize(Rect::new(
            rect.main.saturating_sub(self.header_height),
            rect.cross,
        ));
    }

    /// Reports a header click. Sortable columns emit their key through `on_sort`; the
    /// table's own sort is left untouched.
    ///
    /// Returns `true` when the click targeted a sortable column.
    pub fn header_click(&self, key: &str) -> bool {
        let sortable = self.columns.iter().any(|c| c.key == key && c.sortable);
        if !sortable {
            return false;
        }
        wtrace!(key, "header_click");
        if let Some(on_sort) = &self.on_sort {
            on_sort(key);
        }
        true
    }

    pub fn header(&self) -> Vec<HeaderCell> {
        self.columns
            .iter()
            .map(|c| HeaderCell {
                key: c.key.clone(),
                header: c.header.clone(),
                sortable: c.sortable,
                sorted: self
                    .sort
                    .as_ref()
                    .filter(|s| c.sortable && s.key == c.key)
                    .map(|s| s.direction),
                width: c.width,
            })
            .collect()
    }

    /// Display order as indexes into `data()`.
    pub fn sorted_order(&mut self) -> &[usize] {
        self.refresh_order();
        self.body.items()
    }

    pub fn render(&mut self) -> TableView<V> {
        if self.loading {
            return TableView::Loading {
                height: self.height,
            };
        }
        self.refresh_order();

        let header = self.header();
        let data = &self.data;
        let columns = &self.columns;
        let body = self.body.render(|&source_index, _| TableRow {
            source_index,
            cells: columns
                .iter()
                .map(|c| TableCell {
                    key: c.key.clone(),
                    width: c.width,
                    view: (c.render)(&data[source_index]),
                })
                .collect(),
        });

        TableView::Ready { header, body }
    }

    fn refresh_order(&mut self) {
        let fresh = match &self.memo {
            Some(memo) => {
                Arc::ptr_eq(&memo.data, &self.data)
                    && memo.sort == self.sort
                    && memo.columns_rev == self.columns_rev
            }
            None => false,
        };
        if fresh {
            return;
        }

        let order = sorted_order(&self.data, &self.columns, self.sort.as_ref());
        wdebug!(rows = order.len(), "table order recomputed");
        self.body.set_items(order);
        self.memo = Some(SortMemo {
            data: Arc::clone(&self.data),
            sort: self.sort.clone(),
            columns_rev: self.columns_rev,
        });
    }
}

impl<T, V> core::fmt::Debug for OptimizedTable<T, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OptimizedTable")
            .field("rows", &self.data.len())
            .field("columns", &self.columns)
            .field("sort", &self.sort)
            .field("loading", &self.loading)
            .field("height", &self.height)
            .field("header_height", &self.header_height)
            .finish_non_exhaustive()
    }
}

fn sorted_order<T, V>(data: &[T], columns: &[Column<T, V>], sort: Option<&SortSpec>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..data.len()).collect();
    let Some(sort) = sort else {
        return order;
    };
    let compare = columns
        .iter()
        .find(|c| c.sortable && c.key == sort.key)
        .and_then(|c| c.compare.as_ref());
    let Some(compare) = compare else {
        wwarn!(key = sort.key.as_str(), "sort key has no comparable column");
        return order;
    };

    // `sort_by` is stable; reversing the comparator keeps ties in source order both ways.
    order.sort_by(|&a, &b| {
        let ord = compare(&data[a], &data[b]);
        match sort.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
    order
}
