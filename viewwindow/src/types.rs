use core::ops::Range;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Align {
    Start,
    Center,
    End,
    Auto,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScrollDirection {
    Forward,
    Backward,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Viewport size of a scroll container.
///
/// - `main` is the scroll axis (height for vertical lists)
/// - `cross` is the other axis (width for vertical lists)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub main: u32,
    pub cross: u32,
}

impl Rect {
    pub fn new(main: u32, cross: u32) -> Self {
        Self { main, cross }
    }
}

/// The contiguous index range a list renders for one scroll position.
///
/// Always satisfies `start_index <= end_index <= total_count`. It is recomputed on every
/// scroll/resize and never stored by the windower.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RowWindow {
    pub start_index: usize,
    pub end_index: usize, // exclusive
    pub item_height: u32,
    pub total_count: usize,
}

impl RowWindow {
    pub fn empty(item_height: u32, total_count: usize) -> Self {
        Self {
            start_index: 0,
            end_index: 0,
            item_height,
            total_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start_index >= self.end_index
    }

    pub fn len(&self) -> usize {
        self.end_index.saturating_sub(self.start_index)
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start_index && index < self.end_index
    }

    pub fn indices(&self) -> Range<usize> {
        self.start_index..self.end_index
    }

    /// Absolute offset of `index` inside the scrollable area.
    pub fn row_offset(&self, index: usize) -> u64 {
        (index as u64).saturating_mul(self.item_height as u64)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VirtualRow {
    pub index: usize,
    /// Start offset in the scroll axis (`index * item_height`).
    pub start: u64,
    pub size: u32,
}

impl VirtualRow {
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.size as u64)
    }
}
