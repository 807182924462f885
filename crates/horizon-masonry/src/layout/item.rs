//! Items managed by the grid.
//!
//! Each container child that takes part in layout becomes a [`GridItem`],
//! keyed by an [`ItemId`] and kept in discovery order by the [`ItemStore`].

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Stable identifier of a grid item.
    pub struct ItemId;
}

/// Requirements on the host's item handle type.
pub trait ItemHandle: Clone + Eq + Hash + Debug {}

impl<T: Clone + Eq + Hash + Debug> ItemHandle for T {}

/// A grid item and its layout state.
#[derive(Debug, Clone)]
pub struct GridItem<H> {
    handle: H,
    /// Cached outer height; `None` until measured.
    height: Option<i32>,
    /// Vertical offset assigned by the last pass.
    top: i32,
    /// Horizontal offset assigned by the last pass.
    side: i32,
    /// Column assigned by the last full layout.
    column_index: Option<usize>,
    /// Normalized filter tags.
    tags: Vec<String>,
    /// Excluded by the current filter.
    filtered_out: bool,
}

impl<H> GridItem<H> {
    pub fn new(handle: H) -> Self {
        Self {
            handle,
            height: None,
            top: 0,
            side: 0,
            column_index: None,
            tags: Vec::new(),
            filtered_out: false,
        }
    }

    #[inline]
    pub fn handle(&self) -> &H {
        &self.handle
    }

    #[inline]
    pub fn height(&self) -> Option<i32> {
        self.height
    }

    /// Cached height, zero when never measured.
    #[inline]
    pub fn height_or_zero(&self) -> i32 {
        self.height.unwrap_or(0)
    }

    pub(crate) fn set_height(&mut self, height: i32) {
        self.height = Some(height);
    }

    /// Drop the cached height so the next pass measures it again.
    pub(crate) fn invalidate_height(&mut self) {
        self.height = None;
    }

    #[inline]
    pub fn top(&self) -> i32 {
        self.top
    }

    /// Offset from the container edge given by the layout direction.
    #[inline]
    pub fn side_offset(&self) -> i32 {
        self.side
    }

    #[inline]
    pub fn column_index(&self) -> Option<usize> {
        self.column_index
    }

    pub(crate) fn place(&mut self, column: usize, top: i32, side: i32) {
        self.column_index = Some(column);
        self.top = top;
        self.side = side;
    }

    pub(crate) fn clear_placement(&mut self) {
        self.column_index = None;
    }

    #[inline]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub(crate) fn set_tags(&mut self, tags: Vec<String>) {
        self.tags = tags;
    }

    /// Whether the current filter selects this item.
    #[inline]
    pub fn is_selected(&self) -> bool {
        !self.filtered_out
    }

    pub(crate) fn set_filtered_out(&mut self, filtered_out: bool) {
        self.filtered_out = filtered_out;
    }
}

/// Items in discovery order.
#[derive(Debug, Clone)]
pub struct ItemStore<H> {
    items: SlotMap<ItemId, GridItem<H>>,
    order: Vec<ItemId>,
    by_handle: HashMap<H, ItemId>,
}

impl<H> Default for ItemStore<H> {
    fn default() -> Self {
        Self {
            items: SlotMap::with_key(),
            order: Vec::new(),
            by_handle: HashMap::new(),
        }
    }
}

impl<H: ItemHandle> ItemStore<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item. Returns `None` if the handle is already tracked.
    pub fn push(&mut self, handle: H) -> Option<ItemId> {
        if self.by_handle.contains_key(&handle) {
            return None;
        }
        let id = self.items.insert(GridItem::new(handle.clone()));
        self.by_handle.insert(handle, id);
        self.order.push(id);
        Some(id)
    }

    /// Remove the item with the given handle.
    pub fn remove(&mut self, handle: &H) -> Option<GridItem<H>> {
        let id = self.by_handle.remove(handle)?;
        self.order.retain(|&other| other != id);
        self.items.remove(id)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.order.clear();
        self.by_handle.clear();
    }

    pub fn find(&self, handle: &H) -> Option<ItemId> {
        self.by_handle.get(handle).copied()
    }

    pub fn get(&self, id: ItemId) -> Option<&GridItem<H>> {
        self.items.get(id)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut GridItem<H>> {
        self.items.get_mut(id)
    }

    /// Item IDs in discovery order.
    pub fn ids(&self) -> &[ItemId] {
        &self.order
    }

    /// Items in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &GridItem<H>)> + '_ {
        self.order.iter().map(|&id| (id, &self.items[id]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<H> std::ops::Index<ItemId> for ItemStore<H> {
    type Output = GridItem<H>;

    fn index(&self, id: ItemId) -> &GridItem<H> {
        &self.items[id]
    }
}
