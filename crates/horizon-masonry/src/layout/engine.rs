//! The column packing algorithm.
//!
//! A pass first derives [`LayoutMetrics`] from the configuration and the
//! container width, then runs in one of two modes:
//!
//! - **Full layout** assigns every active item to the column that is
//!   currently shortest (first one on ties), stacking items top to bottom.
//!   This greedy heuristic is not globally optimal but runs in
//!   O(items × columns) without backtracking.
//! - **Column refresh** keeps the cached column assignment and only
//!   recomputes offsets. It is used when neither the column count nor the
//!   set of active items changed, which covers the common case of item
//!   heights changing in place.
//!
//! Both modes return the height of the tallest column and write every
//! position into a single [`RenderBatch`].

use std::collections::{HashMap, HashSet};

use horizon_masonry_core::logging::targets;

use super::item::{ItemHandle, ItemId, ItemStore};
use super::options::{Alignment, Direction, GridConfig, ItemInfo, ItemOrder};
use super::ports::MeasurementPort;
use super::render::{RenderBatch, RenderTarget, StyleProperties, StyleValue};

/// Which algorithm a pass ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    /// Column membership and offsets were recomputed.
    Full,
    /// Only offsets were recomputed.
    Columns,
}

/// Geometry shared by every item in a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutMetrics {
    /// Container width minus the outer offsets.
    pub inner_width: i32,
    /// Width of one item.
    pub item_width: i32,
    /// Width items are stretched to, when a flexible width is configured.
    pub stretch_width: Option<i32>,
    /// Item width plus the column offset.
    pub column_width: i32,
    /// Number of columns.
    pub columns: usize,
    /// Horizontal offset of the first column.
    pub base_offset: i32,
    /// Edge the horizontal offset is measured from.
    pub direction: Direction,
    /// Whether the first column hugs the container edge.
    pub left_aligned: bool,
}

impl LayoutMetrics {
    /// Derive pass geometry.
    ///
    /// `first_item_width` is only consulted when no item width is configured.
    pub fn compute(
        config: &GridConfig,
        container_width: i32,
        active_items: usize,
        first_item_width: impl FnOnce() -> i32,
    ) -> Self {
        let offset = config.offset;
        let inner_width = container_width - 2 * config.outer_offset;
        let (item_width, stretch_width) = item_width(config, inner_width, first_item_width);

        let column_width = item_width + offset;
        let fitting = if column_width > 0 {
            ((inner_width + offset) / column_width).max(0) as usize
        } else {
            1
        };
        let columns = fitting.min(active_items).max(1);

        let mut base_offset = config.outer_offset;
        if config.align == Alignment::Center {
            let used = columns as i32 * column_width - offset;
            base_offset += centering_shift(inner_width - used);
        }

        Self {
            inner_width,
            item_width,
            stretch_width,
            column_width,
            columns,
            base_offset,
            direction: config.resolved_direction(),
            left_aligned: config.align == Alignment::Left,
        }
    }

    /// Horizontal offset of a column.
    #[inline]
    pub fn column_offset(&self, column: usize) -> i32 {
        if column == 0 && self.left_aligned {
            self.base_offset
        } else {
            self.base_offset + column as i32 * self.column_width
        }
    }
}

/// Half of the horizontal leftover, rounded half-up before halving. A negative
/// leftover (one column wider than the container) therefore rounds toward
/// zero: -51 shifts by -25.
fn centering_shift(leftover: i32) -> i32 {
    ((f64::from(leftover) + 0.5).trunc() as i32) >> 1
}

/// Resolve the item width, and the stretch width for flexible layouts.
fn item_width(
    config: &GridConfig,
    inner_width: i32,
    first_item_width: impl FnOnce() -> i32,
) -> (i32, Option<i32>) {
    let offset = config.offset;
    let mut width = if config.item_width.is_zero() && !config.has_flexible_width() {
        first_item_width()
    } else {
        config.item_width.resolve(inner_width)
    };

    if !config.has_flexible_width() {
        return (width, None);
    }

    let flexible = config.flexible_width.resolve(inner_width);
    let padded = f64::from(inner_width + offset);
    let flexible_columns = if flexible + offset > 0 {
        (0.5 + padded / f64::from(flexible + offset)).floor() as i32
    } else {
        0
    };
    let fixed_columns = if width > 0 {
        (padded / f64::from(width + offset)).floor() as i32
    } else {
        0
    };
    let columns = flexible_columns.max(fixed_columns).max(1);
    let even_split = (inner_width - (columns - 1) * offset).div_euclid(columns);
    width = width.max(flexible.min(even_split));
    (width, Some(width))
}

/// One column of the cached assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Column {
    items: Vec<ItemId>,
    height: i32,
}

impl Column {
    fn seeded(height: i32) -> Self {
        Self {
            items: Vec::new(),
            height,
        }
    }

    /// Items in the column, top to bottom.
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    /// Accumulated height after the last item, including its vertical offset.
    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn last(&self) -> Option<ItemId> {
        self.items.last().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Summary of one layout pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutReport {
    pub mode: LayoutMode,
    pub columns: usize,
    pub column_width: i32,
    pub item_width: i32,
    pub base_offset: i32,
    /// Height of the tallest column, which the container is resized to.
    pub content_height: i32,
    pub active_items: usize,
}

/// Column assignment state between passes.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    columns: Option<Vec<Column>>,
    active_item_count: usize,
    heights_dirty: bool,
    heights_initialized: bool,
    last_direction: Option<Direction>,
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self {
            columns: None,
            active_item_count: 0,
            heights_dirty: true,
            heights_initialized: false,
            last_direction: None,
        }
    }

    /// The cached column assignment, if any.
    pub fn columns(&self) -> Option<&[Column]> {
        self.columns.as_deref()
    }

    /// Number of active items in the most recent pass.
    #[inline]
    pub fn active_item_count(&self) -> usize {
        self.active_item_count
    }

    /// Force the next pass to repack.
    pub fn invalidate_columns(&mut self) {
        self.columns = None;
    }

    /// Re-measure every active item on the next pass.
    pub fn mark_heights_dirty(&mut self) {
        self.heights_dirty = true;
    }

    #[inline]
    pub fn heights_dirty(&self) -> bool {
        self.heights_dirty || !self.heights_initialized
    }

    /// Refresh cached heights. Everything is measured when heights are
    /// dirty; otherwise only items that were never measured.
    ///
    /// Inactive items are not measured. When heights are dirty their cached
    /// height is dropped instead, so they are measured once they become
    /// active again.
    pub fn measure_heights<H, M>(&mut self, items: &mut ItemStore<H>, active: &[ItemId], measure: &M)
    where
        H: ItemHandle,
        M: MeasurementPort<H>,
    {
        let all = self.heights_dirty();
        if all {
            let active: HashSet<ItemId> = active.iter().copied().collect();
            let inactive: Vec<ItemId> = items.ids().iter().copied().filter(|id| !active.contains(id)).collect();
            for id in inactive {
                if let Some(item) = items.get_mut(id) {
                    item.invalidate_height();
                }
            }
        }
        let mut measured = 0usize;
        for &id in active {
            let Some(item) = items.get_mut(id) else {
                continue;
            };
            if all || item.height().is_none() {
                let height = measure.outer_height(item.handle());
                item.set_height(height);
                measured += 1;
            }
        }
        self.heights_dirty = false;
        self.heights_initialized = true;
        tracing::trace!(target: targets::LAYOUT, measured, all, "item heights cached");
    }

    /// Why a full layout is needed, or `None` when a column refresh suffices.
    fn full_layout_reason(&self, force: bool, metrics: &LayoutMetrics, active: &[ItemId]) -> Option<&'static str> {
        if force {
            return Some("forced");
        }
        let Some(columns) = &self.columns else {
            return Some("no cached columns");
        };
        if columns.len() != metrics.columns {
            return Some("column count changed");
        }
        if self.active_item_count != active.len() {
            return Some("active item count changed");
        }
        let active: HashSet<ItemId> = active.iter().copied().collect();
        if !columns.iter().flat_map(|c| c.items.iter()).all(|id| active.contains(id)) {
            return Some("active item set changed");
        }
        None
    }

    /// Run one pass over `active` and append its writes to `batch`.
    #[tracing::instrument(
        skip_all,
        target = "horizon_masonry::layout",
        level = "debug",
        fields(active = active.len(), columns = metrics.columns)
    )]
    pub fn layout<H: ItemHandle>(
        &mut self,
        items: &mut ItemStore<H>,
        active: &[ItemId],
        metrics: &LayoutMetrics,
        config: &GridConfig,
        force: bool,
        batch: &mut RenderBatch<H>,
    ) -> LayoutReport {
        let mode = match self.full_layout_reason(force, metrics, active) {
            Some(reason) => {
                tracing::debug!(target: targets::LAYOUT, reason, "full layout");
                LayoutMode::Full
            }
            None => {
                tracing::debug!(target: targets::LAYOUT, "column refresh");
                LayoutMode::Columns
            }
        };

        let content_height = match mode {
            LayoutMode::Full => self.layout_full(items, active, metrics, config, batch),
            LayoutMode::Columns => self.layout_columns(items, metrics, config, batch),
        };
        self.active_item_count = active.len();
        self.last_direction = Some(metrics.direction);

        LayoutReport {
            mode,
            columns: metrics.columns,
            column_width: metrics.column_width,
            item_width: metrics.item_width,
            base_offset: metrics.base_offset,
            content_height,
            active_items: active.len(),
        }
    }

    /// Position properties for an item, clearing the opposite edge when the
    /// direction flipped since the last pass.
    fn position(&self, metrics: &LayoutMetrics, top: i32, side: i32) -> StyleProperties {
        let mut props = StyleProperties::new();
        props
            .set("position", StyleValue::Keyword("absolute"))
            .set("top", StyleValue::Px(top))
            .set(metrics.direction.property(), StyleValue::Px(side));
        if let Some(previous) = self.last_direction
            && previous != metrics.direction
        {
            props.set(previous.property(), StyleValue::Keyword("auto"));
        }
        props
    }

    fn layout_full<H: ItemHandle>(
        &mut self,
        items: &mut ItemStore<H>,
        active: &[ItemId],
        metrics: &LayoutMetrics,
        config: &GridConfig,
        batch: &mut RenderBatch<H>,
    ) -> i32 {
        let order = sorted(items, active, &config.order);
        let vertical_offset = config.vertical_offset();
        let mut columns: Vec<Column> = (0..metrics.columns)
            .map(|_| Column::seeded(config.outer_offset))
            .collect();

        for id in order {
            let mut shortest = 0;
            for (index, column) in columns.iter().enumerate() {
                if column.height < columns[shortest].height {
                    shortest = index;
                }
            }

            let top = columns[shortest].height;
            let side = metrics.column_offset(shortest);
            let Some(item) = items.get_mut(id) else {
                continue;
            };
            item.place(shortest, top, side);
            tracing::trace!(target: targets::LAYOUT, handle = ?item.handle(), column = shortest, top, side, "placed");

            let height = item.height_or_zero();
            batch.push(RenderTarget::Item(item.handle().clone()), self.position(metrics, top, side));

            let column = &mut columns[shortest];
            column.height += height + vertical_offset;
            column.items.push(id);
        }

        let content_height = tallest(&columns, config.outer_offset);
        self.columns = Some(columns);
        content_height
    }

    fn layout_columns<H: ItemHandle>(
        &mut self,
        items: &mut ItemStore<H>,
        metrics: &LayoutMetrics,
        config: &GridConfig,
        batch: &mut RenderBatch<H>,
    ) -> i32 {
        let vertical_offset = config.vertical_offset();
        let mut columns = self.columns.take().unwrap_or_default();

        for (index, column) in columns.iter_mut().enumerate() {
            let side = metrics.column_offset(index);
            let mut height = config.outer_offset;
            for &id in &column.items {
                let Some(item) = items.get_mut(id) else {
                    continue;
                };
                item.place(index, height, side);
                batch.push(RenderTarget::Item(item.handle().clone()), self.position(metrics, height, side));
                height += item.height_or_zero() + vertical_offset;
            }
            column.height = height;
        }

        let content_height = tallest(&columns, config.outer_offset);
        self.columns = Some(columns);
        content_height
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn tallest(columns: &[Column], floor: i32) -> i32 {
    columns.iter().map(Column::height).max().unwrap_or(floor)
}

/// Apply the configured item order, stable with respect to discovery order.
fn sorted<H: ItemHandle>(items: &ItemStore<H>, active: &[ItemId], order: &ItemOrder) -> Vec<ItemId> {
    let mut ids = active.to_vec();
    let ItemOrder::Sorted(compare) = order else {
        return ids;
    };
    let positions: HashMap<ItemId, usize> = items
        .ids()
        .iter()
        .enumerate()
        .map(|(index, &id)| (id, index))
        .collect();
    let info = |id: ItemId| {
        let item = &items[id];
        ItemInfo {
            index: positions.get(&id).copied().unwrap_or(usize::MAX),
            height: item.height_or_zero(),
            tags: item.tags(),
        }
    };
    ids.sort_by(|&a, &b| compare(&info(a), &info(b)));
    ids
}
