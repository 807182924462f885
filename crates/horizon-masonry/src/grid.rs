//! The grid controller.
//!
//! [`MasonryGrid`] owns the item set, the filter index, the layout engine
//! and the resize debouncer. It owns no rendering surface: every operation
//! that measures or writes borrows the host's ports for the duration of
//! the call.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use horizon_masonry::prelude::*;
//!
//! struct Page {
//!     heights: HashMap<u32, i32>,
//! }
//!
//! impl MeasurementPort<u32> for Page {
//!     fn outer_width(&self, _item: &u32) -> i32 { 190 }
//!     fn outer_height(&self, item: &u32) -> i32 { self.heights[item] }
//!     fn is_visible(&self, _item: &u32) -> bool { true }
//!     fn container_inner_width(&self) -> i32 { 600 }
//!     fn container_inner_height(&self) -> i32 { 0 }
//! }
//!
//! #[derive(Default)]
//! struct Surface {
//!     batches: Vec<RenderBatch<u32>>,
//! }
//!
//! impl RenderPort<u32> for Surface {
//!     fn apply_batch(&mut self, batch: RenderBatch<u32>) {
//!         self.batches.push(batch);
//!     }
//! }
//!
//! let page = Page { heights: (0..6).map(|i| (i, 100 + i as i32 * 10)).collect() };
//! let mut surface = Surface::default();
//! let mut grid: MasonryGrid<u32> = MasonryGrid::new(GridOptions::new().with_offset(10)).unwrap();
//!
//! let report = grid.initialize(0..6, &page, &mut surface).unwrap().unwrap();
//! assert_eq!(report.columns, 3);
//!
//! // Positions are written on the next frame.
//! assert!(grid.on_frame(&mut surface));
//! ```

use std::collections::HashSet;
use std::time::Instant;

use horizon_masonry_core::logging::{span_names, targets};
use horizon_masonry_core::{Debouncer, PerfSpan, Signal};

use crate::error::{Error, Result};
use crate::layout::{
    FilterIndex, FilterMode, FrameBatcher, GridConfig, GridItem, GridOptions, ItemHandle, ItemId,
    ItemStore, LayoutEngine, LayoutMetrics, LayoutReport, MeasurementPort, PlaceholderSizer,
    RenderBatch, RenderPort, RenderTarget, StyleProperties, StyleValue, parse_tag_attribute,
};

/// A masonry grid over host items of type `H`.
pub struct MasonryGrid<H: ItemHandle> {
    config: GridConfig,
    items: ItemStore<H>,
    filter_index: FilterIndex,
    engine: LayoutEngine,
    placeholders: PlaceholderSizer,
    frames: FrameBatcher<H>,
    resize: Debouncer,
    /// Width last written to items by flexible-width stretching.
    applied_width: Option<i32>,
    /// Container height last written by a layout pass.
    written_height: Option<i32>,
    layout_changed: Signal<LayoutReport>,
    torn_down: bool,
}

impl<H: ItemHandle> MasonryGrid<H> {
    /// Create a grid with `options` merged over the defaults.
    ///
    /// Nothing is discovered or laid out until [`initialize`](Self::initialize).
    pub fn new(options: GridOptions) -> Result<Self> {
        let config = GridConfig::default().merged(&options);
        config.validate()?;
        Ok(Self {
            resize: Debouncer::new(config.resize_delay),
            config,
            items: ItemStore::new(),
            filter_index: FilterIndex::new(),
            engine: LayoutEngine::new(),
            placeholders: PlaceholderSizer::new(),
            frames: FrameBatcher::new(),
            applied_width: None,
            written_height: None,
            layout_changed: Signal::new(),
            torn_down: false,
        })
    }

    // =========================================================================
    // Item Set
    // =========================================================================

    /// Discover the container's children and run a forced layout.
    ///
    /// Any previously tracked items are forgotten. Children that are not
    /// elements are skipped.
    #[tracing::instrument(skip_all, target = "horizon_masonry::grid", level = "debug")]
    pub fn initialize<I, M, R>(&mut self, children: I, measure: &M, render: &mut R) -> Result<Option<LayoutReport>>
    where
        I: IntoIterator<Item = H>,
        M: MeasurementPort<H>,
        R: RenderPort<H>,
    {
        self.ensure_live()?;
        self.items.clear();
        self.engine = LayoutEngine::new();
        self.applied_width = None;
        self.written_height = None;

        let discovered = self.discover(children, measure, render);
        tracing::debug!(target: targets::GRID, discovered, "grid initialized");

        self.refresh_filters(measure)?;
        self.layout(true, measure, render)
    }

    /// Track additional children. Returns how many were added.
    ///
    /// The next layout repacks. Call [`refresh_filters`](Self::refresh_filters)
    /// if the new items carry tags.
    pub fn append_items<I, M, R>(&mut self, children: I, measure: &M, render: &mut R) -> Result<usize>
    where
        I: IntoIterator<Item = H>,
        M: MeasurementPort<H>,
        R: RenderPort<H>,
    {
        self.ensure_live()?;
        let added = self.discover(children, measure, render);
        if added > 0 {
            self.engine.invalidate_columns();
            self.applied_width = None;
        }
        Ok(added)
    }

    /// Stop tracking an item. Returns whether it was tracked.
    pub fn remove_item(&mut self, handle: &H) -> Result<bool> {
        self.ensure_live()?;
        let removed = self.items.remove(handle).is_some();
        if removed {
            self.engine.invalidate_columns();
            tracing::debug!(target: targets::GRID, ?handle, "item removed");
        }
        Ok(removed)
    }

    fn discover<I, M, R>(&mut self, children: I, measure: &M, render: &mut R) -> usize
    where
        I: IntoIterator<Item = H>,
        M: MeasurementPort<H>,
        R: RenderPort<H>,
    {
        let mut shown = RenderBatch::new();
        for child in children {
            if !measure.is_element(&child) {
                tracing::trace!(target: targets::GRID, ?child, "skipping non-element child");
                continue;
            }
            if self.items.push(child.clone()).is_some() {
                shown.push(RenderTarget::Item(child), display("block"));
            }
        }
        let added = shown.len();
        if !shown.is_empty() {
            render.apply_batch(shown);
        }
        added
    }

    // =========================================================================
    // Options
    // =========================================================================

    /// Merge `options` into the configuration and run a forced layout.
    ///
    /// Values set by earlier updates survive unless `options` sets them again.
    /// The merged configuration is validated as a whole; on error the current
    /// configuration is kept.
    pub fn update_options<M, R>(&mut self, options: GridOptions, measure: &M, render: &mut R) -> Result<Option<LayoutReport>>
    where
        M: MeasurementPort<H>,
        R: RenderPort<H>,
    {
        self.ensure_live()?;
        let config = self.config.merged(&options);
        config.validate()?;
        self.config = config;
        self.resize.set_quiet_period(self.config.resize_delay);
        self.engine.mark_heights_dirty();
        if options.possible_filters.is_some() {
            self.refresh_filters(measure)?;
        }
        tracing::debug!(target: targets::GRID, ?options, "options updated");
        self.layout(true, measure, render)
    }

    /// The resolved configuration.
    #[inline]
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Run one layout pass.
    ///
    /// A forced pass always repacks; otherwise the engine refreshes the
    /// cached columns when it can. Returns `None` when the container is
    /// hidden or no item is active, in which case nothing is written.
    pub fn layout<M, R>(&mut self, force: bool, measure: &M, render: &mut R) -> Result<Option<LayoutReport>>
    where
        M: MeasurementPort<H>,
        R: RenderPort<H>,
    {
        self.ensure_live()?;
        let _perf = PerfSpan::new(span_names::LAYOUT_PASS);

        if !measure.is_container_visible() {
            tracing::debug!(target: targets::GRID, "container hidden, layout skipped");
            return Ok(None);
        }

        let active = self.active_items(measure);
        if active.is_empty() {
            tracing::debug!(target: targets::GRID, "no active items, layout skipped");
            return Ok(None);
        }

        let metrics = LayoutMetrics::compute(
            &self.config,
            measure.container_inner_width(),
            active.len(),
            || measure.outer_width(self.items[active[0]].handle()),
        );
        if let Some(width) = metrics.stretch_width {
            self.apply_stretch(width, render);
        }

        self.engine.measure_heights(&mut self.items, &active, measure);

        let mut batch = RenderBatch::new();
        let report = self
            .engine
            .layout(&mut self.items, &active, &metrics, &self.config, force, &mut batch);

        let mut container = StyleProperties::new();
        container.set("height", StyleValue::Px(report.content_height));
        batch.push(RenderTarget::Container, container);

        let container_height = self.container_height(report.content_height, measure);
        if self.config.fill_empty_space {
            let columns = self.engine.columns().unwrap_or_default();
            self.placeholders.refresh(
                columns,
                &self.items,
                &metrics,
                &self.config,
                container_height,
                &mut batch,
            );
        } else {
            self.placeholders.hide_all(&mut batch);
        }

        self.frames.submit(batch, self.config.frame_mode, render);
        tracing::debug!(
            target: targets::GRID,
            mode = ?report.mode,
            columns = report.columns,
            height = report.content_height,
            "layout pass complete"
        );
        self.layout_changed.emit(report.clone());
        Ok(Some(report))
    }

    /// Height the container ends up with once `content_height` is written.
    ///
    /// The host reports back the height written by the previous pass. A
    /// different reading comes from its own styling, such as a minimum
    /// height, and floors the result.
    fn container_height<M: MeasurementPort<H>>(&mut self, content_height: i32, measure: &M) -> i32 {
        let reported = measure.container_inner_height();
        let floor = match self.written_height {
            Some(written) if written == reported => 0,
            _ => reported,
        };
        self.written_height = Some(content_height);
        content_height.max(floor)
    }

    /// Items that take part in layout, in discovery order.
    fn active_items<M: MeasurementPort<H>>(&self, measure: &M) -> Vec<ItemId> {
        let include_filtered = !self.config.ignore_inactive_items;
        self.items
            .iter()
            .filter(|(_, item)| (item.is_selected() || include_filtered) && measure.is_visible(item.handle()))
            .map(|(id, _)| id)
            .collect()
    }

    /// Write the stretched width to every item when it changed.
    fn apply_stretch<R: RenderPort<H>>(&mut self, width: i32, render: &mut R) {
        if self.applied_width == Some(width) {
            return;
        }
        let mut batch = RenderBatch::new();
        for (_, item) in self.items.iter() {
            let mut props = StyleProperties::new();
            props.set("width", StyleValue::Px(width));
            batch.push(RenderTarget::Item(item.handle().clone()), props);
        }
        render.apply_batch(batch);
        self.applied_width = Some(width);
        self.engine.mark_heights_dirty();
        tracing::debug!(target: targets::GRID, width, "items stretched");
    }

    // =========================================================================
    // Filtering
    // =========================================================================

    /// Re-read every item's tags and rebuild the filter index.
    ///
    /// Items whose tag data cannot be parsed are left untagged.
    pub fn refresh_filters<M: MeasurementPort<H>>(&mut self, measure: &M) -> Result<()> {
        self.ensure_live()?;
        let _perf = PerfSpan::new(span_names::FILTER_REBUILD);

        let ids = self.items.ids().to_vec();
        for id in ids {
            let Some(item) = self.items.get_mut(id) else {
                continue;
            };
            let tags = match measure.tag_attribute(item.handle()) {
                None => Vec::new(),
                Some(attribute) => parse_tag_attribute(&attribute).unwrap_or_else(|| {
                    tracing::warn!(
                        target: targets::FILTER,
                        handle = ?item.handle(),
                        ?attribute,
                        "malformed tag data ignored"
                    );
                    Vec::new()
                }),
            };
            item.set_tags(tags);
        }

        self.filter_index.rebuild(&self.items, &self.config.possible_filters);
        Ok(())
    }

    /// Known tags with their item counts, sorted by tag.
    pub fn filter_tags(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.filter_index.tags()
    }

    /// Select items by tag and, unless `dry_run`, apply the selection.
    ///
    /// An empty `tags` slice selects every item. Applying a selection marks
    /// the other items inactive, hides them when inactive items are ignored,
    /// and repacks. A dry run only reports the selection.
    pub fn filter<S, M, R>(
        &mut self,
        tags: &[S],
        mode: FilterMode,
        dry_run: bool,
        measure: &M,
        render: &mut R,
    ) -> Result<Vec<H>>
    where
        S: AsRef<str>,
        M: MeasurementPort<H>,
        R: RenderPort<H>,
    {
        self.ensure_live()?;
        let selected: Vec<ItemId> = match self.filter_index.select(tags, mode) {
            None => self.items.ids().to_vec(),
            Some(ids) => ids.into_iter().filter(|&id| self.items.get(id).is_some()).collect(),
        };
        let handles: Vec<H> = selected
            .iter()
            .map(|&id| self.items[id].handle().clone())
            .collect();
        if dry_run {
            return Ok(handles);
        }

        let selected: HashSet<ItemId> = selected.into_iter().collect();
        let write_visibility = self.config.ignore_inactive_items;
        let mut visibility = RenderBatch::new();
        for id in self.items.ids().to_vec() {
            let keep = selected.contains(&id);
            let Some(item) = self.items.get_mut(id) else {
                continue;
            };
            item.set_filtered_out(!keep);
            if !keep {
                item.clear_placement();
            }
            if write_visibility {
                let value = if keep { "block" } else { "none" };
                visibility.push(RenderTarget::Item(item.handle().clone()), display(value));
            }
        }
        if !visibility.is_empty() {
            render.apply_batch(visibility);
        }

        tracing::debug!(target: targets::GRID, selected = handles.len(), ?mode, "filter applied");
        self.engine.invalidate_columns();
        self.layout(false, measure, render)?;
        Ok(handles)
    }

    // =========================================================================
    // Triggers
    // =========================================================================

    /// Note a container resize at `now`.
    ///
    /// Ignored unless auto resize is enabled. The relayout runs from
    /// [`poll`](Self::poll) once the resize delay has passed without
    /// another resize.
    pub fn on_resize(&mut self, now: Instant) {
        if self.torn_down || !self.config.auto_resize {
            return;
        }
        if self.config.has_flexible_width() {
            self.engine.mark_heights_dirty();
        }
        self.resize.trigger(now);
    }

    /// Run the debounced relayout if its quiet period has elapsed at `now`.
    pub fn poll<M, R>(&mut self, now: Instant, measure: &M, render: &mut R) -> Result<Option<LayoutReport>>
    where
        M: MeasurementPort<H>,
        R: RenderPort<H>,
    {
        if self.torn_down || !self.resize.poll(now) {
            return Ok(None);
        }
        tracing::debug!(target: targets::GRID, "debounced resize relayout");
        self.layout(false, measure, render)
    }

    /// Re-measure every item and lay out immediately.
    ///
    /// A pending resize relayout stays scheduled.
    pub fn on_refresh<M, R>(&mut self, measure: &M, render: &mut R) -> Result<Option<LayoutReport>>
    where
        M: MeasurementPort<H>,
        R: RenderPort<H>,
    {
        if self.torn_down {
            return Ok(None);
        }
        self.engine.mark_heights_dirty();
        self.layout(false, measure, render)
    }

    /// Apply the pending render batch. Returns whether anything was written.
    pub fn on_frame<R: RenderPort<H>>(&mut self, render: &mut R) -> bool {
        if self.torn_down {
            return false;
        }
        self.frames.flush(render)
    }

    /// When the pending resize relayout is due, if one is scheduled.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.resize.deadline()
    }

    /// Whether a render batch is waiting for the next frame.
    pub fn has_pending_frame(&self) -> bool {
        self.frames.has_pending()
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Stop all activity.
    ///
    /// Cancels the pending resize relayout, drops the pending render batch
    /// and disconnects every layout-changed slot. Afterwards triggers are
    /// ignored and explicit operations return [`Error::TornDown`].
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.resize.shutdown();
        self.frames.discard();
        self.layout_changed.disconnect_all();
        self.torn_down = true;
        tracing::debug!(target: targets::GRID, items = self.items.len(), "grid torn down");
    }

    #[inline]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    fn ensure_live(&self) -> Result<()> {
        if self.torn_down {
            Err(Error::TornDown)
        } else {
            Ok(())
        }
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Signal emitted with the report of every pass that wrote a layout.
    pub fn layout_changed(&self) -> &Signal<LayoutReport> {
        &self.layout_changed
    }

    /// Tracked items in discovery order.
    pub fn items(&self) -> &ItemStore<H> {
        &self.items
    }

    pub fn item(&self, handle: &H) -> Option<&GridItem<H>> {
        self.items.find(handle).and_then(|id| self.items.get(id))
    }

    /// Number of items in the most recent pass.
    pub fn active_item_count(&self) -> usize {
        self.engine.active_item_count()
    }

    /// Number of columns in the cached assignment.
    pub fn column_count(&self) -> usize {
        self.engine.columns().map_or(0, <[_]>::len)
    }

    /// Item handles per column, top to bottom.
    pub fn columns(&self) -> Vec<Vec<H>> {
        self.engine
            .columns()
            .unwrap_or_default()
            .iter()
            .map(|column| {
                column
                    .items()
                    .iter()
                    .filter_map(|&id| self.items.get(id))
                    .map(|item| item.handle().clone())
                    .collect()
            })
            .collect()
    }

    /// Placeholder slots handed out so far.
    pub fn placeholder_count(&self) -> usize {
        self.placeholders.allocated()
    }
}

impl<H: ItemHandle> std::fmt::Debug for MasonryGrid<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasonryGrid")
            .field("config", &self.config)
            .field("items", &self.items.len())
            .field("columns", &self.column_count())
            .field("torn_down", &self.torn_down)
            .finish_non_exhaustive()
    }
}

fn display(value: &'static str) -> StyleProperties {
    let mut props = StyleProperties::new();
    props.set("display", StyleValue::Keyword(value));
    props
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    use crate::layout::{Alignment, Length};

    struct Page {
        heights: HashMap<u32, i32>,
        width: i32,
    }

    impl Page {
        fn new(heights: &[i32], width: i32) -> Self {
            Self {
                heights: heights.iter().enumerate().map(|(i, &h)| (i as u32, h)).collect(),
                width,
            }
        }
    }

    impl MeasurementPort<u32> for Page {
        fn outer_width(&self, _item: &u32) -> i32 {
            90
        }
        fn outer_height(&self, item: &u32) -> i32 {
            self.heights.get(item).copied().unwrap_or(0)
        }
        fn is_visible(&self, _item: &u32) -> bool {
            true
        }
        fn container_inner_width(&self) -> i32 {
            self.width
        }
        fn container_inner_height(&self) -> i32 {
            0
        }
    }

    #[derive(Default)]
    struct Surface {
        batches: Vec<RenderBatch<u32>>,
    }

    impl RenderPort<u32> for Surface {
        fn apply_batch(&mut self, batch: RenderBatch<u32>) {
            self.batches.push(batch);
        }
    }

    fn grid() -> MasonryGrid<u32> {
        MasonryGrid::new(
            GridOptions::new()
                .with_offset(10)
                .with_align(Alignment::Left)
                .with_frame_mode(crate::layout::FrameMode::Immediate),
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_options() {
        let result = MasonryGrid::<u32>::new(GridOptions::new().with_outer_offset(-4));
        assert!(matches!(result, Err(Error::InvalidOption { option: "outerOffset", .. })));
    }

    #[test]
    fn test_initialize_infers_item_width() {
        let page = Page::new(&[10, 20, 30, 40], 300);
        let mut surface = Surface::default();
        let mut grid = grid();

        let report = grid.initialize(0..4, &page, &mut surface).unwrap().unwrap();

        assert_eq!(report.item_width, 90);
        assert_eq!(report.columns, 3);
        assert_eq!(grid.columns(), vec![vec![0, 3], vec![1], vec![2]]);
        // Display batch, then the layout batch.
        assert_eq!(surface.batches.len(), 2);
        let container = surface.batches[1].properties_for(&RenderTarget::Container).unwrap();
        assert_eq!(container.px("height"), Some(70));
    }

    #[test]
    fn test_refresh_keeps_columns() {
        let mut page = Page::new(&[10, 20, 30], 300);
        let mut surface = Surface::default();
        let mut grid = grid();
        grid.initialize(0..3, &page, &mut surface).unwrap();

        page.heights.insert(0, 500);
        let report = grid.on_refresh(&page, &mut surface).unwrap().unwrap();

        assert_eq!(report.mode, crate::layout::LayoutMode::Columns);
        assert_eq!(report.content_height, 510);
        assert_eq!(grid.item(&0).unwrap().height(), Some(500));
    }

    #[test]
    fn test_resize_ignored_without_auto_resize() {
        let page = Page::new(&[10], 300);
        let mut surface = Surface::default();
        let mut grid = grid();
        grid.initialize(0..1, &page, &mut surface).unwrap();

        let now = Instant::now();
        grid.on_resize(now);
        assert_eq!(grid.next_deadline(), None);
        assert!(grid.poll(now + Duration::from_secs(1), &page, &mut surface).unwrap().is_none());
    }

    #[test]
    fn test_item_width_option_overrides_measurement() {
        let page = Page::new(&[10, 10], 1000);
        let mut surface = Surface::default();
        let mut grid = grid();
        grid.initialize(0..2, &page, &mut surface).unwrap();

        let report = grid
            .update_options(GridOptions::new().with_item_width(Length::px(490)), &page, &mut surface)
            .unwrap()
            .unwrap();
        assert_eq!(report.columns, 2);
        assert_eq!(report.item_width, 490);
        assert_eq!(grid.config().offset, 10);
    }
}
