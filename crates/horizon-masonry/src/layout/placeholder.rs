//! Filler rectangles below short columns.
//!
//! With `fill_empty_space` enabled each column gets a placeholder that spans
//! from just below its last item down to the bottom of the grid, so the
//! block of columns renders as a clean rectangle. Placeholder slots are
//! created by the host on first use and reused for every later pass.

use horizon_masonry_core::logging::targets;

use super::engine::{Column, LayoutMetrics};
use super::item::{ItemHandle, ItemStore};
use super::options::GridConfig;
use super::render::{RenderBatch, RenderTarget, StyleProperties, StyleValue};

/// Sizes placeholder slots after a layout pass.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderSizer {
    allocated: usize,
}

impl PlaceholderSizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of placeholder slots handed out so far. Never shrinks.
    #[inline]
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    /// Size one placeholder per column and hide the rest.
    ///
    /// Placeholders reach down to `container_height`, the bottom of the
    /// container after this pass.
    /// Returns the number of visible placeholders.
    pub fn refresh<H: ItemHandle>(
        &mut self,
        columns: &[Column],
        items: &ItemStore<H>,
        metrics: &LayoutMetrics,
        config: &GridConfig,
        container_height: i32,
        batch: &mut RenderBatch<H>,
    ) -> usize {
        self.allocated = self.allocated.max(columns.len());
        let inner_offset = config.offset + 2 * config.placeholder_border_width;
        let vertical_offset = config.vertical_offset();
        let mut visible = 0;

        for slot in 0..self.allocated {
            let last = columns
                .get(slot)
                .and_then(Column::last)
                .and_then(|id| items.get(id));
            let Some(last) = last else {
                batch.push(RenderTarget::Placeholder(slot), hidden());
                continue;
            };

            let top = last.top() + last.height_or_zero() + vertical_offset;
            let height = container_height - top - inner_offset;
            if height <= 0 {
                batch.push(RenderTarget::Placeholder(slot), hidden());
                continue;
            }

            let mut props = StyleProperties::new();
            props
                .set("position", StyleValue::Keyword("absolute"))
                .set("display", StyleValue::Keyword("block"))
                .set("top", StyleValue::Px(top))
                .set(metrics.direction.property(), StyleValue::Px(metrics.column_offset(slot)))
                .set("width", StyleValue::Px(metrics.column_width - inner_offset))
                .set("height", StyleValue::Px(height));
            batch.push(RenderTarget::Placeholder(slot), props);
            visible += 1;
        }

        tracing::trace!(
            target: targets::LAYOUT,
            allocated = self.allocated,
            visible,
            "placeholders sized"
        );
        visible
    }

    /// Hide every allocated slot, e.g. after `fill_empty_space` is turned off.
    pub fn hide_all<H: ItemHandle>(&self, batch: &mut RenderBatch<H>) {
        for slot in 0..self.allocated {
            batch.push(RenderTarget::Placeholder(slot), hidden());
        }
    }
}

fn hidden() -> StyleProperties {
    let mut props = StyleProperties::new();
    props.set("display", StyleValue::Keyword("none"));
    props
}
