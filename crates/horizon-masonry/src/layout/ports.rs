//! Traits connecting the grid to a rendering surface.
//!
//! The grid never touches a rendering surface directly. Hosts implement
//! [`MeasurementPort`] to report sizes and [`RenderPort`] to apply the
//! positional updates a layout pass produces. `H` is the host's item
//! handle: an element reference, a node ID, an index into a widget arena.

use super::render::RenderBatch;

/// Tag data an item declares for filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagAttribute {
    /// An already structured list of tags.
    List(Vec<String>),
    /// Raw attribute text, expected to be a JSON array of strings.
    Raw(String),
}

/// Read access to item and container dimensions.
pub trait MeasurementPort<H> {
    /// Rendered outer width of an item, in pixels.
    fn outer_width(&self, item: &H) -> i32;

    /// Rendered outer height of an item, in pixels.
    fn outer_height(&self, item: &H) -> i32;

    /// Whether the item is currently visible.
    fn is_visible(&self, item: &H) -> bool;

    /// Whether a container child is an element that takes part in layout.
    ///
    /// Text and comment nodes return `false` and are never tracked.
    fn is_element(&self, _item: &H) -> bool {
        true
    }

    /// The filter tags an item declares, if any.
    fn tag_attribute(&self, _item: &H) -> Option<TagAttribute> {
        None
    }

    /// Inner width of the container.
    fn container_inner_width(&self) -> i32;

    /// Inner height of the container.
    fn container_inner_height(&self) -> i32;

    /// Whether the container is displayed at all. Hidden containers skip layout.
    fn is_container_visible(&self) -> bool {
        true
    }
}

/// Write access to the rendering surface.
pub trait RenderPort<H> {
    /// Apply a batch of style updates as a single visual update.
    fn apply_batch(&mut self, batch: RenderBatch<H>);
}
