//! Masonry layout building blocks.
//!
//! This module provides the pieces a [`MasonryGrid`](crate::MasonryGrid) is
//! assembled from:
//!
//! - [`LayoutEngine`]: Shortest-column packing and column refresh
//! - [`FilterIndex`]: Tag to item lists with AND/OR selection
//! - [`PlaceholderSizer`]: Filler rectangles below short columns
//! - [`GridOptions`] / [`GridConfig`]: Partial and resolved configuration
//! - [`MeasurementPort`] / [`RenderPort`]: The host's rendering surface
//! - [`RenderBatch`] / [`FrameBatcher`]: Coalesced style writes
//!
//! # Layout Algorithm
//!
//! Every pass works in three steps:
//!
//! 1. **Metrics**: Derive item width, column width, column count and the
//!    horizontal base offset from the container width.
//! 2. **Heights**: Measure items whose heights are unknown or dirty.
//! 3. **Placement**: Either repack every active item into the shortest
//!    column, or keep the previous column assignment and only recompute
//!    offsets when nothing structural changed.
//!
//! All positions of a pass are written as one [`RenderBatch`].
//!
//! # Example
//!
//! ```
//! use horizon_masonry::layout::{GridConfig, GridOptions, LayoutMetrics, Length};
//!
//! let config = GridConfig::default().merged(
//!     &GridOptions::new().with_item_width(Length::px(190)).with_offset(10),
//! );
//! let metrics = LayoutMetrics::compute(&config, 600, 12, || 0);
//!
//! assert_eq!(metrics.columns, 3);
//! assert_eq!(metrics.column_width, 200);
//! assert_eq!(metrics.base_offset, 5);
//! ```

mod engine;
mod filter;
mod item;
mod options;
mod placeholder;
mod ports;
mod render;

pub use engine::{Column, LayoutEngine, LayoutMetrics, LayoutMode, LayoutReport};
pub use filter::{FilterIndex, FilterMode, normalize_tag, parse_tag_attribute};
pub use item::{GridItem, ItemHandle, ItemId, ItemStore};
pub use options::{
    Alignment, Comparator, DEFAULT_OFFSET, DEFAULT_RESIZE_DELAY, Direction, FrameMode, GridConfig,
    GridOptions, ItemInfo, ItemOrder, Length,
};
pub use placeholder::PlaceholderSizer;
pub use ports::{MeasurementPort, RenderPort, TagAttribute};
pub use render::{FrameBatcher, RenderBatch, RenderTarget, RenderUpdate, StyleProperties, StyleValue};
