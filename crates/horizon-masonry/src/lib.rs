//! Horizon Masonry - a masonry (Pinterest-style) grid layout.
//!
//! Items of equal width are packed into columns, each one going to the
//! column that is currently shortest. The grid can filter items by tag,
//! fill the space below short columns with placeholders, and coalesce
//! container resizes into a single relayout.
//!
//! The crate is host-independent: the host reports sizes through a
//! [`MeasurementPort`](layout::MeasurementPort) and applies positions
//! through a [`RenderPort`](layout::RenderPort). Time is passed in as
//! [`Instant`](std::time::Instant)s, so the grid never blocks or spawns.
//!
//! # Example
//!
//! ```
//! use horizon_masonry::prelude::*;
//!
//! let options = GridOptions::from_json(r#"{"itemWidth": 190, "offset": 10}"#).unwrap();
//! let grid: MasonryGrid<u32> = MasonryGrid::new(options).unwrap();
//!
//! assert_eq!(grid.config().item_width, Length::px(190));
//! ```

pub use horizon_masonry_core::*;

mod error;
mod grid;
pub mod layout;
pub mod prelude;

pub use error::{Error, Result};
pub use grid::MasonryGrid;

static_assertions::assert_impl_all!(MasonryGrid<u32>: Send, Sync);
static_assertions::assert_impl_all!(layout::GridOptions: Send, Sync, Clone);
