//! Prelude module for Horizon Masonry.
//!
//! This module re-exports the most commonly used types for convenient importing:
//!
//! ```
//! use horizon_masonry::prelude::*;
//! ```

// ============================================================================
// Grid
// ============================================================================

pub use crate::MasonryGrid;
pub use crate::error::{Error, Result};

// ============================================================================
// Configuration
// ============================================================================

pub use crate::layout::{Alignment, Direction, FrameMode, GridOptions, ItemInfo, ItemOrder, Length};

// ============================================================================
// Host Ports
// ============================================================================

pub use crate::layout::{
    MeasurementPort, RenderBatch, RenderPort, RenderTarget, RenderUpdate, StyleProperties,
    StyleValue, TagAttribute,
};

// ============================================================================
// Results and Filtering
// ============================================================================

pub use crate::layout::{FilterMode, LayoutMode, LayoutReport};

// ============================================================================
// Signals
// ============================================================================

pub use horizon_masonry_core::{ConnectionId, Signal};
