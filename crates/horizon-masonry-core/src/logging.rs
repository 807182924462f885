//! Logging facilities for Horizon Masonry.
//!
//! Horizon Masonry uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt::init();
//!     // Build and drive your grid...
//! }
//! ```
//!
//! Layout passes, filter queries and timer processing each log under their
//! own target (see [`targets`]) so they can be filtered independently, e.g.
//! `RUST_LOG=horizon_masonry::layout=debug`.

/// Span names used throughout Horizon Masonry for tracing.
pub mod span_names {
    /// A single layout pass.
    pub const LAYOUT_PASS: &str = "horizon_masonry::layout_pass";
    /// A filter index rebuild.
    pub const FILTER_REBUILD: &str = "horizon_masonry::filter_rebuild";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core target.
    pub const CORE: &str = "horizon_masonry_core";
    /// Timer system target.
    pub const TIMER: &str = "horizon_masonry_core::timer";
    /// Debounce target.
    pub const DEBOUNCE: &str = "horizon_masonry_core::debounce";
    /// Signal target.
    pub const SIGNAL: &str = "horizon_masonry_core::signal";
    /// Layout engine target.
    pub const LAYOUT: &str = "horizon_masonry::layout";
    /// Filter index target.
    pub const FILTER: &str = "horizon_masonry::filter";
    /// Render batching target.
    pub const RENDER: &str = "horizon_masonry::render";
    /// Grid controller target.
    pub const GRID: &str = "horizon_masonry::grid";
    /// Performance spans.
    pub const PERF: &str = "horizon_masonry::perf";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Useful for measuring how long a layout pass or index rebuild takes.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

/// Debug-level event under the core target.
#[macro_export]
macro_rules! masonry_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: $crate::logging::targets::CORE, $($arg)*)
    };
}
