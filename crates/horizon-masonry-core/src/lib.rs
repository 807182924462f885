//! Core systems for Horizon Masonry.
//!
//! This crate provides the host-independent plumbing used by the masonry
//! grid:
//!
//! - **Timers**: One-shot timers driven by host-supplied instants
//! - **Debouncing**: Re-armable one-shot triggers for resize coalescing
//! - **Signal/Slot System**: Notifications such as "layout changed"
//! - **Logging**: Tracing targets, span names and a debug macro
//!
//! # Debounce Example
//!
//! ```
//! use horizon_masonry_core::Debouncer;
//! use std::time::{Duration, Instant};
//!
//! let now = Instant::now();
//! let mut debouncer = Debouncer::new(Duration::from_millis(50));
//! debouncer.trigger(now);
//! assert!(debouncer.poll(now + Duration::from_millis(50)));
//! ```

mod debounce;
mod error;
pub mod logging;
pub mod signal;
mod timer;

pub use debounce::Debouncer;
pub use error::{CoreError, Result, TimerError};
pub use logging::PerfSpan;
pub use signal::{ConnectionId, Signal};
pub use timer::{TimerId, TimerManager};

static_assertions::assert_impl_all!(Signal<()>: Send, Sync);
static_assertions::assert_impl_all!(Debouncer: Send);
