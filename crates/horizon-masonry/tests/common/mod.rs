//! In-memory page used by the integration tests.
//!
//! [`Page`] hands out a measurement port and a render port that share one
//! surface, so style writes (like `display: none`) are visible to later
//! measurements.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use horizon_masonry::prelude::*;

#[derive(Debug, Default)]
pub struct Surface {
    pub container_width: i32,
    pub container_height: i32,
    /// Minimum height the host styles the container with.
    pub container_min_height: i32,
    pub container_hidden: bool,
    pub widths: HashMap<u32, i32>,
    pub heights: HashMap<u32, i32>,
    pub tags: HashMap<u32, TagAttribute>,
    pub non_elements: HashSet<u32>,
    pub hidden: HashSet<u32>,
    pub styles: HashMap<RenderTarget<u32>, StyleProperties>,
    pub applied_batches: usize,
}

#[derive(Clone)]
pub struct Page(Rc<RefCell<Surface>>);

impl Page {
    /// A page whose items are 190px wide, with the given heights.
    pub fn new(container_width: i32, heights: &[i32]) -> Self {
        let surface = Surface {
            container_width,
            widths: (0..heights.len() as u32).map(|i| (i, 190)).collect(),
            heights: heights.iter().enumerate().map(|(i, &h)| (i as u32, h)).collect(),
            ..Surface::default()
        };
        Self(Rc::new(RefCell::new(surface)))
    }

    pub fn children(&self) -> Vec<u32> {
        let surface = self.0.borrow();
        let mut children: Vec<u32> = surface.heights.keys().copied().collect();
        children.sort_unstable();
        children
    }

    pub fn with_surface<T>(&self, f: impl FnOnce(&mut Surface) -> T) -> T {
        f(&mut self.0.borrow_mut())
    }

    pub fn tag(&self, item: u32, tags: &[&str]) {
        let list = TagAttribute::List(tags.iter().map(|t| t.to_string()).collect());
        self.0.borrow_mut().tags.insert(item, list);
    }

    pub fn style(&self, target: RenderTarget<u32>) -> StyleProperties {
        self.0.borrow().styles.get(&target).cloned().unwrap_or_default()
    }

    pub fn item_style(&self, item: u32) -> StyleProperties {
        self.style(RenderTarget::Item(item))
    }

    pub fn applied_batches(&self) -> usize {
        self.0.borrow().applied_batches
    }

    pub fn measure(&self) -> Measure {
        Measure(self.0.clone())
    }

    pub fn render(&self) -> Render {
        Render(self.0.clone())
    }
}

pub struct Measure(Rc<RefCell<Surface>>);

impl MeasurementPort<u32> for Measure {
    fn outer_width(&self, item: &u32) -> i32 {
        self.0.borrow().widths.get(item).copied().unwrap_or(0)
    }

    fn outer_height(&self, item: &u32) -> i32 {
        self.0.borrow().heights.get(item).copied().unwrap_or(0)
    }

    fn is_visible(&self, item: &u32) -> bool {
        !self.0.borrow().hidden.contains(item)
    }

    fn is_element(&self, item: &u32) -> bool {
        !self.0.borrow().non_elements.contains(item)
    }

    fn tag_attribute(&self, item: &u32) -> Option<TagAttribute> {
        self.0.borrow().tags.get(item).cloned()
    }

    fn container_inner_width(&self) -> i32 {
        self.0.borrow().container_width
    }

    fn container_inner_height(&self) -> i32 {
        self.0.borrow().container_height
    }

    fn is_container_visible(&self) -> bool {
        !self.0.borrow().container_hidden
    }
}

pub struct Render(Rc<RefCell<Surface>>);

impl RenderPort<u32> for Render {
    fn apply_batch(&mut self, batch: RenderBatch<u32>) {
        let mut surface = self.0.borrow_mut();
        surface.applied_batches += 1;
        for update in batch.into_updates() {
            if let RenderTarget::Item(item) = update.target {
                match update.properties.get("display") {
                    Some(StyleValue::Keyword("none")) => {
                        surface.hidden.insert(item);
                    }
                    Some(StyleValue::Keyword(_)) => {
                        surface.hidden.remove(&item);
                    }
                    _ => {}
                }
            }
            if let RenderTarget::Container = update.target
                && let Some(height) = update.properties.px("height")
            {
                surface.container_height = height.max(surface.container_min_height);
            }
            let entry = surface.styles.entry(update.target).or_default();
            for (name, value) in update.properties.iter() {
                entry.set(name, value);
            }
        }
    }
}

/// Options for a 10px-offset grid that writes immediately.
pub fn immediate() -> GridOptions {
    GridOptions::new()
        .with_offset(10)
        .with_frame_mode(FrameMode::Immediate)
}

/// Route grid logs to the test harness; filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
