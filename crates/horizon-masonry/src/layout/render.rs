//! Render batches and frame coalescing.
//!
//! A layout pass never writes positions one item at a time. It collects every
//! style write into a [`RenderBatch`] and hands the batch to a
//! [`FrameBatcher`], which either applies it right away or keeps it pending
//! until the host signals the next frame. Batches submitted within the same
//! frame are merged: later values for the same target and property win.

use std::collections::HashMap;
use std::fmt;

use horizon_masonry_core::logging::targets;

use super::item::ItemHandle;
use super::options::FrameMode;
use super::ports::RenderPort;

/// A single style value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleValue {
    /// A length in pixels.
    Px(i32),
    /// A keyword such as `absolute`, `none` or `block`.
    Keyword(&'static str),
}

impl fmt::Display for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleValue::Px(px) => write!(f, "{px}px"),
            StyleValue::Keyword(keyword) => f.write_str(keyword),
        }
    }
}

/// Ordered style properties of one target. Setting a property twice keeps
/// its first position and the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleProperties {
    entries: Vec<(&'static str, StyleValue)>,
}

impl StyleProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, replacing any earlier value.
    pub fn set(&mut self, name: &'static str, value: StyleValue) -> &mut Self {
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<StyleValue> {
        self.entries
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }

    /// Pixel value of a property, if it is set in pixels.
    pub fn px(&self, name: &str) -> Option<i32> {
        match self.get(name)? {
            StyleValue::Px(px) => Some(px),
            StyleValue::Keyword(_) => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, StyleValue)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn merge(&mut self, other: StyleProperties) {
        for (name, value) in other.entries {
            self.set(name, value);
        }
    }
}

/// What a render update applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RenderTarget<H> {
    /// A grid item.
    Item(H),
    /// A placeholder slot, created by the host on first use and reused after.
    Placeholder(usize),
    /// The container itself.
    Container,
}

/// Style properties for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderUpdate<H> {
    pub target: RenderTarget<H>,
    pub properties: StyleProperties,
}

/// An ordered set of updates applied as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderBatch<H> {
    updates: Vec<RenderUpdate<H>>,
}

impl<H> Default for RenderBatch<H> {
    fn default() -> Self {
        Self {
            updates: Vec::new(),
        }
    }
}

impl<H: ItemHandle> RenderBatch<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an update without merging.
    pub fn push(&mut self, target: RenderTarget<H>, properties: StyleProperties) {
        self.updates.push(RenderUpdate { target, properties });
    }

    pub fn updates(&self) -> &[RenderUpdate<H>] {
        &self.updates
    }

    pub fn into_updates(self) -> Vec<RenderUpdate<H>> {
        self.updates
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Properties written to `target`, merged across updates.
    pub fn properties_for(&self, target: &RenderTarget<H>) -> Option<StyleProperties> {
        let mut found: Option<StyleProperties> = None;
        for update in self.updates.iter().filter(|u| &u.target == target) {
            found
                .get_or_insert_with(StyleProperties::new)
                .merge(update.properties.clone());
        }
        found
    }

    /// Merge `later` into this batch. Targets keep their first position.
    pub fn absorb(&mut self, later: RenderBatch<H>) {
        let mut index: HashMap<RenderTarget<H>, usize> = self
            .updates
            .iter()
            .enumerate()
            .map(|(i, u)| (u.target.clone(), i))
            .collect();
        for update in later.updates {
            match index.get(&update.target) {
                Some(&i) => self.updates[i].properties.merge(update.properties),
                None => {
                    index.insert(update.target.clone(), self.updates.len());
                    self.updates.push(update);
                }
            }
        }
    }
}

/// Holds at most one pending batch per frame.
#[derive(Debug)]
pub struct FrameBatcher<H> {
    pending: Option<RenderBatch<H>>,
}

impl<H> Default for FrameBatcher<H> {
    fn default() -> Self {
        Self {
            pending: None,
        }
    }
}

impl<H: ItemHandle> FrameBatcher<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit a batch. `Immediate` flushes anything pending together with it.
    pub fn submit<R: RenderPort<H>>(&mut self, batch: RenderBatch<H>, mode: FrameMode, port: &mut R) {
        if batch.is_empty() {
            return;
        }
        match self.pending.as_mut() {
            Some(pending) => pending.absorb(batch),
            None => self.pending = Some(batch),
        }
        if mode == FrameMode::Immediate {
            self.flush(port);
        } else {
            tracing::trace!(
                target: targets::RENDER,
                pending = self.pending.as_ref().map_or(0, RenderBatch::len),
                "batch deferred to next frame"
            );
        }
    }

    /// Apply the pending batch, if any. Returns whether anything was written.
    pub fn flush<R: RenderPort<H>>(&mut self, port: &mut R) -> bool {
        let Some(batch) = self.pending.take() else {
            return false;
        };
        tracing::debug!(target: targets::RENDER, updates = batch.len(), "applying render batch");
        port.apply_batch(batch);
        true
    }

    /// Drop the pending batch without applying it.
    pub fn discard(&mut self) {
        self.pending = None;
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingPort {
        batches: Vec<RenderBatch<u32>>,
    }

    impl RenderPort<u32> for RecordingPort {
        fn apply_batch(&mut self, batch: RenderBatch<u32>) {
            self.batches.push(batch);
        }
    }

    fn top(px: i32) -> StyleProperties {
        let mut props = StyleProperties::new();
        props.set("top", StyleValue::Px(px));
        props
    }

    #[test]
    fn test_properties_override_in_place() {
        let mut props = StyleProperties::new();
        props
            .set("position", StyleValue::Keyword("absolute"))
            .set("top", StyleValue::Px(4))
            .set("position", StyleValue::Keyword("relative"));

        assert_eq!(props.len(), 2);
        assert_eq!(props.iter().next().unwrap().0, "position");
        assert_eq!(props.get("position"), Some(StyleValue::Keyword("relative")));
        assert_eq!(props.px("top"), Some(4));
        assert_eq!(StyleValue::Px(4).to_string(), "4px");
    }

    #[test]
    fn test_next_frame_coalesces() {
        let mut port = RecordingPort::default();
        let mut batcher = FrameBatcher::new();

        let mut first = RenderBatch::new();
        first.push(RenderTarget::Item(1), top(0));
        first.push(RenderTarget::Item(2), top(0));
        batcher.submit(first, FrameMode::NextFrame, &mut port);

        let mut second = RenderBatch::new();
        second.push(RenderTarget::Item(2), top(30));
        second.push(RenderTarget::Container, top(1));
        batcher.submit(second, FrameMode::NextFrame, &mut port);

        assert!(port.batches.is_empty());
        assert!(batcher.flush(&mut port));
        assert!(!batcher.flush(&mut port));

        let applied = &port.batches[0];
        assert_eq!(port.batches.len(), 1);
        assert_eq!(applied.len(), 3);
        assert_eq!(applied.updates()[1].target, RenderTarget::Item(2));
        assert_eq!(applied.updates()[1].properties.px("top"), Some(30));
        assert!(!batcher.has_pending());
    }

    #[test]
    fn test_immediate_applies_at_once() {
        let mut port = RecordingPort::default();
        let mut batcher = FrameBatcher::new();

        let mut batch = RenderBatch::new();
        batch.push(RenderTarget::Placeholder(0), top(12));
        batcher.submit(batch, FrameMode::Immediate, &mut port);
        batcher.submit(RenderBatch::new(), FrameMode::Immediate, &mut port);

        assert_eq!(port.batches.len(), 1);
        assert!(!batcher.has_pending());
    }
}
