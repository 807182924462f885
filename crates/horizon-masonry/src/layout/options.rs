//! Grid configuration.
//!
//! Configuration comes in two shapes:
//!
//! - [`GridOptions`]: a partial update. Every field is an `Option`, where
//!   `Some` means "the caller set this" and `None` means "leave as is".
//! - [`GridConfig`]: the fully resolved configuration a layout pass runs
//!   with. [`GridConfig::default()`] is the immutable default record.
//!
//! Merging is functional: [`GridConfig::merged`] returns a new config in
//! which every value set by an earlier update survives unless the new update
//! sets it again.
//!
//! Options can also be loaded from JSON with camelCase keys:
//!
//! ```
//! use horizon_masonry::layout::{Alignment, GridOptions, Length};
//!
//! let options = GridOptions::from_json(r#"{
//!     "align": "left",
//!     "itemWidth": "30%",
//!     "offset": 10,
//!     "resizeDelay": 100
//! }"#).unwrap();
//!
//! assert_eq!(options.align, Some(Alignment::Left));
//! assert_eq!(options.item_width, Some(Length::Percent(30.0)));
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

/// Default spacing between columns and between items in a column.
pub const DEFAULT_OFFSET: i32 = 2;

/// Default quiet period before a resize triggers a relayout.
pub const DEFAULT_RESIZE_DELAY: Duration = Duration::from_millis(50);

/// Horizontal alignment of the column block inside the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Columns hug the left edge.
    Left,
    /// Leftover width is split on both sides.
    #[default]
    Center,
    /// Columns are anchored to the right edge.
    Right,
}

/// Which container edge horizontal offsets are measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// `Right` for right alignment, `Left` otherwise.
    #[default]
    Auto,
    /// Offsets are written as `left`.
    Left,
    /// Offsets are written as `right`.
    Right,
}

impl Direction {
    /// Resolve `Auto` against an alignment.
    pub fn resolve(self, align: Alignment) -> Direction {
        match self {
            Direction::Auto if align == Alignment::Right => Direction::Right,
            Direction::Auto => Direction::Left,
            explicit => explicit,
        }
    }

    /// The style property name for this direction.
    pub fn property(self) -> &'static str {
        match self {
            Direction::Right => "right",
            Direction::Left | Direction::Auto => "left",
        }
    }
}

/// When render batches are handed to the render port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FrameMode {
    /// Batches wait for the next [`on_frame`](crate::MasonryGrid::on_frame).
    #[default]
    NextFrame,
    /// Batches are applied as soon as they are produced.
    Immediate,
}

/// A width given in pixels or as a percentage of the container's inner width.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "LengthRepr")]
pub enum Length {
    /// Absolute pixels. Zero means "not set".
    Pixels(i32),
    /// Percentage of the container's inner width.
    Percent(f64),
}

impl Length {
    /// The unset length.
    pub const ZERO: Length = Length::Pixels(0);

    /// Pixel length.
    pub fn px(value: i32) -> Self {
        Length::Pixels(value)
    }

    /// Percentage length.
    pub fn percent(value: f64) -> Self {
        Length::Percent(value)
    }

    /// Whether this length is zero (treated as unset).
    pub fn is_zero(&self) -> bool {
        match *self {
            Length::Pixels(px) => px == 0,
            Length::Percent(pct) => pct == 0.0,
        }
    }

    /// Resolve to pixels against `basis`, rounding percentages down.
    pub fn resolve(&self, basis: i32) -> i32 {
        match *self {
            Length::Pixels(px) => px,
            Length::Percent(pct) => (pct / 100.0 * f64::from(basis)).floor() as i32,
        }
    }

    fn validate(&self, option: &'static str) -> Result<()> {
        match *self {
            Length::Pixels(px) if px < 0 => {
                Err(Error::invalid_option(option, format!("{px}px is negative")))
            }
            Length::Percent(pct) if !(0.0..=100.0).contains(&pct) => Err(Error::invalid_option(
                option,
                format!("{pct}% is outside 0%..=100%"),
            )),
            _ => Ok(()),
        }
    }
}

impl Default for Length {
    fn default() -> Self {
        Length::ZERO
    }
}

impl FromStr for Length {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if let Some(pct) = trimmed.strip_suffix('%') {
            return pct
                .trim()
                .parse::<f64>()
                .map(Length::Percent)
                .map_err(|_| Error::invalid_length(input));
        }
        let px = trimmed.strip_suffix("px").unwrap_or(trimmed).trim();
        px.parse::<f64>()
            .map(|value| Length::Pixels(value.floor() as i32))
            .map_err(|_| Error::invalid_length(input))
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Pixels(px) => write!(f, "{px}px"),
            Length::Percent(pct) => write!(f, "{pct}%"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LengthRepr {
    Number(f64),
    Text(String),
}

impl TryFrom<LengthRepr> for Length {
    type Error = Error;

    fn try_from(repr: LengthRepr) -> Result<Self> {
        match repr {
            LengthRepr::Number(value) => Ok(Length::Pixels(value.floor() as i32)),
            LengthRepr::Text(text) => text.parse(),
        }
    }
}

/// What a comparator sees of an item.
#[derive(Debug, Clone, Copy)]
pub struct ItemInfo<'a> {
    /// Position of the item in discovery order.
    pub index: usize,
    /// Cached outer height.
    pub height: i32,
    /// Normalized filter tags.
    pub tags: &'a [String],
}

/// Comparator used to order active items before a full layout.
pub type Comparator = Arc<dyn Fn(&ItemInfo<'_>, &ItemInfo<'_>) -> Ordering + Send + Sync>;

/// Ordering of active items in a full layout.
#[derive(Clone, Default)]
pub enum ItemOrder {
    /// Discovery order.
    #[default]
    Discovery,
    /// Stable sort with a caller-supplied comparator.
    Sorted(Comparator),
}

impl ItemOrder {
    /// Order items with the given comparator.
    pub fn sorted_by<F>(compare: F) -> Self
    where
        F: Fn(&ItemInfo<'_>, &ItemInfo<'_>) -> Ordering + Send + Sync + 'static,
    {
        ItemOrder::Sorted(Arc::new(compare))
    }
}

impl fmt::Debug for ItemOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemOrder::Discovery => f.write_str("Discovery"),
            ItemOrder::Sorted(_) => f.write_str("Sorted(<comparator>)"),
        }
    }
}

fn deserialize_millis<'de, D>(deserializer: D) -> std::result::Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
}

/// A partial configuration update.
///
/// Only fields that are `Some` are applied by [`GridConfig::merged`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct GridOptions {
    /// Alignment of the column block.
    pub align: Option<Alignment>,
    /// Whether resize signals trigger a debounced relayout.
    pub auto_resize: Option<bool>,
    /// Ordering of items in a full layout. Code-only.
    #[serde(skip)]
    pub order: Option<ItemOrder>,
    /// Edge horizontal offsets are measured from.
    pub direction: Option<Direction>,
    /// Whether filtered-out items are excluded from layout.
    pub ignore_inactive_items: Option<bool>,
    /// Fixed item width; zero infers it from the first item.
    pub item_width: Option<Length>,
    /// Whether placeholders fill the space below short columns.
    pub fill_empty_space: Option<bool>,
    /// Preferred maximum width for stretched items; zero disables it.
    pub flexible_width: Option<Length>,
    /// Spacing between columns.
    pub offset: Option<i32>,
    /// Margin between the container edge and the columns.
    pub outer_offset: Option<i32>,
    /// Tags to register even when no item carries them.
    pub possible_filters: Option<Vec<String>>,
    /// Quiet period before a resize relayout, in milliseconds when parsed.
    #[serde(deserialize_with = "deserialize_millis")]
    pub resize_delay: Option<Duration>,
    /// Spacing between items in a column; falls back to `offset`.
    pub vertical_offset: Option<i32>,
    /// Border width of placeholder elements, subtracted from their size.
    pub placeholder_border_width: Option<i32>,
    /// When render batches are applied.
    pub frame_mode: Option<FrameMode>,
}

impl GridOptions {
    /// An empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a JSON object.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_align(mut self, align: Alignment) -> Self {
        self.align = Some(align);
        self
    }

    pub fn with_auto_resize(mut self, enabled: bool) -> Self {
        self.auto_resize = Some(enabled);
        self
    }

    pub fn with_order(mut self, order: ItemOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn with_ignore_inactive_items(mut self, ignore: bool) -> Self {
        self.ignore_inactive_items = Some(ignore);
        self
    }

    pub fn with_item_width(mut self, width: Length) -> Self {
        self.item_width = Some(width);
        self
    }

    pub fn with_fill_empty_space(mut self, fill: bool) -> Self {
        self.fill_empty_space = Some(fill);
        self
    }

    pub fn with_flexible_width(mut self, width: Length) -> Self {
        self.flexible_width = Some(width);
        self
    }

    pub fn with_offset(mut self, offset: i32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_outer_offset(mut self, offset: i32) -> Self {
        self.outer_offset = Some(offset);
        self
    }

    pub fn with_possible_filters<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.possible_filters = Some(filters.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_resize_delay(mut self, delay: Duration) -> Self {
        self.resize_delay = Some(delay);
        self
    }

    pub fn with_vertical_offset(mut self, offset: i32) -> Self {
        self.vertical_offset = Some(offset);
        self
    }

    pub fn with_placeholder_border_width(mut self, width: i32) -> Self {
        self.placeholder_border_width = Some(width);
        self
    }

    pub fn with_frame_mode(mut self, mode: FrameMode) -> Self {
        self.frame_mode = Some(mode);
        self
    }
}

/// Fully resolved configuration for a layout pass.
#[derive(Debug, Clone)]
pub struct GridConfig {
    pub align: Alignment,
    pub auto_resize: bool,
    pub order: ItemOrder,
    pub direction: Direction,
    pub ignore_inactive_items: bool,
    pub item_width: Length,
    pub fill_empty_space: bool,
    pub flexible_width: Length,
    pub offset: i32,
    pub outer_offset: i32,
    pub possible_filters: Vec<String>,
    pub resize_delay: Duration,
    /// Explicit vertical spacing; see [`GridConfig::vertical_offset`].
    pub vertical_offset: Option<i32>,
    pub placeholder_border_width: i32,
    pub frame_mode: FrameMode,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            align: Alignment::Center,
            auto_resize: false,
            order: ItemOrder::Discovery,
            direction: Direction::Auto,
            ignore_inactive_items: true,
            item_width: Length::ZERO,
            fill_empty_space: false,
            flexible_width: Length::ZERO,
            offset: DEFAULT_OFFSET,
            outer_offset: 0,
            possible_filters: Vec::new(),
            resize_delay: DEFAULT_RESIZE_DELAY,
            vertical_offset: None,
            placeholder_border_width: 0,
            frame_mode: FrameMode::NextFrame,
        }
    }
}

impl GridConfig {
    /// Apply an update on top of this configuration.
    pub fn merged(&self, update: &GridOptions) -> GridConfig {
        let current = self.clone();
        GridConfig {
            align: update.align.unwrap_or(current.align),
            auto_resize: update.auto_resize.unwrap_or(current.auto_resize),
            order: update.order.clone().unwrap_or(current.order),
            direction: update.direction.unwrap_or(current.direction),
            ignore_inactive_items: update
                .ignore_inactive_items
                .unwrap_or(current.ignore_inactive_items),
            item_width: update.item_width.unwrap_or(current.item_width),
            fill_empty_space: update.fill_empty_space.unwrap_or(current.fill_empty_space),
            flexible_width: update.flexible_width.unwrap_or(current.flexible_width),
            offset: update.offset.unwrap_or(current.offset),
            outer_offset: update.outer_offset.unwrap_or(current.outer_offset),
            possible_filters: update
                .possible_filters
                .clone()
                .unwrap_or(current.possible_filters),
            resize_delay: update.resize_delay.unwrap_or(current.resize_delay),
            vertical_offset: update.vertical_offset.or(current.vertical_offset),
            placeholder_border_width: update
                .placeholder_border_width
                .unwrap_or(current.placeholder_border_width),
            frame_mode: update.frame_mode.unwrap_or(current.frame_mode),
        }
    }

    /// Spacing between items in a column.
    #[inline]
    pub fn vertical_offset(&self) -> i32 {
        self.vertical_offset.unwrap_or(self.offset)
    }

    /// Edge horizontal offsets are measured from, after resolving `Auto`.
    #[inline]
    pub fn resolved_direction(&self) -> Direction {
        self.direction.resolve(self.align)
    }

    /// Whether items are stretched to a computed width.
    #[inline]
    pub fn has_flexible_width(&self) -> bool {
        !self.flexible_width.is_zero()
    }

    /// Reject values the layout engine cannot work with.
    ///
    /// Checks the resolved values, so options that are only invalid in
    /// combination are caught however they were set.
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("offset", Some(self.offset)),
            ("outerOffset", Some(self.outer_offset)),
            ("verticalOffset", self.vertical_offset),
            ("placeholderBorderWidth", Some(self.placeholder_border_width)),
        ];
        for (option, value) in non_negative {
            if let Some(value) = value
                && value < 0
            {
                return Err(Error::invalid_option(option, format!("{value} is negative")));
            }
        }
        self.item_width.validate("itemWidth")?;
        self.flexible_width.validate("flexibleWidth")?;
        if self.auto_resize && self.resize_delay.is_zero() {
            return Err(Error::invalid_option(
                "resizeDelay",
                "auto resize needs a non-zero quiet period",
            ));
        }
        Ok(())
    }
}
