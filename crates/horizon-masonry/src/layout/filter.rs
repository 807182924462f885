//! Tag-based filter index.
//!
//! The [`FilterIndex`] maps each normalized tag to the items carrying it, in
//! discovery order, and answers AND/OR selections over those lists. It is
//! rebuilt wholesale; the grid never patches it incrementally, so callers
//! refresh it after changing the item set.

use std::collections::{BTreeMap, HashSet};

use horizon_masonry_core::logging::targets;

use super::item::{ItemHandle, ItemId, ItemStore};
use super::ports::TagAttribute;

/// How multiple requested tags combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// An item qualifies if it carries any requested tag.
    #[default]
    Or,
    /// An item qualifies only if it carries every known requested tag.
    And,
}

/// Trim and lower-case a tag name.
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// Turn a tag attribute into normalized tags.
///
/// Returns `None` when raw attribute text is not a JSON array of strings.
pub fn parse_tag_attribute(attribute: &TagAttribute) -> Option<Vec<String>> {
    let raw: Vec<String> = match attribute {
        TagAttribute::List(tags) => tags.clone(),
        TagAttribute::Raw(text) => serde_json::from_str(text).ok()?,
    };
    let mut tags: Vec<String> = Vec::with_capacity(raw.len());
    for tag in raw.iter().map(|t| normalize_tag(t)) {
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    Some(tags)
}

/// Tag to item lists.
#[derive(Debug, Clone, Default)]
pub struct FilterIndex {
    classes: BTreeMap<String, Vec<ItemId>>,
}

impl FilterIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from the tags stored on `items`, then register every
    /// `possible_filters` entry that has no items with an empty list.
    pub fn rebuild<H: ItemHandle>(&mut self, items: &ItemStore<H>, possible_filters: &[String]) {
        self.classes.clear();
        for (id, item) in items.iter() {
            for tag in item.tags() {
                self.classes.entry(tag.clone()).or_default().push(id);
            }
        }
        for filter in possible_filters {
            let tag = normalize_tag(filter);
            if !tag.is_empty() {
                self.classes.entry(tag).or_default();
            }
        }
        tracing::debug!(
            target: targets::FILTER,
            items = items.len(),
            classes = self.classes.len(),
            "filter index rebuilt"
        );
    }

    /// Items carrying `tag`, if the tag is known.
    pub fn items_for(&self, tag: &str) -> Option<&[ItemId]> {
        self.classes.get(&normalize_tag(tag)).map(Vec::as_slice)
    }

    /// Known tags with their item counts, sorted by tag.
    pub fn tags(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.classes
            .iter()
            .map(|(tag, items)| (tag.as_str(), items.len()))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Select items for `tags` combined with `mode`.
    ///
    /// Returns `None` when `tags` is empty, meaning "no filtering". Unknown
    /// tags are ignored; if none of the requested tags is known the result
    /// is empty.
    pub fn select<S: AsRef<str>>(&self, tags: &[S], mode: FilterMode) -> Option<Vec<ItemId>> {
        if tags.is_empty() {
            return None;
        }

        let lists: Vec<&[ItemId]> = tags
            .iter()
            .filter_map(|tag| self.items_for(tag.as_ref()))
            .collect();

        let selected = if mode == FilterMode::Or || lists.len() == 1 {
            union(&lists)
        } else {
            intersection(&lists)
        };

        tracing::debug!(
            target: targets::FILTER,
            requested = tags.len(),
            known = lists.len(),
            ?mode,
            selected = selected.len(),
            "filter selection"
        );
        Some(selected)
    }
}

fn union(lists: &[&[ItemId]]) -> Vec<ItemId> {
    let mut seen = HashSet::new();
    lists
        .iter()
        .flat_map(|list| list.iter().copied())
        .filter(|id| seen.insert(*id))
        .collect()
}

fn intersection(lists: &[&[ItemId]]) -> Vec<ItemId> {
    // Walk the shortest list and probe the others.
    let Some(shortest) = lists
        .iter()
        .enumerate()
        .min_by_key(|(_, list)| list.len())
        .map(|(i, _)| i)
    else {
        return Vec::new();
    };

    let others: Vec<HashSet<ItemId>> = lists
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != shortest)
        .map(|(_, list)| list.iter().copied().collect())
        .collect();

    lists[shortest]
        .iter()
        .copied()
        .filter(|id| others.iter().all(|set| set.contains(id)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(tagged: &[(&'static str, &[&str])]) -> (ItemStore<&'static str>, Vec<ItemId>) {
        let mut store = ItemStore::new();
        let mut ids = Vec::new();
        for (handle, tags) in tagged {
            let id = store.push(*handle).unwrap();
            let tags = tags.iter().map(|t| t.to_string()).collect();
            store.get_mut(id).unwrap().set_tags(tags);
            ids.push(id);
        }
        (store, ids)
    }

    #[test]
    fn test_and_requires_every_tag() {
        let (items, ids) = store(&[("one", &["a"]), ("two", &["b"]), ("three", &["a", "b"]), ("four", &[])]);
        let mut index = FilterIndex::new();
        index.rebuild(&items, &[]);

        assert_eq!(index.select(&["a", "b"], FilterMode::And), Some(vec![ids[2]]));
        assert_eq!(
            index.select(&["a", "b"], FilterMode::Or),
            Some(vec![ids[0], ids[2], ids[1]])
        );
    }

    #[test]
    fn test_empty_request_means_no_filter() {
        let (items, _) = store(&[("one", &["a"])]);
        let mut index = FilterIndex::new();
        index.rebuild(&items, &[]);

        let none: [&str; 0] = [];
        assert_eq!(index.select(&none, FilterMode::And), None);
    }

    #[test]
    fn test_unknown_tags_are_ignored() {
        let (items, ids) = store(&[("one", &["a"]), ("two", &["a", "b"])]);
        let mut index = FilterIndex::new();
        index.rebuild(&items, &[]);

        // The unknown tag drops out; the remaining single tag acts as OR.
        assert_eq!(
            index.select(&["a", "zebra"], FilterMode::And),
            Some(vec![ids[0], ids[1]])
        );
        assert_eq!(index.select(&["zebra"], FilterMode::And), Some(vec![]));
        assert_eq!(index.select(&["zebra"], FilterMode::Or), Some(vec![]));
    }

    #[test]
    fn test_requested_tags_are_normalized() {
        let (items, ids) = store(&[("one", &["red"])]);
        let mut index = FilterIndex::new();
        index.rebuild(&items, &[]);

        assert_eq!(index.select(&["  RED "], FilterMode::Or), Some(vec![ids[0]]));
    }

    #[test]
    fn test_possible_filters_registered_empty() {
        let (items, _) = store(&[("one", &["red"])]);
        let mut index = FilterIndex::new();
        index.rebuild(&items, &["Blue".to_string(), "red".to_string()]);

        let tags: Vec<(&str, usize)> = index.tags().collect();
        assert_eq!(tags, vec![("blue", 0), ("red", 1)]);
        assert_eq!(index.items_for("blue"), Some(&[][..]));
    }

    #[test]
    fn test_parse_tag_attribute() {
        let list = TagAttribute::List(vec![" Red".into(), "red".into(), "".into(), "Blue ".into()]);
        assert_eq!(parse_tag_attribute(&list), Some(vec!["red".to_string(), "blue".to_string()]));

        let raw = TagAttribute::Raw(r#"["Summer", "BEACH"]"#.into());
        assert_eq!(parse_tag_attribute(&raw), Some(vec!["summer".to_string(), "beach".to_string()]));

        assert_eq!(parse_tag_attribute(&TagAttribute::Raw("summer, beach".into())), None);
        assert_eq!(parse_tag_attribute(&TagAttribute::Raw(r#"{"tag": 1}"#.into())), None);
    }
}
