//! Dynamic-content DSL: filter, sort, limit, group.
//!
//! Evaluates the declarative queries from the `dynamic` section of the
//! config into named content collections. A query names a source sub-path
//! and optional sort/limit/group steps:
//!
//! ```json
//! {
//!   "posts": { "from": "blog", "sortBy": "date", "order": "desc", "limit": 10 },
//!   "archive": { "from": "blog", "sortBy": "date", "groupBy": "date|year" }
//! }
//! ```
//!
//! Steps apply in a fixed order: scan+parse, sort, limit, group. The result
//! shape depends on `groupBy`, so [`evaluate`] returns a tagged
//! [`ContentSet`] and callers must handle both variants.
//!
//! Bad field names never error: a missing `sortBy` field compares as absent
//! (a stable no-op), and a missing `groupBy` field collects items under an
//! empty group key.

use crate::parse::{self, ContentItem, ParseError};
use crate::scan::{self, NON_MARKDOWN_FILES, ScanError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Sort direction. Ascending unless the query says `"desc"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

/// One named query from the `dynamic` config section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DynamicQuery {
    /// Sub-path under the base directory to scan. Whole tree when absent.
    pub from: Option<String>,
    /// Meta field to sort by (string comparison, stable).
    pub sort_by: Option<String>,
    #[serde(default)]
    pub order: Order,
    /// Meta field to group by, optionally `field|modifier` where the
    /// modifier (`year`/`month`/`day`) applies to `date` fields.
    pub group_by: Option<String>,
    /// Keep only the first N items, applied after sorting.
    pub limit: Option<usize>,
}

/// Items sharing one grouping key, in sorted order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedItems {
    pub group: String,
    pub items: Vec<ContentItem>,
}

/// Result of evaluating a query: flat unless `groupBy` was set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ContentSet {
    Flat(Vec<ContentItem>),
    Grouped(Vec<GroupedItems>),
}

impl ContentSet {
    /// Total number of items across the set.
    pub fn len(&self) -> usize {
        match self {
            ContentSet::Flat(items) => items.len(),
            ContentSet::Grouped(groups) => groups.iter().map(|g| g.items.len()).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// All Markdown content under `base_dir`, unsorted and ungrouped.
pub fn all(base_dir: &Path) -> Result<Vec<ContentItem>, ContentError> {
    let files = scan::scan(base_dir, &[&NON_MARKDOWN_FILES])?;
    Ok(parse::parse(&files)?)
}

/// Evaluate one query. Without a query this is just [`all`], flat.
pub fn evaluate(base_dir: &Path, query: Option<&DynamicQuery>) -> Result<ContentSet, ContentError> {
    let Some(query) = query else {
        return Ok(ContentSet::Flat(all(base_dir)?));
    };

    let root = match &query.from {
        Some(from) => base_dir.join(from),
        None => base_dir.to_path_buf(),
    };

    let mut items = all(&root)?;

    if let Some(field) = &query.sort_by {
        sort_items(&mut items, field, query.order);
    }

    if let Some(limit) = query.limit {
        items.truncate(limit);
    }

    if let Some(group_by) = &query.group_by {
        return Ok(ContentSet::Grouped(group_items(items, group_by)));
    }

    Ok(ContentSet::Flat(items))
}

/// Evaluate every named query independently.
pub fn evaluate_all(
    base_dir: &Path,
    queries: &BTreeMap<String, DynamicQuery>,
) -> Result<BTreeMap<String, ContentSet>, ContentError> {
    let mut results = BTreeMap::new();
    for (name, query) in queries {
        results.insert(name.clone(), evaluate(base_dir, Some(query))?);
    }
    Ok(results)
}

/// Stable string sort on a meta field. Items without the field compare as
/// `None` (first in ascending order); ties keep their input order. `Desc`
/// reverses the comparison, not the sorted result, so stability holds in
/// both directions.
fn sort_items(items: &mut [ContentItem], field: &str, order: Order) {
    items.sort_by(|a, b| {
        let ka = a.meta.get(field).map(|v| v.as_key());
        let kb = b.meta.get(field).map(|v| v.as_key());
        match order {
            Order::Asc => ka.cmp(&kb),
            Order::Desc => kb.cmp(&ka),
        }
    });
}

/// Partition items by grouping key, groups ordered by first appearance.
fn group_items(items: Vec<ContentItem>, group_by: &str) -> Vec<GroupedItems> {
    let (field, modifier) = match group_by.split_once('|') {
        Some((field, modifier)) => (field.trim(), Some(modifier.trim())),
        None => (group_by.trim(), None),
    };

    let mut groups: Vec<GroupedItems> = Vec::new();
    for item in items {
        let key = group_key(&item, field, modifier);
        match groups.iter_mut().find(|g| g.group == key) {
            Some(group) => group.items.push(item),
            None => groups.push(GroupedItems {
                group: key,
                items: vec![item],
            }),
        }
    }
    groups
}

/// The grouping key for one item. Date modifiers pick a `-`-delimited
/// segment of the value (year = 0, month = 1, day = 2); any other field
/// groups by its raw string value. A missing field yields an empty key.
fn group_key(item: &ContentItem, field: &str, modifier: Option<&str>) -> String {
    let value = match item.meta.get(field) {
        Some(value) => value.as_key(),
        None => return String::new(),
    };

    if field != "date" {
        return value;
    }

    let segment = match modifier {
        Some("year") => 0,
        Some("month") => 1,
        Some("day") => 2,
        _ => return value,
    };

    value
        .split('-')
        .nth(segment)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn post(root: &Path, rel: &str, front: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, format!("---\n{front}\n---\nBody")).unwrap();
    }

    fn flat(set: ContentSet) -> Vec<ContentItem> {
        match set {
            ContentSet::Flat(items) => items,
            ContentSet::Grouped(_) => panic!("expected flat content"),
        }
    }

    fn grouped(set: ContentSet) -> Vec<GroupedItems> {
        match set {
            ContentSet::Grouped(groups) => groups,
            ContentSet::Flat(_) => panic!("expected grouped content"),
        }
    }

    fn dates(items: &[ContentItem]) -> Vec<String> {
        items
            .iter()
            .map(|i| i.meta.get("date").unwrap().as_key())
            .collect()
    }

    #[test]
    fn no_query_returns_everything_flat() {
        let tmp = TempDir::new().unwrap();
        post(tmp.path(), "a.md", "title: A");
        post(tmp.path(), "blog/b.md", "title: B");

        let set = evaluate(tmp.path(), None).unwrap();
        assert_eq!(flat(set).len(), 2);
    }

    #[test]
    fn from_restricts_the_scan_root() {
        let tmp = TempDir::new().unwrap();
        post(tmp.path(), "a.md", "title: A");
        post(tmp.path(), "blog/b.md", "title: B");

        let query = DynamicQuery {
            from: Some("blog".into()),
            ..Default::default()
        };
        let items = flat(evaluate(tmp.path(), Some(&query)).unwrap());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].slug, "b");
    }

    #[test]
    fn sort_desc_with_limit() {
        let tmp = TempDir::new().unwrap();
        post(tmp.path(), "a.md", "date: 2020-01-01");
        post(tmp.path(), "b.md", "date: 2020-01-03");
        post(tmp.path(), "c.md", "date: 2020-01-02");

        let query = DynamicQuery {
            sort_by: Some("date".into()),
            order: Order::Desc,
            limit: Some(2),
            ..Default::default()
        };
        let items = flat(evaluate(tmp.path(), Some(&query)).unwrap());
        assert_eq!(dates(&items), vec!["2020-01-03", "2020-01-02"]);
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let tmp = TempDir::new().unwrap();
        // Scan order is deterministic by file name: a, b, c, d.
        post(tmp.path(), "a.md", "date: 2020-05-05\ntitle: first");
        post(tmp.path(), "b.md", "date: 2020-01-01\ntitle: early");
        post(tmp.path(), "c.md", "date: 2020-05-05\ntitle: second");
        post(tmp.path(), "d.md", "date: 2020-05-05\ntitle: third");

        let asc = DynamicQuery {
            sort_by: Some("date".into()),
            ..Default::default()
        };
        let items = flat(evaluate(tmp.path(), Some(&asc)).unwrap());
        let titles: Vec<_> = items
            .iter()
            .map(|i| i.meta.get("title").unwrap().as_key())
            .collect();
        assert_eq!(titles, vec!["early", "first", "second", "third"]);

        let desc = DynamicQuery {
            sort_by: Some("date".into()),
            order: Order::Desc,
            ..Default::default()
        };
        let items = flat(evaluate(tmp.path(), Some(&desc)).unwrap());
        let titles: Vec<_> = items
            .iter()
            .map(|i| i.meta.get("title").unwrap().as_key())
            .collect();
        // Equal keys keep input order even when descending.
        assert_eq!(titles, vec!["first", "second", "third", "early"]);
    }

    #[test]
    fn unknown_sort_field_is_a_stable_no_op() {
        let tmp = TempDir::new().unwrap();
        post(tmp.path(), "a.md", "title: A");
        post(tmp.path(), "b.md", "title: B");

        let query = DynamicQuery {
            sort_by: Some("nonexistent".into()),
            ..Default::default()
        };
        let items = flat(evaluate(tmp.path(), Some(&query)).unwrap());
        assert_eq!(items[0].slug, "a");
        assert_eq!(items[1].slug, "b");
    }

    #[test]
    fn group_by_date_month_modifier() {
        let tmp = TempDir::new().unwrap();
        post(tmp.path(), "a.md", "date: 2021-05-01");
        post(tmp.path(), "b.md", "date: 2021-06-15");

        let query = DynamicQuery {
            group_by: Some("date|month".into()),
            ..Default::default()
        };
        let groups = grouped(evaluate(tmp.path(), Some(&query)).unwrap());
        let keys: Vec<_> = groups.iter().map(|g| g.group.as_str()).collect();
        assert_eq!(keys, vec!["05", "06"]);
    }

    #[test]
    fn group_by_date_year_after_desc_sort() {
        let tmp = TempDir::new().unwrap();
        post(tmp.path(), "a.md", "date: 2020-03-01");
        post(tmp.path(), "b.md", "date: 2021-01-01");
        post(tmp.path(), "c.md", "date: 2020-07-01");

        let query = DynamicQuery {
            sort_by: Some("date".into()),
            order: Order::Desc,
            group_by: Some("date|year".into()),
            ..Default::default()
        };
        let groups = grouped(evaluate(tmp.path(), Some(&query)).unwrap());
        // Groups appear in first-seen order over the sorted items.
        let keys: Vec<_> = groups.iter().map(|g| g.group.as_str()).collect();
        assert_eq!(keys, vec!["2021", "2020"]);
        assert_eq!(groups[1].items.len(), 2);
    }

    #[test]
    fn group_by_plain_field_uses_raw_value() {
        let tmp = TempDir::new().unwrap();
        post(tmp.path(), "a.md", "category: rust");
        post(tmp.path(), "b.md", "category: prose");
        post(tmp.path(), "c.md", "category: rust");

        let query = DynamicQuery {
            group_by: Some("category".into()),
            ..Default::default()
        };
        let groups = grouped(evaluate(tmp.path(), Some(&query)).unwrap());
        assert_eq!(groups.len(), 2);
        let rust = groups.iter().find(|g| g.group == "rust").unwrap();
        assert_eq!(rust.items.len(), 2);
    }

    #[test]
    fn grouping_partitions_without_loss() {
        let tmp = TempDir::new().unwrap();
        for i in 0..6 {
            post(
                tmp.path(),
                &format!("p{i}.md"),
                &format!("date: 2020-0{}-01", (i % 3) + 1),
            );
        }

        let query = DynamicQuery {
            group_by: Some("date|month".into()),
            ..Default::default()
        };
        let set = evaluate(tmp.path(), Some(&query)).unwrap();
        assert_eq!(set.len(), 6);
        let groups = grouped(set);
        assert_eq!(groups.len(), 3);
        assert!(groups.iter().all(|g| g.items.len() == 2));
    }

    #[test]
    fn missing_group_field_collects_under_empty_key() {
        let tmp = TempDir::new().unwrap();
        post(tmp.path(), "a.md", "date: 2020-01-01");
        post(tmp.path(), "b.md", "title: undated");

        let query = DynamicQuery {
            group_by: Some("date".into()),
            ..Default::default()
        };
        let groups = grouped(evaluate(tmp.path(), Some(&query)).unwrap());
        assert!(groups.iter().any(|g| g.group.is_empty()));
        assert_eq!(groups.iter().map(|g| g.items.len()).sum::<usize>(), 2);
    }

    #[test]
    fn evaluate_all_runs_each_query() {
        let tmp = TempDir::new().unwrap();
        post(tmp.path(), "blog/a.md", "date: 2020-01-01");
        post(tmp.path(), "blog/b.md", "date: 2020-02-01");

        let mut queries = BTreeMap::new();
        queries.insert(
            "posts".to_string(),
            DynamicQuery {
                from: Some("blog".into()),
                sort_by: Some("date".into()),
                order: Order::Desc,
                ..Default::default()
            },
        );
        queries.insert(
            "archive".to_string(),
            DynamicQuery {
                from: Some("blog".into()),
                group_by: Some("date|year".into()),
                ..Default::default()
            },
        );

        let results = evaluate_all(tmp.path(), &queries).unwrap();
        assert_eq!(results.len(), 2);
        assert!(matches!(results["posts"], ContentSet::Flat(_)));
        assert!(matches!(results["archive"], ContentSet::Grouped(_)));
    }

    #[test]
    fn query_deserializes_from_camel_case_json() {
        let query: DynamicQuery = serde_json::from_str(
            r#"{"from": "blog", "sortBy": "date", "order": "desc", "groupBy": "date|year", "limit": 5}"#,
        )
        .unwrap();
        assert_eq!(query.from.as_deref(), Some("blog"));
        assert_eq!(query.sort_by.as_deref(), Some("date"));
        assert_eq!(query.order, Order::Desc);
        assert_eq!(query.group_by.as_deref(), Some("date|year"));
        assert_eq!(query.limit, Some(5));
    }
}
