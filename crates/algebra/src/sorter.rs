//! Sorters: row expansion plus a total order over sort items.
//!
//! A sorter does two jobs. `collect_items` expands one backing object into
//! zero or more rows (fan-out for hierarchical displays), and `compare`
//! orders rows. `sort` and `merge_into` must agree with `compare`, so a
//! single insertion merged into a sorted list lands where a full sort would
//! have put it.

use crate::schema::{Collation, Schema};
use folio_core::{BackingStore, ObjectId, PropertyId, Result, SortItem};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// Sort direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl Order {
    /// Applies this order to a comparison result.
    #[inline]
    pub fn apply(&self, ord: Ordering) -> Ordering {
        match self {
            Order::Asc => ord,
            Order::Desc => ord.reverse(),
        }
    }
}

/// Row expansion and ordering strategy.
pub trait Sorter {
    /// Appends the rows representing `root` to `out`.
    fn collect_items(&self, root: ObjectId, store: &dyn BackingStore, out: &mut Vec<SortItem>);

    /// Total order over rows.
    fn compare(&self, a: &SortItem, b: &SortItem, store: &dyn BackingStore) -> Ordering;

    /// Reorders a full list.
    fn sort(&self, items: &mut Vec<SortItem>, store: &dyn BackingStore) {
        items.sort_by(|a, b| self.compare(a, b, store));
    }

    /// Inserts `new_items` into an already sorted list without resorting it.
    fn merge_into(&self, sorted: &mut Vec<SortItem>, new_items: Vec<SortItem>, store: &dyn BackingStore) {
        for item in new_items {
            let pos = sorted.partition_point(|x| self.compare(x, &item, store) != Ordering::Greater);
            sorted.insert(pos, item);
        }
    }

    /// Serializes the sorter to an opaque descriptor string.
    fn descriptor(&self) -> Result<String>;
}

/// Appends the single trivial row used when no sorter is configured.
#[inline]
pub fn collect_trivial(root: ObjectId, out: &mut Vec<SortItem>) {
    out.push(SortItem::new(root));
}

/// A chain of vector properties walked from each root to produce rows.
///
/// With `[senses]`, an entry with three senses yields three rows keyed by
/// the senses. An object with no children at some level yields one row
/// keyed by itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanOut {
    pub properties: Vec<PropertyId>,
}

impl FanOut {
    pub fn new(properties: Vec<PropertyId>) -> Self {
        Self { properties }
    }

    /// Expands `root` into rows.
    pub fn expand(&self, root: ObjectId, store: &dyn BackingStore, out: &mut Vec<SortItem>) {
        let mut path = Vec::with_capacity(self.properties.len());
        self.walk(root, root, 0, store, &mut path, out);
    }

    fn walk(
        &self,
        root: ObjectId,
        current: ObjectId,
        depth: usize,
        store: &dyn BackingStore,
        path: &mut Vec<ObjectId>,
        out: &mut Vec<SortItem>,
    ) {
        let children = match self.properties.get(depth) {
            Some(&property) => store.vector(current, property),
            None => &[],
        };
        if children.is_empty() {
            out.push(SortItem::with_path(current, root, path.clone()));
            return;
        }
        for &child in children {
            path.push(child);
            self.walk(root, child, depth + 1, store, path, out);
            path.pop();
        }
    }
}

/// One sort key: a field of the key object, a direction, and an optional
/// writing system that selects the collation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    #[serde(default)]
    pub order: Order,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writing_system: Option<String>,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: Order::Asc,
            writing_system: None,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: Order::Desc,
            writing_system: None,
        }
    }

    pub fn in_writing_system(mut self, ws: impl Into<String>) -> Self {
        self.writing_system = Some(ws.into());
        self
    }
}

/// Sorts by string fields of the key object, breaking ties by key id and
/// then root id so the order is total.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldSorter {
    keys: Vec<SortKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fan_out: Option<FanOut>,
    #[serde(skip)]
    collations: Vec<Collation>,
}

/// Precomputed comparison key for one row.
struct RowKey {
    fields: Vec<String>,
    key: ObjectId,
    root: ObjectId,
}

impl FieldSorter {
    /// Creates a sorter, resolving each key's writing system against the
    /// schema.
    pub fn new(keys: Vec<SortKey>, schema: &Schema) -> Result<Self> {
        let mut sorter = Self {
            keys,
            fan_out: None,
            collations: Vec::new(),
        };
        sorter.bind(schema)?;
        Ok(sorter)
    }

    /// Expands every root through `fan_out` when collecting rows.
    pub fn with_fan_out(mut self, fan_out: FanOut) -> Self {
        self.fan_out = Some(fan_out);
        self
    }

    /// Returns the sort keys.
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    /// Reconstructs a sorter from a descriptor, failing if a field or
    /// writing system it names is gone.
    pub fn from_descriptor(descriptor: &str, schema: &Schema) -> Result<Self> {
        let mut sorter: FieldSorter = serde_json::from_str(descriptor).inspect_err(|e| {
            debug!(error = %e, "unreadable sorter descriptor");
        })?;
        sorter.bind(schema).inspect_err(|e| {
            debug!(error = %e, keys = sorter.keys.len(), "sorter descriptor does not fit the schema");
        })?;
        Ok(sorter)
    }

    fn bind(&mut self, schema: &Schema) -> Result<()> {
        let mut collations = Vec::with_capacity(self.keys.len());
        for key in &self.keys {
            schema.require_field(&key.field)?;
            let collation = match &key.writing_system {
                Some(ws) => schema.collation(ws)?,
                None => Collation::default(),
            };
            collations.push(collation);
        }
        self.collations = collations;
        Ok(())
    }

    fn row_key(&self, item: &SortItem, store: &dyn BackingStore) -> RowKey {
        let fields = self
            .keys
            .iter()
            .zip(&self.collations)
            .map(|(key, collation)| {
                collation.normalize(store.field(item.key(), &key.field).unwrap_or(""))
            })
            .collect();
        RowKey {
            fields,
            key: item.key(),
            root: item.root(),
        }
    }

    fn compare_keys(&self, a: &RowKey, b: &RowKey) -> Ordering {
        for ((x, y), key) in a.fields.iter().zip(&b.fields).zip(&self.keys) {
            let ord = key.order.apply(x.cmp(y));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.key.cmp(&b.key).then(a.root.cmp(&b.root))
    }
}

impl Sorter for FieldSorter {
    fn collect_items(&self, root: ObjectId, store: &dyn BackingStore, out: &mut Vec<SortItem>) {
        match &self.fan_out {
            Some(fan_out) => fan_out.expand(root, store, out),
            None => collect_trivial(root, out),
        }
    }

    fn compare(&self, a: &SortItem, b: &SortItem, store: &dyn BackingStore) -> Ordering {
        self.compare_keys(&self.row_key(a, store), &self.row_key(b, store))
    }

    fn sort(&self, items: &mut Vec<SortItem>, store: &dyn BackingStore) {
        let mut keyed: Vec<(RowKey, SortItem)> = items
            .drain(..)
            .map(|item| (self.row_key(&item, store), item))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| self.compare_keys(a, b));
        items.extend(keyed.into_iter().map(|(_, item)| item));
    }

    fn merge_into(&self, sorted: &mut Vec<SortItem>, new_items: Vec<SortItem>, store: &dyn BackingStore) {
        for item in new_items {
            let probe = self.row_key(&item, store);
            let pos = sorted.partition_point(|x| {
                self.compare_keys(&self.row_key(x, store), &probe) != Ordering::Greater
            });
            sorted.insert(pos, item);
        }
    }

    fn descriptor(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
