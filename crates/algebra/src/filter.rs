//! Filter composition algebra.
//!
//! `Filter::Null` is the "no filter" sentinel. Conjunctions are built with
//! [`Filter::and`] and taken apart with [`Filter::without`]; a conjunction
//! reduced to one child collapses to that child, so the active filter is
//! never a one-element `And`.

use crate::schema::Schema;
use folio_core::{BackingStore, ClassId, ObjectId, Result, SortItem};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// A predicate over sort items.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Filter {
    /// Accepts everything.
    #[default]
    Null,
    /// Conjunction over child filters.
    And(AndFilter),
    /// Matches a string field of the key object.
    Field(FieldFilter),
    /// Matches the class of the key object.
    Class(ClassFilter),
    /// Rejects rows whose root is in a fixed set. Internal only.
    Exclude(ExcludeIds),
}

impl Filter {
    /// Evaluates the filter against an item.
    pub fn accept(&self, item: &SortItem, store: &dyn BackingStore) -> bool {
        match self {
            Filter::Null => true,
            Filter::And(and) => and.filters.iter().all(|f| f.accept(item, store)),
            Filter::Field(f) => f.accept(item, store),
            Filter::Class(f) => store
                .class_of(item.key())
                .map(|class| f.classes.contains(&class))
                .unwrap_or(false),
            Filter::Exclude(f) => !f.ids.contains(&item.root()),
        }
    }

    /// Returns true for the "no filter" sentinel.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Filter::Null)
    }

    /// Returns true if a user could have picked this filter from the UI.
    pub fn is_user_visible(&self) -> bool {
        match self {
            Filter::Null | Filter::Exclude(_) => false,
            Filter::And(and) => and.filters.iter().any(Filter::is_user_visible),
            Filter::Field(f) => f.user_visible,
            Filter::Class(f) => f.user_visible,
        }
    }

    /// Adds `other` to this filter, producing the combined filter.
    pub fn and(self, other: Filter) -> Filter {
        match (self, other) {
            (Filter::Null, other) => other,
            (this, Filter::Null) => this,
            (Filter::And(mut and), other) => {
                and.add(other);
                Filter::And(and)
            }
            (this, other) => Filter::And(AndFilter {
                filters: vec![this, other],
            }),
        }
    }

    /// Removes `target` from this filter. Removing the filter itself yields
    /// `Null`; removing the next-to-last child of a conjunction yields the
    /// surviving child.
    pub fn without(self, target: &Filter) -> Filter {
        if &self == target {
            return Filter::Null;
        }
        match self {
            Filter::And(mut and) => {
                and.remove(target);
                and.reduce()
            }
            other => other,
        }
    }

    /// Short description of the active filter, for status displays.
    pub fn describe(&self) -> String {
        match self {
            Filter::Null => "none".to_owned(),
            Filter::And(and) => and
                .filters
                .iter()
                .map(Filter::describe)
                .collect::<Vec<_>>()
                .join(" and "),
            Filter::Field(f) => format!("{} {}", f.field, f.matcher.describe()),
            Filter::Class(f) => format!("class in {:?}", f.classes),
            Filter::Exclude(f) => format!("excluding {} records", f.ids.len()),
        }
    }

    /// Checks every schema reference in the filter.
    pub fn validate(&self, schema: &Schema) -> Result<()> {
        match self {
            Filter::And(and) => and.filters.iter().try_for_each(|f| f.validate(schema)),
            Filter::Field(f) => schema.require_field(&f.field),
            Filter::Null | Filter::Class(_) | Filter::Exclude(_) => Ok(()),
        }
    }

    /// Serializes the filter to an opaque descriptor string.
    pub fn descriptor(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Reconstructs a filter from a descriptor, failing if it references a
    /// schema element that no longer exists.
    pub fn from_descriptor(descriptor: &str, schema: &Schema) -> Result<Filter> {
        let filter: Filter = serde_json::from_str(descriptor).inspect_err(|e| {
            debug!(error = %e, "unreadable filter descriptor");
        })?;
        filter.validate(schema).inspect_err(|e| {
            debug!(error = %e, "filter descriptor does not fit the schema");
        })?;
        Ok(filter)
    }
}

/// Conjunction over child filters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AndFilter {
    filters: Vec<Filter>,
}

impl AndFilter {
    /// Creates a conjunction. Prefer [`Filter::and`], which never builds a
    /// conjunction of fewer than two children.
    pub fn new(filters: Vec<Filter>) -> Self {
        Self { filters }
    }

    /// Returns the children.
    #[inline]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Adds a child. Nested conjunctions are flattened.
    pub fn add(&mut self, filter: Filter) {
        match filter {
            Filter::Null => {}
            Filter::And(inner) => self.filters.extend(inner.filters),
            other => self.filters.push(other),
        }
    }

    /// Removes the first child equal to `filter`.
    pub fn remove(&mut self, filter: &Filter) -> bool {
        match self.filters.iter().position(|f| f == filter) {
            Some(pos) => {
                self.filters.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Collapses the conjunction: no children is `Null`, one child is that
    /// child.
    pub fn reduce(mut self) -> Filter {
        match self.filters.len() {
            0 => Filter::Null,
            1 => self.filters.pop().unwrap_or(Filter::Null),
            _ => Filter::And(self),
        }
    }
}

/// How a field value is matched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Matcher {
    Equals(String),
    Contains(String),
    StartsWith(String),
    Empty,
    NonEmpty,
}

impl Matcher {
    fn matches(&self, value: &str, fold_case: bool) -> bool {
        let fold = |s: &str| if fold_case { s.to_lowercase() } else { s.to_owned() };
        match self {
            Matcher::Equals(p) => fold(value) == fold(p),
            Matcher::Contains(p) => fold(value).contains(&fold(p)),
            Matcher::StartsWith(p) => fold(value).starts_with(&fold(p)),
            Matcher::Empty => value.is_empty(),
            Matcher::NonEmpty => !value.is_empty(),
        }
    }

    fn describe(&self) -> String {
        match self {
            Matcher::Equals(p) => format!("= {p:?}"),
            Matcher::Contains(p) => format!("contains {p:?}"),
            Matcher::StartsWith(p) => format!("starts with {p:?}"),
            Matcher::Empty => "is empty".to_owned(),
            Matcher::NonEmpty => "is not empty".to_owned(),
        }
    }
}

/// Matches a string field of the key object. A missing field reads as empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFilter {
    pub field: String,
    pub matcher: Matcher,
    #[serde(default)]
    pub fold_case: bool,
    #[serde(default = "default_true")]
    pub user_visible: bool,
}

impl FieldFilter {
    /// Creates a user-visible, case-sensitive field filter.
    pub fn new(field: impl Into<String>, matcher: Matcher) -> Self {
        Self {
            field: field.into(),
            matcher,
            fold_case: false,
            user_visible: true,
        }
    }

    /// Makes matching case-insensitive.
    pub fn fold_case(mut self) -> Self {
        self.fold_case = true;
        self
    }

    /// Marks the filter as internal.
    pub fn internal(mut self) -> Self {
        self.user_visible = false;
        self
    }

    fn accept(&self, item: &SortItem, store: &dyn BackingStore) -> bool {
        let value = store.field(item.key(), &self.field).unwrap_or("");
        self.matcher.matches(value, self.fold_case)
    }
}

/// Matches the class of the key object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassFilter {
    pub classes: Vec<ClassId>,
    #[serde(default = "default_true")]
    pub user_visible: bool,
}

impl ClassFilter {
    /// Creates a user-visible class filter.
    pub fn new(classes: Vec<ClassId>) -> Self {
        Self {
            classes,
            user_visible: true,
        }
    }
}

/// Rejects rows whose root is in the set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludeIds {
    pub ids: BTreeSet<ObjectId>,
}

impl ExcludeIds {
    pub fn new(ids: impl IntoIterator<Item = ObjectId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }
}

fn default_true() -> bool {
    true
}
