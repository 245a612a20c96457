//! Collection queries: equality filters, one sort key, optional limit.
//!
//! [`Query::apply`] is the single definition of query semantics; every store
//! either evaluates it directly or pre-filters and then calls it.

use std::cmp::Ordering;

use serde_json::Value;

use super::Document;
use crate::domain::CollectionPath;
use crate::domain::fields::parse_timestamp;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// Equality predicate on a dotted field path.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    /// Dotted field path.
    pub field: String,
    /// Value the field must equal.
    pub value: Value,
}

/// Sort key.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    /// Dotted field path.
    pub field: String,
    /// Sort direction.
    pub direction: Direction,
}

/// A query over one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Target collection.
    pub collection: CollectionPath,
    /// Conjunction of equality filters.
    pub filters: Vec<FieldFilter>,
    /// Optional sort key. Documents lacking the field are excluded.
    pub order_by: Option<OrderBy>,
    /// Maximum number of documents returned.
    pub limit: Option<usize>,
}

impl Query {
    /// Starts a query returning the whole collection.
    #[must_use]
    pub const fn collection(collection: CollectionPath) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    /// Adds an equality filter.
    #[must_use]
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Sets the sort key.
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Caps the number of results.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns `true` if `doc` satisfies every filter and has the sort field.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        let filters_hold = self
            .filters
            .iter()
            .all(|f| doc.field(&f.field) == Some(&f.value));
        let has_sort_field = self
            .order_by
            .as_ref()
            .is_none_or(|o| doc.field(&o.field).is_some_and(|v| !v.is_null()));
        filters_hold && has_sort_field
    }

    /// Filters, sorts and truncates a set of candidate documents.
    ///
    /// Ties on the sort field are broken by document id in the same
    /// direction, so results are deterministic.
    #[must_use]
    pub fn apply(&self, docs: impl IntoIterator<Item = Document>) -> Vec<Document> {
        let mut matched: Vec<Document> = docs.into_iter().filter(|d| self.matches(d)).collect();

        if let Some(order) = &self.order_by {
            matched.sort_by(|a, b| {
                let ordering = match (a.field(&order.field), b.field(&order.field)) {
                    (Some(x), Some(y)) => compare_values(x, y),
                    _ => Ordering::Equal,
                }
                .then_with(|| a.id.cmp(&b.id));
                match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }
        matched
    }
}

/// Orders two field values: timestamps chronologically, numbers numerically,
/// strings lexically. Values of different kinds compare by kind rank.
#[must_use]
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    if let (Some(x), Some(y)) = (parse_timestamp_like(a), parse_timestamp_like(b)) {
        return x.cmp(&y);
    }
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

/// Timestamps only: plain numbers compare numerically, not as epoch millis.
fn parse_timestamp_like(value: &Value) -> Option<chrono::DateTime<chrono::Utc>> {
    match value {
        Value::String(_) | Value::Object(_) => parse_timestamp(value),
        _ => None,
    }
}

const fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::Object(_) => 3,
        Value::String(_) => 4,
        Value::Array(_) => 5,
    }
}
