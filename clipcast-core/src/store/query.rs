use std::cmp::Ordering;

use serde_json::Value;
use uuid::Uuid;

use super::document::{
    CREATED_AT_FIELD, Document, ID_FIELD, compare_values, id_value, now_value,
};

/// Match filter over top-level document fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document
    All,
    /// Field equals value; `null` also matches a missing field
    Eq(String, Value),
    /// Field is present and not `null`
    Exists(String),
    /// Field equals one of the values
    In(String, Vec<Value>),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(field.into(), value.into())
    }

    pub fn eq_id(field: impl Into<String>, id: Uuid) -> Self {
        Self::Eq(field.into(), id_value(id))
    }

    pub fn by_id(id: Uuid) -> Self {
        Self::eq_id(ID_FIELD, id)
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Self::Exists(field.into())
    }

    pub fn any_of(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::In(field.into(), values)
    }

    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::All, other) | (other, Filter::All) => other,
            (Filter::And(mut left), Filter::And(right)) => {
                left.extend(right);
                Filter::And(left)
            }
            (Filter::And(mut left), other) => {
                left.push(other);
                Filter::And(left)
            }
            (this, other) => Filter::And(vec![this, other]),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, Value::Null) => doc.get(field).is_none_or(Value::is_null),
            Filter::Eq(field, value) => doc.get(field) == Some(value),
            Filter::Exists(field) => doc.get(field).is_some_and(|v| !v.is_null()),
            Filter::In(field, values) => doc
                .get(field)
                .is_some_and(|v| values.iter().any(|candidate| candidate == v)),
            Filter::And(filters) => filters.iter().all(|f| f.matches(doc)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(doc)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    /// Accepts `1`/`-1` as well as `asc`/`desc` spellings.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "asc" | "ascending" => Some(Self::Ascending),
            "-1" | "desc" | "descending" => Some(Self::Descending),
            _ => None,
        }
    }

    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

/// Sort key plus direction. Ties break on `_id` in the same direction, which
/// keeps pages stable because ids are time-ordered UUIDv7 values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn newest_first() -> Self {
        Self::new(CREATED_AT_FIELD, SortDirection::Descending)
    }

    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let primary = compare_values(a.get(&self.field), b.get(&self.field));
        let ordering = primary.then_with(|| compare_values(a.get(ID_FIELD), b.get(ID_FIELD)));
        self.direction.apply(ordering)
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::newest_first()
    }
}

/// Skip/limit window handed to the store when sorting is pushed down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub skip: u64,
    pub limit: u64,
}

/// Single-document update operations, applied atomically by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    /// Set (or overwrite) a field
    Set(String, Value),
    /// Add a number to a numeric field (missing counts as zero)
    Increment(String, i64),
    /// Append to an array field unless already present
    AddToSet(String, Value),
    /// Remove every occurrence from an array field
    Pull(String, Value),
    /// Stamp `updatedAt` with the current time
    Touch,
}

impl UpdateOp {
    pub fn set(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Set(field.into(), value.into())
    }

    /// Apply a batch of operations to a document in place.
    pub fn apply_all(ops: &[UpdateOp], doc: &mut Document) {
        for op in ops {
            op.apply(doc);
        }
    }

    fn apply(&self, doc: &mut Document) {
        match self {
            UpdateOp::Set(field, value) => {
                doc.insert(field.clone(), value.clone());
            }
            UpdateOp::Increment(field, by) => {
                let current = doc.get(field).and_then(Value::as_i64).unwrap_or(0);
                doc.insert(field.clone(), Value::from(current.saturating_add(*by)));
            }
            UpdateOp::AddToSet(field, value) => {
                let entry = doc
                    .entry(field.clone())
                    .or_insert_with(|| Value::Array(Vec::new()));
                if !entry.is_array() {
                    *entry = Value::Array(Vec::new());
                }
                if let Value::Array(items) = entry
                    && !items.contains(value)
                {
                    items.push(value.clone());
                }
            }
            UpdateOp::Pull(field, value) => {
                if let Some(Value::Array(items)) = doc.get_mut(field) {
                    items.retain(|item| item != value);
                }
            }
            UpdateOp::Touch => {
                doc.insert(super::document::UPDATED_AT_FIELD.to_string(), now_value());
            }
        }
    }
}
