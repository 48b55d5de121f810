use uuid::Uuid;

use super::pagination::PageRequest;
use crate::store::{Filter, SortSpec, document::CREATED_AT_FIELD};

/// How many joined documents a record expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Target is the single match, or `null` when nothing matches
    ZeroOrOne,
    /// Target is the single match; records without one are dropped
    ExactlyOne,
    /// Target is an array of every match
    Many,
}

impl Cardinality {
    pub fn is_to_one(self) -> bool {
        !matches!(self, Cardinality::Many)
    }
}

/// One related-collection lookup merged into each record.
///
/// Keys are compared by JSON equality. When the local field holds an array,
/// every element is looked up and a `Many` target keeps the order of the
/// local array.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinSpec {
    pub from: String,
    pub local_field: String,
    pub foreign_field: String,
    pub target: String,
    pub cardinality: Cardinality,
    /// Extra condition on joined documents; non-matching ones count as absent
    pub filter: Filter,
    /// Fields kept on joined documents; `None` keeps everything. Targets of
    /// nested joins are always kept.
    pub retain: Option<Vec<String>>,
    /// Joins applied to the joined documents before `retain`
    pub joins: Vec<JoinSpec>,
}

impl JoinSpec {
    fn new(
        from: impl Into<String>,
        local_field: impl Into<String>,
        foreign_field: impl Into<String>,
        target: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            from: from.into(),
            local_field: local_field.into(),
            foreign_field: foreign_field.into(),
            target: target.into(),
            cardinality,
            filter: Filter::All,
            retain: None,
            joins: Vec::new(),
        }
    }

    /// `target` becomes the matching document or `null`.
    pub fn to_one(
        from: impl Into<String>,
        local_field: impl Into<String>,
        foreign_field: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self::new(from, local_field, foreign_field, target, Cardinality::ZeroOrOne)
    }

    /// `target` becomes an array of matching documents.
    pub fn many(
        from: impl Into<String>,
        local_field: impl Into<String>,
        foreign_field: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self::new(from, local_field, foreign_field, target, Cardinality::Many)
    }

    /// Drop records that have no match instead of yielding `null`.
    pub fn required(mut self) -> Self {
        self.cardinality = Cardinality::ExactlyOne;
        self
    }

    pub fn matching(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn retain(mut self, fields: &[&str]) -> Self {
        self.retain = Some(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn join(mut self, nested: JoinSpec) -> Self {
        self.joins.push(nested);
        self
    }

    /// Whether this join can drop base records.
    pub(crate) fn prunes(&self) -> bool {
        self.cardinality == Cardinality::ExactlyOne
    }
}

/// Scalar computed after joins.
#[derive(Debug, Clone, PartialEq)]
pub enum DerivedField {
    /// Length of the array at `source` (missing or non-array counts as 0)
    Count { field: String, source: String },
    /// Whether the caller's id appears in the array at `source`. Elements are
    /// compared directly, or through `member_field` when they are documents.
    /// Always `false` without a caller.
    ContainsCaller {
        field: String,
        source: String,
        member_field: Option<String>,
    },
}

impl DerivedField {
    pub fn count(field: impl Into<String>, source: impl Into<String>) -> Self {
        Self::Count {
            field: field.into(),
            source: source.into(),
        }
    }

    pub fn contains_caller(
        field: impl Into<String>,
        source: impl Into<String>,
        member_field: Option<&str>,
    ) -> Self {
        Self::ContainsCaller {
            field: field.into(),
            source: source.into(),
            member_field: member_field.map(str::to_string),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            DerivedField::Count { field, .. } | DerivedField::ContainsCaller { field, .. } => field,
        }
    }
}

/// Final shape of each record.
///
/// With a `root`, the record is first replaced by the document stored under
/// that field. `fields` then selects top-level fields; `None` keeps all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    pub fields: Option<Vec<String>>,
    pub root: Option<String>,
}

impl Projection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn fields(fields: &[&str]) -> Self {
        Self {
            fields: Some(fields.iter().map(|f| f.to_string()).collect()),
            root: None,
        }
    }

    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = Some(root.into());
        self
    }
}

/// Declarative description of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingSpec {
    pub collection: String,
    pub filter: Filter,
    pub joins: Vec<JoinSpec>,
    pub derived: Vec<DerivedField>,
    pub projection: Projection,
    /// Fields a caller may sort by; the default sort field is always allowed
    pub sortable: Vec<String>,
    pub default_sort: SortSpec,
}

impl ListingSpec {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filter: Filter::All,
            joins: Vec::new(),
            derived: Vec::new(),
            projection: Projection::all(),
            sortable: vec![CREATED_AT_FIELD.to_string()],
            default_sort: SortSpec::newest_first(),
        }
    }

    pub fn matching(mut self, filter: Filter) -> Self {
        self.filter = self.filter.and(filter);
        self
    }

    pub fn join(mut self, join: JoinSpec) -> Self {
        self.joins.push(join);
        self
    }

    pub fn derive(mut self, field: DerivedField) -> Self {
        self.derived.push(field);
        self
    }

    pub fn project(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn sortable(mut self, fields: &[&str]) -> Self {
        self.sortable.extend(fields.iter().map(|f| f.to_string()));
        self
    }

    pub fn default_sort(mut self, sort: SortSpec) -> Self {
        self.default_sort = sort;
        self
    }

    /// The requested sort when its field is allowed, the default otherwise.
    pub fn resolve_sort(&self, requested: Option<&SortSpec>) -> SortSpec {
        requested
            .filter(|sort| {
                sort.field == self.default_sort.field || self.sortable.contains(&sort.field)
            })
            .cloned()
            .unwrap_or_else(|| self.default_sort.clone())
    }

    /// Whether `field` is written by a join or a derived field.
    pub(crate) fn is_computed(&self, field: &str) -> bool {
        self.joins.iter().any(|join| join.target == field)
            || self.derived.iter().any(|derived| derived.field() == field)
    }

    pub(crate) fn prunes(&self) -> bool {
        self.joins.iter().any(JoinSpec::prunes)
    }
}

/// Per-call inputs: which page, optional explicit sort and who is asking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingRequest {
    pub page: PageRequest,
    pub sort: Option<SortSpec>,
    pub caller: Option<Uuid>,
}

impl ListingRequest {
    pub fn new(page: PageRequest) -> Self {
        Self {
            page,
            sort: None,
            caller: None,
        }
    }

    pub fn for_caller(mut self, caller: Option<Uuid>) -> Self {
        self.caller = caller;
        self
    }

    pub fn with_sort(mut self, sort: Option<SortSpec>) -> Self {
        self.sort = sort;
        self
    }
}
