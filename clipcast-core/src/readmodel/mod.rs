//! Read-model composition
//!
//! Listing endpoints are declared as data: a [`ListingSpec`] names the base
//! collection and match filter, the related collections to pull in
//! ([`JoinSpec`]), the scalars computed from the joined data
//! ([`DerivedField`]) and the fields that survive ([`Projection`]). The
//! [`ReadModelComposer`] evaluates a spec against a [`DocumentStore`] in a
//! fixed order:
//!
//! 1. match
//! 2. joins, one batched store query per join and nesting level
//! 3. derived fields
//! 4. sort (default `createdAt` descending, ties on `_id`)
//! 5. slice to the requested page
//! 6. projection
//!
//! `total` counts records after matching and after required joins dropped
//! unmatched records, before slicing.
//!
//! [`DocumentStore`]: crate::store::DocumentStore

mod composer;
mod pagination;
mod spec;

pub use composer::{ComposeError, ReadModelComposer};
pub use pagination::{DEFAULT_LIMIT, MAX_LIMIT, Page, PageRequest};
pub use spec::{Cardinality, DerivedField, JoinSpec, ListingRequest, ListingSpec, Projection};
