//! # Clipcast Core
//!
//! Core library for the Clipcast video platform, providing the session
//! authority, the credential codec, the abstract document store and the
//! read-model composition engine used by every listing endpoint.
//!
//! ## Overview
//!
//! - **Accounts**: account records, their public projection and the identity
//!   store contract
//! - **Authentication**: signed access/refresh tokens, single active refresh
//!   token per account with rotation on every refresh, request-time gate
//! - **Read models**: declarative joins, derived counts and membership flags,
//!   deny-by-default projection and deterministic pagination
//! - **Content**: typed video, tweet, comment, like, subscription and playlist
//!   records with the engagement toggles
//!
//! ## Feature Flags
//!
//! - `postgres`: enables the PostgreSQL JSONB document store (SQLx)
//! - `postgres-tests`: runs the PostgreSQL integration tests
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use clipcast_core::{
//!     catalog,
//!     readmodel::{ListingRequest, PageRequest, ReadModelComposer},
//!     store::MemoryStore,
//! };
//! use uuid::Uuid;
//!
//! async fn first_page(owner: Uuid) -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::new());
//!     let composer = ReadModelComposer::new(store);
//!     let request = ListingRequest::new(PageRequest::from_query(Some("1"), Some("10")))
//!         .for_caller(Some(owner));
//!     let page = composer
//!         .compose(&catalog::videos_by_owner(owner, true), &request)
//!         .await?;
//!     println!("{} of {} videos", page.items.len(), page.total);
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

/// Account records and the identity store contract
pub mod accounts;

/// Response envelope and request payloads shared with the HTTP layer
pub mod api_types;

/// Credential codec, session authority and request gate
pub mod auth;

/// Listing and detail views for every entity, expressed as composer specs
pub mod catalog;

/// Content records and engagement operations
pub mod content;

/// Error taxonomy shared by every component
pub mod error;

/// Declarative read-model composition engine
pub mod readmodel;

/// Abstract document store and its backends
pub mod store;

#[cfg(feature = "postgres")]
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub use error::ErrorKind;
