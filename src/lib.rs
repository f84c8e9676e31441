#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # paramquery
//!
//! Declarative query-condition compiler for SQLx/Postgres.
//!
//! ## Overview
//!
//! `paramquery` takes an untyped map of request parameters plus a small
//! grammar describing which fields are queryable and how (exact match,
//! set membership, substring match, range), and deterministically
//! compiles it into a composed query plan: bound predicates, left joins,
//! projection, ordering, grouping and pagination.
//!
//! The compiler is permissive by design: absent, null and empty
//! parameters mean "do not filter on this field". The only hard failure
//! during compilation is a shape mismatch between a declared condition
//! kind and the supplied value.
//!
//! ## Module Organization
//!
//! - [`query`] - The [`EntityQuery`] compiler and execution dispatch
//! - [`definition`] - Condition kinds and the per-field grammar
//! - [`query_builder`] - Plans, predicates, joins and pagination
//! - [`entity`] - Entity descriptors and scope capabilities
//! - [`params`] - Parameter normalization
//! - [`error`] - Structured error handling
//! - [`logging`] - Tracing bootstrap
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use paramquery::{ConditionDefinition, ConditionKind, Entity, EntityQuery};
//! use serde_json::json;
//! use sqlx::PgPool;
//!
//! #[derive(sqlx::FromRow)]
//! struct User {
//!     id: i64,
//!     name: String,
//! }
//!
//! impl Entity for User {
//!     const TABLE: &'static str = "users";
//!     const PRIMARY_KEY: &'static str = "id";
//! }
//!
//! # async fn example(pool: &PgPool) -> paramquery::Result<()> {
//! let query = EntityQuery::<User>::new().condition(
//!     ConditionDefinition::new()
//!         .field("status", ConditionKind::Term)
//!         .field("name", ConditionKind::Fuzzy)
//!         .field("created_at", ConditionKind::Range),
//! );
//!
//! let params = match json!({"status": "active", "name": "jo"}) {
//!     serde_json::Value::Object(map) => map,
//!     _ => unreachable!(),
//! };
//! let page = query.query(pool, &params).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Safety
//!
//! Generated SQL references columns only through entity descriptors and
//! condition definitions, which are developer-declared. Every
//! user-supplied value is bound as a typed query parameter, never
//! interpolated into the SQL text.

pub mod definition;
pub mod entity;
pub mod error;
pub mod logging;
pub mod params;
pub mod query;
pub mod query_builder;

pub use definition::{ConditionDefinition, ConditionKind, FieldRule};
pub use entity::{Entity, ScopeFn};
pub use error::{QueryError, Result};
pub use logging::init_logging;
pub use params::{normalize, ParamMap};
pub use query::{EntityQuery, ListResult, PagedResult};
pub use query_builder::{
    Direction, GroupRow, Join, JoinDirection, JoinSpec, Page, Pagination, Predicate, QueryPlan,
};
