//! # Entity Descriptors
//!
//! The compiler never owns entity definitions; it consumes a minimal
//! descriptor: the table name, the primary-key column, and row hydration
//! via `sqlx::FromRow`.
//!
//! Named scopes are a capability set, not dynamic dispatch: an entity
//! declares which scope names it supports by matching on them in
//! [`Entity::scope`]. The applier performs a lookup and silently skips
//! names the entity does not expose, so scope application stays
//! opportunistic and loosely coupled.

use crate::query_builder::QueryPlan;

/// A named-scope implementation: a plan-to-plan transformation applied
/// with no arguments.
pub type ScopeFn = fn(QueryPlan) -> QueryPlan;

/// Descriptor for a queryable entity backed by a single table.
pub trait Entity: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin {
    /// Table name. Used to qualify every generated column reference.
    const TABLE: &'static str;

    /// Primary-key column name.
    const PRIMARY_KEY: &'static str;

    /// Capability lookup for named scopes. The default supports none.
    fn scope(name: &str) -> Option<ScopeFn> {
        let _ = name;
        None
    }
}
