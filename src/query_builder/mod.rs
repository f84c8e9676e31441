//! # Query Builder System
//!
//! The plan layer underneath the condition compiler: accumulating query
//! state, predicate and join rendering, and pagination.
//!
//! ## Key Components
//!
//! - [`plan`] - Core query plan with SQL generation and bound execution
//! - [`predicates`] - The five predicate forms conditions compile to
//! - [`joins`] - Left-join declarations with foreign-key inference
//! - [`pagination`] - LIMIT/OFFSET, page resolution and the page envelope
//!
//! All generated SQL binds values through `$n` placeholders; column
//! references come exclusively from entity descriptors and condition
//! definitions, never from request input.

pub mod joins;
pub mod pagination;
pub mod plan;
pub mod predicates;

pub use joins::{Join, JoinDirection, JoinSpec};
pub use pagination::{GroupRow, Page, Pagination, DEFAULT_PER_PAGE, MAX_PER_PAGE};
pub use plan::{qualify, Direction, QueryPlan};
pub use predicates::Predicate;
