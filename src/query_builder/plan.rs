//! # Query Plan
//!
//! The accumulating, mutable query state one compile-execute cycle
//! produces: select list, left joins, predicates, grouping, ordering and
//! pagination. A plan is created fresh per public entry point and
//! discarded after the call.
//!
//! Rendering emits `$n` placeholders for every predicate value;
//! execution binds the collected values through SQLx, so no user input
//! is ever interpolated into the SQL text.

use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{PgPool, Postgres};
use tracing::debug;

use super::joins::Join;
use super::pagination::Pagination;
use super::predicates::Predicate;

/// Sort direction for an ordering entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn to_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }

    /// Case-insensitive parse of a direction string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Direction::Asc),
            "desc" => Some(Direction::Desc),
            _ => None,
        }
    }
}

/// Qualify a field with its owning table unless it already carries a
/// qualifier.
pub fn qualify(table: &str, field: &str) -> String {
    if field.contains('.') {
        field.to_string()
    } else {
        format!("{table}.{field}")
    }
}

/// A compiled query plan against a single base table.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    base_table: String,
    select_fields: Vec<String>,
    joins: Vec<Join>,
    predicates: Vec<Predicate>,
    group_by: Option<String>,
    order_by: Vec<String>,
    pagination: Option<Pagination>,
    related: Vec<String>,
}

impl QueryPlan {
    /// Create an empty plan scoped to the given table, selecting
    /// `table.*` until a projection is set.
    pub fn new(table: &str) -> Self {
        Self {
            base_table: table.to_string(),
            select_fields: vec![format!("{table}.*")],
            joins: Vec::new(),
            predicates: Vec::new(),
            group_by: None,
            order_by: Vec::new(),
            pagination: None,
            related: Vec::new(),
        }
    }

    /// Replace the projection entirely.
    pub fn select(mut self, fields: Vec<String>) -> Self {
        self.select_fields = fields;
        self
    }

    /// Append a left-join clause.
    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    /// Append a predicate. Predicates always combine with `AND`.
    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Set the group-by field (already qualified by the caller).
    pub fn group_by(mut self, field: &str) -> Self {
        self.group_by = Some(field.to_string());
        self
    }

    /// Append an ordering entry (field already qualified by the caller).
    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by.push(format!("{field} {}", direction.to_sql()));
        self
    }

    /// Set LIMIT/OFFSET.
    pub fn paginate(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Record relation names for an external hydration layer. The plan
    /// itself performs no eager loading.
    pub fn with_related(mut self, relations: Vec<String>) -> Self {
        self.related.extend(relations);
        self
    }

    pub fn base_table(&self) -> &str {
        &self.base_table
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn related(&self) -> &[String] {
        &self.related
    }

    /// Render the complete SQL statement with `$n` placeholders.
    pub fn build_sql(&self) -> String {
        let mut sql = format!(
            "SELECT {} FROM {}",
            self.select_fields.join(", "),
            self.base_table
        );

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.to_sql());
        }

        if !self.predicates.is_empty() {
            let mut next = 1;
            let parts: Vec<String> = self
                .predicates
                .iter()
                .map(|p| p.to_sql(&mut next))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&parts.join(" AND "));
        }

        if let Some(ref group) = self.group_by {
            sql.push_str(&format!(" GROUP BY {group}"));
        }

        if !self.order_by.is_empty() {
            sql.push_str(&format!(" ORDER BY {}", self.order_by.join(", ")));
        }

        if let Some(ref pagination) = self.pagination {
            sql.push_str(&pagination.to_sql());
        }

        sql
    }

    /// The values to bind, in placeholder order.
    pub fn bind_values(&self) -> Vec<Value> {
        self.predicates
            .iter()
            .flat_map(|p| p.bind_values())
            .collect()
    }

    /// Execute and return all rows.
    pub async fn fetch_all<T>(&self, pool: &PgPool) -> Result<Vec<T>, sqlx::Error>
    where
        T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql = self.build_sql();
        let values = self.bind_values();
        debug!(sql = %sql, binds = values.len(), "executing plan");
        let mut query = sqlx::query_as::<_, T>(&sql);
        for value in &values {
            query = bind_value(query, value);
        }
        query.fetch_all(pool).await
    }

    /// Execute and return at most one row.
    pub async fn fetch_optional<T>(&self, pool: &PgPool) -> Result<Option<T>, sqlx::Error>
    where
        T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql = self.build_sql();
        let values = self.bind_values();
        debug!(sql = %sql, binds = values.len(), "executing plan");
        let mut query = sqlx::query_as::<_, T>(&sql);
        for value in &values {
            query = bind_value(query, value);
        }
        query.fetch_optional(pool).await
    }

    /// Execute a `COUNT(*)` over this plan, with ordering, grouping and
    /// pagination stripped.
    pub async fn count(&self, pool: &PgPool) -> Result<i64, sqlx::Error> {
        self.derive_count("COUNT(*)".to_string())
            .fetch_scalar(pool)
            .await
    }

    /// Count the distinct values of `field` matched by this plan. Used as
    /// the total for grouped pagination.
    pub async fn count_distinct(&self, pool: &PgPool, field: &str) -> Result<i64, sqlx::Error> {
        self.derive_count(format!("COUNT(DISTINCT {field})"))
            .fetch_scalar(pool)
            .await
    }

    fn derive_count(&self, select: String) -> QueryPlan {
        let mut plan = self.clone();
        plan.select_fields = vec![select];
        plan.order_by.clear();
        plan.group_by = None;
        plan.pagination = None;
        plan
    }

    async fn fetch_scalar(&self, pool: &PgPool) -> Result<i64, sqlx::Error> {
        let sql = self.build_sql();
        let values = self.bind_values();
        debug!(sql = %sql, binds = values.len(), "executing count");
        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for value in &values {
            query = bind_scalar_value(query, value);
        }
        query.fetch_one(pool).await
    }
}

fn bind_value<'q, T>(
    query: sqlx::query::QueryAs<'q, Postgres, T, PgArguments>,
    value: &'q Value,
) -> sqlx::query::QueryAs<'q, Postgres, T, PgArguments> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(f) = n.as_f64() {
                query.bind(f)
            } else {
                query.bind(n.to_string())
            }
        }
        Value::String(s) => query.bind(s.as_str()),
        other => query.bind(other.clone()),
    }
}

fn bind_scalar_value<'q>(
    query: sqlx::query::QueryScalar<'q, Postgres, i64, PgArguments>,
    value: &'q Value,
) -> sqlx::query::QueryScalar<'q, Postgres, i64, PgArguments> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(f) = n.as_f64() {
                query.bind(f)
            } else {
                query.bind(n.to_string())
            }
        }
        Value::String(s) => query.bind(s.as_str()),
        other => query.bind(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_builder::joins::JoinSpec;
    use serde_json::json;

    #[test]
    fn test_default_projection() {
        let plan = QueryPlan::new("users");
        assert_eq!(plan.build_sql(), "SELECT users.* FROM users");
        assert!(plan.bind_values().is_empty());
    }

    #[test]
    fn test_clause_ordering() {
        let plan = QueryPlan::new("orders")
            .join(JoinSpec::to("users", "id").render("orders", "id"))
            .predicate(Predicate::Eq {
                field: "orders.status".to_string(),
                value: json!("paid"),
            })
            .order_by("orders.id", Direction::Desc)
            .paginate(Pagination::new(1, 10));

        assert_eq!(
            plan.build_sql(),
            "SELECT orders.* FROM orders \
             LEFT JOIN users ON orders.users_id = users.id \
             WHERE orders.status = $1 \
             ORDER BY orders.id DESC LIMIT 10 OFFSET 0"
        );
        assert_eq!(plan.bind_values(), vec![json!("paid")]);
    }

    #[test]
    fn test_predicates_join_with_and() {
        let plan = QueryPlan::new("users")
            .predicate(Predicate::Gte {
                field: "users.age".to_string(),
                value: json!(18),
            })
            .predicate(Predicate::In {
                field: "users.role".to_string(),
                values: vec![json!("admin"), json!("editor")],
            });

        assert_eq!(
            plan.build_sql(),
            "SELECT users.* FROM users WHERE users.age >= $1 AND users.role IN ($2, $3)"
        );
        assert_eq!(
            plan.bind_values(),
            vec![json!(18), json!("admin"), json!("editor")]
        );
    }

    #[test]
    fn test_group_by_rendering() {
        let plan = QueryPlan::new("orders")
            .select(vec![
                "CAST(orders.status AS TEXT) AS group_value".to_string(),
                "COUNT(*) AS group_count".to_string(),
            ])
            .group_by("orders.status")
            .order_by("orders.status", Direction::Asc);

        assert_eq!(
            plan.build_sql(),
            "SELECT CAST(orders.status AS TEXT) AS group_value, COUNT(*) AS group_count \
             FROM orders GROUP BY orders.status ORDER BY orders.status ASC"
        );
    }

    #[test]
    fn test_count_derivation_strips_order_and_pagination() {
        let plan = QueryPlan::new("users")
            .predicate(Predicate::Eq {
                field: "users.active".to_string(),
                value: json!(true),
            })
            .order_by("users.id", Direction::Desc)
            .paginate(Pagination::new(2, 10));

        let count = plan.derive_count("COUNT(*)".to_string());
        assert_eq!(
            count.build_sql(),
            "SELECT COUNT(*) FROM users WHERE users.active = $1"
        );
        // Binds survive the derivation unchanged.
        assert_eq!(count.bind_values(), plan.bind_values());
    }

    #[test]
    fn test_qualify() {
        assert_eq!(qualify("users", "name"), "users.name");
        assert_eq!(qualify("users", "orders.total"), "orders.total");
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!(Direction::parse("ASC"), Some(Direction::Asc));
        assert_eq!(Direction::parse(" desc "), Some(Direction::Desc));
        assert_eq!(Direction::parse("sideways"), None);
    }
}
