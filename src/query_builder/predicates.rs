//! # Predicates
//!
//! The five predicate forms a condition definition can compile to.
//! Rendering produces `$n` placeholders; the matching values are
//! collected separately and bound at execution time, so user-supplied
//! values never reach the SQL text. Field names are always
//! table-qualified by the compiler and never come from user input.

use serde_json::Value;

/// A single emitted WHERE condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Exact equality (`TERM`).
    Eq { field: String, value: Value },
    /// Set membership (`TERMS`).
    In { field: String, values: Vec<Value> },
    /// Substring match (`FUZZY`); the pattern already carries the `%`
    /// wildcards.
    Like { field: String, pattern: String },
    /// Lower bound of a `RANGE`.
    Gte { field: String, value: Value },
    /// Upper bound of a `RANGE`.
    Lte { field: String, value: Value },
}

impl Predicate {
    /// Render to SQL, consuming placeholder numbers from `next` in bind
    /// order.
    pub fn to_sql(&self, next: &mut usize) -> String {
        let mut placeholder = || {
            let n = *next;
            *next += 1;
            format!("${n}")
        };

        match self {
            Predicate::Eq { field, .. } => format!("{field} = {}", placeholder()),
            Predicate::In { field, values } => {
                if values.is_empty() {
                    // Guarded upstream; an empty set matches nothing.
                    return "1 = 0".to_string();
                }
                let list = values
                    .iter()
                    .map(|_| placeholder())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{field} IN ({list})")
            }
            Predicate::Like { field, .. } => format!("{field} LIKE {}", placeholder()),
            Predicate::Gte { field, .. } => format!("{field} >= {}", placeholder()),
            Predicate::Lte { field, .. } => format!("{field} <= {}", placeholder()),
        }
    }

    /// The values this predicate binds, in placeholder order.
    pub fn bind_values(&self) -> Vec<Value> {
        match self {
            Predicate::Eq { value, .. }
            | Predicate::Gte { value, .. }
            | Predicate::Lte { value, .. } => vec![value.clone()],
            Predicate::In { values, .. } => values.clone(),
            Predicate::Like { pattern, .. } => vec![Value::String(pattern.clone())],
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_eq_placeholder() {
        let predicate = Predicate::Eq {
            field: "users.status".to_string(),
            value: json!("active"),
        };
        let mut next = 1;
        assert_eq!(predicate.to_sql(&mut next), "users.status = $1");
        assert_eq!(next, 2);
        assert_eq!(predicate.bind_values(), vec![json!("active")]);
    }

    #[test]
    fn test_in_consumes_one_placeholder_per_value() {
        let predicate = Predicate::In {
            field: "users.tags".to_string(),
            values: vec![json!("a"), json!("b"), json!("c")],
        };
        let mut next = 3;
        assert_eq!(predicate.to_sql(&mut next), "users.tags IN ($3, $4, $5)");
        assert_eq!(next, 6);
    }

    #[test]
    fn test_empty_in_matches_nothing() {
        let predicate = Predicate::In {
            field: "users.tags".to_string(),
            values: vec![],
        };
        let mut next = 1;
        assert_eq!(predicate.to_sql(&mut next), "1 = 0");
        assert_eq!(next, 1);
    }

    #[test]
    fn test_like_binds_pattern() {
        let predicate = Predicate::Like {
            field: "users.name".to_string(),
            pattern: "%jo%".to_string(),
        };
        let mut next = 1;
        assert_eq!(predicate.to_sql(&mut next), "users.name LIKE $1");
        assert_eq!(predicate.bind_values(), vec![json!("%jo%")]);
    }

    #[test]
    fn test_range_bounds() {
        let lower = Predicate::Gte {
            field: "orders.created_at".to_string(),
            value: json!("2023-01-01"),
        };
        let upper = Predicate::Lte {
            field: "orders.created_at".to_string(),
            value: json!("2023-12-31"),
        };
        let mut next = 1;
        assert_eq!(lower.to_sql(&mut next), "orders.created_at >= $1");
        assert_eq!(upper.to_sql(&mut next), "orders.created_at <= $2");
    }
}
