//! # Join Composition
//!
//! Single-hop left joins in two directions, with foreign-key inference:
//!
//! - `to`: the current table carries the foreign key, default
//!   `<target_table>_id`, matched against the target's primary key
//!   (`current.target_id = target.pk`).
//! - `from`: the target table carries the foreign key, default
//!   `<current_table>_id`, matched against the current table's primary
//!   key (`current.pk = target.current_id`).
//!
//! Both compile to `LEFT JOIN`, retaining unmatched rows. Joins are
//! appended in declaration order and never deduplicated.

/// Which side of the join carries the foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinDirection {
    To,
    From,
}

/// A declared join against another entity's table.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinSpec {
    pub direction: JoinDirection,
    pub target_table: String,
    pub target_key: String,
    /// Foreign-key column override; inferred from a table name when
    /// absent.
    pub key: Option<String>,
}

impl JoinSpec {
    pub fn to(target_table: &str, target_key: &str) -> Self {
        Self {
            direction: JoinDirection::To,
            target_table: target_table.to_string(),
            target_key: target_key.to_string(),
            key: None,
        }
    }

    pub fn from(target_table: &str, target_key: &str) -> Self {
        Self {
            direction: JoinDirection::From,
            target_table: target_table.to_string(),
            target_key: target_key.to_string(),
            key: None,
        }
    }

    /// Override the inferred foreign-key column.
    pub fn via(mut self, key: &str) -> Self {
        self.key = Some(key.to_string());
        self
    }

    /// Resolve against the owning entity into a concrete join clause.
    pub fn render(&self, current_table: &str, current_key: &str) -> Join {
        match self.direction {
            JoinDirection::To => {
                let fk = self
                    .key
                    .clone()
                    .unwrap_or_else(|| format!("{}_id", self.target_table));
                Join::left(
                    &self.target_table,
                    &format!(
                        "{current_table}.{fk} = {}.{}",
                        self.target_table, self.target_key
                    ),
                )
            }
            JoinDirection::From => {
                let fk = self
                    .key
                    .clone()
                    .unwrap_or_else(|| format!("{current_table}_id"));
                Join::left(
                    &self.target_table,
                    &format!("{current_table}.{current_key} = {}.{fk}", self.target_table),
                )
            }
        }
    }
}

/// A rendered left-join clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub table: String,
    pub on_condition: String,
}

impl Join {
    pub fn left(table: &str, on_condition: &str) -> Self {
        Self {
            table: table.to_string(),
            on_condition: on_condition.to_string(),
        }
    }

    pub fn to_sql(&self) -> String {
        format!("LEFT JOIN {} ON {}", self.table, self.on_condition)
    }
}
