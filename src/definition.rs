//! # Condition Definitions
//!
//! The small grammar describing which fields of an entity are queryable
//! and how. Each entry pairs a field name with either an explicit
//! [`ConditionKind`] or the inferred shorthand, where the kind is resolved
//! once per compile from the runtime shape of the supplied parameter
//! (list → `Terms`, anything else → `Term`).

use crate::params::ParamMap;

/// The four supported condition kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    /// Exact equality (`=`).
    Term,
    /// Set membership (`IN`). The value may arrive as a list or as a
    /// comma-separated string; both compile to the same predicate.
    Terms,
    /// Substring match (`LIKE '%value%'`).
    Fuzzy,
    /// Two-element `[min, max]` bound pair; either bound may be omitted
    /// independently (`>=` / `<=`).
    Range,
}

/// How the kind for a field is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// The kind was declared up front.
    Explicit(ConditionKind),
    /// Resolved per compile from the parameter's shape.
    Inferred,
}

/// Ordered mapping from field name to rule. Field names are unique within
/// one definition: redeclaring a field replaces its rule in place.
#[derive(Debug, Clone, Default)]
pub struct ConditionDefinition {
    entries: Vec<(String, FieldRule)>,
}

impl ConditionDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field with an explicit condition kind.
    pub fn field(self, name: &str, kind: ConditionKind) -> Self {
        self.push(name, FieldRule::Explicit(kind))
    }

    /// Declare a field using the inferred shorthand.
    pub fn inferred(self, name: &str) -> Self {
        self.push(name, FieldRule::Inferred)
    }

    fn push(mut self, name: &str, rule: FieldRule) -> Self {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = rule,
            None => self.entries.push((name.to_string(), rule)),
        }
        self
    }

    /// Build a definition from the keys of a parameter map, every field
    /// using the inferred shorthand. Used by primary-key-less `first`
    /// lookups, where the caller's map is both definition and input.
    pub fn inferred_from_keys(params: &ParamMap) -> Self {
        params
            .keys()
            .fold(Self::new(), |def, key| def.inferred(key))
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, FieldRule)> {
        self.entries.iter().map(|(name, rule)| (name.as_str(), *rule))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_declaration_order_preserved() {
        let def = ConditionDefinition::new()
            .field("status", ConditionKind::Term)
            .field("tags", ConditionKind::Terms)
            .inferred("team_id");

        let names: Vec<&str> = def.entries().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["status", "tags", "team_id"]);
    }

    #[test]
    fn test_redeclaration_replaces_in_place() {
        let def = ConditionDefinition::new()
            .field("status", ConditionKind::Term)
            .field("name", ConditionKind::Fuzzy)
            .field("status", ConditionKind::Terms);

        assert_eq!(def.len(), 2);
        let (name, rule) = def.entries().next().unwrap();
        assert_eq!(name, "status");
        assert_eq!(rule, FieldRule::Explicit(ConditionKind::Terms));
    }

    #[test]
    fn test_inferred_from_keys() {
        let params = match json!({"email": "a@b.c", "team_id": [1, 2]}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        let def = ConditionDefinition::inferred_from_keys(&params);
        assert_eq!(def.len(), 2);
        assert!(def.entries().all(|(_, rule)| rule == FieldRule::Inferred));
    }
}
