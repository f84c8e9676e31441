//! Integration tests for the condition compiler, asserting over compiled
//! SQL and bind lists through the public API only. No database required.

use chrono::NaiveDate;
use paramquery::{
    ConditionDefinition, ConditionKind, Direction, Entity, EntityQuery, ParamMap, Predicate,
    QueryError,
};
use proptest::prelude::*;
use serde_json::{json, Value};

#[derive(Debug, sqlx::FromRow)]
struct User {
    #[allow(dead_code)]
    id: i64,
}

impl Entity for User {
    const TABLE: &'static str = "users";
    const PRIMARY_KEY: &'static str = "id";

    fn scope(name: &str) -> Option<paramquery::ScopeFn> {
        match name {
            "with_trashed" => Some(|plan| plan),
            "active" => Some(|plan| {
                plan.predicate(Predicate::Eq {
                    field: "users.deleted_at".to_string(),
                    value: Value::Null,
                })
            }),
            _ => None,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct Order {
    #[allow(dead_code)]
    id: i64,
}

impl Entity for Order {
    const TABLE: &'static str = "orders";
    const PRIMARY_KEY: &'static str = "id";
}

fn params(value: Value) -> ParamMap {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected object"),
    }
}

#[test]
fn compiles_configured_pipeline_end_to_end() {
    let query = EntityQuery::<Order>::new()
        .condition(
            ConditionDefinition::new()
                .field("status", ConditionKind::Term)
                .field("total", ConditionKind::Range),
        )
        .join_to::<User>()
        .add_select(&["users.name"]);

    let plan = query
        .compile(&params(json!({"status": "paid", "total": [100, null]})))
        .unwrap();

    assert_eq!(
        plan.build_sql(),
        "SELECT orders.*, users.name FROM orders \
         LEFT JOIN users ON orders.users_id = users.id \
         WHERE orders.status = $1 AND orders.total >= $2"
    );
    assert_eq!(plan.bind_values(), vec![json!("paid"), json!(100)]);
}

#[test]
fn validation_error_carries_field_name() {
    let query = EntityQuery::<User>::new()
        .condition(ConditionDefinition::new().field("name", ConditionKind::Fuzzy));
    let err = query.compile(&params(json!({"name": ["jo"]}))).unwrap_err();
    assert_eq!(err.to_string(), "field name format invalid");
    assert!(matches!(err, QueryError::Validation(_)));
}

#[test]
fn join_key_overrides_compose_with_inference() {
    let query = EntityQuery::<Order>::new()
        .join_to_via::<User>("buyer_id")
        .join_from_via::<User>("last_order_id");

    let plan = query.compile(&params(json!({}))).unwrap();
    assert_eq!(
        plan.build_sql(),
        "SELECT orders.* FROM orders \
         LEFT JOIN users ON orders.buyer_id = users.id \
         LEFT JOIN users ON orders.id = users.last_order_id"
    );
}

#[test]
fn scope_capabilities_are_opportunistic() {
    let supported = EntityQuery::<User>::new().use_scope("active");
    assert_eq!(
        supported.compile(&params(json!({}))).unwrap().predicates().len(),
        1
    );

    // Order exposes no scopes; the same configuration is a no-op.
    let unsupported = EntityQuery::<Order>::new().use_scope("active");
    assert!(unsupported
        .compile(&params(json!({})))
        .unwrap()
        .predicates()
        .is_empty());
}

#[test]
fn trimming_applies_before_emptiness_checks() {
    let query = EntityQuery::<User>::new()
        .condition(ConditionDefinition::new().field("name", ConditionKind::Fuzzy));

    // A parameter that is only whitespace trims to empty and is skipped.
    let plan = query.compile(&params(json!({"name": "  "}))).unwrap();
    assert!(plan.predicates().is_empty());

    // A padded value trims before the wildcards are added.
    let plan = query.compile(&params(json!({"name": " jo "}))).unwrap();
    assert_eq!(plan.bind_values(), vec![json!("%jo%")]);
}

#[test]
fn range_accepts_date_bounds() {
    let query = EntityQuery::<Order>::new()
        .condition(ConditionDefinition::new().field("created_at", ConditionKind::Range));

    let since = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap().to_string();
    let until = NaiveDate::from_ymd_opt(2023, 6, 30).unwrap().to_string();
    let plan = query
        .compile(&params(json!({"created_at": [since, until]})))
        .unwrap();

    assert_eq!(
        plan.build_sql(),
        "SELECT orders.* FROM orders \
         WHERE orders.created_at >= $1 AND orders.created_at <= $2"
    );
    assert_eq!(
        plan.bind_values(),
        vec![json!("2023-01-01"), json!("2023-06-30")]
    );
}

#[test]
fn ordering_direction_parsing_is_case_insensitive() {
    assert_eq!(Direction::parse("DESC"), Some(Direction::Desc));
    assert_eq!(Direction::parse("Asc"), Some(Direction::Asc));
    assert_eq!(Direction::parse("up"), None);
}

proptest! {
    /// TERM with an empty (or whitespace-only) string never emits a
    /// predicate; any other string emits exactly one.
    #[test]
    fn term_emptiness_absorption(value in "[ a-z]{0,8}") {
        let query = EntityQuery::<User>::new()
            .condition(ConditionDefinition::new().field("status", ConditionKind::Term));
        let plan = query.compile(&params(json!({"status": value.clone()}))).unwrap();
        let expected = usize::from(!value.trim().is_empty());
        prop_assert_eq!(plan.predicates().len(), expected);
    }

    /// RANGE emits exactly as many predicates as non-null bounds among
    /// the first two elements.
    #[test]
    fn range_bound_counts(
        lower in proptest::option::of(0i64..1000),
        upper in proptest::option::of(0i64..1000),
    ) {
        let query = EntityQuery::<User>::new()
            .condition(ConditionDefinition::new().field("age", ConditionKind::Range));
        let bounds = json!([lower, upper]);
        let plan = query.compile(&params(json!({"age": bounds}))).unwrap();
        let expected = usize::from(lower.is_some()) + usize::from(upper.is_some());
        prop_assert_eq!(plan.predicates().len(), expected);
    }

    /// A comma-separated string and the equivalent literal list compile
    /// to the same predicate, SQL and binds.
    #[test]
    fn terms_string_list_equivalence(parts in proptest::collection::vec("[a-z0-9]{1,5}", 1..5)) {
        let query = EntityQuery::<User>::new()
            .condition(ConditionDefinition::new().field("tags", ConditionKind::Terms));

        let joined = parts.join(",");
        let from_string = query.compile(&params(json!({"tags": joined}))).unwrap();
        let from_list = query.compile(&params(json!({"tags": parts}))).unwrap();

        prop_assert_eq!(from_string.build_sql(), from_list.build_sql());
        prop_assert_eq!(from_string.bind_values(), from_list.bind_values());
    }

    /// Compiling the same definition and parameters through two fresh
    /// instances yields structurally identical plans.
    #[test]
    fn compilation_idempotence(
        status in proptest::option::of("[a-z]{1,8}"),
        team_ids in proptest::collection::vec(0i64..100, 0..4),
    ) {
        let build = || {
            EntityQuery::<User>::new().condition(
                ConditionDefinition::new()
                    .field("status", ConditionKind::Term)
                    .inferred("team_id"),
            )
        };
        let mut input = ParamMap::new();
        if let Some(status) = &status {
            input.insert("status".to_string(), json!(status));
        }
        input.insert("team_id".to_string(), json!(team_ids));

        let first = build().compile(&input).unwrap();
        let second = build().compile(&input).unwrap();
        prop_assert_eq!(first.build_sql(), second.build_sql());
        prop_assert_eq!(first.bind_values(), second.bind_values());
    }
}
