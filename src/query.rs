//! # Entity Query Compiler
//!
//! [`EntityQuery`] is the public surface of the crate: an immutable,
//! fluently-built configuration (condition definition, ordering, joins,
//! scope names, projection, grouping, extension hook) paired with a fresh
//! [`QueryPlan`] per compile call, so no plan state survives a request.
//!
//! ## Compilation pipeline
//!
//! 1. Normalize parameters (recursive whitespace trim).
//! 2. Walk the condition definition in declaration order, emitting zero
//!    or one predicate per field; absent and empty parameters are
//!    skipped, shape mismatches abort with a validation error.
//! 3. Apply supported named scopes (capability lookup on the entity).
//! 4. Append declared left joins.
//! 5. Run the caller's plan-mutation hook, if any.
//! 6. Finalize the projection: base selection first, then added columns
//!    in call order, each table-qualified unless already qualified.
//!
//! ## Execution dispatch
//!
//! - [`EntityQuery::first`] - single row, primary-key shorthand for
//!   non-map input, `NotFound` on empty result.
//! - [`EntityQuery::query`] - paginated fetch; grouped pagination when a
//!   group-by field is configured.
//! - [`EntityQuery::query_all`] - unpaginated fetch, plain or grouped.

use std::marker::PhantomData;

use serde_json::Value;
use sqlx::PgPool;
use tracing::{debug, warn};

use crate::definition::{ConditionDefinition, ConditionKind, FieldRule};
use crate::entity::Entity;
use crate::error::{QueryError, Result};
use crate::params::{is_blank, normalize, ParamMap};
use crate::query_builder::{
    qualify, Direction, GroupRow, JoinSpec, Page, Pagination, Predicate, QueryPlan,
};

/// Result of a paginated fetch: either a page of entity rows or, when a
/// group-by field is configured, a page of group rows.
#[derive(Debug)]
pub enum PagedResult<E> {
    Rows(Page<E>),
    Groups(Page<GroupRow>),
}

/// Result of an unpaginated fetch.
#[derive(Debug)]
pub enum ListResult<E> {
    Rows(Vec<E>),
    Groups(Vec<GroupRow>),
}

type PlanMutator = Box<dyn Fn(QueryPlan) -> QueryPlan + Send + Sync>;

/// Declarative query compiler for one entity type.
///
/// Configuration is set once through the chained builder methods; each
/// call to `query`, `query_all` or `first` compiles a fresh plan from the
/// supplied parameters. One instance serves one logical request.
pub struct EntityQuery<E: Entity> {
    condition: ConditionDefinition,
    order: Vec<(String, Direction)>,
    joins: Vec<JoinSpec>,
    scopes: Vec<String>,
    base_select: Option<Vec<String>>,
    added_select: Vec<String>,
    group_field: Option<String>,
    related: Vec<String>,
    mutator: Option<PlanMutator>,
    _entity: PhantomData<E>,
}

impl<E: Entity> Default for EntityQuery<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> EntityQuery<E> {
    pub fn new() -> Self {
        Self {
            condition: ConditionDefinition::new(),
            order: Vec::new(),
            joins: Vec::new(),
            scopes: Vec::new(),
            base_select: None,
            added_select: Vec::new(),
            group_field: None,
            related: Vec::new(),
            mutator: None,
            _entity: PhantomData,
        }
    }

    /// Set the condition definition: which fields are queryable and how.
    pub fn condition(mut self, definition: ConditionDefinition) -> Self {
        self.condition = definition;
        self
    }

    /// Replace the default ordering (primary key, descending).
    pub fn order_by(mut self, order: &[(&str, Direction)]) -> Self {
        self.order = order
            .iter()
            .map(|(field, direction)| (field.to_string(), *direction))
            .collect();
        self
    }

    /// Declare a left join where this entity carries the foreign key
    /// (`self.<target>_id = target.<pk>`).
    pub fn join_to<T: Entity>(mut self) -> Self {
        self.joins.push(JoinSpec::to(T::TABLE, T::PRIMARY_KEY));
        self
    }

    /// [`join_to`](Self::join_to) with an explicit foreign-key column.
    pub fn join_to_via<T: Entity>(mut self, key: &str) -> Self {
        self.joins
            .push(JoinSpec::to(T::TABLE, T::PRIMARY_KEY).via(key));
        self
    }

    /// Declare a left join where the target carries the foreign key
    /// (`self.<pk> = target.<self>_id`).
    pub fn join_from<T: Entity>(mut self) -> Self {
        self.joins.push(JoinSpec::from(T::TABLE, T::PRIMARY_KEY));
        self
    }

    /// [`join_from`](Self::join_from) with an explicit foreign-key column.
    pub fn join_from_via<T: Entity>(mut self, key: &str) -> Self {
        self.joins
            .push(JoinSpec::from(T::TABLE, T::PRIMARY_KEY).via(key));
        self
    }

    /// Request a named scope. Applied only if the entity exposes the
    /// capability; unsupported names are skipped with a warning.
    pub fn use_scope(mut self, name: &str) -> Self {
        self.scopes.push(name.to_string());
        self
    }

    /// Include soft-deleted rows, for entities exposing the
    /// `with_trashed` scope capability. A no-op everywhere else.
    pub fn with_trashed(self) -> Self {
        self.use_scope("with_trashed")
    }

    /// Replace the base projection (default `table.*`). Unqualified
    /// fields are qualified with the entity's table at compile time.
    pub fn select(mut self, fields: &[&str]) -> Self {
        self.base_select = Some(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    /// Accumulate extra projection columns, appended after the base
    /// projection in call order.
    pub fn add_select(mut self, fields: &[&str]) -> Self {
        self.added_select
            .extend(fields.iter().map(|f| f.to_string()));
        self
    }

    /// Group results by a field, switching `query`/`query_all` to the
    /// grouped fetch path.
    pub fn group_by(mut self, field: &str) -> Self {
        self.group_field = Some(field.to_string());
        self
    }

    /// Record relation names for an external hydration layer.
    pub fn with_related(mut self, relations: &[&str]) -> Self {
        self.related.extend(relations.iter().map(|r| r.to_string()));
        self
    }

    /// Install a plan-mutation hook, composed after joins and scopes and
    /// before projection finalization.
    pub fn apply<F>(mut self, mutator: F) -> Self
    where
        F: Fn(QueryPlan) -> QueryPlan + Send + Sync + 'static,
    {
        self.mutator = Some(Box::new(mutator));
        self
    }

    /// Compile the configured definition against a parameter map into a
    /// fresh plan. Ordering and pagination are applied by the execution
    /// entry points, not here.
    pub fn compile(&self, params: &ParamMap) -> Result<QueryPlan> {
        self.compile_with(&self.condition, params)
    }

    fn compile_with(
        &self,
        definition: &ConditionDefinition,
        params: &ParamMap,
    ) -> Result<QueryPlan> {
        let params = normalize(params);
        let mut plan = QueryPlan::new(E::TABLE);

        plan = emit_predicates::<E>(definition, &params, plan)?;

        for name in &self.scopes {
            match E::scope(name) {
                Some(scope) => {
                    debug!(scope = %name, table = E::TABLE, "applying scope");
                    plan = scope(plan);
                }
                None => {
                    warn!(scope = %name, table = E::TABLE, "unsupported scope, skipping");
                }
            }
        }

        for spec in &self.joins {
            plan = plan.join(spec.render(E::TABLE, E::PRIMARY_KEY));
        }

        if let Some(mutator) = &self.mutator {
            plan = mutator(plan);
        }

        let mut select: Vec<String> = match &self.base_select {
            Some(fields) => fields.iter().map(|f| qualify(E::TABLE, f)).collect(),
            None => vec![format!("{}.*", E::TABLE)],
        };
        select.extend(self.added_select.iter().map(|f| qualify(E::TABLE, f)));
        plan = plan.select(select);

        plan = plan.with_related(self.related.clone());

        debug!(
            table = E::TABLE,
            predicates = plan.predicates().len(),
            "compiled plan"
        );
        Ok(plan)
    }

    /// Apply the configured ordering, defaulting to primary key
    /// descending, each field qualified with the entity's table.
    fn apply_order(&self, mut plan: QueryPlan) -> QueryPlan {
        if self.order.is_empty() {
            return plan.order_by(&qualify(E::TABLE, E::PRIMARY_KEY), Direction::Desc);
        }
        for (field, direction) in &self.order {
            plan = plan.order_by(&qualify(E::TABLE, field), *direction);
        }
        plan
    }

    /// Reshape a compiled plan into the grouped fetch: one row per group
    /// value with its count, ordered by the group field.
    fn group_plan(&self, plan: QueryPlan, group_field: &str) -> QueryPlan {
        plan.select(vec![
            format!("CAST({group_field} AS TEXT) AS group_value"),
            "COUNT(*) AS group_count".to_string(),
        ])
        .group_by(group_field)
        .order_by(group_field, Direction::Asc)
    }

    /// Paginated fetch. Dispatches to the grouped path when a group-by
    /// field is configured.
    pub async fn query(&self, pool: &PgPool, params: &ParamMap) -> Result<PagedResult<E>> {
        let plan = self.compile(params)?;
        let pagination = Pagination::from_params(params);

        match &self.group_field {
            None => {
                let plan = self.apply_order(plan);
                let total = plan.count(pool).await?;
                let rows = plan
                    .paginate(pagination.clone())
                    .fetch_all::<E>(pool)
                    .await?;
                Ok(PagedResult::Rows(Page::new(rows, total, &pagination)))
            }
            Some(field) => {
                let group_field = qualify(E::TABLE, field);
                let total = plan.count_distinct(pool, &group_field).await?;
                let groups = self
                    .group_plan(plan, &group_field)
                    .paginate(pagination.clone())
                    .fetch_all::<GroupRow>(pool)
                    .await?;
                Ok(PagedResult::Groups(Page::new(groups, total, &pagination)))
            }
        }
    }

    /// Unpaginated fetch of every matching row (or group).
    pub async fn query_all(&self, pool: &PgPool, params: &ParamMap) -> Result<ListResult<E>> {
        let plan = self.compile(params)?;

        match &self.group_field {
            None => {
                let plan = self.apply_order(plan);
                Ok(ListResult::Rows(plan.fetch_all::<E>(pool).await?))
            }
            Some(field) => {
                let group_field = qualify(E::TABLE, field);
                let groups = self
                    .group_plan(plan, &group_field)
                    .fetch_all::<GroupRow>(pool)
                    .await?;
                Ok(ListResult::Groups(groups))
            }
        }
    }

    /// Fetch exactly one row.
    ///
    /// A non-map argument is a primary-key lookup: the configured
    /// condition definition is replaced by a single `Term` condition on
    /// the key column. A map argument replaces it with an inferred
    /// definition over the map's own keys. Fails with
    /// [`QueryError::NotFound`] when nothing matches.
    pub async fn first(&self, pool: &PgPool, params: Value) -> Result<E> {
        let (definition, params) = match params {
            Value::Object(map) => (ConditionDefinition::inferred_from_keys(&map), map),
            key => {
                let mut map = ParamMap::new();
                map.insert(E::PRIMARY_KEY.to_string(), key);
                (
                    ConditionDefinition::new().field(E::PRIMARY_KEY, ConditionKind::Term),
                    map,
                )
            }
        };

        let plan = self
            .compile_with(&definition, &params)?
            .paginate(Pagination::limit_only(1));
        plan.fetch_optional::<E>(pool)
            .await?
            .ok_or(QueryError::NotFound)
    }
}

/// Walk the definition in declaration order and emit predicates per the
/// permissive-filter rules: absent, null and empty values are skipped;
/// the only hard failure is a list-shaped value against a scalar kind.
fn emit_predicates<E: Entity>(
    definition: &ConditionDefinition,
    params: &ParamMap,
    mut plan: QueryPlan,
) -> Result<QueryPlan> {
    for (field, rule) in definition.entries() {
        let Some(param) = params.get(field) else {
            continue;
        };
        if param.is_null() {
            continue;
        }

        let kind = match rule {
            FieldRule::Explicit(kind) => kind,
            FieldRule::Inferred => {
                if param.is_array() {
                    ConditionKind::Terms
                } else {
                    ConditionKind::Term
                }
            }
        };

        if is_blank(param) {
            continue;
        }

        // Lists are only meaningful for Terms and Range; JSON objects are
        // not a valid parameter shape for any kind.
        let list_shaped = param.is_array();
        if (list_shaped && !matches!(kind, ConditionKind::Terms | ConditionKind::Range))
            || param.is_object()
        {
            return Err(QueryError::Validation(field.to_string()));
        }

        let qualified = format!("{}.{field}", E::TABLE);

        match kind {
            ConditionKind::Term => {
                plan = plan.predicate(Predicate::Eq {
                    field: qualified,
                    value: param.clone(),
                });
            }
            ConditionKind::Terms => {
                let values = match param {
                    Value::Array(items) => items.clone(),
                    Value::String(s) => s
                        .split(',')
                        .map(|part| Value::String(part.to_string()))
                        .collect(),
                    other => vec![other.clone()],
                };
                plan = plan.predicate(Predicate::In {
                    field: qualified,
                    values,
                });
            }
            ConditionKind::Fuzzy => {
                plan = plan.predicate(Predicate::Like {
                    field: qualified,
                    pattern: format!("%{}%", scalar_text(param)),
                });
            }
            ConditionKind::Range => {
                // A scalar against a Range kind degrades to "no filter".
                let Value::Array(bounds) = param else {
                    continue;
                };
                if bounds.len() > 2 {
                    warn!(
                        field,
                        elements = bounds.len(),
                        "range parameter has more than two elements, extras ignored"
                    );
                }
                if let Some(lower) = bounds.first().filter(|v| !v.is_null()) {
                    plan = plan.predicate(Predicate::Gte {
                        field: qualified.clone(),
                        value: lower.clone(),
                    });
                }
                if let Some(upper) = bounds.get(1).filter(|v| !v.is_null()) {
                    plan = plan.predicate(Predicate::Lte {
                        field: qualified,
                        value: upper.clone(),
                    });
                }
            }
        }
    }

    Ok(plan)
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        // Arrays and objects are rejected before this point.
        other => other.to_string(),
    }
}
