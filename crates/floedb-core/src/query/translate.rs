//! Composition-to-statement rewriting.
//!
//! Each fluent call becomes one rewrite of the select-statement tree, and
//! every legality rule lives here: nothing past this point re-checks
//! composition order, column existence, or value kinds. Rewrites are
//! all-or-nothing; a failed rewrite leaves the statement untouched.

use crate::{
    cql::text::render_value,
    expr::{
        CompareOp, OrderDirection, Ordering, Relation, SelectClause, SelectStatement, Selector,
        Term,
    },
    model::TableModel,
    query::{Cmp, FilterClause, FilterExpr, FilterValue, QueryError},
    value::{CqlKind, Value},
};

/// Seed statement for a table: every schema column, in declaration order.
pub(crate) fn seed<E>(model: &TableModel<E>, default_keyspace: Option<&str>) -> SelectStatement {
    let selectors = model
        .columns
        .iter()
        .map(|column| Selector::column(column.name, column.kind))
        .collect();

    SelectStatement::new(
        SelectClause::Columns {
            selectors,
            distinct: false,
        },
        model.table_ref(default_keyspace),
    )
}

/// Append a predicate as one or more conjunctive relations.
pub(crate) fn apply_filter<E>(
    statement: &mut SelectStatement,
    model: &TableModel<E>,
    expr: &FilterExpr,
) -> Result<(), QueryError> {
    if statement.is_limited() {
        return Err(QueryError::FilterAfterLimit);
    }

    let mut clauses = Vec::new();
    flatten(expr, &mut clauses)?;

    let relations = clauses
        .into_iter()
        .map(|clause| relation_for(statement, model, clause))
        .collect::<Result<Vec<_>, _>>()?;

    statement.relations.extend(relations);
    Ok(())
}

/// Narrow the select list to the named columns.
pub(crate) fn apply_select<E>(
    statement: &mut SelectStatement,
    model: &TableModel<E>,
    columns: &[&str],
) -> Result<(), QueryError> {
    if columns.is_empty() {
        return Err(QueryError::EmptyProjection);
    }

    let selectors = columns
        .iter()
        .map(|name| resolve(statement, model, name))
        .collect::<Result<Vec<_>, _>>()?;

    let distinct = statement.clause.is_distinct();
    statement.clause = SelectClause::Columns {
        selectors,
        distinct,
    };
    Ok(())
}

pub(crate) fn apply_distinct(statement: &mut SelectStatement) -> Result<(), QueryError> {
    if statement.is_limited() {
        return Err(QueryError::DistinctAfterLimit);
    }

    if let SelectClause::Columns { distinct, .. } = &mut statement.clause {
        *distinct = true;
    }
    Ok(())
}

pub(crate) fn apply_order<E>(
    statement: &mut SelectStatement,
    model: &TableModel<E>,
    column: &str,
    direction: OrderDirection,
) -> Result<(), QueryError> {
    if statement.is_limited() {
        return Err(QueryError::OrderAfterLimit);
    }

    let selector = resolve(statement, model, column)?;
    statement.orderings.push(Ordering {
        selector,
        direction,
    });
    Ok(())
}

/// Turn the statement into a `COUNT(*)` aggregate. Orderings are dropped;
/// they cannot change a row count. An existing limit caps the count.
pub(crate) fn apply_count(statement: &mut SelectStatement) -> Result<(), QueryError> {
    if statement.clause.is_distinct() {
        return Err(QueryError::CountWithDistinct);
    }

    statement.clause = SelectClause::Count;
    statement.orderings.clear();
    Ok(())
}

/// Number of positional bind markers the statement carries.
pub(crate) fn param_slots(statement: &SelectStatement) -> usize {
    statement
        .relations
        .iter()
        .filter(|relation| matches!(relation.term, Term::Param(_)))
        .count()
}

// ------------------------------------------------------------------------
// predicate lowering
// ------------------------------------------------------------------------

fn flatten<'a>(expr: &'a FilterExpr, out: &mut Vec<&'a FilterClause>) -> Result<(), QueryError> {
    match expr {
        FilterExpr::Clause(clause) => {
            out.push(clause);
            Ok(())
        }
        FilterExpr::And(parts) => {
            for part in parts {
                flatten(part, out)?;
            }
            Ok(())
        }
        FilterExpr::Or(_) => Err(QueryError::UnsupportedPredicate { construct: "or" }),
        FilterExpr::Not(_) => Err(QueryError::UnsupportedPredicate { construct: "not" }),
    }
}

fn relation_for<E>(
    statement: &SelectStatement,
    model: &TableModel<E>,
    clause: &FilterClause,
) -> Result<Relation, QueryError> {
    let selector = resolve(statement, model, &clause.column)?;
    let kind = selector.kind();

    let term = match &clause.value {
        FilterValue::Bound => Term::Param(kind),
        FilterValue::Constant(value) if clause.cmp == Cmp::In => {
            let candidates = match value {
                Value::List(items) | Value::Set(items) => items.clone(),
                single => vec![single.clone()],
            };
            for candidate in &candidates {
                screen_constant(&clause.column, &kind, candidate)?;
            }
            Term::in_list(candidates)
        }
        FilterValue::Constant(value) => {
            screen_constant(&clause.column, &kind, value)?;
            Term::Constant(value.clone())
        }
    };

    Ok(Relation::new(selector, compare_op(clause.cmp), term))
}

/// Resolve a column name against the statement's current projection.
///
/// Once a projection has narrowed the select list, later compositions may
/// only reference columns that survived the narrowing.
fn resolve<E>(
    statement: &SelectStatement,
    model: &TableModel<E>,
    name: &str,
) -> Result<Selector, QueryError> {
    if let SelectClause::Columns { selectors, .. } = &statement.clause {
        if let Some(selector) = selectors.iter().find(|selector| selector.name() == name) {
            return Ok(selector.clone());
        }
    }

    if model.column(name).is_some() {
        return Err(QueryError::ColumnNotSelected {
            column: name.to_owned(),
        });
    }

    Err(QueryError::UnknownColumn {
        column: name.to_owned(),
        table: model.table,
    })
}

fn screen_constant(column: &str, kind: &CqlKind, value: &Value) -> Result<(), QueryError> {
    if value.is_null() {
        return Err(QueryError::NullComparison {
            column: column.to_owned(),
        });
    }

    if !value.conforms_to(kind) {
        return Err(QueryError::KindMismatch {
            column: column.to_owned(),
            expected: kind.label(),
            found: value.kind_label(),
        });
    }

    // Values that conform can still lack a literal form (inet).
    render_value(value)?;
    Ok(())
}

const fn compare_op(cmp: Cmp) -> CompareOp {
    match cmp {
        Cmp::Eq => CompareOp::Eq,
        Cmp::Gt => CompareOp::Gt,
        Cmp::Gte => CompareOp::Gte,
        Cmp::Lt => CompareOp::Lt,
        Cmp::Lte => CompareOp::Lte,
        Cmp::In => CompareOp::In,
    }
}

///
/// TESTS
///
