//! Data-modification statement texts.
//!
//! Save builds one statement per pending entity from (column, value) pairs
//! the tracker extracts. Inserts are sparse: null columns are omitted so an
//! insert never writes tombstones for values the entity simply does not
//! carry. Updates do render `null` assignments, since there a null means the
//! column was deliberately cleared.

use crate::{
    cql::{
        text::{quote_ident, render_table, render_value},
        RenderError,
    },
    expr::TableRef,
    value::Value,
};

/// `INSERT INTO <table> (..) VALUES (..);` over the non-null columns.
pub fn build_insert(
    table: &TableRef,
    columns: &[(&'static str, Value)],
) -> Result<String, RenderError> {
    let mut names = Vec::with_capacity(columns.len());
    let mut values = Vec::with_capacity(columns.len());
    for (name, value) in columns {
        if matches!(value, Value::Null) {
            continue;
        }
        names.push(quote_ident(name));
        values.push(render_value(value)?);
    }

    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({});",
        render_table(table),
        names.join(", "),
        values.join(", ")
    ))
}

/// `UPDATE <table> SET .. WHERE <keys>;` over the changed columns.
pub fn build_update(
    table: &TableRef,
    assignments: &[(&'static str, Value)],
    keys: &[(&'static str, Value)],
) -> Result<String, RenderError> {
    Ok(format!(
        "UPDATE {} SET {} WHERE {};",
        render_table(table),
        join_pairs(assignments, ", ")?,
        join_pairs(keys, " AND ")?
    ))
}

/// `DELETE FROM <table> WHERE <keys>;`
pub fn build_delete(
    table: &TableRef,
    keys: &[(&'static str, Value)],
) -> Result<String, RenderError> {
    Ok(format!(
        "DELETE FROM {} WHERE {};",
        render_table(table),
        join_pairs(keys, " AND ")?
    ))
}

fn join_pairs(pairs: &[(&'static str, Value)], separator: &str) -> Result<String, RenderError> {
    let rendered = pairs
        .iter()
        .map(|(name, value)| Ok(format!("{}={}", quote_ident(name), render_value(value)?)))
        .collect::<Result<Vec<_>, RenderError>>()?;

    Ok(rendered.join(separator))
}

///
/// TESTS
///
