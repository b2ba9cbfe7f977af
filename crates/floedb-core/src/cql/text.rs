//! Statement-tree to query-text rendering.
//!
//! Rendering is deterministic and purely syntactic: clause order is fixed,
//! identifiers are double-quoted with embedded quotes doubled, and literal
//! forms are chosen by the value's kind. All composition legality has been
//! enforced before a tree gets here.

use crate::{
    cql::RenderError,
    expr::{CompareOp, Ordering, Relation, SelectClause, SelectStatement, Selector, TableRef, Term},
    value::Value,
};
use std::fmt::Write;

/// Render a complete SELECT statement, terminal semicolon included.
pub fn render_select(stmt: &SelectStatement) -> Result<String, RenderError> {
    let mut out = String::from("SELECT ");
    out.push_str(&render_clause(&stmt.clause)?);
    out.push_str(" FROM ");
    out.push_str(&render_table(&stmt.table));

    if !stmt.relations.is_empty() {
        out.push_str(" WHERE ");
        let relations = stmt
            .relations
            .iter()
            .map(render_relation)
            .collect::<Result<Vec<_>, _>>()?;
        out.push_str(&relations.join(" AND "));
    }

    if !stmt.orderings.is_empty() {
        out.push_str(" ORDER BY ");
        let orderings: Vec<_> = stmt.orderings.iter().map(render_ordering).collect();
        out.push_str(&orderings.join(","));
    }

    if let Some(limit) = stmt.limit {
        let _ = write!(out, " LIMIT {limit}");
    }

    if stmt.allow_filtering {
        out.push_str(" ALLOW FILTERING");
    }

    out.push(';');
    Ok(out)
}

/// Double-quoted identifier with embedded quotes doubled.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Table reference, keyspace-qualified when the ref carries one.
#[must_use]
pub fn render_table(table: &TableRef) -> String {
    match table.keyspace {
        Some(keyspace) => format!("{}.{}", quote_ident(keyspace), quote_ident(table.name)),
        None => quote_ident(table.name),
    }
}

fn render_clause(clause: &SelectClause) -> Result<String, RenderError> {
    match clause {
        SelectClause::All => Ok("*".to_owned()),
        SelectClause::Count => Ok("COUNT(*)".to_owned()),
        SelectClause::Columns {
            selectors,
            distinct,
        } => {
            let rendered: Vec<_> = selectors.iter().map(render_selector).collect();
            let prefix = if *distinct { "DISTINCT " } else { "" };
            Ok(format!("{prefix}{}", rendered.join(",")))
        }
    }
}

fn render_selector(selector: &Selector) -> String {
    match selector {
        Selector::Column { name, .. } => quote_ident(name),
        Selector::Call { name, args, .. } => {
            let rendered: Vec<_> = args.iter().map(render_selector).collect();
            format!("{}({})", name.to_lowercase(), rendered.join(","))
        }
    }
}

fn render_ordering(ordering: &Ordering) -> String {
    format!(
        "{} {}",
        render_selector(&ordering.selector),
        ordering.direction.keyword()
    )
}

fn render_relation(relation: &Relation) -> Result<String, RenderError> {
    let selector = render_selector(&relation.selector);

    if relation.op == CompareOp::In {
        let inner = match &relation.term {
            Term::List(terms) | Term::Set(terms) => {
                let rendered = terms.iter().map(render_term).collect::<Result<Vec<_>, _>>()?;
                rendered.join(",")
            }
            other => render_term(other)?,
        };
        return Ok(format!("{selector} IN ({inner})"));
    }

    Ok(format!(
        "{selector}{}{}",
        relation.op.symbol(),
        render_term(&relation.term)?
    ))
}

fn render_term(term: &Term) -> Result<String, RenderError> {
    match term {
        Term::Constant(value) => render_value(value),
        Term::Param(_) => Ok("?".to_owned()),
        Term::List(terms) => {
            let rendered = terms.iter().map(render_term).collect::<Result<Vec<_>, _>>()?;
            Ok(format!("[{}]", rendered.join(",")))
        }
        Term::Set(terms) => {
            let rendered = terms.iter().map(render_term).collect::<Result<Vec<_>, _>>()?;
            Ok(format!("{{{}}}", rendered.join(",")))
        }
        Term::Map(entries) => {
            let rendered = entries
                .iter()
                .map(|(k, v)| Ok(format!("{}:{}", render_term(k)?, render_term(v)?)))
                .collect::<Result<Vec<_>, RenderError>>()?;
            Ok(format!("{{{}}}", rendered.join(",")))
        }
        Term::Call { name, args } => {
            let rendered = args.iter().map(render_term).collect::<Result<Vec<_>, _>>()?;
            Ok(format!("{}({})", name.to_lowercase(), rendered.join(",")))
        }
    }
}

/// Literal form of a runtime value.
///
/// `null` renders as the bare keyword: it appears in UPDATE assignments when
/// a column was cleared, never in comparisons (validation rejects those).
/// Inet values have no literal form in the query language and are refused.
pub fn render_value(value: &Value) -> Result<String, RenderError> {
    match value {
        Value::Text(v) => Ok(format!("'{}'", v.replace('\'', "''"))),
        Value::Bool(v) => Ok(if *v { "true" } else { "false" }.to_owned()),
        Value::Int(v) => Ok(v.to_string()),
        Value::BigInt(v) | Value::Timestamp(v) => Ok(v.to_string()),
        Value::Float(v) => Ok(format!("{v:E}")),
        Value::Double(v) => Ok(format!("{v:E}")),
        Value::Decimal(v) => Ok(v.to_string()),
        Value::Uuid(v) | Value::TimeUuid(v) => Ok(v.to_string()),
        Value::Varint(v) => Ok(v.to_string()),
        Value::Blob(bytes) => {
            let mut out = String::with_capacity(2 + bytes.len() * 2);
            out.push_str("0x");
            for byte in bytes {
                let _ = write!(out, "{byte:02x}");
            }
            Ok(out)
        }
        Value::List(items) => {
            let rendered = items.iter().map(render_value).collect::<Result<Vec<_>, _>>()?;
            Ok(format!("[{}]", rendered.join(",")))
        }
        Value::Set(items) => {
            let rendered = items.iter().map(render_value).collect::<Result<Vec<_>, _>>()?;
            Ok(format!("{{{}}}", rendered.join(",")))
        }
        Value::Map(entries) => {
            let rendered = entries
                .iter()
                .map(|(k, v)| Ok(format!("{}:{}", render_value(k)?, render_value(v)?)))
                .collect::<Result<Vec<_>, RenderError>>()?;
            Ok(format!("{{{}}}", rendered.join(",")))
        }
        Value::Null => Ok("null".to_owned()),
        Value::Token(inner) => render_value(inner),
        Value::Inet(_) => Err(RenderError::NoLiteralForm { kind: "inet" }),
    }
}

///
/// TESTS
///
