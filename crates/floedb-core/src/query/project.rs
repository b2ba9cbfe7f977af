//! Row materialization.
//!
//! A [`Projector`] turns decoded driver rows back into values the caller
//! asked for: whole entities for identity projections, generic value rows
//! for narrowed ones. Select-list order fixes the row ordinals, so the
//! projector is built from the same statement that produced the text.

use crate::{
    driver::Row,
    error::{Error, InternalError},
    expr::{SelectClause, SelectStatement, Selector},
    traits::Entity,
    value::{CqlKind, Value},
};
use derive_more::{Deref, IntoIterator};
use std::marker::PhantomData;

///
/// ValueRow
///
/// One materialized row of a narrowed projection: selected columns in
/// select-list order, each paired with its value. Null cells stay present
/// as explicit nulls so ordinals keep their meaning.
///

#[derive(Clone, Debug, Default, Deref, IntoIterator, PartialEq)]
pub struct ValueRow {
    #[deref]
    #[into_iterator(owned, ref)]
    columns: Vec<(String, Value)>,
}

impl ValueRow {
    pub(crate) const fn new(columns: Vec<(String, Value)>) -> Self {
        Self { columns }
    }

    /// Value of the first column with this name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    /// Value at a select-list ordinal.
    #[must_use]
    pub fn at(&self, ordinal: usize) -> Option<&Value> {
        self.columns.get(ordinal).map(|(_, value)| value)
    }
}

///
/// Projector
///
/// Compiled materializer for one statement's select list.
///

#[derive(Clone, Debug)]
pub struct Projector<E: Entity> {
    selectors: Vec<Selector>,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Entity> Projector<E> {
    pub(crate) fn from_statement(statement: &SelectStatement) -> Self {
        let selectors = match &statement.clause {
            SelectClause::Columns { selectors, .. } => selectors.clone(),
            // Aggregates and star clauses carry no per-column projection.
            SelectClause::All | SelectClause::Count => Vec::new(),
        };

        Self {
            selectors,
            _marker: PhantomData,
        }
    }

    /// Rebuild a full entity from an identity-projection row.
    ///
    /// Starts from `E::default()` and writes each non-null cell through the
    /// model's column accessor, so null cells keep the field's default.
    pub fn entity_row(&self, row: &dyn Row) -> Result<E, Error> {
        self.check_width(row)?;

        let mut entity = E::default();
        for (ordinal, selector) in self.selectors.iter().enumerate() {
            let Selector::Column { name, .. } = selector else {
                return Err(InternalError::projection_corruption(format!(
                    "entity construction cannot materialize call selector {}",
                    selector.name()
                ))
                .into());
            };

            if row.is_null(ordinal) {
                continue;
            }

            let value = row.cell(ordinal)?.clone();
            let column = E::MODEL.column(name).ok_or_else(|| {
                InternalError::projection_corruption(format!(
                    "selected column {name} is missing from the schema model"
                ))
            })?;
            column.write(&mut entity, value)?;
        }

        Ok(entity)
    }

    /// Materialize a narrowed-projection row.
    ///
    /// Token selectors keep the partitioner's raw cell wrapped in
    /// [`Value::Token`] instead of coercing it to a column kind.
    pub fn value_row(&self, row: &dyn Row) -> Result<ValueRow, Error> {
        self.check_width(row)?;

        let columns = self
            .selectors
            .iter()
            .enumerate()
            .map(|(ordinal, selector)| {
                let cell = row.get(ordinal).cloned().unwrap_or(Value::Null);
                let value = if selector.kind() == CqlKind::Token
                    && !matches!(cell, Value::Null | Value::Token(_))
                {
                    Value::Token(Box::new(cell))
                } else {
                    cell
                };
                (selector.name().to_owned(), value)
            })
            .collect();

        Ok(ValueRow::new(columns))
    }

    fn check_width(&self, row: &dyn Row) -> Result<(), Error> {
        if row.len() < self.selectors.len() {
            return Err(InternalError::projection_corruption(format!(
                "row carries {} columns but the select list names {}",
                row.len(),
                self.selectors.len()
            ))
            .into());
        }
        Ok(())
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::Error,
        model::{ColumnModel, ColumnRole, TableModel},
        query::translate,
        value::{CqlKind, MappingError},
    };

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Probe {
        id: i32,
        value: Option<String>,
    }

    impl Entity for Probe {
        const MODEL: &'static TableModel<Self> = &TableModel {
            table: "myvalue",
            keyspace: None,
            columns: &[
                ColumnModel {
                    name: "id",
                    kind: CqlKind::Int,
                    role: ColumnRole::PartitionKey,
                    get: |e| Value::Int(e.id),
                    set: |e, v| {
                        e.id = v.into_int()?;
                        Ok(())
                    },
                },
                ColumnModel {
                    name: "value",
                    kind: CqlKind::Text,
                    role: ColumnRole::Regular,
                    get: |e| Value::from(e.value.clone()),
                    set: |e, v| {
                        e.value = if v.is_null() { None } else { Some(v.into_text()?) };
                        Ok(())
                    },
                },
            ],
        };
    }

    struct TestRow(Vec<Value>);

    impl Row for TestRow {
        fn len(&self) -> usize {
            self.0.len()
        }

        fn get(&self, ordinal: usize) -> Option<&Value> {
            self.0.get(ordinal)
        }
    }

    fn identity_projector() -> Projector<Probe> {
        Projector::from_statement(&translate::seed(Probe::MODEL, None))
    }

    #[test]
    fn null_cells_keep_the_field_default() {
        let projector = identity_projector();

        let full = projector
            .entity_row(&TestRow(vec![Value::Int(7), Value::from("hello")]))
            .expect("full row must materialize");
        assert_eq!(
            full,
            Probe {
                id: 7,
                value: Some("hello".to_owned())
            }
        );

        let sparse = projector
            .entity_row(&TestRow(vec![Value::Int(7), Value::Null]))
            .expect("sparse row must materialize");
        assert_eq!(sparse, Probe { id: 7, value: None });
    }

    #[test]
    fn value_rows_keep_selector_order_and_nulls() {
        let mut statement = translate::seed(Probe::MODEL, None);
        translate::apply_select(&mut statement, Probe::MODEL, &["value", "id"])
            .expect("narrowing must be legal");
        let projector: Projector<Probe> = Projector::from_statement(&statement);

        let row = projector
            .value_row(&TestRow(vec![Value::Null, Value::Int(3)]))
            .expect("narrow row must materialize");

        assert_eq!(row.len(), 2);
        assert_eq!(row.at(0), Some(&Value::Null));
        assert_eq!(row.get("id"), Some(&Value::Int(3)));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn token_selectors_pass_the_raw_cell_through() {
        let mut statement = translate::seed(Probe::MODEL, None);
        statement.clause = SelectClause::Columns {
            selectors: vec![Selector::call(
                "token",
                CqlKind::Token,
                vec![Selector::column("id", CqlKind::Int)],
            )],
            distinct: false,
        };
        let projector: Projector<Probe> = Projector::from_statement(&statement);

        let row = projector
            .value_row(&TestRow(vec![Value::BigInt(i64::MIN)]))
            .expect("token row must materialize");

        assert_eq!(
            row.get("token"),
            Some(&Value::Token(Box::new(Value::BigInt(i64::MIN))))
        );
    }

    #[test]
    fn narrow_rows_are_reported_as_corruption() {
        let projector = identity_projector();
        let err = projector
            .entity_row(&TestRow(vec![Value::Int(7)]))
            .expect_err("a one-cell row cannot fill a two-column select list");

        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn driver_kind_drift_surfaces_as_a_mapping_error() {
        let projector = identity_projector();
        let err = projector
            .entity_row(&TestRow(vec![Value::from("seven"), Value::Null]))
            .expect_err("a text cell cannot fill an int column");

        assert!(matches!(
            err,
            Error::Mapping(MappingError::KindMismatch { .. })
        ));
    }
}
