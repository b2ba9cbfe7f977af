//! Compiled query plans.
//!
//! A plan carries everything needed to run one SELECT repeatedly: the
//! rendered text, bound parameters, the projector, tracking eligibility,
//! and execution hints. Plans never cache results; every call re-issues the
//! query, so two enumerations mean two round trips.

use crate::{
    cql::text::render_select,
    driver::{QueryOptions, Row, RowSource, Statement},
    error::Error,
    expr::SelectStatement,
    obs::StatementKind,
    query::{translate, Projector, QueryError, ValueRow},
    session::{CancelToken, Session},
    traits::Entity,
    value::Value,
};
use std::marker::PhantomData;

///
/// QueryPlan
///
/// `T` is the row shape: the entity itself for identity projections, or
/// [`ValueRow`] once a projection narrowed the select list.
///

#[derive(Clone, Debug)]
pub struct QueryPlan<E: Entity, T = E> {
    text: String,
    params: Vec<Value>,
    slots: usize,
    projector: Projector<E>,
    trackable: bool,
    options: QueryOptions,
    _marker: PhantomData<fn() -> T>,
}

impl<E: Entity, T> QueryPlan<E, T> {
    pub(crate) fn compile(
        statement: &SelectStatement,
        trackable: bool,
        options: QueryOptions,
    ) -> Result<Self, Error> {
        let text = render_select(statement)?;

        Ok(Self {
            text,
            params: Vec::new(),
            slots: translate::param_slots(statement),
            projector: Projector::from_statement(statement),
            trackable,
            options,
            _marker: PhantomData,
        })
    }

    /// The exact statement text this plan executes.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn is_trackable(&self) -> bool {
        self.trackable
    }

    /// Number of positional bind markers in the text.
    #[must_use]
    pub const fn param_slots(&self) -> usize {
        self.slots
    }

    /// Bind positional parameters, in marker order.
    pub fn bind(mut self, params: Vec<Value>) -> Result<Self, Error> {
        if params.len() != self.slots {
            return Err(QueryError::ParamArity {
                expected: self.slots,
                found: params.len(),
            }
            .into());
        }

        self.params = params;
        Ok(self)
    }

    /// Count execution: reads the aggregate scalar off the first row.
    pub(crate) fn scalar_count(&self, session: &Session) -> Result<i64, Error> {
        let Some(mut source) = self.open_source(session)? else {
            return Ok(0);
        };

        match source.next_row()? {
            Some(row) => Ok(row.bigint(0)?.unwrap_or(0)),
            None => Ok(0),
        }
    }

    fn open_source(&self, session: &Session) -> Result<Option<Box<dyn RowSource>>, Error> {
        self.check_bound()?;
        if !session.log_statement(StatementKind::Query, &self.text) {
            return Ok(None);
        }

        session.ensure_open()?;
        let statement = Statement::with_params(self.text.clone(), self.params.clone());
        let source = session
            .driver()
            .query(&statement, &session.merge_options(&self.options))?;
        Ok(Some(source))
    }

    async fn open_source_async(
        &self,
        session: &Session,
        cancel: &CancelToken,
    ) -> Result<Option<Box<dyn RowSource>>, Error> {
        self.check_bound()?;
        if !session.log_statement(StatementKind::Query, &self.text) {
            return Ok(None);
        }

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        session.ensure_open_async().await?;

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let statement = Statement::with_params(self.text.clone(), self.params.clone());
        let source = session
            .driver()
            .query_async(&statement, &session.merge_options(&self.options))
            .await?;
        Ok(Some(source))
    }

    fn check_bound(&self) -> Result<(), Error> {
        if self.params.len() == self.slots {
            Ok(())
        } else {
            Err(QueryError::ParamArity {
                expected: self.slots,
                found: self.params.len(),
            }
            .into())
        }
    }
}

// ------------------------------------------------------------------------
// identity projections
// ------------------------------------------------------------------------

impl<E: Entity> QueryPlan<E, E> {
    /// All matching entities. Tracked instances win over fresh copies when
    /// the plan is trackable.
    pub fn rows(&self, session: &Session) -> Result<Vec<E>, Error> {
        self.gather(session, None)
    }

    pub async fn rows_async(
        &self,
        session: &Session,
        cancel: &CancelToken,
    ) -> Result<Vec<E>, Error> {
        let Some(mut source) = self.open_source_async(session, cancel).await? else {
            return Ok(Vec::new());
        };

        let mut out = Vec::new();
        while let Some(row) = source.next_row()? {
            out.push(self.adopt(session, row.as_ref())?);
        }
        Ok(out)
    }

    pub fn first(&self, session: &Session) -> Result<Option<E>, Error> {
        Ok(self.gather(session, Some(1))?.pop())
    }

    /// At most one matching entity; a second row is a composition error.
    pub fn single(&self, session: &Session) -> Result<Option<E>, Error> {
        let mut rows = self.gather(session, Some(2))?;
        if rows.len() > 1 {
            return Err(QueryError::MultipleRows.into());
        }
        Ok(rows.pop())
    }

    pub fn any(&self, session: &Session) -> Result<bool, Error> {
        Ok(!self.gather(session, Some(1))?.is_empty())
    }

    fn gather(&self, session: &Session, cap: Option<usize>) -> Result<Vec<E>, Error> {
        let Some(mut source) = self.open_source(session)? else {
            return Ok(Vec::new());
        };

        let mut out = Vec::new();
        while let Some(row) = source.next_row()? {
            out.push(self.adopt(session, row.as_ref())?);
            if cap.is_some_and(|cap| out.len() >= cap) {
                break;
            }
        }
        Ok(out)
    }

    fn adopt(&self, session: &Session, row: &dyn Row) -> Result<E, Error> {
        let entity = self.projector.entity_row(row)?;
        if self.trackable {
            session.tracker::<E>().adopt(entity)
        } else {
            Ok(entity)
        }
    }
}

// ------------------------------------------------------------------------
// narrowed projections
// ------------------------------------------------------------------------

impl<E: Entity> QueryPlan<E, ValueRow> {
    pub fn rows(&self, session: &Session) -> Result<Vec<ValueRow>, Error> {
        self.gather(session, None)
    }

    pub async fn rows_async(
        &self,
        session: &Session,
        cancel: &CancelToken,
    ) -> Result<Vec<ValueRow>, Error> {
        let Some(mut source) = self.open_source_async(session, cancel).await? else {
            return Ok(Vec::new());
        };

        let mut out = Vec::new();
        while let Some(row) = source.next_row()? {
            out.push(self.projector.value_row(row.as_ref())?);
        }
        Ok(out)
    }

    pub fn first(&self, session: &Session) -> Result<Option<ValueRow>, Error> {
        Ok(self.gather(session, Some(1))?.pop())
    }

    pub fn single(&self, session: &Session) -> Result<Option<ValueRow>, Error> {
        let mut rows = self.gather(session, Some(2))?;
        if rows.len() > 1 {
            return Err(QueryError::MultipleRows.into());
        }
        Ok(rows.pop())
    }

    pub fn any(&self, session: &Session) -> Result<bool, Error> {
        Ok(!self.gather(session, Some(1))?.is_empty())
    }

    fn gather(&self, session: &Session, cap: Option<usize>) -> Result<Vec<ValueRow>, Error> {
        let Some(mut source) = self.open_source(session)? else {
            return Ok(Vec::new());
        };

        let mut out = Vec::new();
        while let Some(row) = source.next_row()? {
            out.push(self.projector.value_row(row.as_ref())?);
            if cap.is_some_and(|cap| out.len() >= cap) {
                break;
            }
        }
        Ok(out)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        query::FilterExpr,
        session::Session,
        test_support::{MemoryDriver, MyValue},
    };
    use std::sync::Arc;

    #[test]
    fn plans_re_execute_per_enumeration() {
        let driver = Arc::new(MemoryDriver::new());
        driver.script_rows(vec![vec![Value::Int(1), Value::from("one")]]);
        driver.script_rows(vec![vec![Value::Int(1), Value::from("one")]]);
        let session = Session::new(driver.clone());

        let plan = session
            .query::<MyValue>()
            .plan()
            .expect("identity query must compile");

        let first = plan.rows(&session).expect("first run must succeed");
        let second = plan.rows(&session).expect("second run must succeed");
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);

        let texts = driver.statement_texts();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0], texts[1]);
    }

    #[test]
    fn skipped_execution_returns_empty_without_driver_contact() {
        let driver = Arc::new(MemoryDriver::new());
        let session = Session::new(driver.clone());
        session.set_skip_execute(true);

        let plan = session
            .query::<MyValue>()
            .plan()
            .expect("identity query must compile");
        let rows = plan.rows(&session).expect("skipped run must succeed");

        assert!(rows.is_empty());
        assert!(driver.statement_texts().is_empty());
        assert!(!driver.is_opened());
    }

    #[test]
    fn bound_parameters_are_arity_checked() {
        let driver = Arc::new(MemoryDriver::new());
        driver.script_rows(vec![vec![Value::Int(2), Value::Null]]);
        let session = Session::new(driver.clone());

        let plan = session
            .query::<MyValue>()
            .filter(FilterExpr::bound("id", crate::query::Cmp::Eq))
            .plan()
            .expect("parameterized query must compile");
        assert_eq!(plan.param_slots(), 1);

        let err = plan
            .clone()
            .bind(vec![])
            .expect_err("an empty binding cannot fill one marker");
        assert!(matches!(
            err,
            Error::Query(QueryError::ParamArity {
                expected: 1,
                found: 0
            })
        ));

        let err = plan.rows(&session).expect_err("unbound plans must not run");
        assert!(matches!(err, Error::Query(QueryError::ParamArity { .. })));

        let bound = plan
            .bind(vec![Value::Int(2)])
            .expect("one value fills one marker");
        let rows = bound.rows(&session).expect("bound run must succeed");
        assert_eq!(rows.len(), 1);

        let recorded = driver.statements();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].params, vec![Value::Int(2)]);
    }

    #[test]
    fn single_rejects_a_second_row() {
        let driver = Arc::new(MemoryDriver::new());
        driver.script_rows(vec![
            vec![Value::Int(1), Value::from("one")],
            vec![Value::Int(2), Value::from("two")],
        ]);
        let session = Session::new(driver);

        let plan = session
            .query::<MyValue>()
            .plan()
            .expect("identity query must compile");
        let err = plan
            .single(&session)
            .expect_err("two rows cannot satisfy single");

        assert!(matches!(err, Error::Query(QueryError::MultipleRows)));
    }

    #[test]
    fn trackable_rows_prefer_already_tracked_instances() {
        let driver = Arc::new(MemoryDriver::new());
        driver.script_rows(vec![vec![Value::Int(1), Value::from("from-db")]]);
        let session = Session::new(driver);

        let local = MyValue {
            id: 1,
            value: Some("local".to_owned()),
        };
        assert!(
            session
                .table::<MyValue>()
                .attach(local)
                .expect("attach must extract the key")
        );

        let rows = session
            .query::<MyValue>()
            .rows()
            .expect("tracked read must succeed");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value.as_deref(), Some("local"));
    }

    #[tokio::test]
    async fn cancellation_is_observed_before_any_network_step() {
        let driver = Arc::new(MemoryDriver::new());
        let session = Session::new(driver.clone());

        let cancel = CancelToken::new();
        cancel.cancel();

        let plan = session
            .query::<MyValue>()
            .plan()
            .expect("identity query must compile");
        let err = plan
            .rows_async(&session, &cancel)
            .await
            .expect_err("a cancelled token must stop execution");

        assert!(matches!(err, Error::Cancelled));
        assert!(!driver.is_opened());
    }
}
