//! Fluent query composition.
//!
//! A [`Query`] accumulates one SELECT statement against an entity's schema.
//! Every combinator is checked as it is applied; the first failure is stored
//! and surfaces from whichever terminal finally runs, so call chains never
//! panic mid-composition.

use crate::{
    driver::{Consistency, QueryOptions},
    error::Error,
    expr::{OrderDirection, SelectStatement},
    query::{translate, FilterExpr, QueryError, QueryPlan, ValueRow},
    session::{CancelToken, Session},
    traits::Entity,
};
use std::marker::PhantomData;

///
/// Query
///
/// `T` is the row shape produced by the terminals: the entity itself until
/// [`Query::select`] narrows the statement to a [`ValueRow`].
///

pub struct Query<'a, E: Entity, T = E> {
    session: &'a Session,
    statement: SelectStatement,
    trackable: bool,
    options: QueryOptions,
    error: Option<QueryError>,
    _marker: PhantomData<fn() -> (E, T)>,
}

impl<'a, E: Entity> Query<'a, E> {
    pub(crate) fn new(session: &'a Session) -> Self {
        let keyspace = session.keyspace();
        Self {
            session,
            statement: translate::seed(E::MODEL, keyspace.as_deref()),
            trackable: true,
            options: QueryOptions::default(),
            error: None,
            _marker: PhantomData,
        }
    }
}

impl<'a, E: Entity, T> Query<'a, E, T> {
    /// Restrict the result set. Conjunctions flatten into the WHERE clause;
    /// disjunctions and negations are rejected by name.
    #[must_use]
    pub fn filter(self, expr: FilterExpr) -> Self {
        self.apply(|statement| translate::apply_filter(statement, E::MODEL, &expr))
    }

    /// Cap the result set. Repeated caps keep the smallest value, whichever
    /// order they arrive in.
    #[must_use]
    pub fn take(self, limit: u32) -> Self {
        self.apply(|statement| {
            statement.merge_limit(limit);
            Ok(())
        })
    }

    #[must_use]
    pub fn distinct(self) -> Self {
        self.apply(translate::apply_distinct)
    }

    #[must_use]
    pub fn order_by(self, column: &str) -> Self {
        self.apply(|statement| {
            translate::apply_order(statement, E::MODEL, column, OrderDirection::Asc)
        })
    }

    #[must_use]
    pub fn order_by_desc(self, column: &str) -> Self {
        self.apply(|statement| {
            translate::apply_order(statement, E::MODEL, column, OrderDirection::Desc)
        })
    }

    /// Continue an ordering chain. Orderings always accumulate, so this is
    /// [`Query::order_by`] under the name call sites expect after a first key.
    #[must_use]
    pub fn then_by(self, column: &str) -> Self {
        self.order_by(column)
    }

    #[must_use]
    pub fn then_by_desc(self, column: &str) -> Self {
        self.order_by_desc(column)
    }

    /// Let the server scan past its filtering guardrails.
    #[must_use]
    pub fn allow_filtering(mut self) -> Self {
        self.statement.allow_filtering = true;
        self
    }

    /// Per-query consistency, overriding the session default.
    #[must_use]
    pub const fn consistency(mut self, consistency: Consistency) -> Self {
        self.options.consistency = Some(consistency);
        self
    }

    #[must_use]
    pub const fn page_size(mut self, rows: i32) -> Self {
        self.options.page_size = Some(rows);
        self
    }

    /// Narrow the select list to the named columns, in the order given.
    /// Narrowed results are plain value rows and are never tracked.
    #[must_use]
    pub fn select(self, columns: &[&str]) -> Query<'a, E, ValueRow> {
        let mut next = Query {
            session: self.session,
            statement: self.statement,
            trackable: false,
            options: self.options,
            error: self.error,
            _marker: PhantomData,
        };
        if next.error.is_none() {
            if let Err(err) = translate::apply_select(&mut next.statement, E::MODEL, columns) {
                next.error = Some(err);
            }
        }
        next
    }

    /// Compile the accumulated statement into a restartable plan.
    pub fn plan(self) -> Result<QueryPlan<E, T>, Error> {
        if let Some(err) = self.error {
            return Err(err.into());
        }
        QueryPlan::compile(&self.statement, self.trackable, self.options)
    }

    /// Number of matching rows, as the server counts them.
    pub fn count(self) -> Result<i64, Error> {
        let session = self.session;
        let plan = self
            .apply(translate::apply_count)
            .plan_as::<ValueRow>()?;
        plan.scalar_count(session)
    }

    pub fn count_where(self, expr: FilterExpr) -> Result<i64, Error> {
        self.filter(expr).count()
    }

    fn apply(
        mut self,
        op: impl FnOnce(&mut SelectStatement) -> Result<(), QueryError>,
    ) -> Self {
        if self.error.is_none() {
            if let Err(err) = op(&mut self.statement) {
                self.error = Some(err);
            }
        }
        self
    }

    /// Recompile under a different row shape without touching the statement.
    fn plan_as<U>(self) -> Result<QueryPlan<E, U>, Error> {
        if let Some(err) = self.error {
            return Err(err.into());
        }
        QueryPlan::compile(&self.statement, false, self.options)
    }
}

// ------------------------------------------------------------------------
// identity terminals
// ------------------------------------------------------------------------

impl<E: Entity> Query<'_, E, E> {
    /// Execute and materialize every matching entity.
    pub fn rows(self) -> Result<Vec<E>, Error> {
        let session = self.session;
        self.plan()?.rows(session)
    }

    pub async fn rows_async(self, cancel: &CancelToken) -> Result<Vec<E>, Error> {
        let session = self.session;
        self.plan()?.rows_async(session, cancel).await
    }

    /// The first matching entity, if any. Caps the fetch at one row.
    pub fn first(self) -> Result<Option<E>, Error> {
        let session = self.session;
        self.take(1).plan()?.first(session)
    }

    pub fn first_where(self, expr: FilterExpr) -> Result<Option<E>, Error> {
        self.filter(expr).first()
    }

    /// At most one matching entity. Fetches up to two rows to prove it.
    pub fn single(self) -> Result<Option<E>, Error> {
        let session = self.session;
        self.take(2).plan()?.single(session)
    }

    pub fn single_where(self, expr: FilterExpr) -> Result<Option<E>, Error> {
        self.filter(expr).single()
    }

    pub fn any(self) -> Result<bool, Error> {
        let session = self.session;
        self.take(1).plan()?.any(session)
    }

    pub fn any_where(self, expr: FilterExpr) -> Result<bool, Error> {
        self.filter(expr).any()
    }
}

// ------------------------------------------------------------------------
// narrowed terminals
// ------------------------------------------------------------------------

impl<E: Entity> Query<'_, E, ValueRow> {
    pub fn rows(self) -> Result<Vec<ValueRow>, Error> {
        let session = self.session;
        self.plan()?.rows(session)
    }

    pub async fn rows_async(self, cancel: &CancelToken) -> Result<Vec<ValueRow>, Error> {
        let session = self.session;
        self.plan()?.rows_async(session, cancel).await
    }

    pub fn first(self) -> Result<Option<ValueRow>, Error> {
        let session = self.session;
        self.take(1).plan()?.first(session)
    }

    pub fn first_where(self, expr: FilterExpr) -> Result<Option<ValueRow>, Error> {
        self.filter(expr).first()
    }

    pub fn single(self) -> Result<Option<ValueRow>, Error> {
        let session = self.session;
        self.take(2).plan()?.single(session)
    }

    pub fn single_where(self, expr: FilterExpr) -> Result<Option<ValueRow>, Error> {
        self.filter(expr).single()
    }

    pub fn any(self) -> Result<bool, Error> {
        let session = self.session;
        self.take(1).plan()?.any(session)
    }

    pub fn any_where(self, expr: FilterExpr) -> Result<bool, Error> {
        self.filter(expr).any()
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        query::Cmp,
        test_support::{logged_session, MyValue, QualifiedValue},
    };

    fn only_text(sink: &crate::obs::CollectingSink) -> String {
        let texts = sink.texts();
        assert_eq!(texts.len(), 1, "expected exactly one logged statement");
        texts.into_iter().next().expect("one logged statement")
    }

    #[test]
    fn an_unadorned_query_selects_every_column() {
        let (session, sink) = logged_session();

        let rows = session
            .query::<MyValue>()
            .rows()
            .expect("identity query must compose");

        assert!(rows.is_empty());
        assert_eq!(only_text(&sink), r#"SELECT "id","value" FROM "myvalue";"#);
    }

    #[test]
    fn equality_filters_render_inline() {
        let (session, sink) = logged_session();

        session
            .query::<MyValue>()
            .filter(FilterExpr::eq("value", "hallo daar"))
            .rows()
            .expect("filtered query must compose");

        assert_eq!(
            only_text(&sink),
            r#"SELECT "id","value" FROM "myvalue" WHERE "value"='hallo daar';"#
        );
    }

    #[test]
    fn earlier_filters_survive_a_later_projection() {
        let (session, sink) = logged_session();

        session
            .query::<MyValue>()
            .filter(FilterExpr::eq("value", "hallo daar"))
            .select(&["id"])
            .rows()
            .expect("filter before projection must compose");

        assert_eq!(
            only_text(&sink),
            r#"SELECT "id" FROM "myvalue" WHERE "value"='hallo daar';"#
        );
    }

    #[test]
    fn conjunctions_join_with_and() {
        let (session, sink) = logged_session();

        session
            .query::<MyValue>()
            .filter(FilterExpr::gt("id", 1i32) & FilterExpr::lte("id", 5i32))
            .rows()
            .expect("conjunction must compose");

        assert_eq!(
            only_text(&sink),
            r#"SELECT "id","value" FROM "myvalue" WHERE "id">1 AND "id"<=5;"#
        );
    }

    #[test]
    fn membership_renders_a_structural_in() {
        let (session, sink) = logged_session();

        session
            .query::<MyValue>()
            .filter(FilterExpr::in_iter("id", [1i32, 2, 3, 4]))
            .rows()
            .expect("membership must compose");

        assert_eq!(
            only_text(&sink),
            r#"SELECT "id","value" FROM "myvalue" WHERE "id" IN (1,2,3,4);"#
        );
    }

    #[test]
    fn orderings_accumulate_in_call_order() {
        let (session, sink) = logged_session();

        session
            .query::<MyValue>()
            .order_by("id")
            .then_by_desc("value")
            .rows()
            .expect("ordered query must compose");

        assert_eq!(
            only_text(&sink),
            r#"SELECT "id","value" FROM "myvalue" ORDER BY "id" ASC,"value" DESC;"#
        );
    }

    #[test]
    fn repeated_caps_keep_the_smallest_limit() {
        let (session, sink) = logged_session();
        session
            .query::<MyValue>()
            .take(3)
            .take(1)
            .rows()
            .expect("capped query must compose");
        assert_eq!(
            only_text(&sink),
            r#"SELECT "id","value" FROM "myvalue" LIMIT 1;"#
        );
        sink.clear();

        session
            .query::<MyValue>()
            .take(1)
            .take(3)
            .rows()
            .expect("capped query must compose");
        assert_eq!(
            only_text(&sink),
            r#"SELECT "id","value" FROM "myvalue" LIMIT 1;"#
        );
    }

    #[test]
    fn composition_errors_surface_from_the_terminal() {
        let (session, _sink) = logged_session();

        let err = session
            .query::<MyValue>()
            .take(1)
            .distinct()
            .rows()
            .expect_err("distinct after a cap must fail");
        assert!(matches!(err, Error::Query(QueryError::DistinctAfterLimit)));

        let err = session
            .query::<MyValue>()
            .take(1)
            .filter(FilterExpr::eq("id", 1i32))
            .rows()
            .expect_err("filtering after a cap must fail");
        assert!(matches!(err, Error::Query(QueryError::FilterAfterLimit)));
    }

    #[test]
    fn the_first_composition_error_wins() {
        let (session, _sink) = logged_session();

        let err = session
            .query::<MyValue>()
            .take(1)
            .filter(FilterExpr::eq("id", 1i32))
            .filter(FilterExpr::eq("missing", 2i32))
            .rows()
            .expect_err("the stored error must survive later calls");

        assert!(matches!(err, Error::Query(QueryError::FilterAfterLimit)));
    }

    #[test]
    fn projections_narrow_the_select_list() {
        let (session, sink) = logged_session();

        session
            .query::<MyValue>()
            .select(&["id"])
            .filter(FilterExpr::eq("id", 1i32))
            .rows()
            .expect("narrowed query must compose");

        assert_eq!(
            only_text(&sink),
            r#"SELECT "id" FROM "myvalue" WHERE "id"=1;"#
        );
    }

    #[test]
    fn filters_on_unselected_columns_are_rejected() {
        let (session, _sink) = logged_session();

        let err = session
            .query::<MyValue>()
            .select(&["id"])
            .filter(FilterExpr::eq("value", "x"))
            .rows()
            .expect_err("a discarded column cannot be filtered");

        assert!(matches!(
            err,
            Error::Query(QueryError::ColumnNotSelected { column }) if column == "value"
        ));
    }

    #[test]
    fn distinct_projections_render_the_keyword() {
        let (session, sink) = logged_session();

        session
            .query::<MyValue>()
            .select(&["id"])
            .distinct()
            .rows()
            .expect("distinct projection must compose");

        assert_eq!(only_text(&sink), r#"SELECT DISTINCT "id" FROM "myvalue";"#);
    }

    #[test]
    fn count_renders_the_aggregate_and_drops_orderings() {
        let (session, sink) = logged_session();

        let total = session
            .query::<MyValue>()
            .order_by("id")
            .count_where(FilterExpr::eq("id", 2i32))
            .expect("count must compose");

        assert_eq!(total, 0);
        assert_eq!(
            only_text(&sink),
            r#"SELECT COUNT(*) FROM "myvalue" WHERE "id"=2;"#
        );
    }

    #[test]
    fn allow_filtering_trails_the_statement() {
        let (session, sink) = logged_session();

        session
            .query::<MyValue>()
            .filter(FilterExpr::eq("value", "x"))
            .allow_filtering()
            .rows()
            .expect("allow filtering must compose");

        assert_eq!(
            only_text(&sink),
            r#"SELECT "id","value" FROM "myvalue" WHERE "value"='x' ALLOW FILTERING;"#
        );
    }

    #[test]
    fn model_keyspaces_qualify_the_table_name() {
        let (session, sink) = logged_session();

        session
            .query::<QualifiedValue>()
            .rows()
            .expect("qualified query must compose");

        assert_eq!(
            only_text(&sink),
            r#"SELECT "id","value" FROM "linqtest"."myvalue";"#
        );
    }

    #[test]
    fn a_matching_session_keyspace_suppresses_qualification() {
        let (session, sink) = logged_session();
        session
            .set_keyspace("linqtest")
            .expect("keyspace is settable before the session opens");

        session
            .query::<QualifiedValue>()
            .rows()
            .expect("qualified query must compose");

        assert_eq!(only_text(&sink), r#"SELECT "id","value" FROM "myvalue";"#);
    }

    #[test]
    fn bound_markers_render_as_question_marks() {
        let (session, sink) = logged_session();

        let plan = session
            .query::<MyValue>()
            .filter(FilterExpr::bound("id", Cmp::Eq))
            .plan()
            .expect("parameterized query must compile");
        assert_eq!(plan.text(), r#"SELECT "id","value" FROM "myvalue" WHERE "id"=?;"#);

        plan.bind(vec![crate::value::Value::Int(7)])
            .expect("one value fills one marker")
            .rows(&session)
            .expect("bound plan must run");
        assert_eq!(
            only_text(&sink),
            r#"SELECT "id","value" FROM "myvalue" WHERE "id"=?;"#
        );
    }
}
