use crate::value::{CqlKind, Value};

///
/// SelectStatement
///
/// One SELECT under construction. Composition never renders text; it only
/// rewrites this tree, so a statement is always a complete, renderable
/// description of the query built so far.
///

#[derive(Clone, Debug, PartialEq)]
pub struct SelectStatement {
    pub clause: SelectClause,
    pub table: TableRef,
    pub relations: Vec<Relation>,
    pub orderings: Vec<Ordering>,
    pub limit: Option<u32>,
    pub allow_filtering: bool,
}

impl SelectStatement {
    #[must_use]
    pub fn new(clause: SelectClause, table: TableRef) -> Self {
        Self {
            clause,
            table,
            relations: Vec::new(),
            orderings: Vec::new(),
            limit: None,
            allow_filtering: false,
        }
    }

    /// Whether a row limit has been fixed. Filters, orderings and distinct
    /// may not be composed past this point.
    #[must_use]
    pub const fn is_limited(&self) -> bool {
        self.limit.is_some()
    }

    /// Lower the limit to `n`, or set it when absent. Limits only ever
    /// shrink under composition.
    pub fn merge_limit(&mut self, n: u32) {
        self.limit = Some(self.limit.map_or(n, |current| current.min(n)));
    }
}

///
/// TableRef
///
/// Resolved table reference. `keyspace` is only present when the statement
/// must render a qualified name; suppressing the session default happens
/// before the ref is built.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TableRef {
    pub keyspace: Option<&'static str>,
    pub name: &'static str,
}

///
/// SelectClause
///

#[derive(Clone, Debug, PartialEq)]
pub enum SelectClause {
    /// Every column, rendered as `*`. Fluent composition never produces this;
    /// seeded statements list the schema columns explicitly so the projector
    /// knows its ordinals.
    All,
    /// `COUNT(*)` aggregate.
    Count,
    Columns {
        selectors: Vec<Selector>,
        distinct: bool,
    },
}

impl SelectClause {
    #[must_use]
    pub const fn is_distinct(&self) -> bool {
        matches!(
            self,
            Self::Columns { distinct: true, .. }
        )
    }
}

///
/// Selector
///
/// A select-list or predicate left-hand side: a column identifier or a
/// function call over further selectors. Both carry their value kind so the
/// projector can pick the right typed row accessor later.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Selector {
    Column {
        name: &'static str,
        kind: CqlKind,
    },
    Call {
        name: String,
        kind: CqlKind,
        args: Vec<Selector>,
    },
}

impl Selector {
    #[must_use]
    pub const fn column(name: &'static str, kind: CqlKind) -> Self {
        Self::Column { name, kind }
    }

    #[must_use]
    pub fn call(name: impl Into<String>, kind: CqlKind, args: Vec<Self>) -> Self {
        Self::Call {
            name: name.into(),
            kind,
            args,
        }
    }

    /// Column name, or the call name for function selectors.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Column { name, .. } => name,
            Self::Call { name, .. } => name,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> CqlKind {
        match self {
            Self::Column { kind, .. } | Self::Call { kind, .. } => *kind,
        }
    }
}

///
/// Relation
///
/// One predicate: `selector op term`. Relations are conjunctive; the
/// statement's relation list renders joined by `AND`.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Relation {
    pub selector: Selector,
    pub op: CompareOp,
    pub term: Term,
}

impl Relation {
    #[must_use]
    pub const fn new(selector: Selector, op: CompareOp, term: Term) -> Self {
        Self { selector, op, term }
    }
}

///
/// CompareOp
///
/// The comparison operators CQL relations support. There is no `!=`.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompareOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl CompareOp {
    /// Infix symbol for the binary operators. `In` renders structurally
    /// (`sel IN (..)`) and has no infix form.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::In => " IN ",
        }
    }
}

///
/// Term
///
/// A predicate right-hand side. Constants carry their runtime value (and
/// with it the kind that drives literal rendering); `Param` is a positional
/// bind marker rendered as `?`.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Term {
    Constant(Value),
    Param(CqlKind),
    List(Vec<Term>),
    Set(Vec<Term>),
    Map(Vec<(Term, Term)>),
    Call { name: String, args: Vec<Term> },
}

impl Term {
    /// Build the `IN`-list term for a set of candidate values.
    #[must_use]
    pub fn in_list(values: Vec<Value>) -> Self {
        Self::List(values.into_iter().map(Self::Constant).collect())
    }
}

///
/// Ordering
///

#[derive(Clone, Debug, PartialEq)]
pub struct Ordering {
    pub selector: Selector,
    pub direction: OrderDirection,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

///
/// TESTS
///
