use crate::value::Value;
use std::ops::{BitAnd, BitOr, Not};

///
/// FilterExpr
///
/// Logical predicate over entity columns, composed before translation.
///
/// Expressions can be:
/// - Single clauses comparing a column with a value
/// - Composite expressions: `And`, `Or`, and negation `Not`.
///
/// The query language only renders conjunctions of clauses; `Or` and `Not`
/// are expressible here so translation can reject them by name instead of
/// the composition API silently bending their meaning.
///

#[derive(Clone, Debug, PartialEq)]
pub enum FilterExpr {
    Clause(FilterClause),
    And(Vec<Self>),
    Or(Vec<Self>),
    Not(Box<Self>),
}

impl FilterExpr {
    // --- Clause ---

    /// Create a single clause: `column cmp value`.
    pub fn clause(column: impl Into<String>, cmp: Cmp, value: impl Into<Value>) -> Self {
        Self::Clause(FilterClause::new(column, cmp, value))
    }

    /// Create a clause whose right-hand side is a positional bind marker.
    pub fn bound(column: impl Into<String>, cmp: Cmp) -> Self {
        Self::Clause(FilterClause {
            column: column.into(),
            cmp,
            value: FilterValue::Bound,
        })
    }

    // --- Equality ---

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::clause(column, Cmp::Eq, value)
    }

    // --- Ordering ---

    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::clause(column, Cmp::Lt, value)
    }

    pub fn lte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::clause(column, Cmp::Lte, value)
    }

    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::clause(column, Cmp::Gt, value)
    }

    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::clause(column, Cmp::Gte, value)
    }

    // --- Membership ---

    pub fn in_iter<I>(column: impl Into<String>, vals: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Self::clause(
            column,
            Cmp::In,
            Value::List(vals.into_iter().map(Into::into).collect()),
        )
    }

    /// Combine two expressions into an `And` expression.
    ///
    /// This flattens nested `And`s to avoid deep nesting (e.g., `(a AND b) AND c` becomes `AND[a,b,c]`).
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::And(mut a), Self::And(mut b)) => {
                a.append(&mut b);
                Self::And(a)
            }
            (Self::And(mut a), b) => {
                a.push(b);
                Self::And(a)
            }
            (a, Self::And(mut b)) => {
                let mut list = vec![a];
                list.append(&mut b);
                Self::And(list)
            }
            (a, b) => Self::And(vec![a, b]),
        }
    }

    /// Combine two expressions into an `Or` expression,
    /// flattening nested `Or`s similarly to `and`.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        match (self, other) {
            (Self::Or(mut a), Self::Or(mut b)) => {
                a.append(&mut b);
                Self::Or(a)
            }
            (Self::Or(mut a), b) => {
                a.push(b);
                Self::Or(a)
            }
            (a, Self::Or(mut b)) => {
                let mut list = vec![a];
                list.append(&mut b);
                Self::Or(list)
            }
            (a, b) => Self::Or(vec![a, b]),
        }
    }

    /// Negate this expression.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }
}

impl BitAnd for FilterExpr {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl BitOr for FilterExpr {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

impl Not for FilterExpr {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self::Not(Box::new(self))
    }
}

///
/// FilterClause
/// represents a basic comparison expression: `column cmp value`
///

#[derive(Clone, Debug, PartialEq)]
pub struct FilterClause {
    pub column: String,
    pub cmp: Cmp,
    pub value: FilterValue,
}

impl FilterClause {
    pub fn new(column: impl Into<String>, cmp: Cmp, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            cmp,
            value: FilterValue::Constant(value.into()),
        }
    }
}

///
/// FilterValue
///
/// Right-hand side of a clause: an inline constant, or a positional bind
/// marker filled in when a compiled plan is bound.
///

#[derive(Clone, Debug, PartialEq)]
pub enum FilterValue {
    Constant(Value),
    Bound,
}

///
/// Cmp
///
/// The comparison operators a clause may carry. Only the operators the
/// query language itself supports appear here; there is no `!=`.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Cmp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_sugar_matches_the_named_combinators() {
        let a = FilterExpr::eq("id", 1i32);
        let b = FilterExpr::gt("id", 5i32);

        assert_eq!(a.clone() & b.clone(), a.clone().and(b.clone()));
        assert_eq!(a.clone() | b.clone(), a.clone().or(b));
        assert_eq!(!a.clone(), a.not());
    }

    #[test]
    fn and_flattens_nested_conjunctions() {
        let expr = FilterExpr::eq("a", 1i32)
            .and(FilterExpr::eq("b", 2i32))
            .and(FilterExpr::eq("c", 3i32));

        let FilterExpr::And(parts) = expr else {
            panic!("conjunction must flatten into a single And");
        };
        assert_eq!(parts.len(), 3);
    }

    #[test]
    fn in_iter_collects_candidates_into_a_list() {
        let expr = FilterExpr::in_iter("id", [1i32, 2, 3, 4]);

        let FilterExpr::Clause(clause) = expr else {
            panic!("membership must build a clause");
        };
        assert_eq!(clause.cmp, Cmp::In);
        assert_eq!(
            clause.value,
            FilterValue::Constant(Value::List(vec![
                Value::Int(1),
                Value::Int(2),
                Value::Int(3),
                Value::Int(4),
            ]))
        );
    }

    #[test]
    fn bound_clauses_carry_no_value() {
        let FilterExpr::Clause(clause) = FilterExpr::bound("id", Cmp::Eq) else {
            panic!("bound must build a clause");
        };
        assert_eq!(clause.value, FilterValue::Bound);
    }
}
