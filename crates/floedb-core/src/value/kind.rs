use serde::Serialize;
use std::fmt;

///
/// CqlKind
///
/// Declared CQL type of a column, term, or selector. Collection kinds
/// reference their element kinds by static borrow so models can be built
/// entirely in consts.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum CqlKind {
    Ascii,
    BigInt,
    Blob,
    Bool,
    Counter,
    Decimal,
    Double,
    Float,
    Inet,
    Int,
    List(&'static CqlKind),
    Map(&'static CqlKind, &'static CqlKind),
    Set(&'static CqlKind),
    Text,
    TimeUuid,
    Timestamp,
    Token,
    Uuid,
    Varint,
}

impl CqlKind {
    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(self, Self::List(_) | Self::Map(_, _) | Self::Set(_))
    }

    /// Stable lowercase label, collection element kinds included.
    #[must_use]
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CqlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascii => write!(f, "ascii"),
            Self::BigInt => write!(f, "bigint"),
            Self::Blob => write!(f, "blob"),
            Self::Bool => write!(f, "boolean"),
            Self::Counter => write!(f, "counter"),
            Self::Decimal => write!(f, "decimal"),
            Self::Double => write!(f, "double"),
            Self::Float => write!(f, "float"),
            Self::Inet => write!(f, "inet"),
            Self::Int => write!(f, "int"),
            Self::List(elem) => write!(f, "list<{elem}>"),
            Self::Map(key, value) => write!(f, "map<{key},{value}>"),
            Self::Set(elem) => write!(f, "set<{elem}>"),
            Self::Text => write!(f, "text"),
            Self::TimeUuid => write!(f, "timeuuid"),
            Self::Timestamp => write!(f, "timestamp"),
            Self::Token => write!(f, "token"),
            Self::Uuid => write!(f, "uuid"),
            Self::Varint => write!(f, "varint"),
        }
    }
}
