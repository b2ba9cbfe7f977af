mod decimal;
mod kind;

pub use decimal::Decimal;
pub use kind::CqlKind;

use num_bigint::BigInt;
use std::hash::{Hash, Hasher};
use std::mem::discriminant;
use std::net::IpAddr;
use thiserror::Error as ThisError;
use time::OffsetDateTime;
use uuid::Uuid;

///
/// MappingError
///
/// A runtime value did not fit the declared column or accessor kind.
/// Raised by row coercion and by model write accessors; never by rendering.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum MappingError {
    #[error("expected a {expected} value, found {found}")]
    KindMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("row has no column at ordinal {ordinal}")]
    MissingOrdinal { ordinal: usize },
}

impl MappingError {
    #[must_use]
    pub const fn mismatch(expected: &'static str, found: &'static str) -> Self {
        Self::KindMismatch { expected, found }
    }
}

///
/// Value
///
/// Runtime CQL value union. One variant per wire type the projector and
/// literal renderer distinguish; `ascii` and `counter` columns reuse the
/// `Text` and `BigInt` payloads.
///
/// Null      → absent cell (sparse storage model).
/// Token     → opaque partitioner token wrapping the raw cell value.
/// Timestamp → milliseconds since the Unix epoch.
///

#[derive(Clone, Debug)]
pub enum Value {
    BigInt(i64),
    Blob(Vec<u8>),
    Bool(bool),
    Decimal(Decimal),
    Double(f64),
    Float(f32),
    Inet(IpAddr),
    Int(i32),
    /// Ordered list; order is preserved through rendering and comparison.
    List(Vec<Self>),
    /// Entry order is preserved as constructed; no implicit sorting.
    Map(Vec<(Self, Self)>),
    Null,
    /// Set payloads keep construction order so rendering stays deterministic.
    Set(Vec<Self>),
    Text(String),
    TimeUuid(Uuid),
    Timestamp(i64),
    Token(Box<Self>),
    Uuid(Uuid),
    Varint(BigInt),
}

impl Value {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Build a `Value::List` from a slice of convertible items.
    #[must_use]
    pub fn list_of<T>(items: &[T]) -> Self
    where
        T: Into<Self> + Clone,
    {
        Self::List(items.iter().cloned().map(Into::into).collect())
    }

    /// Build a `Value::Set` from a slice of convertible items.
    #[must_use]
    pub fn set_of<T>(items: &[T]) -> Self
    where
        T: Into<Self> + Clone,
    {
        Self::Set(items.iter().cloned().map(Into::into).collect())
    }

    /// Build a `Value::Map` from convertible key/value pairs.
    #[must_use]
    pub fn map_of<K, V>(entries: &[(K, V)]) -> Self
    where
        K: Into<Self> + Clone,
        V: Into<Self> + Clone,
    {
        Self::Map(
            entries
                .iter()
                .cloned()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a `Value::Timestamp` from a calendar datetime.
    #[must_use]
    pub const fn timestamp_from(datetime: OffsetDateTime) -> Self {
        Self::Timestamp((datetime.unix_timestamp_nanos() / 1_000_000) as i64)
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Stable lowercase label used in error messages.
    #[must_use]
    pub const fn kind_label(&self) -> &'static str {
        match self {
            Self::BigInt(_) => "bigint",
            Self::Blob(_) => "blob",
            Self::Bool(_) => "boolean",
            Self::Decimal(_) => "decimal",
            Self::Double(_) => "double",
            Self::Float(_) => "float",
            Self::Inet(_) => "inet",
            Self::Int(_) => "int",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Null => "null",
            Self::Set(_) => "set",
            Self::Text(_) => "text",
            Self::TimeUuid(_) => "timeuuid",
            Self::Timestamp(_) => "timestamp",
            Self::Token(_) => "token",
            Self::Uuid(_) => "uuid",
            Self::Varint(_) => "varint",
        }
    }

    /// Whether this value can inhabit a column of the given declared kind.
    ///
    /// Null never conforms: key extraction and filter validation both treat
    /// null as an error, and sparse inserts elide the column entirely.
    #[must_use]
    pub fn conforms_to(&self, kind: &CqlKind) -> bool {
        match (self, kind) {
            (Self::Null, _) => false,
            (_, CqlKind::Token) => true,
            (Self::Text(_), CqlKind::Text | CqlKind::Ascii)
            | (Self::Int(_), CqlKind::Int)
            | (Self::BigInt(_), CqlKind::BigInt | CqlKind::Counter)
            | (Self::Bool(_), CqlKind::Bool)
            | (Self::Float(_), CqlKind::Float)
            | (Self::Double(_), CqlKind::Double)
            | (Self::Decimal(_), CqlKind::Decimal)
            | (Self::Uuid(_), CqlKind::Uuid | CqlKind::TimeUuid)
            | (Self::TimeUuid(_), CqlKind::TimeUuid)
            | (Self::Timestamp(_), CqlKind::Timestamp)
            | (Self::Blob(_), CqlKind::Blob)
            | (Self::Inet(_), CqlKind::Inet)
            | (Self::Varint(_), CqlKind::Varint) => true,
            (Self::List(items), CqlKind::List(elem)) | (Self::Set(items), CqlKind::Set(elem)) => {
                items.iter().all(|item| item.conforms_to(elem))
            }
            (Self::Map(entries), CqlKind::Map(key_kind, value_kind)) => entries
                .iter()
                .all(|(k, v)| k.conforms_to(key_kind) && v.conforms_to(value_kind)),
            _ => false,
        }
    }

    /// Datetime view of a `Timestamp` value, when representable.
    #[must_use]
    pub fn to_datetime(&self) -> Option<OffsetDateTime> {
        match self {
            Self::Timestamp(millis) => {
                OffsetDateTime::from_unix_timestamp_nanos(i128::from(*millis) * 1_000_000).ok()
            }
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Coercion
    //
    // Owning downcasts used by the default row accessors and the model
    // write path. Strict per kind except the int → bigint widening that
    // aggregate results rely on.
    // ------------------------------------------------------------------

    pub fn into_text(self) -> Result<String, MappingError> {
        match self {
            Self::Text(v) => Ok(v),
            other => Err(MappingError::mismatch("text", other.kind_label())),
        }
    }

    pub fn into_int(self) -> Result<i32, MappingError> {
        match self {
            Self::Int(v) => Ok(v),
            other => Err(MappingError::mismatch("int", other.kind_label())),
        }
    }

    pub fn into_bigint(self) -> Result<i64, MappingError> {
        match self {
            Self::BigInt(v) => Ok(v),
            Self::Int(v) => Ok(i64::from(v)),
            other => Err(MappingError::mismatch("bigint", other.kind_label())),
        }
    }

    pub fn into_bool(self) -> Result<bool, MappingError> {
        match self {
            Self::Bool(v) => Ok(v),
            other => Err(MappingError::mismatch("boolean", other.kind_label())),
        }
    }

    pub fn into_float(self) -> Result<f32, MappingError> {
        match self {
            Self::Float(v) => Ok(v),
            other => Err(MappingError::mismatch("float", other.kind_label())),
        }
    }

    pub fn into_double(self) -> Result<f64, MappingError> {
        match self {
            Self::Double(v) => Ok(v),
            other => Err(MappingError::mismatch("double", other.kind_label())),
        }
    }

    pub fn into_decimal(self) -> Result<Decimal, MappingError> {
        match self {
            Self::Decimal(v) => Ok(v),
            other => Err(MappingError::mismatch("decimal", other.kind_label())),
        }
    }

    pub fn into_uuid(self) -> Result<Uuid, MappingError> {
        match self {
            Self::Uuid(v) | Self::TimeUuid(v) => Ok(v),
            other => Err(MappingError::mismatch("uuid", other.kind_label())),
        }
    }

    pub fn into_timestamp(self) -> Result<i64, MappingError> {
        match self {
            Self::Timestamp(v) => Ok(v),
            other => Err(MappingError::mismatch("timestamp", other.kind_label())),
        }
    }

    pub fn into_blob(self) -> Result<Vec<u8>, MappingError> {
        match self {
            Self::Blob(v) => Ok(v),
            other => Err(MappingError::mismatch("blob", other.kind_label())),
        }
    }

    pub fn into_inet(self) -> Result<IpAddr, MappingError> {
        match self {
            Self::Inet(v) => Ok(v),
            other => Err(MappingError::mismatch("inet", other.kind_label())),
        }
    }

    pub fn into_varint(self) -> Result<BigInt, MappingError> {
        match self {
            Self::Varint(v) => Ok(v),
            other => Err(MappingError::mismatch("varint", other.kind_label())),
        }
    }

    pub fn into_list(self) -> Result<Vec<Self>, MappingError> {
        match self {
            Self::List(v) => Ok(v),
            other => Err(MappingError::mismatch("list", other.kind_label())),
        }
    }

    pub fn into_set(self) -> Result<Vec<Self>, MappingError> {
        match self {
            Self::Set(v) => Ok(v),
            other => Err(MappingError::mismatch("set", other.kind_label())),
        }
    }

    pub fn into_map(self) -> Result<Vec<(Self, Self)>, MappingError> {
        match self {
            Self::Map(v) => Ok(v),
            other => Err(MappingError::mismatch("map", other.kind_label())),
        }
    }
}

// Floats compare and hash by bit pattern so `Value` can back keyed maps with
// the usual equal-implies-equal-hash contract. NaN equals itself; 0.0 and
// -0.0 are distinct.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::BigInt(a), Self::BigInt(b)) => a == b,
            (Self::Blob(a), Self::Blob(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Decimal(a), Self::Decimal(b)) => a == b,
            (Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits(),
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Inet(a), Self::Inet(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::List(a), Self::List(b)) | (Self::Set(a), Self::Set(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Null, Self::Null) => true,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::TimeUuid(a), Self::TimeUuid(b)) | (Self::Uuid(a), Self::Uuid(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            (Self::Token(a), Self::Token(b)) => a == b,
            (Self::Varint(a), Self::Varint(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        discriminant(self).hash(state);
        match self {
            Self::BigInt(v) | Self::Timestamp(v) => v.hash(state),
            Self::Blob(v) => v.hash(state),
            Self::Bool(v) => v.hash(state),
            Self::Decimal(v) => v.hash(state),
            Self::Double(v) => v.to_bits().hash(state),
            Self::Float(v) => v.to_bits().hash(state),
            Self::Inet(v) => v.hash(state),
            Self::Int(v) => v.hash(state),
            Self::List(items) | Self::Set(items) => items.hash(state),
            Self::Map(entries) => entries.hash(state),
            Self::Null => {}
            Self::Text(v) => v.hash(state),
            Self::TimeUuid(v) | Self::Uuid(v) => v.hash(state),
            Self::Token(inner) => inner.hash(state),
            Self::Varint(v) => v.hash(state),
        }
    }
}

/// Implements `From<T> for Value` for payload conversions
macro_rules! impl_value_from {
    ( $( $ty:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    }
}

impl_value_from! {
    BigInt => Varint,
    Decimal => Decimal,
    IpAddr => Inet,
    String => Text,
    Uuid => Uuid,
    Vec<u8> => Blob,
    bool => Bool,
    f32 => Float,
    f64 => Double,
    i16 => Int,
    i32 => Int,
    i64 => BigInt,
    i8 => Int,
    u16 => Int,
    u32 => BigInt,
    u8 => Int,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<OffsetDateTime> for Value {
    fn from(v: OffsetDateTime) -> Self {
        Self::timestamp_from(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

///
/// TESTS
///
