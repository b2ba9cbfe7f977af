use crate::{
    cql::RenderError, driver::DriverError, query::QueryError, session::SessionError,
    track::KeyError, value::MappingError,
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
///
/// Top-level error union returned by session and query entry points. Each
/// subsystem keeps its own enum; this wrapper only routes them so callers
/// can match on the failing layer without losing the inner payload.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Internal(#[from] InternalError),

    /// An async operation observed its cancellation token before completing.
    /// Statements already handed to the driver are not rolled back.
    #[error("operation cancelled before completion")]
    Cancelled,
}

///
/// InternalError
///
/// Structured runtime error with a stable internal classification.
/// Not a stable API; intended for internal use and may change without notice.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl InternalError {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Construct a tracker-origin corruption error.
    pub(crate) fn tracker_corruption(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Corruption, ErrorOrigin::Tracker, message.into())
    }

    /// Construct a projection-origin corruption error.
    pub(crate) fn projection_corruption(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::Corruption,
            ErrorOrigin::Projection,
            message.into(),
        )
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Corruption,
    NotFound,
    Internal,
    Conflict,
    Unsupported,
    InvariantViolation,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Corruption => "corruption",
            Self::NotFound => "not_found",
            Self::Internal => "internal",
            Self::Conflict => "conflict",
            Self::Unsupported => "unsupported",
            Self::InvariantViolation => "invariant_violation",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Query,
    Projection,
    Tracker,
    Session,
    Driver,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Query => "query",
            Self::Projection => "projection",
            Self::Tracker => "tracker",
            Self::Session => "session",
            Self::Driver => "driver",
        };
        write!(f, "{label}")
    }
}

///
/// TESTS
///
