pub mod dml;
pub mod text;

use thiserror::Error as ThisError;

///
/// RenderError
///
/// A value reached the renderer that the query language has no literal
/// syntax for. Fluent composition screens these out during validation, so
/// this surfaces only from hand-built statement trees and from DML built
/// over entities whose columns hold such values.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum RenderError {
    #[error("{kind} values have no literal form")]
    NoLiteralForm { kind: &'static str },
}
