//! Primary-key identity for tracked entities.

use crate::{traits::Entity, value::Value};
use thiserror::Error as ThisError;

///
/// KeyError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum KeyError {
    #[error("key column '{column}' is null")]
    NullKeyColumn { column: &'static str },

    #[error("expected {expected} key values, found {found}")]
    ArityMismatch { expected: usize, found: usize },

    #[error("key column '{column}' expects {expected}, found {found}")]
    KindMismatch {
        column: &'static str,
        expected: String,
        found: &'static str,
    },
}

///
/// EntityKey
///
/// The extracted key column values of one entity, partition columns first,
/// clustering columns after, in schema declaration order. Two entities with
/// equal keys denote the same row, so the tracker maps on this.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct EntityKey {
    values: Vec<Value>,
}

impl EntityKey {
    /// Extract the key from an entity instance.
    pub fn of<E: Entity>(entity: &E) -> Result<Self, KeyError> {
        let mut values = Vec::new();
        for column in E::MODEL.key_columns() {
            let value = column.read(entity);
            if value.is_null() {
                return Err(KeyError::NullKeyColumn {
                    column: column.name,
                });
            }
            values.push(value);
        }

        Ok(Self { values })
    }

    /// Build a key from caller-supplied values, checked against the schema.
    pub fn from_values<E: Entity>(values: Vec<Value>) -> Result<Self, KeyError> {
        let expected = E::MODEL.key_count();
        if values.len() != expected {
            return Err(KeyError::ArityMismatch {
                expected,
                found: values.len(),
            });
        }

        for (column, value) in E::MODEL.key_columns().zip(&values) {
            if value.is_null() {
                return Err(KeyError::NullKeyColumn {
                    column: column.name,
                });
            }
            if !value.conforms_to(&column.kind) {
                return Err(KeyError::KindMismatch {
                    column: column.name,
                    expected: column.kind.label(),
                    found: value.kind_label(),
                });
            }
        }

        Ok(Self { values })
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

///
/// TESTS
///
