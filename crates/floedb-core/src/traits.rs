use crate::{model::TableModel, value::Value};

///
/// Entity
///
/// A struct that maps onto one table. `Default` doubles as the row baseline:
/// the projector starts from `Self::default()` and only writes columns whose
/// cells are non-null, so field defaults are the null substitutes.
///

pub trait Entity: Clone + Default + Send + Sync + Sized + 'static {
    const MODEL: &'static TableModel<Self>;

    /// All column values in model declaration order. This is the snapshot
    /// shape the change tracker diffs against.
    fn column_values(&self) -> Vec<Value> {
        Self::MODEL
            .columns
            .iter()
            .map(|column| column.read(self))
            .collect()
    }
}
