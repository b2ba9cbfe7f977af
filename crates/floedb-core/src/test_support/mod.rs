//! Shared fixtures for unit tests: model entities over a scripted in-memory
//! driver, plus a pre-wired session that only records statement text.

pub(crate) mod driver;

pub(crate) use driver::MemoryDriver;

use crate::{
    model::{ColumnModel, ColumnRole, TableModel},
    obs::CollectingSink,
    session::Session,
    traits::Entity,
    value::{CqlKind, Value},
};
use std::sync::Arc;
use uuid::Uuid;

/// A session over a fresh in-memory driver with execution skipped and every
/// statement collected, for assertions on generated text alone.
pub(crate) fn logged_session() -> (Session, Arc<CollectingSink>) {
    let sink = Arc::new(CollectingSink::new());
    let session = Session::with_sink(Arc::new(MemoryDriver::new()), sink.clone());
    session.set_skip_execute(true);
    (session, sink)
}

///
/// MyValue
///
/// The smallest useful table: one int key, one text payload.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct MyValue {
    pub id: i32,
    pub value: Option<String>,
}

impl Entity for MyValue {
    const MODEL: &'static TableModel<Self> = &TableModel {
        table: "myvalue",
        keyspace: None,
        columns: &[
            ColumnModel {
                name: "id",
                kind: CqlKind::Int,
                role: ColumnRole::PartitionKey,
                get: |e| Value::Int(e.id),
                set: |e, v| {
                    e.id = v.into_int()?;
                    Ok(())
                },
            },
            ColumnModel {
                name: "value",
                kind: CqlKind::Text,
                role: ColumnRole::Regular,
                get: |e| Value::from(e.value.clone()),
                set: |e, v| {
                    e.value = if v.is_null() { None } else { Some(v.into_text()?) };
                    Ok(())
                },
            },
        ],
    };
}

///
/// QualifiedValue
///
/// Same shape as [`MyValue`] but pinned to a keyspace, for qualification
/// rules.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct QualifiedValue {
    pub id: i32,
    pub value: Option<String>,
}

impl Entity for QualifiedValue {
    const MODEL: &'static TableModel<Self> = &TableModel {
        table: "myvalue",
        keyspace: Some("linqtest"),
        columns: &[
            ColumnModel {
                name: "id",
                kind: CqlKind::Int,
                role: ColumnRole::PartitionKey,
                get: |e| Value::Int(e.id),
                set: |e, v| {
                    e.id = v.into_int()?;
                    Ok(())
                },
            },
            ColumnModel {
                name: "value",
                kind: CqlKind::Text,
                role: ColumnRole::Regular,
                get: |e| Value::from(e.value.clone()),
                set: |e, v| {
                    e.value = if v.is_null() { None } else { Some(v.into_text()?) };
                    Ok(())
                },
            },
        ],
    };
}

///
/// SensorReading
///
/// A wider table with a composite key, a collection column, and a uuid, for
/// the key and change-detection paths.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct SensorReading {
    pub station: Option<String>,
    pub taken_at: Option<i64>,
    pub reading: Option<f64>,
    pub tags: Vec<String>,
    pub trace: Option<Uuid>,
}

impl Entity for SensorReading {
    const MODEL: &'static TableModel<Self> = &TableModel {
        table: "readings",
        keyspace: None,
        columns: &[
            ColumnModel {
                name: "station",
                kind: CqlKind::Text,
                role: ColumnRole::PartitionKey,
                get: |e| Value::from(e.station.clone()),
                set: |e, v| {
                    e.station = if v.is_null() { None } else { Some(v.into_text()?) };
                    Ok(())
                },
            },
            ColumnModel {
                name: "taken_at",
                kind: CqlKind::Timestamp,
                role: ColumnRole::ClusteringKey,
                get: |e| e.taken_at.map_or(Value::Null, Value::Timestamp),
                set: |e, v| {
                    e.taken_at = if v.is_null() {
                        None
                    } else {
                        Some(v.into_timestamp()?)
                    };
                    Ok(())
                },
            },
            ColumnModel {
                name: "reading",
                kind: CqlKind::Double,
                role: ColumnRole::Regular,
                get: |e| Value::from(e.reading),
                set: |e, v| {
                    e.reading = if v.is_null() { None } else { Some(v.into_double()?) };
                    Ok(())
                },
            },
            ColumnModel {
                name: "tags",
                kind: CqlKind::Set(&CqlKind::Text),
                role: ColumnRole::Regular,
                get: |e| Value::set_of(&e.tags),
                set: |e, v| {
                    if v.is_null() {
                        e.tags = Vec::new();
                        return Ok(());
                    }
                    let mut tags = Vec::new();
                    for item in v.into_set()? {
                        tags.push(item.into_text()?);
                    }
                    e.tags = tags;
                    Ok(())
                },
            },
            ColumnModel {
                name: "trace",
                kind: CqlKind::Uuid,
                role: ColumnRole::Regular,
                get: |e| Value::from(e.trace),
                set: |e, v| {
                    e.trace = if v.is_null() { None } else { Some(v.into_uuid()?) };
                    Ok(())
                },
            },
        ],
    };
}
