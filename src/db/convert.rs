//! Driver-agnostic row -> JSON conversion for the `sqlx::Any` backend.
//!
//! `AnyRow` has no static column typing, so conversion cascades through
//! the scalar decode it tries in order, falling back to the next type on
//! a decode mismatch rather than failing the whole row.

use serde_json::{Map, Value};
use sqlx::any::AnyRow;
use sqlx::{Column, Row};

/// Convert one row to a `{column_name: value}` map, in column order.
/// Temporal columns are rendered as ISO-8601 strings per the query result
/// contract; a column that decodes as none of the tried types comes back
/// `null` rather than failing the whole row.
pub fn row_to_json(row: &AnyRow) -> Map<String, Value> {
    let mut map = Map::new();
    for column in row.columns() {
        let name = column.name();
        map.insert(name.to_string(), column_value(row, name));
    }
    map
}

fn column_value(row: &AnyRow, name: &str) -> Value {
    if let Ok(v) = row.try_get::<Option<bool>, _>(name) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(name) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(name) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    // `Any` has no temporal decode of its own (chrono impls exist only for
    // the concrete sqlite/mysql/postgres drivers); every backend hands
    // temporal columns back to `Any` as ISO-8601 text, so this arm covers
    // them too.
    if let Ok(v) = row.try_get::<Option<String>, _>(name) {
        return v.map(Value::String).unwrap_or(Value::Null);
    }
    Value::Null
}
