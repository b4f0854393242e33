//! Syntactic sugar over the executor: builds DDL strings from structured
//! column definitions and runs them through the same query pipeline.

use serde::Deserialize;
use serde_json::Value;

use crate::db::executor::{self, QueryResult};
use crate::db::manager::ConnectionManager;
use crate::errors::{DomainError, ResourceError};

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(rename = "primaryKey", default)]
    pub primary_key: bool,
    #[serde(rename = "notNull", default)]
    pub not_null: bool,
    #[serde(rename = "defaultValue", default)]
    pub default_value: Option<Value>,
}

impl ColumnDefinition {
    fn render(&self) -> String {
        let mut out = format!("{} {}", self.name, self.data_type);
        if self.primary_key {
            out.push_str(" PRIMARY KEY");
        }
        if self.not_null {
            out.push_str(" NOT NULL");
        }
        if let Some(default) = &self.default_value {
            out.push_str(&format!(" DEFAULT {}", render_literal(default)));
        }
        out
    }
}

fn render_literal(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        other => other.to_string(),
    }
}

pub async fn create_table(
    manager: &ConnectionManager,
    connection_id: &str,
    table_name: &str,
    columns: &[ColumnDefinition],
) -> Result<QueryResult, ResourceError> {
    let body = columns.iter().map(ColumnDefinition::render).collect::<Vec<_>>().join(", ");
    let sql = format!("CREATE TABLE {table_name} ({body})");
    executor::execute_query(manager, connection_id, &sql, vec![], 1000).await
}

pub async fn drop_table(
    manager: &ConnectionManager,
    connection_id: &str,
    table_name: &str,
) -> Result<QueryResult, ResourceError> {
    let sql = format!("DROP TABLE {table_name}");
    executor::execute_query(manager, connection_id, &sql, vec![], 1000).await
}

/// `action` is `"add_column"` (requires `column_definition`) or
/// `"drop_column"` (requires `column_name`); anything else is a domain
/// error rather than a SQL syntax error.
pub async fn alter_table(
    manager: &ConnectionManager,
    connection_id: &str,
    table_name: &str,
    action: &str,
    column_definition: Option<&ColumnDefinition>,
    column_name: Option<&str>,
) -> Result<QueryResult, DbToolError> {
    let sql = match action {
        "add_column" => {
            let column = column_definition
                .ok_or_else(|| DbToolError::Domain(DomainError("columnDefinition is required for add_column".to_string())))?;
            format!("ALTER TABLE {table_name} ADD COLUMN {}", column.render())
        }
        "drop_column" => {
            let name = column_name
                .ok_or_else(|| DbToolError::Domain(DomainError("columnName is required for drop_column".to_string())))?;
            format!("ALTER TABLE {table_name} DROP COLUMN {name}")
        }
        other => return Err(DbToolError::Domain(DomainError(format!("unsupported alter_table action: {other}")))),
    };
    executor::execute_query(manager, connection_id, &sql, vec![], 1000)
        .await
        .map_err(DbToolError::Resource)
}

/// Small error union so `alter_table`'s two failure shapes (bad request
/// shape vs. execution failure) convert cleanly into `HandlerError`.
#[derive(Debug, thiserror::Error)]
pub enum DbToolError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

impl From<DbToolError> for crate::errors::HandlerError {
    fn from(e: DbToolError) -> Self {
        match e {
            DbToolError::Domain(d) => d.into(),
            DbToolError::Resource(r) => r.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_definition_renders_constraints_in_order() {
        let column = ColumnDefinition {
            name: "id".to_string(),
            data_type: "INTEGER".to_string(),
            primary_key: true,
            not_null: true,
            default_value: Some(Value::from(0)),
        };
        assert_eq!(column.render(), "id INTEGER PRIMARY KEY NOT NULL DEFAULT 0");
    }

    #[test]
    fn string_default_is_quoted() {
        let column = ColumnDefinition {
            name: "status".to_string(),
            data_type: "TEXT".to_string(),
            primary_key: false,
            not_null: false,
            default_value: Some(Value::from("active")),
        };
        assert_eq!(column.render(), "status TEXT DEFAULT 'active'");
    }
}
