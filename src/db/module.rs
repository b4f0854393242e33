//! Wires the database tool family into a [`Module`]: one [`Tool`] entry
//! per operation in §6's tool catalogue, each parsing its own arguments
//! and delegating to `executor`/`ddl`/`dml`/`introspect`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::config::Config;
use crate::db::config::DatabaseConfig;
use crate::db::ddl::{self, ColumnDefinition};
use crate::db::dml;
use crate::db::executor::{self, TransactionStatement};
use crate::db::introspect;
use crate::db::manager::ConnectionManager;
use crate::db::schemas;
use crate::errors::{DomainError, HandlerError};
use crate::module::Module;
use crate::registry::Tool;
use crate::response::Envelope;

fn required_str(args: &Value, field: &str) -> Result<String, HandlerError> {
    args.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| DomainError(format!("{field} is required")).into())
}

fn params_array(args: &Value, field: &str) -> Vec<Value> {
    args.get(field).and_then(Value::as_array).cloned().unwrap_or_default()
}

fn data_object(args: &Value, field: &str) -> Result<Map<String, Value>, HandlerError> {
    args.get(field)
        .and_then(Value::as_object)
        .cloned()
        .ok_or_else(|| DomainError(format!("{field} is required")).into())
}

/// The database tool family. Holds the shared connection manager and a
/// snapshot of the ambient pool-tuning config captured at construction.
pub struct DatabaseModule {
    manager: Arc<ConnectionManager>,
    config: Arc<Config>,
}

impl DatabaseModule {
    pub fn new(manager: Arc<ConnectionManager>, config: Arc<Config>) -> Self {
        Self { manager, config }
    }
}

#[async_trait]
impl Module for DatabaseModule {
    fn name(&self) -> &str {
        "database"
    }

    fn version(&self) -> &str {
        "0.1.0"
    }

    fn description(&self) -> Option<&str> {
        Some("Pooled SQL connections, parameterised queries, transactions, and schema introspection")
    }

    fn tools(&self) -> Vec<Tool> {
        let manager = self.manager.clone();
        let config = self.config.clone();

        vec![
            {
                let manager = manager.clone();
                let config = config.clone();
                Tool::new("connect_database", "Open a pooled connection to a SQL database", schemas::connect_database(), move |args| {
                    let manager = manager.clone();
                    let config = config.clone();
                    async move {
                        let connection_id = required_str(&args, "connectionId")?;
                        let config_value = args.get("config").cloned().unwrap_or(Value::Null);
                        let db_config = DatabaseConfig::from_json(&config_value)?;
                        let kind = db_config.kind().to_string();
                        manager.connect(&connection_id, db_config, &config).await?;
                        Ok(Envelope::text(format!("Connected to {kind} database with connection ID: {connection_id}")))
                    }
                })
            },
            {
                let manager = manager.clone();
                Tool::new("disconnect_database", "Close a pooled database connection", schemas::disconnect_database(), move |args| {
                    let manager = manager.clone();
                    async move {
                        let connection_id = required_str(&args, "connectionId")?;
                        manager.disconnect(&connection_id).await;
                        Ok(Envelope::text(format!("Disconnected connection: {connection_id}")))
                    }
                })
            },
            {
                let manager = manager.clone();
                Tool::new("execute_query", "Run one parameterised query", schemas::execute_query(), move |args| {
                    let manager = manager.clone();
                    async move {
                        let connection_id = required_str(&args, "connectionId")?;
                        let query = required_str(&args, "query")?;
                        let params = params_array(&args, "params");
                        let limit = args.get("limit").and_then(Value::as_u64).unwrap_or(1000) as usize;
                        let result = executor::execute_query(&manager, &connection_id, &query, params, limit).await?;
                        Ok(Envelope::json(&serde_json::to_value(result).unwrap_or(Value::Null)))
                    }
                })
            },
            {
                let manager = manager.clone();
                Tool::new("execute_transaction", "Run a sequence of statements atomically", schemas::execute_transaction(), move |args| {
                    let manager = manager.clone();
                    async move {
                        let connection_id = required_str(&args, "connectionId")?;
                        let queries = args
                            .get("queries")
                            .and_then(Value::as_array)
                            .cloned()
                            .ok_or_else(|| HandlerError::from(DomainError("queries is required".to_string())))?;
                        let statements = queries
                            .into_iter()
                            .map(|q| TransactionStatement {
                                query: q.get("query").and_then(Value::as_str).unwrap_or_default().to_string(),
                                params: q.get("params").and_then(Value::as_array).cloned().unwrap_or_default(),
                            })
                            .collect();
                        let results = executor::execute_transaction(&manager, &connection_id, statements).await?;
                        Ok(Envelope::json(&serde_json::to_value(results).unwrap_or(Value::Null)))
                    }
                })
            },
            {
                let manager = manager.clone();
                Tool::new("list_tables", "Enumerate tables visible to a connection", schemas::list_tables(), move |args| {
                    let manager = manager.clone();
                    async move {
                        let connection_id = required_str(&args, "connectionId")?;
                        let tables = introspect::list_tables(&manager, &connection_id).await?;
                        Ok(Envelope::json(&json!(tables)))
                    }
                })
            },
            {
                let manager = manager.clone();
                Tool::new("get_table_schema", "Describe a table's columns", schemas::get_table_schema(), move |args| {
                    let manager = manager.clone();
                    async move {
                        let connection_id = required_str(&args, "connectionId")?;
                        let table_name = required_str(&args, "tableName")?;
                        let columns = introspect::get_table_schema(&manager, &connection_id, &table_name).await?;
                        Ok(Envelope::json(&json!(columns)))
                    }
                })
            },
            {
                let manager = manager.clone();
                Tool::new("get_database_metrics", "Report connection-pool and query counters", schemas::get_database_metrics(), move |_args| {
                    let manager = manager.clone();
                    async move { Ok(Envelope::json(&manager.metrics())) }
                })
            },
            {
                let manager = manager.clone();
                Tool::new("insert_data", "Insert one row from a column->value map", schemas::insert_data(), move |args| {
                    let manager = manager.clone();
                    async move {
                        let connection_id = required_str(&args, "connectionId")?;
                        let table_name = required_str(&args, "tableName")?;
                        let data = data_object(&args, "data")?;
                        let result = dml::insert_data(&manager, &connection_id, &table_name, &data).await?;
                        Ok(Envelope::json(&serde_json::to_value(result).unwrap_or(Value::Null)))
                    }
                })
            },
            {
                let manager = manager.clone();
                Tool::new("update_data", "Update rows matching an optional WHERE clause", schemas::update_data(), move |args| {
                    let manager = manager.clone();
                    async move {
                        let connection_id = required_str(&args, "connectionId")?;
                        let table_name = required_str(&args, "tableName")?;
                        let data = data_object(&args, "data")?;
                        let where_clause = args.get("where").and_then(Value::as_str).map(str::to_string);
                        let where_params = params_array(&args, "whereParams");
                        let result = dml::update_data(&manager, &connection_id, &table_name, &data, where_clause.as_deref(), where_params)
                            .await?;
                        Ok(Envelope::json(&serde_json::to_value(result).unwrap_or(Value::Null)))
                    }
                })
            },
            {
                let manager = manager.clone();
                Tool::new("delete_data", "Delete rows matching an optional WHERE clause", schemas::delete_data(), move |args| {
                    let manager = manager.clone();
                    async move {
                        let connection_id = required_str(&args, "connectionId")?;
                        let table_name = required_str(&args, "tableName")?;
                        let where_clause = args.get("where").and_then(Value::as_str).map(str::to_string);
                        let where_params = params_array(&args, "whereParams");
                        let result = dml::delete_data(&manager, &connection_id, &table_name, where_clause.as_deref(), where_params).await?;
                        Ok(Envelope::json(&serde_json::to_value(result).unwrap_or(Value::Null)))
                    }
                })
            },
            {
                let manager = manager.clone();
                Tool::new("create_table", "Create a table from structured column definitions", schemas::create_table(), move |args| {
                    let manager = manager.clone();
                    async move {
                        let connection_id = required_str(&args, "connectionId")?;
                        let table_name = required_str(&args, "tableName")?;
                        let columns: Vec<ColumnDefinition> = serde_json::from_value(args.get("columns").cloned().unwrap_or(json!([])))
                            .map_err(|e| HandlerError::from(DomainError(format!("invalid columns: {e}"))))?;
                        let result = ddl::create_table(&manager, &connection_id, &table_name, &columns).await?;
                        Ok(Envelope::json(&serde_json::to_value(result).unwrap_or(Value::Null)))
                    }
                })
            },
            {
                let manager = manager.clone();
                Tool::new("drop_table", "Drop a table", schemas::drop_table(), move |args| {
                    let manager = manager.clone();
                    async move {
                        let connection_id = required_str(&args, "connectionId")?;
                        let table_name = required_str(&args, "tableName")?;
                        let result = ddl::drop_table(&manager, &connection_id, &table_name).await?;
                        Ok(Envelope::json(&serde_json::to_value(result).unwrap_or(Value::Null)))
                    }
                })
            },
            {
                let manager = manager.clone();
                Tool::new("alter_table", "Add or drop a column", schemas::alter_table(), move |args| {
                    let manager = manager.clone();
                    async move {
                        let connection_id = required_str(&args, "connectionId")?;
                        let table_name = required_str(&args, "tableName")?;
                        let action = required_str(&args, "action")?;
                        let column_definition: Option<ColumnDefinition> = args
                            .get("columnDefinition")
                            .map(|v| serde_json::from_value(v.clone()))
                            .transpose()
                            .map_err(|e| HandlerError::from(DomainError(format!("invalid columnDefinition: {e}"))))?;
                        let column_name = args.get("columnName").and_then(Value::as_str);
                        let result = ddl::alter_table(
                            &manager,
                            &connection_id,
                            &table_name,
                            &action,
                            column_definition.as_ref(),
                            column_name,
                        )
                        .await?;
                        Ok(Envelope::json(&serde_json::to_value(result).unwrap_or(Value::Null)))
                    }
                })
            },
        ]
    }
}
