//! Parameterised query and transaction execution against a pooled
//! connection, shared by `execute_query`, `execute_transaction`, and the
//! DDL/DML sugar built on top of them.

use serde::Serialize;
use serde_json::Value;
use sqlx::any::AnyPool;
use sqlx::{Column, Executor, Row};

use crate::db::config::DatabaseConfig;
use crate::db::convert::row_to_json;
use crate::db::manager::ConnectionManager;
use crate::errors::{DomainError, ResourceError};

/// Hard cap on rows materialised for a SELECT executed inside a
/// transaction, independent of any `limit` a caller might pass elsewhere.
const TRANSACTION_ROW_LIMIT: usize = 1000;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub row_count: usize,
    pub columns: Vec<String>,
    pub rows: Vec<serde_json::Map<String, Value>>,
    pub affected_rows: u64,
}

impl QueryResult {
    fn selected(columns: Vec<String>, rows: Vec<serde_json::Map<String, Value>>) -> Self {
        Self { row_count: rows.len(), columns, rows, affected_rows: 0 }
    }

    fn affected(n: u64) -> Self {
        Self { row_count: 0, columns: Vec::new(), rows: Vec::new(), affected_rows: n }
    }
}

fn is_select_shaped(query: &str) -> bool {
    let upper = query.trim_start().to_uppercase();
    ["SELECT", "WITH", "PRAGMA", "SHOW", "EXPLAIN"]
        .iter()
        .any(|keyword| upper.starts_with(keyword))
}

fn log_hazard_if_present(query: &str, connection_id: &str) {
    let upper = query.to_uppercase();
    for keyword in ["DROP ", "TRUNCATE ", "ALTER ", "CREATE "] {
        if upper.contains(keyword) {
            tracing::warn!(connection_id, query = %truncate_for_log(query), "query contains {}", keyword.trim());
        }
    }
}

fn truncate_for_log(query: &str) -> String {
    if query.chars().count() > 100 {
        format!("{}…", query.chars().take(100).collect::<String>())
    } else {
        query.to_string()
    }
}

fn bind_params<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Any, sqlx::any::AnyArguments<'q>>,
    params: Vec<Value>,
) -> sqlx::query::Query<'q, sqlx::Any, sqlx::any::AnyArguments<'q>> {
    for value in params {
        query = match value {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(b),
            Value::Number(n) if n.is_i64() => query.bind(n.as_i64().unwrap()),
            Value::Number(n) => query.bind(n.as_f64().unwrap_or_default()),
            Value::String(s) => query.bind(s),
            other => query.bind(other.to_string()),
        };
    }
    query
}

fn rows_to_result(rows: Vec<sqlx::any::AnyRow>, limit: usize) -> QueryResult {
    let columns: Vec<String> = rows
        .first()
        .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();
    let materialized: Vec<_> = rows.into_iter().take(limit).map(|row| row_to_json(&row)).collect();
    QueryResult::selected(columns, materialized)
}

/// Run one query against `connection_id`'s pool, materialising up to
/// `limit` rows if it is SELECT-shaped, or returning the affected-row
/// count otherwise.
pub async fn execute_query(
    manager: &ConnectionManager,
    connection_id: &str,
    query: &str,
    params: Vec<Value>,
    limit: usize,
) -> Result<QueryResult, ResourceError> {
    if query.trim().is_empty() {
        return Err(ResourceError("query must not be empty".to_string()));
    }
    let record = manager.get(connection_id).map_err(|e| ResourceError(e.0))?;
    log_hazard_if_present(query, connection_id);

    manager.record_query();
    let result = run_one(&record.pool, query, params, limit).await;
    if result.is_err() {
        manager.record_error();
    }
    result.map_err(|e| wrap_failure(&record.config, connection_id, e))
}

async fn run_one(
    pool: &AnyPool,
    query: &str,
    params: Vec<Value>,
    limit: usize,
) -> Result<QueryResult, sqlx::Error> {
    let built = bind_params(sqlx::query(query), params);
    if is_select_shaped(query) {
        let rows = built.fetch_all(pool).await?;
        Ok(rows_to_result(rows, limit))
    } else {
        let outcome = built.execute(pool).await?;
        Ok(QueryResult::affected(outcome.rows_affected()))
    }
}

/// One `(query, params)` pair within a transaction request.
pub struct TransactionStatement {
    pub query: String,
    pub params: Vec<Value>,
}

/// Run every statement on the same connection with autocommit disabled;
/// either every statement commits or the whole transaction rolls back.
/// The rollback never masks the original failure's message.
pub async fn execute_transaction(
    manager: &ConnectionManager,
    connection_id: &str,
    statements: Vec<TransactionStatement>,
) -> Result<Vec<QueryResult>, ResourceError> {
    let record = manager.get(connection_id).map_err(|e| ResourceError(e.0))?;

    let mut tx = record
        .pool
        .begin()
        .await
        .map_err(|e| wrap_failure(&record.config, connection_id, e))?;

    let mut results = Vec::with_capacity(statements.len());
    for statement in statements {
        log_hazard_if_present(&statement.query, connection_id);
        manager.record_query();

        let built = bind_params(sqlx::query(&statement.query), statement.params);
        let outcome = if is_select_shaped(&statement.query) {
            built.fetch_all(&mut *tx).await.map(|rows| rows_to_result(rows, TRANSACTION_ROW_LIMIT))
        } else {
            built.execute(&mut *tx).await.map(|r| QueryResult::affected(r.rows_affected()))
        };

        match outcome {
            Ok(result) => results.push(result),
            Err(e) => {
                manager.record_error();
                let wrapped = wrap_failure(&record.config, connection_id, e);
                let _ = tx.rollback().await;
                return Err(wrapped);
            }
        }
    }

    tx.commit().await.map_err(|e| wrap_failure(&record.config, connection_id, e))?;
    Ok(results)
}

fn wrap_failure(config: &DatabaseConfig, connection_id: &str, cause: sqlx::Error) -> ResourceError {
    ResourceError(format!(
        "Database operation failed for {} database (connection: {connection_id}): {cause}",
        config.kind()
    ))
}

/// Rejects before any statement runs if the column->value map is empty —
/// shared by `insert_data`/`update_data`/`delete_data`.
pub fn require_non_empty_data(data: &serde_json::Map<String, Value>) -> Result<(), DomainError> {
    if data.is_empty() {
        Err(DomainError("data must not be empty".to_string()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::config::DatabaseConfig;

    async fn connected_manager() -> ConnectionManager {
        let manager = ConnectionManager::new();
        manager
            .connect("c1", DatabaseConfig::Sqlite { file: ":memory:".to_string() }, &Config::default())
            .await
            .unwrap();
        manager
    }

    #[tokio::test]
    async fn create_then_insert_then_select_round_trips() {
        let manager = connected_manager().await;
        execute_query(&manager, "c1", "CREATE TABLE t(id INTEGER PRIMARY KEY, name TEXT)", vec![], 1000)
            .await
            .unwrap();
        execute_query(
            &manager,
            "c1",
            "INSERT INTO t(id, name) VALUES (?, ?)",
            vec![Value::from(1), Value::from("alice")],
            1000,
        )
        .await
        .unwrap();
        let result = execute_query(&manager, "c1", "SELECT * FROM t", vec![], 1000).await.unwrap();
        assert_eq!(result.row_count, 1);
        assert!(result.columns.contains(&"id".to_string()));
        assert_eq!(result.rows[0]["name"], Value::from("alice"));
    }

    #[tokio::test]
    async fn empty_query_is_rejected_before_execution() {
        let manager = connected_manager().await;
        let err = execute_query(&manager, "c1", "   ", vec![], 1000).await.unwrap_err();
        assert!(err.0.contains("empty"));
    }

    #[tokio::test]
    async fn failing_statement_rolls_back_the_whole_transaction() {
        let manager = connected_manager().await;
        execute_query(&manager, "c1", "CREATE TABLE t(id INTEGER PRIMARY KEY, name TEXT)", vec![], 1000)
            .await
            .unwrap();

        let statements = vec![
            TransactionStatement {
                query: "INSERT INTO t(id, name) VALUES (?, ?)".to_string(),
                params: vec![Value::from(1), Value::from("a")],
            },
            TransactionStatement {
                query: "INSERT INTO nonexistent VALUES (?)".to_string(),
                params: vec![Value::from("x")],
            },
        ];
        assert!(execute_transaction(&manager, "c1", statements).await.is_err());

        let result = execute_query(&manager, "c1", "SELECT COUNT(*) AS n FROM t", vec![], 1000).await.unwrap();
        assert_eq!(result.rows[0]["n"], Value::from(0));
    }
}
