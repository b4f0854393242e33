//! Parameterised `insert_data`/`update_data`/`delete_data` helpers built
//! from a column->value map plus an optional WHERE clause.

use serde_json::{Map, Value};

use crate::db::executor::{self, QueryResult, require_non_empty_data};
use crate::db::manager::ConnectionManager;
use crate::errors::DomainError;

use super::ddl::DbToolError;

pub async fn insert_data(
    manager: &ConnectionManager,
    connection_id: &str,
    table_name: &str,
    data: &Map<String, Value>,
) -> Result<QueryResult, DbToolError> {
    require_non_empty_data(data)?;
    let columns: Vec<&String> = data.keys().collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    let column_list = columns.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(", ");
    let sql = format!("INSERT INTO {table_name} ({column_list}) VALUES ({placeholders})");
    let params: Vec<Value> = columns.iter().map(|c| data[*c].clone()).collect();
    executor::execute_query(manager, connection_id, &sql, params, 1000)
        .await
        .map_err(DbToolError::Resource)
}

pub async fn update_data(
    manager: &ConnectionManager,
    connection_id: &str,
    table_name: &str,
    data: &Map<String, Value>,
    where_clause: Option<&str>,
    where_params: Vec<Value>,
) -> Result<QueryResult, DbToolError> {
    require_non_empty_data(data)?;
    let assignments = data.keys().map(|c| format!("{c} = ?")).collect::<Vec<_>>().join(", ");
    let mut sql = format!("UPDATE {table_name} SET {assignments}");
    if let Some(clause) = where_clause {
        sql.push_str(" WHERE ");
        sql.push_str(clause);
    }
    let mut params: Vec<Value> = data.values().cloned().collect();
    params.extend(where_params);
    executor::execute_query(manager, connection_id, &sql, params, 1000)
        .await
        .map_err(DbToolError::Resource)
}

pub async fn delete_data(
    manager: &ConnectionManager,
    connection_id: &str,
    table_name: &str,
    where_clause: Option<&str>,
    where_params: Vec<Value>,
) -> Result<QueryResult, DomainError> {
    let mut sql = format!("DELETE FROM {table_name}");
    if let Some(clause) = where_clause {
        sql.push_str(" WHERE ");
        sql.push_str(clause);
    }
    executor::execute_query(manager, connection_id, &sql, where_params, 1000)
        .await
        .map_err(|e| DomainError(e.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::config::DatabaseConfig;
    use serde_json::json;

    async fn connected_manager_with_table() -> ConnectionManager {
        let manager = ConnectionManager::new();
        manager
            .connect("c1", DatabaseConfig::Sqlite { file: ":memory:".to_string() }, &Config::default())
            .await
            .unwrap();
        executor::execute_query(&manager, "c1", "CREATE TABLE t(id INTEGER, name TEXT)", vec![], 1000)
            .await
            .unwrap();
        manager
    }

    #[tokio::test]
    async fn insert_then_delete_round_trips() {
        let manager = connected_manager_with_table().await;
        let mut data = Map::new();
        data.insert("id".to_string(), json!(1));
        data.insert("name".to_string(), json!("bob"));
        insert_data(&manager, "c1", "t", &data).await.unwrap();

        let result = executor::execute_query(&manager, "c1", "SELECT * FROM t", vec![], 1000).await.unwrap();
        assert_eq!(result.row_count, 1);

        delete_data(&manager, "c1", "t", Some("id = ?"), vec![json!(1)]).await.unwrap();
        let after = executor::execute_query(&manager, "c1", "SELECT * FROM t", vec![], 1000).await.unwrap();
        assert_eq!(after.row_count, 0);
    }

    #[tokio::test]
    async fn empty_data_map_is_rejected() {
        let manager = connected_manager_with_table().await;
        let data = Map::new();
        let err = insert_data(&manager, "c1", "t", &data).await.unwrap_err();
        assert!(matches!(err, DbToolError::Domain(_)));
    }
}
