//! Schema introspection: `list_tables` and `get_table_schema`, expressed
//! per-dialect since there is no portable metadata query across sqlite,
//! mysql, and postgres information schemas.

use serde_json::{Value, json};
use sqlx::Row;

use crate::db::config::DatabaseConfig;
use crate::db::manager::ConnectionManager;
use crate::errors::ResourceError;

pub async fn list_tables(manager: &ConnectionManager, connection_id: &str) -> Result<Vec<Value>, ResourceError> {
    let record = manager.get(connection_id).map_err(|e| ResourceError(e.0))?;
    let kind = record.config.kind();

    let sql = match &record.config {
        DatabaseConfig::Sqlite { .. } => "SELECT name FROM sqlite_master WHERE type = 'table'",
        DatabaseConfig::MySql(_) => "SELECT table_name FROM information_schema.tables WHERE table_schema = DATABASE()",
        DatabaseConfig::Postgres(_) => {
            "SELECT table_name FROM information_schema.tables WHERE table_schema = 'public'"
        }
    };

    let rows = sqlx::query(sql)
        .fetch_all(&record.pool)
        .await
        .map_err(|e| wrap(kind, connection_id, e))?;

    let (schema, catalog) = match &record.config {
        DatabaseConfig::Sqlite { .. } => ("main", Value::Null),
        DatabaseConfig::MySql(_) => ("public", Value::Null),
        DatabaseConfig::Postgres(_) => ("public", Value::Null),
    };

    Ok(rows
        .into_iter()
        .map(|row| {
            let name: String = row.try_get(0).unwrap_or_default();
            json!({
                "name": name,
                "type": "TABLE",
                "schema": schema,
                "catalog": catalog,
                "remarks": "",
            })
        })
        .collect())
}

pub async fn get_table_schema(
    manager: &ConnectionManager,
    connection_id: &str,
    table_name: &str,
) -> Result<Vec<Value>, ResourceError> {
    let record = manager.get(connection_id).map_err(|e| ResourceError(e.0))?;
    let kind = record.config.kind();

    match &record.config {
        DatabaseConfig::Sqlite { .. } => sqlite_table_schema(&record.pool, table_name).await.map_err(|e| wrap(kind, connection_id, e)),
        DatabaseConfig::MySql(_) => mysql_table_schema(&record.pool, table_name).await.map_err(|e| wrap(kind, connection_id, e)),
        DatabaseConfig::Postgres(_) => {
            postgres_table_schema(&record.pool, table_name).await.map_err(|e| wrap(kind, connection_id, e))
        }
    }
}

async fn sqlite_table_schema(pool: &sqlx::any::AnyPool, table_name: &str) -> Result<Vec<Value>, sqlx::Error> {
    let rows = sqlx::query(&format!("PRAGMA table_info({table_name})")).fetch_all(pool).await?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let name: String = row.try_get("name").unwrap_or_default();
            let data_type: String = row.try_get("type").unwrap_or_default();
            let not_null: i64 = row.try_get("notnull").unwrap_or(0);
            let default_value: Option<String> = row.try_get("dflt_value").ok().flatten();
            let pk: i64 = row.try_get("pk").unwrap_or(0);
            let auto_increment = pk > 0 && data_type.to_uppercase().contains("INTEGER");
            json!({
                "name": name,
                "type": data_type,
                "size": Value::Null,
                "nullable": not_null == 0,
                "defaultValue": default_value,
                "precision": Value::Null,
                "scale": Value::Null,
                "autoIncrement": auto_increment,
                "isPrimaryKey": pk > 0,
            })
        })
        .collect())
}

async fn mysql_table_schema(pool: &sqlx::any::AnyPool, table_name: &str) -> Result<Vec<Value>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT column_name, data_type, character_maximum_length, is_nullable, column_default, \
         numeric_precision, numeric_scale, extra, column_key \
         FROM information_schema.columns WHERE table_schema = DATABASE() AND table_name = ?",
    )
    .bind(table_name)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let extra: String = row.try_get("extra").unwrap_or_default();
            let column_key: String = row.try_get("column_key").unwrap_or_default();
            let is_nullable: String = row.try_get("is_nullable").unwrap_or_default();
            json!({
                "name": row.try_get::<String, _>("column_name").unwrap_or_default(),
                "type": row.try_get::<String, _>("data_type").unwrap_or_default(),
                "size": row.try_get::<Option<i64>, _>("character_maximum_length").ok().flatten(),
                "nullable": is_nullable.eq_ignore_ascii_case("YES"),
                "defaultValue": row.try_get::<Option<String>, _>("column_default").ok().flatten(),
                "precision": row.try_get::<Option<i64>, _>("numeric_precision").ok().flatten(),
                "scale": row.try_get::<Option<i64>, _>("numeric_scale").ok().flatten(),
                "autoIncrement": extra.to_lowercase().contains("auto_increment"),
                "isPrimaryKey": column_key == "PRI",
            })
        })
        .collect())
}

async fn postgres_table_schema(pool: &sqlx::any::AnyPool, table_name: &str) -> Result<Vec<Value>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT column_name, data_type, character_maximum_length, is_nullable, column_default, \
         numeric_precision, numeric_scale \
         FROM information_schema.columns WHERE table_schema = 'public' AND table_name = $1",
    )
    .bind(table_name)
    .fetch_all(pool)
    .await?;

    let primary_keys = sqlx::query(
        "SELECT kcu.column_name FROM information_schema.table_constraints tc \
         JOIN information_schema.key_column_usage kcu ON tc.constraint_name = kcu.constraint_name \
         WHERE tc.constraint_type = 'PRIMARY KEY' AND tc.table_name = $1",
    )
    .bind(table_name)
    .fetch_all(pool)
    .await?
    .into_iter()
    .filter_map(|row| row.try_get::<String, _>("column_name").ok())
    .collect::<Vec<_>>();

    Ok(rows
        .into_iter()
        .map(|row| {
            let name: String = row.try_get("column_name").unwrap_or_default();
            let default_value: Option<String> = row.try_get("column_default").ok().flatten();
            let is_nullable: String = row.try_get("is_nullable").unwrap_or_default();
            let auto_increment = default_value.as_deref().is_some_and(|d| d.starts_with("nextval("));
            let is_primary = primary_keys.contains(&name);
            json!({
                "name": name,
                "type": row.try_get::<String, _>("data_type").unwrap_or_default(),
                "size": row.try_get::<Option<i64>, _>("character_maximum_length").ok().flatten(),
                "nullable": is_nullable.eq_ignore_ascii_case("YES"),
                "defaultValue": default_value,
                "precision": row.try_get::<Option<i64>, _>("numeric_precision").ok().flatten(),
                "scale": row.try_get::<Option<i64>, _>("numeric_scale").ok().flatten(),
                "autoIncrement": auto_increment,
                "isPrimaryKey": is_primary,
            })
        })
        .collect())
}

fn wrap(kind: &str, connection_id: &str, cause: sqlx::Error) -> ResourceError {
    ResourceError(format!("Database operation failed for {kind} database (connection: {connection_id}): {cause}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::config::DatabaseConfig;
    use crate::db::executor;

    #[tokio::test]
    async fn list_tables_finds_created_table() {
        let manager = ConnectionManager::new();
        manager
            .connect("c1", DatabaseConfig::Sqlite { file: ":memory:".to_string() }, &Config::default())
            .await
            .unwrap();
        executor::execute_query(&manager, "c1", "CREATE TABLE widgets(id INTEGER PRIMARY KEY)", vec![], 1000)
            .await
            .unwrap();

        let tables = list_tables(&manager, "c1").await.unwrap();
        assert!(tables.iter().any(|t| t["name"] == Value::from("widgets")));
    }

    #[tokio::test]
    async fn get_table_schema_reports_primary_key() {
        let manager = ConnectionManager::new();
        manager
            .connect("c1", DatabaseConfig::Sqlite { file: ":memory:".to_string() }, &Config::default())
            .await
            .unwrap();
        executor::execute_query(&manager, "c1", "CREATE TABLE widgets(id INTEGER PRIMARY KEY, name TEXT)", vec![], 1000)
            .await
            .unwrap();

        let columns = get_table_schema(&manager, "c1", "widgets").await.unwrap();
        let id_column = columns.iter().find(|c| c["name"] == Value::from("id")).unwrap();
        assert_eq!(id_column["isPrimaryKey"], Value::from(true));
    }
}
