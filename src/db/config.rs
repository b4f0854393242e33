//! The tagged database configuration variant accepted by `connect_database`.

use serde::Deserialize;
use serde_json::Value;

use crate::errors::DomainError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MySqlConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
}

/// One of `sqlite`, `mysql`, `postgresql` — the `type` discriminator is
/// case-insensitive on input and canonicalised to lowercase for logging.
#[derive(Debug, Clone)]
pub enum DatabaseConfig {
    Sqlite { file: String },
    MySql(MySqlConfig),
    Postgres(PostgresConfig),
}

impl DatabaseConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            DatabaseConfig::Sqlite { .. } => "sqlite",
            DatabaseConfig::MySql(_) => "mysql",
            DatabaseConfig::Postgres(_) => "postgresql",
        }
    }

    /// Parse the `config` object passed to `connect_database`. The schema
    /// already guarantees `type` is present and one of the three values;
    /// this only needs to pick the right variant and fish out its fields.
    pub fn from_json(value: &Value) -> Result<Self, DomainError> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| DomainError("config.type is required".to_string()))?
            .to_lowercase();

        match kind.as_str() {
            "sqlite" => {
                let file = value
                    .get("file")
                    .and_then(Value::as_str)
                    .ok_or_else(|| DomainError("config.file is required for sqlite".to_string()))?;
                Ok(DatabaseConfig::Sqlite { file: file.to_string() })
            }
            "mysql" => {
                let config: MySqlConfig = serde_json::from_value(value.clone())
                    .map_err(|e| DomainError(format!("invalid mysql config: {e}")))?;
                Ok(DatabaseConfig::MySql(config))
            }
            "postgresql" => {
                let config: PostgresConfig = serde_json::from_value(value.clone())
                    .map_err(|e| DomainError(format!("invalid postgresql config: {e}")))?;
                Ok(DatabaseConfig::Postgres(config))
            }
            other => Err(DomainError(format!("unsupported database type: {other}"))),
        }
    }

    /// The connection string sqlx's pool builders accept for this backend.
    pub fn connection_url(&self) -> String {
        match self {
            DatabaseConfig::Sqlite { file } => format!("sqlite:{file}?mode=rwc"),
            DatabaseConfig::MySql(c) => {
                format!("mysql://{}:{}@{}:{}/{}", c.username, c.password, c.host, c.port, c.database)
            }
            DatabaseConfig::Postgres(c) => {
                format!("postgres://{}:{}@{}:{}/{}", c.username, c.password, c.host, c.port, c.database)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_discriminator_is_case_insensitive() {
        let config = DatabaseConfig::from_json(&json!({"type": "SQLite", "file": ":memory:"})).unwrap();
        assert_eq!(config.kind(), "sqlite");
    }

    #[test]
    fn unknown_type_is_a_domain_error() {
        let err = DatabaseConfig::from_json(&json!({"type": "oracle"})).unwrap_err();
        assert!(err.0.contains("oracle"));
    }

    #[test]
    fn sqlite_connection_url_enables_create() {
        let config = DatabaseConfig::Sqlite { file: ":memory:".to_string() };
        assert_eq!(config.connection_url(), "sqlite::memory:?mode=rwc");
    }
}
