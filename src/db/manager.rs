//! Owns the concurrent `connectionId -> Pool` mapping and the process-
//! lifetime query/error counters surfaced by `get_database_metrics`.
//!
//! Pools are backend-agnostic `sqlx::AnyPool`s: one pooling/Query code
//! path serves sqlite, mysql, and postgres alike, which is what lets the
//! executor and introspection modules stay driver-neutral too.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Once;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::{Value, json};
use sqlx::any::{AnyPool, AnyPoolOptions};

use crate::config::Config;
use crate::db::config::DatabaseConfig;
use crate::errors::{DomainError, NotFoundError, ResourceError};

static DRIVERS_INSTALLED: Once = Once::new();

fn ensure_drivers_installed() {
    DRIVERS_INSTALLED.call_once(|| {
        sqlx::any::install_default_drivers();
    });
}

pub struct ConnectionRecord {
    pub config: DatabaseConfig,
    pub pool: AnyPool,
}

#[derive(Default)]
pub struct Counters {
    pub total_queries: AtomicU64,
    pub total_errors: AtomicU64,
}

/// Owns every pooled connection the server holds, keyed by the client-
/// supplied `connectionId`. `DashMap` gives concurrent readers and writers
/// without a global lock; per-connection state is otherwise independent.
pub struct ConnectionManager {
    connections: Arc<DashMap<String, Arc<ConnectionRecord>>>,
    counters: Counters,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager {
    pub fn new() -> Self {
        ensure_drivers_installed();
        Self {
            connections: Arc::new(DashMap::new()),
            counters: Counters::default(),
        }
    }

    pub fn record_query(&self) {
        self.counters.total_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.counters.total_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Fails if `connection_id` is already present. Builds a pool tuned per
    /// the ambient config, validates it with one liveness query, and only
    /// then inserts the record — on any failure the map is left untouched.
    pub async fn connect(
        &self,
        connection_id: &str,
        config: DatabaseConfig,
        tuning: &Config,
    ) -> Result<(), DomainError> {
        if self.connections.contains_key(connection_id) {
            return Err(DomainError(format!("connection '{connection_id}' already exists")));
        }

        let kind = config.kind();
        let pool = build_pool(&config, tuning)
            .await
            .map_err(|e| DomainError(format!("Database operation failed for {kind} database (connection: {connection_id}): {e}")))?;

        if let Err(e) = sqlx::query("SELECT 1").fetch_one(&pool).await {
            pool.close().await;
            return Err(DomainError(format!(
                "Database operation failed for {kind} database (connection: {connection_id}): {e}"
            )));
        }

        self.connections.insert(connection_id.to_string(), Arc::new(ConnectionRecord { config, pool }));
        Ok(())
    }

    /// Idempotent: removing a missing id is not an error.
    pub async fn disconnect(&self, connection_id: &str) {
        if let Some((_, record)) = self.connections.remove(connection_id) {
            record.pool.close().await;
        } else {
            tracing::debug!(connection_id, "disconnect called on unknown connection id");
        }
    }

    pub fn get(&self, connection_id: &str) -> Result<Arc<ConnectionRecord>, NotFoundError> {
        self.connections
            .get(connection_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| NotFoundError(format!("Connection not found: {connection_id}")))
    }

    pub fn metrics(&self) -> Value {
        let mut connections = serde_json::Map::new();
        for entry in self.connections.iter() {
            let pool = &entry.value().pool;
            let total = pool.size();
            let idle = pool.num_idle() as u32;
            connections.insert(
                entry.key().clone(),
                json!({ "active": total.saturating_sub(idle), "idle": idle, "total": total }),
            );
        }
        json!({
            "total_queries": self.counters.total_queries.load(Ordering::Relaxed),
            "total_errors": self.counters.total_errors.load(Ordering::Relaxed),
            "active_connections": self.connections.len(),
            "connections": connections,
        })
    }

    /// Close every pool. Called once, from the shutdown hook.
    pub async fn close_all(&self) {
        for entry in self.connections.iter() {
            entry.value().pool.close().await;
        }
        self.connections.clear();
    }
}

async fn build_pool(config: &DatabaseConfig, tuning: &Config) -> Result<AnyPool, ResourceError> {
    // A private in-memory sqlite database is per-connection; capping the
    // pool at one connection keeps `:memory:` usable across statements the
    // way a single logical connection would be.
    let max_connections = match config {
        DatabaseConfig::Sqlite { file } if file == ":memory:" => 1,
        _ => tuning.db_pool_size,
    };

    AnyPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(tuning.db_pool_min_idle.min(max_connections))
        .acquire_timeout(Duration::from_millis(tuning.db_connection_timeout_ms))
        .idle_timeout(Duration::from_millis(tuning.db_idle_timeout_ms))
        .max_lifetime(Duration::from_millis(tuning.db_max_lifetime_ms))
        .connect(&config.connection_url())
        .await
        .map_err(|e| ResourceError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connecting_twice_with_same_id_fails() {
        let manager = ConnectionManager::new();
        let config = Config::default();
        manager
            .connect("c1", DatabaseConfig::Sqlite { file: ":memory:".to_string() }, &config)
            .await
            .unwrap();
        let err = manager
            .connect("c1", DatabaseConfig::Sqlite { file: ":memory:".to_string() }, &config)
            .await
            .unwrap_err();
        assert!(err.0.contains("already exists"));
        assert_eq!(manager.connections.len(), 1);
    }

    #[tokio::test]
    async fn disconnect_is_idempotent_on_missing_id() {
        let manager = ConnectionManager::new();
        manager.disconnect("ghost").await;
        manager.disconnect("ghost").await;
    }

    #[tokio::test]
    async fn get_fails_for_unknown_connection() {
        let manager = ConnectionManager::new();
        assert!(manager.get("nope").is_err());
    }
}
