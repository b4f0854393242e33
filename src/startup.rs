//! Assembles the registry from every module, attaches the stdio transport,
//! and blocks until shutdown — the single place that owns the server's
//! lifecycle from cold start to clean exit.

use std::sync::Arc;

use crate::db::manager::ConnectionManager;
use crate::errors::FatalError;
use crate::module::{Module, ModuleHost};
use crate::registry::ToolRegistry;
use crate::rpc::kernel::{self, ServerInfo};
use crate::rpc::transport::StdioTransport;

/// Runs once, before any module is registered, to fail fast on an
/// unusable environment rather than accepting connections that can never
/// succeed.
pub fn validate_environment() -> Result<(), FatalError> {
    if std::env::var_os("HOME").is_none() {
        tracing::debug!("HOME is not set; continuing, since no module currently requires it");
    }
    Ok(())
}

/// Owns the tool registry, the stdio transport, and the connection
/// manager shutdown hook. Module registration order is never observable
/// from the protocol surface — `tools/list` enumerates in the order each
/// module happened to register, not a documented contract.
pub struct StartupOrchestrator {
    registry: ToolRegistry,
    manager: Arc<ConnectionManager>,
    info: ServerInfo,
}

impl StartupOrchestrator {
    pub fn new(manager: Arc<ConnectionManager>, info: ServerInfo) -> Self {
        Self {
            registry: ToolRegistry::new(),
            manager,
            info,
        }
    }

    /// Register every module's tools atomically. A module that fails to
    /// load aborts startup entirely — there is no partial-module state.
    pub async fn load_modules(&self, modules: Vec<Box<dyn Module>>) -> Result<(), FatalError> {
        for module in modules {
            let host = ModuleHost::new();
            host.initialize(module.as_ref(), &self.registry).await?;
        }
        tracing::info!(tool_count = self.registry.len(), "all modules loaded");
        Ok(())
    }

    /// Attach stdin/stdout, start the read loop, and block until EOF or a
    /// shutdown signal. Returns once the transport has fully stopped and
    /// every pooled connection has been closed.
    pub async fn run(&self) -> Result<(), FatalError> {
        let transport = Arc::new(StdioTransport::new(tokio::io::stdout()));

        let registry = self.registry.clone();
        let info = self.info.clone();
        transport
            .set_message_handler(move |line| {
                let registry = registry.clone();
                let info = info.clone();
                async move { kernel::handle_line(&line, &registry, &info).await }
            })
            .await;

        transport.start(tokio::io::stdin()).await.map_err(|e| FatalError::Transport(e.to_string()))?;

        tokio::select! {
            _ = transport.wait() => {
                tracing::info!("stdin closed, shutting down");
            }
            _ = shutdown_signal() => {
                tracing::info!("shutdown signal received");
                transport.stop().await;
            }
        }

        tracing::info!("graceful shutdown initiated");
        self.manager.close_all().await;
        self.registry.clear();
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let Ok(mut signal) = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) else {
            std::future::pending::<()>().await;
            return;
        };
        signal.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
