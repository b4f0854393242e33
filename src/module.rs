//! Groups related tools into named *modules* for lifecycle (`on_load`/
//! `on_unload`) and discovery, and registers all tools of a module
//! atomically with the [`ToolRegistry`].

use async_trait::async_trait;

use crate::errors::FatalError;
use crate::registry::{Tool, ToolRegistry};

/// `{name, version, description?}` plus the tools it contributes.
#[async_trait]
pub trait Module: Send + Sync {
    fn name(&self) -> &str;
    fn version(&self) -> &str;
    fn description(&self) -> Option<&str> {
        None
    }

    /// Runs once, before any of this module's tools are registered.
    async fn on_load(&self) -> Result<(), FatalError> {
        Ok(())
    }

    /// Runs once at shutdown. Tools are **not** removed from the registry
    /// on unload — the registry is only ever cleared wholesale, at process
    /// exit, never tool-by-tool.
    async fn on_unload(&self) {}

    /// The tools this module contributes. Called once, after `on_load`.
    fn tools(&self) -> Vec<Tool>;
}

/// Calls `initialize` exactly once per module; a second call fails.
pub struct ModuleHost {
    initialized: std::sync::atomic::AtomicBool,
}

impl Default for ModuleHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleHost {
    pub fn new() -> Self {
        Self {
            initialized: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Run `on_load`, then register every tool of `module` with `registry`.
    /// Registration is atomic in the sense that a duplicate tool name
    /// anywhere in the module aborts the whole module's registration — the
    /// caller decides whether that is fatal.
    pub async fn initialize(
        &self,
        module: &dyn Module,
        registry: &ToolRegistry,
    ) -> Result<(), FatalError> {
        if self
            .initialized
            .swap(true, std::sync::atomic::Ordering::SeqCst)
        {
            return Err(FatalError::ModuleInit(format!(
                "module host for `{}` already initialized",
                module.name()
            )));
        }

        module.on_load().await?;

        for tool in module.tools() {
            registry.register(tool).map_err(|e| {
                FatalError::ModuleInit(format!(
                    "module `{}` failed to register tool: {e}",
                    module.name()
                ))
            })?;
        }

        tracing::info!(module = module.name(), version = module.version(), "module initialized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Envelope;
    use serde_json::json;

    struct EchoModule;

    #[async_trait]
    impl Module for EchoModule {
        fn name(&self) -> &str {
            "echo"
        }
        fn version(&self) -> &str {
            "0.1.0"
        }
        fn tools(&self) -> Vec<Tool> {
            vec![Tool::new("echo", "echoes", json!({"type": "object"}), |_args| async {
                Ok(Envelope::text("echo"))
            })]
        }
    }

    #[tokio::test]
    async fn second_initialize_fails() {
        let host = ModuleHost::new();
        let registry = ToolRegistry::new();
        let module = EchoModule;
        host.initialize(&module, &registry).await.unwrap();
        assert!(host.initialize(&module, &registry).await.is_err());
        assert_eq!(registry.len(), 1);
    }
}
