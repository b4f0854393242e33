//! The tool registry: an insertion-safe, name-keyed mapping from tool name
//! to [`Tool`], shared by every module and read concurrently by the
//! dispatch pipeline and by `tools/list`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;

use crate::errors::HandlerError;
use crate::response::Envelope;
use crate::schema_validator::CompiledSchema;

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Envelope, HandlerError>> + Send>>;
pub type Handler = Arc<dyn Fn(Value) -> HandlerFuture + Send + Sync>;

/// An immutable tool descriptor. Constructed at module load and owned by
/// the registry for the lifetime of the process.
#[derive(Clone)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub schema: Arc<CompiledSchema>,
    pub handler: Handler,
}

impl Tool {
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        handler: F,
    ) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Envelope, HandlerError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            schema: Arc::new(CompiledSchema::compile(input_schema)),
            handler: Arc::new(move |args| Box::pin(handler(args))),
        }
    }
}

/// Failed to register a tool whose name already exists.
#[derive(Debug, thiserror::Error)]
#[error("tool already registered: {0}")]
pub struct DuplicateToolError(pub String);

/// A concurrent, name-keyed collection of registered tools.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Arc<DashMap<String, Arc<Tool>>>,
    /// Preserves insertion order for stable `tools/list` enumeration;
    /// `DashMap` iteration order is not stable across inserts/removals.
    order: Arc<std::sync::Mutex<Vec<String>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Fails if a tool with the same name is already
    /// present — names are unique across all modules.
    pub fn register(&self, tool: Tool) -> Result<(), DuplicateToolError> {
        if self.tools.contains_key(&tool.name) {
            return Err(DuplicateToolError(tool.name));
        }
        let name = tool.name.clone();
        self.tools.insert(name.clone(), Arc::new(tool));
        self.order.lock().unwrap_or_else(|e| e.into_inner()).push(name);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<Tool>> {
        self.tools.get(name).map(|entry| entry.value().clone())
    }

    /// Enumerate tools in registration order, suitable for `tools/list`.
    pub fn list(&self) -> Vec<Arc<Tool>> {
        let order = self.order.lock().unwrap_or_else(|e| e.into_inner());
        order
            .iter()
            .filter_map(|name| self.tools.get(name).map(|entry| entry.value().clone()))
            .collect()
    }

    /// Clear the registry wholesale. Only used at shutdown.
    pub fn clear(&self) {
        self.tools.clear();
        self.order.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn noop_tool(name: &str) -> Tool {
        Tool::new(name, "a test tool", json!({"type": "object"}), |_args| async {
            Ok(Envelope::text("ok"))
        })
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let registry = ToolRegistry::new();
        registry.register(noop_tool("a")).unwrap();
        let err = registry.register(noop_tool("a")).unwrap_err();
        assert_eq!(err.0, "a");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn list_preserves_insertion_order() {
        let registry = ToolRegistry::new();
        for name in ["c", "a", "b"] {
            registry.register(noop_tool(name)).unwrap();
        }
        let names: Vec<_> = registry.list().into_iter().map(|t| t.name.clone()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }
}
