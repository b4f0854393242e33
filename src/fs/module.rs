use async_trait::async_trait;
use serde_json::{Value, json};

use crate::errors::{DomainError, HandlerError, ResourceError};
use crate::module::Module;
use crate::registry::Tool;
use crate::response::Envelope;

fn required_str(args: &Value, field: &str) -> Result<String, HandlerError> {
    args.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| DomainError(format!("{field} is required")).into())
}

pub struct FsModule;

#[async_trait]
impl Module for FsModule {
    fn name(&self) -> &str {
        "fs"
    }

    fn version(&self) -> &str {
        "0.1.0"
    }

    fn tools(&self) -> Vec<Tool> {
        vec![
            Tool::new(
                "read_file",
                "Read a UTF-8 text file",
                json!({"type": "object", "properties": {"path": {"type": "string"}}, "required": ["path"]}),
                |args| async move {
                    let path = required_str(&args, "path")?;
                    let content = tokio::fs::read_to_string(&path).await.map_err(|e| ResourceError(e.to_string()))?;
                    Ok(Envelope::text(content))
                },
            ),
            Tool::new(
                "write_file",
                "Write UTF-8 text to a file, creating or overwriting it",
                json!({"type": "object", "properties": {"path": {"type": "string"}, "content": {"type": "string"}}, "required": ["path", "content"]}),
                |args| async move {
                    let path = required_str(&args, "path")?;
                    let content = required_str(&args, "content")?;
                    tokio::fs::write(&path, content).await.map_err(|e| ResourceError(e.to_string()))?;
                    Ok(Envelope::text(format!("Wrote file: {path}")))
                },
            ),
            Tool::new(
                "list_directory",
                "List entry names of a directory",
                json!({"type": "object", "properties": {"path": {"type": "string"}}, "required": ["path"]}),
                |args| async move {
                    let path = required_str(&args, "path")?;
                    let mut entries = tokio::fs::read_dir(&path).await.map_err(|e| ResourceError(e.to_string()))?;
                    let mut names = Vec::new();
                    while let Some(entry) = entries.next_entry().await.map_err(|e| ResourceError(e.to_string()))? {
                        names.push(entry.file_name().to_string_lossy().to_string());
                    }
                    names.sort();
                    Ok(Envelope::json(&json!(names)))
                },
            ),
        ]
    }
}
