//! JSON Schema Draft-07 documents for the web fetch tool family.

use serde_json::{Value, json};

fn fetch_options_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "timeoutMs": { "type": "integer", "minimum": 1, "default": 10000 },
            "userAgent": { "type": "string" },
            "followRedirects": { "type": "boolean", "default": true },
            "includeHeaders": { "type": "boolean", "default": false },
            "textOnly": { "type": "boolean", "default": true },
            "maxLength": { "type": "integer", "minimum": 1, "default": 50000 }
        }
    })
}

pub fn fetch_url() -> Value {
    json!({
        "type": "object",
        "properties": {
            "url": { "type": "string", "minLength": 1 },
            "options": fetch_options_schema()
        },
        "required": ["url"]
    })
}

pub fn fetch_multiple_urls() -> Value {
    json!({
        "type": "object",
        "properties": {
            "urls": { "type": "array", "items": { "type": "string" }, "minItems": 1 },
            "options": {
                "type": "object",
                "properties": { "includeFailures": { "type": "boolean", "default": false } }
            }
        },
        "required": ["urls"]
    })
}

pub fn extract_links() -> Value {
    json!({
        "type": "object",
        "properties": {
            "url": { "type": "string", "minLength": 1 },
            "options": {
                "type": "object",
                "properties": {
                    "filter": { "type": "string", "enum": ["all", "internal", "external"], "default": "all" },
                    "includeText": { "type": "boolean", "default": true },
                    "unique": { "type": "boolean", "default": true },
                    "maxLinks": { "type": "integer", "minimum": 1, "default": 100 }
                }
            }
        },
        "required": ["url"]
    })
}

pub fn analyze_webpage() -> Value {
    json!({
        "type": "object",
        "properties": {
            "url": { "type": "string", "minLength": 1 },
            "sections": {
                "type": "object",
                "properties": {
                    "metadata": { "type": "boolean", "default": true },
                    "structure": { "type": "boolean", "default": true },
                    "images": { "type": "boolean", "default": true },
                    "performance": { "type": "boolean", "default": true }
                }
            }
        },
        "required": ["url"]
    })
}
