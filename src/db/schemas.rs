//! JSON Schema Draft-07 documents for every database tool. Kept alongside
//! the module that registers them since they are this module's wire
//! contract, not shared with any other tool family.

use serde_json::{Value, json};

const CONNECTION_ID_PATTERN: &str = "^[A-Za-z0-9_-]+$";

fn connection_id_property() -> Value {
    json!({ "type": "string", "pattern": CONNECTION_ID_PATTERN, "description": "Unique identifier for this connection" })
}

fn column_definition_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": { "type": "string" },
            "type": { "type": "string" },
            "primaryKey": { "type": "boolean", "default": false },
            "notNull": { "type": "boolean", "default": false },
            "defaultValue": {}
        },
        "required": ["name", "type"]
    })
}

pub fn connect_database() -> Value {
    json!({
        "type": "object",
        "properties": {
            "connectionId": connection_id_property(),
            "config": {
                "type": "object",
                "properties": {
                    "type": { "type": "string", "enum": ["sqlite", "mysql", "postgresql"] },
                    "file": { "type": "string" },
                    "host": { "type": "string" },
                    "port": { "type": "integer" },
                    "database": { "type": "string" },
                    "username": { "type": "string" },
                    "password": { "type": "string" }
                },
                "required": ["type"]
            }
        },
        "required": ["connectionId", "config"]
    })
}

pub fn disconnect_database() -> Value {
    json!({
        "type": "object",
        "properties": { "connectionId": connection_id_property() },
        "required": ["connectionId"]
    })
}

pub fn execute_query() -> Value {
    json!({
        "type": "object",
        "properties": {
            "connectionId": connection_id_property(),
            "query": { "type": "string", "minLength": 1 },
            "params": { "type": "array", "items": {}, "default": [] },
            "limit": { "type": "integer", "minimum": 1, "maximum": 10000, "default": 1000 }
        },
        "required": ["connectionId", "query"]
    })
}

pub fn execute_transaction() -> Value {
    json!({
        "type": "object",
        "properties": {
            "connectionId": connection_id_property(),
            "queries": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "properties": {
                        "query": { "type": "string", "minLength": 1 },
                        "params": { "type": "array", "items": {}, "default": [] }
                    },
                    "required": ["query"]
                }
            }
        },
        "required": ["connectionId", "queries"]
    })
}

pub fn list_tables() -> Value {
    json!({
        "type": "object",
        "properties": { "connectionId": connection_id_property() },
        "required": ["connectionId"]
    })
}

pub fn get_table_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "connectionId": connection_id_property(),
            "tableName": { "type": "string", "minLength": 1 }
        },
        "required": ["connectionId", "tableName"]
    })
}

pub fn get_database_metrics() -> Value {
    json!({ "type": "object", "properties": {} })
}

pub fn insert_data() -> Value {
    json!({
        "type": "object",
        "properties": {
            "connectionId": connection_id_property(),
            "tableName": { "type": "string", "minLength": 1 },
            "data": { "type": "object", "minProperties": 1 }
        },
        "required": ["connectionId", "tableName", "data"]
    })
}

pub fn update_data() -> Value {
    json!({
        "type": "object",
        "properties": {
            "connectionId": connection_id_property(),
            "tableName": { "type": "string", "minLength": 1 },
            "data": { "type": "object", "minProperties": 1 },
            "where": { "type": "string" },
            "whereParams": { "type": "array", "items": {}, "default": [] }
        },
        "required": ["connectionId", "tableName", "data"]
    })
}

pub fn delete_data() -> Value {
    json!({
        "type": "object",
        "properties": {
            "connectionId": connection_id_property(),
            "tableName": { "type": "string", "minLength": 1 },
            "where": { "type": "string" },
            "whereParams": { "type": "array", "items": {}, "default": [] }
        },
        "required": ["connectionId", "tableName"]
    })
}

pub fn create_table() -> Value {
    json!({
        "type": "object",
        "properties": {
            "connectionId": connection_id_property(),
            "tableName": { "type": "string", "minLength": 1 },
            "columns": { "type": "array", "minItems": 1, "items": column_definition_schema() }
        },
        "required": ["connectionId", "tableName", "columns"]
    })
}

pub fn drop_table() -> Value {
    json!({
        "type": "object",
        "properties": {
            "connectionId": connection_id_property(),
            "tableName": { "type": "string", "minLength": 1 }
        },
        "required": ["connectionId", "tableName"]
    })
}

pub fn alter_table() -> Value {
    json!({
        "type": "object",
        "properties": {
            "connectionId": connection_id_property(),
            "tableName": { "type": "string", "minLength": 1 },
            "action": { "type": "string", "enum": ["add_column", "drop_column"] },
            "columnDefinition": column_definition_schema(),
            "columnName": { "type": "string" }
        },
        "required": ["connectionId", "tableName", "action"],
        "oneOf": [
            {
                "properties": { "action": { "const": "add_column" } },
                "required": ["columnDefinition"]
            },
            {
                "properties": { "action": { "const": "drop_column" } },
                "required": ["columnName"]
            }
        ]
    })
}
