// src/schema/types.rs

use serde::{Deserialize, Serialize};

pub const STRING_TYPE: &str = "STRING";
pub const NULLABLE_MODE: &str = "NULLABLE";
pub const SCHEMA_VERSION: u32 = 2;

fn nullable() -> String {
    NULLABLE_MODE.to_string()
}

/// A single column definition as written to the schema file.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Eq, Hash)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default = "nullable")]
    pub mode: String,
}

impl Column {
    /// Nullable STRING column.
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: STRING_TYPE.to_string(),
            mode: nullable(),
        }
    }
}

/// Column layout of one warehouse table, in dataset column order.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct SchemaDescriptor {
    #[serde(rename = "name")]
    pub table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub columns: Vec<Column>,
}

/// On-disk document: a version marker plus a list of models. We always
/// write exactly one model per file.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct SchemaDocument {
    pub version: u32,
    #[serde(default)]
    pub models: Vec<SchemaDescriptor>,
}

impl SchemaDocument {
    pub fn single(descriptor: SchemaDescriptor) -> Self {
        Self {
            version: SCHEMA_VERSION,
            models: vec![descriptor],
        }
    }
}
