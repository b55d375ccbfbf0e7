//! Parser module - Model schema files in TOML or JSON

use crate::Result;
use std::path::Path;

pub mod schema;

// Re-export key types
pub use schema::{ModelSchema, StateRecord, TransitionRecord};

/// Parser trait for model schema documents
pub trait Parser {
    fn parse_schema(&self, contents: &str) -> Result<ModelSchema>;
    fn render_schema(&self, schema: &ModelSchema) -> Result<String>;
}

/// TOML schema documents (`[[states]]` / `[[transitions]]` tables)
pub struct TomlParser;

impl Parser for TomlParser {
    fn parse_schema(&self, contents: &str) -> Result<ModelSchema> {
        Ok(toml::from_str(contents)?)
    }

    fn render_schema(&self, schema: &ModelSchema) -> Result<String> {
        Ok(toml::to_string_pretty(schema)?)
    }
}

/// JSON schema documents (`{"states": [...], "transitions": [...]}`)
pub struct JsonParser;

impl Parser for JsonParser {
    fn parse_schema(&self, contents: &str) -> Result<ModelSchema> {
        Ok(serde_json::from_str(contents)?)
    }

    fn render_schema(&self, schema: &ModelSchema) -> Result<String> {
        Ok(serde_json::to_string_pretty(schema)?)
    }
}

/// Pick a parser from the file extension; anything but `.json` is TOML
pub fn parser_for(path: &Path) -> &'static dyn Parser {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => &JsonParser,
        _ => &TomlParser,
    }
}
