//! Component databases
//!
//! A database lists component types with their properties. Files are YAML,
//! JSON or TOML, chosen by extension, all with the same structure:
//!
//! ```yaml
//! components:
//!   - type: MyAlg
//!     kind: Algorithm
//!     properties:
//!       - { name: Threshold, type: double, default: "0.5" }
//!       - { name: Inputs, type: "std::vector<std::string>" }
//! ```
//!
//! Defaults are written in options syntax; a missing default is the zero
//! value of the type.

use crate::error::{CoreError, CoreResult};
use gconf_catalog::TypeRegistry;
use gconf_options::parse_value;
use gconf_property::{ComponentKind, Schema, TypeSpec};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parsed database file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentDb {
    /// Component entries
    #[serde(default)]
    pub components: Vec<ComponentEntry>,
}

/// One component type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentEntry {
    /// Type name
    #[serde(rename = "type")]
    pub type_name: String,
    /// Kind name: Algorithm, AlgTool, Service, Auditor or User
    pub kind: String,
    /// Type documentation
    #[serde(default)]
    pub doc: String,
    /// Declared properties
    #[serde(default)]
    pub properties: Vec<PropertyEntry>,
}

/// One property declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyEntry {
    /// Property key
    pub name: String,
    /// C++-style type name
    #[serde(rename = "type")]
    pub type_name: String,
    /// Default in options syntax
    #[serde(default)]
    pub default: Option<String>,
    /// Documentation
    #[serde(default)]
    pub doc: String,
}

impl ComponentDb {
    /// Parse database text; `format` is a file extension
    ///
    /// # Errors
    /// Fails on unknown formats and malformed text.
    pub fn parse(text: &str, format: &str, label: &str) -> CoreResult<Self> {
        let fail = |message: String| CoreError::ComponentDb {
            path: label.to_string(),
            message,
        };
        match format {
            "yaml" | "yml" => serde_yaml::from_str(text).map_err(|e| fail(e.to_string())),
            "json" => serde_json::from_str(text).map_err(|e| fail(e.to_string())),
            "toml" => toml::from_str(text).map_err(|e| fail(e.to_string())),
            other => Err(fail(format!("unsupported database format '{other}'"))),
        }
    }

    /// Read a database file
    ///
    /// # Errors
    /// Fails on I/O errors and malformed files.
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.is_file() {
            return Err(CoreError::MissingFile(path.display().to_string()));
        }
        let text = std::fs::read_to_string(path).map_err(|e| CoreError::io(path.display(), &e))?;
        let format = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::parse(&text, format, &path.display().to_string())
    }

    /// Build schemas for every entry
    ///
    /// # Errors
    /// Fails on unknown kinds, bad type names, unparsable defaults and
    /// defaults that do not fit their type.
    pub fn schemas(&self, label: &str) -> CoreResult<Vec<Schema>> {
        let fail = |message: String| CoreError::ComponentDb {
            path: label.to_string(),
            message,
        };
        let mut out = Vec::with_capacity(self.components.len());
        for entry in &self.components {
            let kind = ComponentKind::parse(&entry.kind)
                .filter(|k| *k != ComponentKind::Generic)
                .ok_or_else(|| fail(format!("{}: unknown kind '{}'", entry.type_name, entry.kind)))?;
            let mut schema = Schema::new(&entry.type_name, kind).with_doc(&entry.doc);
            for property in &entry.properties {
                let spec: TypeSpec = property.type_name.parse()?;
                let default = match &property.default {
                    Some(text) => parse_value(text).map_err(|e| {
                        fail(format!("{}.{}: {e}", entry.type_name, property.name))
                    })?,
                    None => spec.zero(),
                };
                schema.declare(&property.name, spec, default, &property.doc)?;
            }
            out.push(schema);
        }
        Ok(out)
    }

    /// Register every entry; returns how many types were added or replaced
    ///
    /// # Errors
    /// Same as [`ComponentDb::schemas`].
    pub fn register_into(&self, types: &mut TypeRegistry, label: &str) -> CoreResult<usize> {
        let schemas = self.schemas(label)?;
        let count = schemas.len();
        for schema in schemas {
            if types.register(schema).is_some() {
                tracing::debug!("component database {} replaced a type", label);
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gconf_property::Value;

    const YAML: &str = r#"
components:
  - type: MyAlg
    kind: Algorithm
    doc: test algorithm
    properties:
      - { name: Threshold, type: double, default: "0.5" }
      - { name: Inputs, type: "std::vector<std::string>", default: '{"a"}' }
      - { name: Tool, type: "ToolHandle<IMyTool>", default: '"MyTool/Tool"' }
      - { name: Count, type: int }
"#;

    #[test]
    fn test_yaml_database() {
        let db = ComponentDb::parse(YAML, "yaml", "db.yaml").unwrap();
        let schemas = db.schemas("db.yaml").unwrap();
        assert_eq!(schemas.len(), 1);
        let alg = &schemas[0];
        assert_eq!(alg.kind(), ComponentKind::Algorithm);
        assert_eq!(alg.descriptor("Threshold").unwrap().default, Value::Float(0.5));
        assert_eq!(alg.descriptor("Inputs").unwrap().default, Value::list(["a"]));
        assert_eq!(alg.descriptor("Count").unwrap().default, Value::Int(0));
    }

    #[test]
    fn test_toml_and_json_match_yaml() {
        let toml_text = r#"
[[components]]
type = "MyAlg"
kind = "Algorithm"
doc = "test algorithm"
properties = [
  { name = "Threshold", type = "double", default = "0.5" },
  { name = "Inputs", type = "std::vector<std::string>", default = '{"a"}' },
  { name = "Tool", type = "ToolHandle<IMyTool>", default = '"MyTool/Tool"' },
  { name = "Count", type = "int" },
]
"#;
        let yaml = ComponentDb::parse(YAML, "yaml", "db.yaml").unwrap();
        let toml = ComponentDb::parse(toml_text, "toml", "db.toml").unwrap();
        assert_eq!(yaml, toml);
        let json = serde_json::to_string(&yaml).unwrap();
        assert_eq!(ComponentDb::parse(&json, "json", "db.json").unwrap(), yaml);
    }

    #[test]
    fn test_bad_kind() {
        let db = ComponentDb::parse(
            "components:\n  - { type: X, kind: Widget }\n",
            "yaml",
            "db.yaml",
        )
        .unwrap();
        let err = db.schemas("db.yaml").unwrap_err();
        assert_eq!(err.to_string(), "component database db.yaml: X: unknown kind 'Widget'");
    }

    #[test]
    fn test_unsupported_format() {
        assert!(ComponentDb::parse("", "ini", "db.ini").is_err());
    }
}
