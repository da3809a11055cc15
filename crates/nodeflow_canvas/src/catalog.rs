// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node catalog: the externally supplied definitions nodes are created from.

use crate::node::PropertyValue;
use crate::port::PortSpec;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Node type category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Sources (constants, loaders, parameters)
    Input,
    /// Sinks (writers, previews)
    Output,
    /// Math operations
    Math,
    /// Logic/flow control
    Logic,
    /// Data transformation
    Transform,
    /// Utility nodes
    Utility,
    /// Custom/user-defined
    #[default]
    Custom,
}

/// Kind of value a property holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyKind {
    /// Boolean toggle
    Bool,
    /// Integer
    Int,
    /// Floating point
    Float,
    /// Free text
    String,
    /// One of a fixed set of strings
    Enum,
}

/// Constraints a property panel should enforce
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyConstraints {
    /// Minimum numeric value
    pub min: Option<f64>,
    /// Maximum numeric value
    pub max: Option<f64>,
    /// Allowed values for `Enum` properties
    pub options: Vec<String>,
}

/// Schema entry for one node property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySpec {
    /// Value kind
    pub kind: PropertyKind,
    /// Value a new node starts with
    pub default: PropertyValue,
    /// Editing constraints
    #[serde(default)]
    pub constraints: PropertyConstraints,
}

impl PropertySpec {
    /// Create a property with no constraints
    pub fn new(kind: PropertyKind, default: impl Into<PropertyValue>) -> Self {
        Self {
            kind,
            default: default.into(),
            constraints: PropertyConstraints::default(),
        }
    }
}

/// Node type definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDefinition {
    /// Unique type identifier
    pub type_tag: String,
    /// Display name
    pub display_name: String,
    /// Category
    #[serde(default)]
    pub category: NodeCategory,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Input ports
    #[serde(default)]
    pub inputs: Vec<PortSpec>,
    /// Output ports
    #[serde(default)]
    pub outputs: Vec<PortSpec>,
    /// Property schema by key
    #[serde(default)]
    pub properties: IndexMap<String, PropertySpec>,
}

impl NodeDefinition {
    /// Create a definition with no ports or properties
    pub fn new(
        type_tag: impl Into<String>,
        display_name: impl Into<String>,
        category: NodeCategory,
    ) -> Self {
        Self {
            type_tag: type_tag.into(),
            display_name: display_name.into(),
            category,
            description: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            properties: IndexMap::new(),
        }
    }

    /// Add an input port
    pub fn with_input(mut self, port: PortSpec) -> Self {
        self.inputs.push(port);
        self
    }

    /// Add an output port
    pub fn with_output(mut self, port: PortSpec) -> Self {
        self.outputs.push(port);
        self
    }

    /// Add a property
    pub fn with_property(mut self, key: impl Into<String>, spec: PropertySpec) -> Self {
        self.properties.insert(key.into(), spec);
        self
    }

    /// Property values a fresh node starts with
    pub fn default_properties(&self) -> IndexMap<String, PropertyValue> {
        self.properties
            .iter()
            .map(|(key, spec)| (key.clone(), spec.default.clone()))
            .collect()
    }
}

/// Registry of available node types
#[derive(Debug, Clone, Default)]
pub struct NodeCatalog {
    /// Registered definitions by type tag
    definitions: IndexMap<String, NodeDefinition>,
}

impl NodeCatalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node type, replacing any definition with the same tag
    pub fn register(&mut self, definition: NodeDefinition) {
        self.definitions.insert(definition.type_tag.clone(), definition);
    }

    /// Get a definition by type tag
    pub fn get(&self, type_tag: &str) -> Option<&NodeDefinition> {
        self.definitions.get(type_tag)
    }

    /// Whether a type tag is known
    pub fn contains(&self, type_tag: &str) -> bool {
        self.definitions.contains_key(type_tag)
    }

    /// All registered definitions, in registration order
    pub fn definitions(&self) -> impl Iterator<Item = &NodeDefinition> {
        self.definitions.values()
    }

    /// Definitions in a category
    pub fn in_category(&self, category: NodeCategory) -> impl Iterator<Item = &NodeDefinition> {
        self.definitions.values().filter(move |d| d.category == category)
    }

    /// Number of registered definitions
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Parse a RON list of definitions
    pub fn from_ron_str(source: &str) -> Result<Self, CatalogError> {
        let definitions: Vec<NodeDefinition> = ron::from_str(source)?;
        let mut catalog = Self::new();
        for definition in definitions {
            if catalog.contains(&definition.type_tag) {
                return Err(CatalogError::DuplicateType(definition.type_tag));
            }
            catalog.register(definition);
        }
        Ok(catalog)
    }

    /// Load a RON catalog file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_ron_str(&content)?;
        tracing::info!("Loaded {} node definitions from {:?}", catalog.len(), path);
        Ok(catalog)
    }
}

impl FromIterator<NodeDefinition> for NodeCatalog {
    fn from_iter<I: IntoIterator<Item = NodeDefinition>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for definition in iter {
            catalog.register(definition);
        }
        catalog
    }
}

/// Error loading a catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// File could not be read
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    /// File is not a valid RON definition list
    #[error("Invalid catalog: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Two definitions share a type tag
    #[error("Duplicate node type: {0}")]
    DuplicateType(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"[
        (
            type_tag: "constant",
            display_name: "Constant",
            category: Input,
            outputs: [(name: "value", port_type: "Number")],
            properties: {
                "value": (kind: Float, default: 1.5),
            },
        ),
        (
            type_tag: "print",
            display_name: "Print",
            category: Output,
            inputs: [(name: "value", port_type: "any", optional: true)],
        ),
    ]"#;

    #[test]
    fn test_catalog_from_ron() {
        let catalog = NodeCatalog::from_ron_str(CATALOG).unwrap();
        assert_eq!(catalog.len(), 2);

        let constant = catalog.get("constant").unwrap();
        assert_eq!(constant.outputs[0].port_type.as_str(), "number");
        assert_eq!(
            constant.default_properties().get("value"),
            Some(&PropertyValue::Float(1.5))
        );

        let print = catalog.get("print").unwrap();
        assert!(print.inputs[0].optional);
        assert_eq!(catalog.in_category(NodeCategory::Output).count(), 1);
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let source = r#"[
            (type_tag: "a", display_name: "A"),
            (type_tag: "a", display_name: "A again"),
        ]"#;
        assert!(matches!(
            NodeCatalog::from_ron_str(source),
            Err(CatalogError::DuplicateType(tag)) if tag == "a"
        ));
    }

    #[test]
    fn test_register_replaces() {
        let mut catalog = NodeCatalog::new();
        catalog.register(NodeDefinition::new("a", "First", NodeCategory::Math));
        catalog.register(NodeDefinition::new("a", "Second", NodeCategory::Math));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("a").unwrap().display_name, "Second");
    }
}
