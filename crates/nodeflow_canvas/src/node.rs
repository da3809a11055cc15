// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node instances placed on the canvas.

use crate::catalog::NodeDefinition;
use crate::port::{PortDirection, PortSpec};
use egui::{Pos2, Vec2};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a node.
///
/// Allocated by the owning store from a counter; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Opaque color override, e.g. `#ff0000`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    /// Wrap a color string
    pub fn new(color: impl Into<String>) -> Self {
        Self(color.into())
    }

    /// The color string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Color {
    fn from(color: &str) -> Self {
        Self::new(color)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value of a node property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point
    Float(f64),
    /// String
    String(String),
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

/// A node instance in the graph
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Catalog type this node was created from
    pub type_tag: String,
    /// Top-left corner in world units
    pub position: Pos2,
    /// On-screen size in world units, as reported by the renderer
    pub size: Vec2,
    /// Property values, seeded from the definition's defaults
    pub properties: IndexMap<String, PropertyValue>,
    /// Locked nodes cannot be dragged or deleted
    pub locked: bool,
    /// Custom color
    pub color: Option<Color>,
    /// Input ports
    pub input_ports: Vec<PortSpec>,
    /// Output ports
    pub output_ports: Vec<PortSpec>,
}

impl Node {
    pub(crate) fn new(id: NodeId, definition: &NodeDefinition, position: Pos2, size: Vec2) -> Self {
        Self {
            id,
            type_tag: definition.type_tag.clone(),
            position,
            size,
            properties: definition.default_properties(),
            locked: false,
            color: None,
            input_ports: definition.inputs.clone(),
            output_ports: definition.outputs.clone(),
        }
    }

    /// Get an input port by name
    pub fn input_port(&self, name: &str) -> Option<&PortSpec> {
        self.input_ports.iter().find(|p| p.name == name)
    }

    /// Get an output port by name
    pub fn output_port(&self, name: &str) -> Option<&PortSpec> {
        self.output_ports.iter().find(|p| p.name == name)
    }

    /// Get a port by name and direction
    pub fn port(&self, name: &str, direction: PortDirection) -> Option<&PortSpec> {
        match direction {
            PortDirection::Input => self.input_port(name),
            PortDirection::Output => self.output_port(name),
        }
    }
}
