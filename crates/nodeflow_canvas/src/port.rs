// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions for node inputs/outputs.

use crate::connection::Endpoint;
use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type tag that connects to every other type
pub const ANY_TYPE: &str = "any";

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port
    Input,
    /// Output port
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Output => f.write_str("output"),
        }
    }
}

/// Data type tag carried by a port.
///
/// Tags come from the node catalog as free-form strings and are stored
/// lower-cased, so `"Number"` and `"number"` name the same type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PortType(String);

impl PortType {
    /// Create a type tag, normalizing case and surrounding whitespace
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self(tag.as_ref().trim().to_lowercase())
    }

    /// The wildcard type
    pub fn any() -> Self {
        Self(ANY_TYPE.to_string())
    }

    /// The normalized tag
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the wildcard type
    pub fn is_any(&self) -> bool {
        self.0 == ANY_TYPE
    }

    /// Whether a connection between the two types needs no warning
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.is_any() || other.is_any() || self == other
    }
}

impl From<String> for PortType {
    fn from(tag: String) -> Self {
        Self::new(tag)
    }
}

impl From<&str> for PortType {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl From<PortType> for String {
    fn from(port_type: PortType) -> Self {
        port_type.0
    }
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A port declared by a node definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    /// Port name, unique per direction on a node
    pub name: String,
    /// Data type
    #[serde(alias = "type")]
    pub port_type: PortType,
    /// Whether the node can run with this input unbound
    #[serde(default)]
    pub optional: bool,
}

impl PortSpec {
    /// Create a required port
    pub fn new(name: impl Into<String>, port_type: impl Into<PortType>) -> Self {
        Self {
            name: name.into(),
            port_type: port_type.into(),
            optional: false,
        }
    }

    /// Mark as optional
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// A port as identified by the pointer stream.
///
/// The direction is part of the identity: a node may expose an input and an
/// output under the same name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortRef {
    /// Owning node
    pub node_id: NodeId,
    /// Port name
    pub port_name: String,
    /// Port direction
    pub direction: PortDirection,
}

impl PortRef {
    /// Reference an input port
    pub fn input(node_id: NodeId, port_name: impl Into<String>) -> Self {
        Self {
            node_id,
            port_name: port_name.into(),
            direction: PortDirection::Input,
        }
    }

    /// Reference an output port
    pub fn output(node_id: NodeId, port_name: impl Into<String>) -> Self {
        Self {
            node_id,
            port_name: port_name.into(),
            direction: PortDirection::Output,
        }
    }

    /// Drop the direction, keeping the stored connection end
    pub fn endpoint(&self) -> Endpoint {
        Endpoint {
            node_id: self.node_id,
            port_name: self.port_name.clone(),
        }
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} ({})", self.node_id, self.port_name, self.direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_type_normalizes_case() {
        assert_eq!(PortType::new("  Number "), PortType::new("number"));
        assert!(PortType::new("ANY").is_any());
        assert!(!PortType::new("string").is_any());
    }

    #[test]
    fn test_port_type_deserializes_through_normalization() {
        let spec: PortSpec =
            serde_json::from_str(r#"{"name":"in","type":"Image"}"#).unwrap();
        assert_eq!(spec.port_type.as_str(), "image");
        assert!(!spec.optional);
    }
}
