// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection validation: endpoint roles and type compatibility.

use crate::port::{PortDirection, PortRef, PortSpec, PortType};
use crate::store::ConnectionError;

/// Result of comparing two port types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compatibility {
    /// Types match or one side is `any`
    Compatible,
    /// Types differ; the connection is still allowed but flagged
    Mismatch {
        /// Human-readable warning for the UI
        tooltip: String,
    },
}

impl Compatibility {
    /// The warning text, if any
    pub fn into_tooltip(self) -> Option<String> {
        match self {
            Self::Compatible => None,
            Self::Mismatch { tooltip } => Some(tooltip),
        }
    }
}

/// Check if two port types can be connected without a warning
pub fn is_compatible(a: &PortType, b: &PortType) -> bool {
    a.is_compatible(b)
}

/// Compare an output port with the input it feeds
pub fn check(source: &PortSpec, target: &PortSpec) -> Compatibility {
    if is_compatible(&source.port_type, &target.port_type) {
        Compatibility::Compatible
    } else {
        Compatibility::Mismatch {
            tooltip: format!(
                "Type mismatch: {} → {}",
                source.port_type, target.port_type
            ),
        }
    }
}

/// Order two endpoints as (output, input).
///
/// Rejects endpoints on the same node and endpoints with the same role.
pub fn canonicalize(a: PortRef, b: PortRef) -> Result<(PortRef, PortRef), ConnectionError> {
    if a.node_id == b.node_id {
        return Err(ConnectionError::SelfLoop);
    }
    match (a.direction, b.direction) {
        (PortDirection::Output, PortDirection::Input) => Ok((a, b)),
        (PortDirection::Input, PortDirection::Output) => Ok((b, a)),
        (direction, _) => Err(ConnectionError::SameDirection(direction)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeId;

    #[test]
    fn test_compatibility() {
        let number = PortType::new("number");
        assert!(is_compatible(&number, &PortType::new("Number")));
        assert!(is_compatible(&number, &PortType::any()));
        assert!(is_compatible(&PortType::any(), &PortType::new("image")));
        assert!(!is_compatible(&number, &PortType::new("string")));
    }

    #[test]
    fn test_mismatch_tooltip() {
        let result = check(&PortSpec::new("out", "number"), &PortSpec::new("in", "string"));
        assert_eq!(
            result.into_tooltip().as_deref(),
            Some("Type mismatch: number → string")
        );
    }

    #[test]
    fn test_canonicalize_orders_output_first() {
        let input = PortRef::input(NodeId(2), "in");
        let output = PortRef::output(NodeId(1), "out");
        let (source, target) = canonicalize(input.clone(), output.clone()).unwrap();
        assert_eq!(source, output);
        assert_eq!(target, input);
    }

    #[test]
    fn test_canonicalize_rejections() {
        assert_eq!(
            canonicalize(PortRef::output(NodeId(1), "out"), PortRef::input(NodeId(1), "in")),
            Err(ConnectionError::SelfLoop)
        );
        assert_eq!(
            canonicalize(PortRef::input(NodeId(1), "a"), PortRef::input(NodeId(2), "b")),
            Err(ConnectionError::SameDirection(PortDirection::Input))
        );
    }
}
