// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) definitions for the graph.

use crate::node::{Color, NodeId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a connection.
///
/// Allocated by the owning store from a counter; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// One end of a stored connection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Node ID
    pub node_id: NodeId,
    /// Port name on that node
    pub port_name: String,
}

/// A connection from an output port to an input port
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Output end
    pub source: Endpoint,
    /// Input end
    pub target: Endpoint,
    /// Color, inherited from the endpoints unless overridden
    pub color: Option<Color>,
    /// Tooltip text when the port types do not match
    pub mismatch: Option<String>,
}

impl Connection {
    /// The node at the opposite end from `node_id`
    pub fn other_node(&self, node_id: NodeId) -> Option<NodeId> {
        if self.source.node_id == node_id {
            Some(self.target.node_id)
        } else if self.target.node_id == node_id {
            Some(self.source.node_id)
        } else {
            None
        }
    }

    /// Whether the port types were incompatible when connected
    pub fn is_mismatched(&self) -> bool {
        self.mismatch.is_some()
    }
}
