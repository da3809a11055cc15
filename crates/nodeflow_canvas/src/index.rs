// SPDX-License-Identifier: MIT OR Apache-2.0
//! Incoming/outgoing connection index.
//!
//! The index is a projection of the store's connection collection. It is
//! only mutated by the store, in the same call that mutates a connection.

use crate::connection::{Connection, ConnectionId};
use crate::node::NodeId;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;

/// One row of an incoming/outgoing projection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// The connection
    pub connection_id: ConnectionId,
    /// Port on the queried node
    pub local_port: String,
    /// Node at the other end
    pub remote_node: NodeId,
    /// Port on the remote node
    pub remote_port: String,
}

/// Per-node, per-port lookup of connections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionIndex {
    /// Input bindings: at most one connection per input port
    incoming: HashMap<NodeId, IndexMap<String, ConnectionId>>,
    /// Output fan-out: any number of connections per output port
    outgoing: HashMap<NodeId, IndexMap<String, IndexSet<ConnectionId>>>,
}

impl ConnectionIndex {
    /// Build an index from scratch
    pub fn from_connections<'a>(connections: impl IntoIterator<Item = &'a Connection>) -> Self {
        let mut index = Self::default();
        for connection in connections {
            index.insert(connection);
        }
        index
    }

    /// Record a connection. Returns the binding it displaced, which callers
    /// must already have removed.
    pub(crate) fn insert(&mut self, connection: &Connection) -> Option<ConnectionId> {
        self.outgoing
            .entry(connection.source.node_id)
            .or_default()
            .entry(connection.source.port_name.clone())
            .or_default()
            .insert(connection.id);
        self.incoming
            .entry(connection.target.node_id)
            .or_default()
            .insert(connection.target.port_name.clone(), connection.id)
    }

    /// Forget a connection, pruning empty entries
    pub(crate) fn remove(&mut self, connection: &Connection) {
        if let Some(ports) = self.incoming.get_mut(&connection.target.node_id) {
            if ports.get(&connection.target.port_name) == Some(&connection.id) {
                ports.shift_remove(&connection.target.port_name);
            }
            if ports.is_empty() {
                self.incoming.remove(&connection.target.node_id);
            }
        }

        if let Some(ports) = self.outgoing.get_mut(&connection.source.node_id) {
            if let Some(ids) = ports.get_mut(&connection.source.port_name) {
                ids.shift_remove(&connection.id);
                if ids.is_empty() {
                    ports.shift_remove(&connection.source.port_name);
                }
            }
            if ports.is_empty() {
                self.outgoing.remove(&connection.source.node_id);
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.incoming.clear();
        self.outgoing.clear();
    }

    /// The connection bound to an input port
    pub fn binding(&self, node_id: NodeId, port_name: &str) -> Option<ConnectionId> {
        self.incoming.get(&node_id)?.get(port_name).copied()
    }

    /// Connections ending at a node, as (input port, connection)
    pub fn incoming_ids(&self, node_id: NodeId) -> impl Iterator<Item = (&str, ConnectionId)> {
        self.incoming
            .get(&node_id)
            .into_iter()
            .flat_map(|ports| ports.iter().map(|(port, id)| (port.as_str(), *id)))
    }

    /// Connections leaving a node, as (output port, connection)
    pub fn outgoing_ids(&self, node_id: NodeId) -> impl Iterator<Item = (&str, ConnectionId)> {
        self.outgoing.get(&node_id).into_iter().flat_map(|ports| {
            ports
                .iter()
                .flat_map(|(port, ids)| ids.iter().map(move |id| (port.as_str(), *id)))
        })
    }

    /// Whether any entry mentions the node
    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.incoming.contains_key(&node_id) || self.outgoing.contains_key(&node_id)
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.incoming.is_empty() && self.outgoing.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Endpoint;

    fn connection(id: u64, from: u64, to: u64, to_port: &str) -> Connection {
        Connection {
            id: ConnectionId(id),
            source: Endpoint {
                node_id: NodeId(from),
                port_name: "out".to_string(),
            },
            target: Endpoint {
                node_id: NodeId(to),
                port_name: to_port.to_string(),
            },
            color: None,
            mismatch: None,
        }
    }

    #[test]
    fn test_insert_and_remove_prunes() {
        let mut index = ConnectionIndex::default();
        let a = connection(1, 1, 2, "in");
        let b = connection(2, 1, 3, "in");
        index.insert(&a);
        index.insert(&b);

        assert_eq!(index.binding(NodeId(2), "in"), Some(ConnectionId(1)));
        assert_eq!(index.outgoing_ids(NodeId(1)).count(), 2);

        index.remove(&a);
        assert_eq!(index.binding(NodeId(2), "in"), None);
        assert!(!index.contains_node(NodeId(2)));
        assert_eq!(index.outgoing_ids(NodeId(1)).count(), 1);

        index.remove(&b);
        assert!(index.is_empty());
    }

    #[test]
    fn test_remove_stale_binding_keeps_current() {
        let mut index = ConnectionIndex::default();
        let old = connection(1, 1, 2, "in");
        let new = connection(2, 3, 2, "in");
        index.insert(&old);
        index.insert(&new);
        index.remove(&old);
        assert_eq!(index.binding(NodeId(2), "in"), Some(ConnectionId(2)));
    }
}
