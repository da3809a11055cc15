// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph store: nodes, connections and the connection index.
//!
//! Every mutation goes through [`GraphStore`], which keeps the index in
//! step with the connection collection and notifies subscribers.

use crate::catalog::NodeDefinition;
use crate::config::CanvasConfig;
use crate::connection::{Connection, ConnectionId};
use crate::coords::clamp_to_world;
use crate::events::{EntityRef, EventBus, EventKind, GraphEvent, SubscriptionId};
use crate::index::{ConnectionIndex, IndexEntry};
use crate::node::{Color, Node, NodeId, PropertyValue};
use crate::port::{PortDirection, PortRef, PortSpec};
use crate::validator;
use egui::{Pos2, Vec2};
use indexmap::IndexMap;

/// Pick a connection's color: `preferred` if set, else `fallback`.
///
/// `connect` prefers the source node; recoloring a node prefers the node at
/// the other end.
pub fn connection_color(preferred: Option<&Color>, fallback: Option<&Color>) -> Option<Color> {
    preferred.or(fallback).cloned()
}

/// Owner of the node graph
#[derive(Debug)]
pub struct GraphStore {
    nodes: IndexMap<NodeId, Node>,
    connections: IndexMap<ConnectionId, Connection>,
    index: ConnectionIndex,
    next_node_id: u64,
    next_connection_id: u64,
    world_size: f32,
    events: EventBus,
}

impl GraphStore {
    /// Create an empty store over a square world
    pub fn new(world_size: f32) -> Self {
        Self {
            nodes: IndexMap::new(),
            connections: IndexMap::new(),
            index: ConnectionIndex::default(),
            next_node_id: 1,
            next_connection_id: 1,
            world_size,
            events: EventBus::new(),
        }
    }

    /// Create an empty store using the config's world size
    pub fn from_config(config: &CanvasConfig) -> Self {
        Self::new(config.world_size)
    }

    /// Side length of the world
    pub fn world_size(&self) -> f32 {
        self.world_size
    }

    /// Receive events of one kind
    pub fn subscribe(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&GraphEvent) + 'static,
    ) -> SubscriptionId {
        self.events.subscribe(kind, handler)
    }

    /// Receive every event
    pub fn subscribe_all(&mut self, handler: impl FnMut(&GraphEvent) + 'static) -> SubscriptionId {
        self.events.subscribe_all(handler)
    }

    /// Remove a subscription
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // --- Nodes ---

    /// Add a node from a definition.
    ///
    /// `size` is the renderer's on-screen size; the position is clamped so
    /// the whole node stays inside the world.
    pub fn create_node(
        &mut self,
        definition: &NodeDefinition,
        position: Pos2,
        size: Vec2,
    ) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;

        let position = clamp_to_world(position, size, self.world_size);
        self.nodes.insert(id, Node::new(id, definition, position, size));
        tracing::debug!(node = %id, type_tag = %definition.type_tag, "Created node");

        self.events.emit(GraphEvent::NodeCreated { node_id: id });
        id
    }

    /// Remove a node and every connection touching it
    pub fn delete_node(&mut self, node_id: NodeId) -> Result<Node, GraphError> {
        let locked = match self.nodes.get(&node_id) {
            Some(node) => node.locked,
            None => return Err(missing_node(node_id)),
        };
        if locked {
            return Err(self.block(EntityRef::Node(node_id)));
        }

        for connection_id in self.incident_connection_ids(node_id) {
            self.remove_connection(connection_id);
        }

        let node = self
            .nodes
            .shift_remove(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        tracing::debug!(node = %node_id, "Deleted node");
        self.events.emit(GraphEvent::NodeDeleted { node_id });
        Ok(node)
    }

    /// Move a node, clamping into the world. Returns the applied position.
    pub fn move_node(&mut self, node_id: NodeId, position: Pos2) -> Result<Pos2, GraphError> {
        let world_size = self.world_size;
        let node = match self.nodes.get_mut(&node_id) {
            Some(node) => node,
            None => return Err(missing_node(node_id)),
        };
        if node.locked {
            return Err(self.block(EntityRef::Node(node_id)));
        }

        let position = clamp_to_world(position, node.size, world_size);
        if node.position != position {
            node.position = position;
            self.events.emit(GraphEvent::NodeMoved { node_id, position });
        }
        Ok(position)
    }

    /// Update the renderer-reported size, re-clamping the position
    pub fn set_node_size(&mut self, node_id: NodeId, size: Vec2) -> Result<(), GraphError> {
        let world_size = self.world_size;
        let node = self.nodes.get_mut(&node_id).ok_or_else(|| missing_node(node_id))?;
        node.size = size;
        let position = clamp_to_world(node.position, size, world_size);
        if node.position != position {
            node.position = position;
            self.events.emit(GraphEvent::NodeMoved { node_id, position });
        }
        Ok(())
    }

    /// Lock or unlock a node
    pub fn set_locked(&mut self, node_id: NodeId, locked: bool) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(&node_id).ok_or_else(|| missing_node(node_id))?;
        if node.locked != locked {
            node.locked = locked;
            self.events.emit(GraphEvent::NodeLockChanged { node_id, locked });
        }
        Ok(())
    }

    /// Set a property value
    pub fn set_property(
        &mut self,
        node_id: NodeId,
        key: impl Into<String>,
        value: PropertyValue,
    ) -> Result<(), GraphError> {
        let key = key.into();
        let node = self.nodes.get_mut(&node_id).ok_or_else(|| missing_node(node_id))?;
        if node.properties.get(&key) != Some(&value) {
            node.properties.insert(key.clone(), value);
            self.events.emit(GraphEvent::PropertyChanged { node_id, key });
        }
        Ok(())
    }

    /// Set or clear a node's color, then recompute its connections' colors
    pub fn set_node_color(
        &mut self,
        node_id: NodeId,
        color: Option<Color>,
    ) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(&node_id).ok_or_else(|| missing_node(node_id))?;
        if node.color != color {
            node.color = color.clone();
            self.events.emit(GraphEvent::NodeRecolored { node_id, color });
        }
        self.recolor_incident(node_id);
        Ok(())
    }

    fn recolor_incident(&mut self, node_id: NodeId) {
        for connection_id in self.incident_connection_ids(node_id) {
            let Some(connection) = self.connections.get(&connection_id) else {
                continue;
            };
            let Some(other) = connection.other_node(node_id) else {
                continue;
            };
            let color = connection_color(self.node_color(other), self.node_color(node_id));
            self.apply_connection_color(connection_id, color);
        }
    }

    /// Override a connection's color
    pub fn set_connection_color(
        &mut self,
        connection_id: ConnectionId,
        color: Option<Color>,
    ) -> Result<(), GraphError> {
        if !self.connections.contains_key(&connection_id) {
            return Err(missing_connection(connection_id));
        }
        self.apply_connection_color(connection_id, color);
        Ok(())
    }

    fn apply_connection_color(&mut self, connection_id: ConnectionId, color: Option<Color>) {
        if let Some(connection) = self.connections.get_mut(&connection_id) {
            if connection.color != color {
                connection.color = color.clone();
                self.events.emit(GraphEvent::ConnectionRecolored {
                    connection_id,
                    color,
                });
            }
        }
    }

    /// Ask the renderer to redraw every connection touching a node.
    ///
    /// Returns the affected connections.
    pub fn refresh_geometry(&mut self, node_id: NodeId) -> Vec<ConnectionId> {
        let connection_ids = self.incident_connection_ids(node_id);
        if !connection_ids.is_empty() {
            self.events.emit(GraphEvent::ConnectionGeometryChanged {
                connection_ids: connection_ids.clone(),
            });
        }
        connection_ids
    }

    /// Remove everything. IDs keep counting from where they were.
    pub fn clear(&mut self) {
        let (nodes, connections) = (self.nodes.len(), self.connections.len());
        self.connections.clear();
        self.index.clear();
        self.nodes.clear();
        tracing::info!("Cleared graph ({nodes} nodes, {connections} connections)");
        self.events.emit(GraphEvent::GraphCleared);
    }

    // --- Connections ---

    /// Connect two ports.
    ///
    /// The endpoints may be given in either order; the output side becomes
    /// the source. Any connection already bound to the input is replaced.
    /// Incompatible types are allowed but flagged on the connection.
    pub fn connect(&mut self, a: PortRef, b: PortRef) -> Result<ConnectionId, ConnectionError> {
        let (source, target) = validator::canonicalize(a, b)?;
        let mismatch = {
            let source_port = self.port_spec(&source)?;
            let target_port = self.port_spec(&target)?;
            validator::check(source_port, target_port).into_tooltip()
        };

        if let Some(existing) = self.index.binding(target.node_id, &target.port_name) {
            tracing::debug!(connection = %existing, "Replacing input binding on {}", target);
            self.remove_connection(existing);
        }

        let id = ConnectionId(self.next_connection_id);
        self.next_connection_id += 1;

        let connection = Connection {
            id,
            source: source.endpoint(),
            target: target.endpoint(),
            color: connection_color(
                self.node_color(source.node_id),
                self.node_color(target.node_id),
            ),
            mismatch,
        };
        if let Some(tooltip) = &connection.mismatch {
            tracing::debug!(connection = %id, "{tooltip}");
        }

        self.index.insert(&connection);
        self.connections.insert(id, connection);
        tracing::debug!(connection = %id, "Connected {} -> {}", source, target);

        self.events.emit(GraphEvent::ConnectionCreated { connection_id: id });
        Ok(id)
    }

    /// Remove a connection.
    ///
    /// Refused only when both endpoint nodes are locked.
    pub fn disconnect(&mut self, connection_id: ConnectionId) -> Result<Connection, GraphError> {
        let (source, target) = match self.connections.get(&connection_id) {
            Some(c) => (c.source.node_id, c.target.node_id),
            None => return Err(missing_connection(connection_id)),
        };
        if self.is_locked(source) && self.is_locked(target) {
            return Err(self.block(EntityRef::Connection(connection_id)));
        }

        self.remove_connection(connection_id)
            .ok_or(GraphError::ConnectionNotFound(connection_id))
    }

    /// Remove a connection from the collection and the index together
    fn remove_connection(&mut self, connection_id: ConnectionId) -> Option<Connection> {
        let connection = self.connections.shift_remove(&connection_id)?;
        self.index.remove(&connection);
        tracing::debug!(connection = %connection_id, "Removed connection");
        self.events.emit(GraphEvent::ConnectionDeleted { connection_id });
        Some(connection)
    }

    fn port_spec(&self, port: &PortRef) -> Result<&PortSpec, ConnectionError> {
        let node = self
            .nodes
            .get(&port.node_id)
            .ok_or(ConnectionError::NodeNotFound(port.node_id))?;
        node.port(&port.port_name, port.direction)
            .ok_or_else(|| ConnectionError::PortNotFound(port.clone()))
    }

    // --- Queries ---

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// All nodes, in creation order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All node IDs, in creation order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether a node exists
    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    /// Get a connection by ID
    pub fn connection(&self, connection_id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&connection_id)
    }

    /// All connections, in creation order
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// The connection index
    pub fn index(&self) -> &ConnectionIndex {
        &self.index
    }

    /// Connections ending at a node
    pub fn incoming(&self, node_id: NodeId) -> Vec<IndexEntry> {
        self.index
            .incoming_ids(node_id)
            .filter_map(|(port, id)| {
                let connection = self.connections.get(&id)?;
                Some(IndexEntry {
                    connection_id: id,
                    local_port: port.to_string(),
                    remote_node: connection.source.node_id,
                    remote_port: connection.source.port_name.clone(),
                })
            })
            .collect()
    }

    /// Connections leaving a node
    pub fn outgoing(&self, node_id: NodeId) -> Vec<IndexEntry> {
        self.index
            .outgoing_ids(node_id)
            .filter_map(|(port, id)| {
                let connection = self.connections.get(&id)?;
                Some(IndexEntry {
                    connection_id: id,
                    local_port: port.to_string(),
                    remote_node: connection.target.node_id,
                    remote_port: connection.target.port_name.clone(),
                })
            })
            .collect()
    }

    /// The connection bound to an input port
    pub fn input_binding(&self, node_id: NodeId, port_name: &str) -> Option<&Connection> {
        self.index
            .binding(node_id, port_name)
            .and_then(|id| self.connections.get(&id))
    }

    /// IDs of every connection touching a node, incoming first
    pub fn incident_connection_ids(&self, node_id: NodeId) -> Vec<ConnectionId> {
        self.index
            .incoming_ids(node_id)
            .chain(self.index.outgoing_ids(node_id))
            .map(|(_, id)| id)
            .collect()
    }

    fn node_color(&self, node_id: NodeId) -> Option<&Color> {
        self.nodes.get(&node_id).and_then(|n| n.color.as_ref())
    }

    fn is_locked(&self, node_id: NodeId) -> bool {
        self.nodes.get(&node_id).is_some_and(|n| n.locked)
    }

    fn block(&mut self, entity: EntityRef) -> GraphError {
        tracing::warn!("Blocked: {entity} is locked");
        self.events.emit(GraphEvent::Blocked { entity });
        GraphError::Locked(entity)
    }
}

fn missing_node(node_id: NodeId) -> GraphError {
    tracing::debug!(node = %node_id, "Unknown node");
    GraphError::NodeNotFound(node_id)
}

fn missing_connection(connection_id: ConnectionId) -> GraphError {
    tracing::debug!(connection = %connection_id, "Unknown connection");
    GraphError::ConnectionNotFound(connection_id)
}

/// Error from a node or connection mutation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Connection not found
    #[error("Connection not found: {0}")]
    ConnectionNotFound(ConnectionId),

    /// Refused because of a lock
    #[error("{0} is locked")]
    Locked(EntityRef),
}

/// Error when creating a connection
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Port not found on the node
    #[error("Port not found: {0}")]
    PortNotFound(PortRef),

    /// Both ends are on one node
    #[error("Self-loop not allowed")]
    SelfLoop,

    /// Both ends are inputs, or both outputs
    #[error("Both ports are {0}s")]
    SameDirection(PortDirection),
}
