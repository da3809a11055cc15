// SPDX-License-Identifier: MIT OR Apache-2.0
//! Selection state and selection-scoped operations.
//!
//! Nodes and connections are selected independently: selecting a node does
//! not select its connections.

use crate::connection::ConnectionId;
use crate::events::{EventBus, EventKind, GraphEvent, SubscriptionId};
use crate::node::{Color, NodeId};
use crate::store::{GraphError, GraphStore};
use indexmap::IndexSet;

/// Selected nodes and connections
#[derive(Debug, Default)]
pub struct SelectionManager {
    nodes: IndexSet<NodeId>,
    connections: IndexSet<ConnectionId>,
    events: EventBus,
}

impl SelectionManager {
    /// Create an empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive [`GraphEvent::SelectionChanged`]
    pub fn subscribe(&mut self, handler: impl FnMut(&GraphEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(EventKind::SelectionChanged, handler)
    }

    /// Remove a subscription
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Run a mutation and notify if the selection actually changed
    fn apply(&mut self, change: impl FnOnce(&mut IndexSet<NodeId>, &mut IndexSet<ConnectionId>)) {
        let before = (self.nodes.clone(), self.connections.clone());
        change(&mut self.nodes, &mut self.connections);
        if self.nodes != before.0 || self.connections != before.1 {
            self.events.emit(GraphEvent::SelectionChanged {
                nodes: self.nodes.iter().copied().collect(),
                connections: self.connections.iter().copied().collect(),
            });
        }
    }

    /// Select a node, optionally replacing the current selection
    pub fn select_node(&mut self, node_id: NodeId, exclusive: bool) {
        self.apply(|nodes, connections| {
            if exclusive {
                nodes.clear();
                connections.clear();
            }
            nodes.insert(node_id);
        });
    }

    /// Toggle node selection
    pub fn toggle_node(&mut self, node_id: NodeId) {
        self.apply(|nodes, _| {
            if !nodes.shift_remove(&node_id) {
                nodes.insert(node_id);
            }
        });
    }

    /// Select a connection, optionally replacing the current selection
    pub fn select_connection(&mut self, connection_id: ConnectionId, exclusive: bool) {
        self.apply(|nodes, connections| {
            if exclusive {
                nodes.clear();
                connections.clear();
            }
            connections.insert(connection_id);
        });
    }

    /// Toggle connection selection
    pub fn toggle_connection(&mut self, connection_id: ConnectionId) {
        self.apply(|_, connections| {
            if !connections.shift_remove(&connection_id) {
                connections.insert(connection_id);
            }
        });
    }

    /// Clear selection
    pub fn clear(&mut self) {
        self.apply(|nodes, connections| {
            nodes.clear();
            connections.clear();
        });
    }

    /// Whether a node is selected
    pub fn is_node_selected(&self, node_id: NodeId) -> bool {
        self.nodes.contains(&node_id)
    }

    /// Whether a connection is selected
    pub fn is_connection_selected(&self, connection_id: ConnectionId) -> bool {
        self.connections.contains(&connection_id)
    }

    /// Selected nodes, in selection order
    pub fn selected_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    /// Selected connections, in selection order
    pub fn selected_connections(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.connections.iter().copied()
    }

    /// Whether nothing is selected
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.connections.is_empty()
    }

    /// Color every selected node. Incident connections follow the shared
    /// color policy, preferring the other endpoint's color.
    pub fn set_color(&self, store: &mut GraphStore, color: Color) {
        self.recolor(store, Some(color));
    }

    /// Clear the color of every selected node and recompute incident
    /// connection colors
    pub fn reset_color(&self, store: &mut GraphStore) {
        self.recolor(store, None);
    }

    fn recolor(&self, store: &mut GraphStore, color: Option<Color>) {
        for &node_id in &self.nodes {
            if let Err(err) = store.set_node_color(node_id, color.clone()) {
                tracing::debug!("Skipping recolor: {err}");
            }
        }
    }

    /// Delete the selection: connections first, then nodes.
    ///
    /// Locked items are left in place and stay selected. Returns how many
    /// items were removed.
    pub fn delete_selected(&mut self, store: &mut GraphStore) -> usize {
        let mut removed = 0;
        let mut kept_connections = IndexSet::new();
        let mut kept_nodes = IndexSet::new();

        for &connection_id in &self.connections {
            match store.disconnect(connection_id) {
                Ok(_) => removed += 1,
                Err(GraphError::Locked(_)) => {
                    kept_connections.insert(connection_id);
                }
                Err(_) => {}
            }
        }

        for &node_id in &self.nodes {
            match store.delete_node(node_id) {
                Ok(_) => removed += 1,
                Err(GraphError::Locked(_)) => {
                    kept_nodes.insert(node_id);
                }
                Err(_) => {}
            }
        }

        self.apply(|nodes, connections| {
            *nodes = kept_nodes;
            *connections = kept_connections;
        });
        removed
    }

    /// Forget selected ids that no longer exist in the store
    pub fn retain_existing(&mut self, store: &GraphStore) {
        self.apply(|nodes, connections| {
            nodes.retain(|&id| store.contains_node(id));
            connections.retain(|&id| store.connection(id).is_some());
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::PortRef;
    use crate::testing::{add_node, catalog};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// `a -> n -> c`, returning (store, a, n, c, a->n, n->c)
    fn chain() -> (GraphStore, NodeId, NodeId, NodeId, ConnectionId, ConnectionId) {
        let catalog = catalog();
        let mut store = GraphStore::new(100_000.0);
        let a = add_node(&mut store, &catalog, "source");
        let n = add_node(&mut store, &catalog, "relay");
        let c = add_node(&mut store, &catalog, "relay");
        let an = store.connect(PortRef::output(a, "out"), PortRef::input(n, "in")).unwrap();
        let nc = store.connect(PortRef::output(n, "out"), PortRef::input(c, "in")).unwrap();
        (store, a, n, c, an, nc)
    }

    #[test]
    fn test_color_propagation() {
        let (mut store, _, n, _, an, nc) = chain();
        let mut selection = SelectionManager::new();
        selection.select_node(n, true);

        selection.set_color(&mut store, Color::from("#ff0000"));
        assert_eq!(store.connection(an).unwrap().color, Some(Color::from("#ff0000")));
        assert_eq!(store.connection(nc).unwrap().color, Some(Color::from("#ff0000")));

        selection.reset_color(&mut store);
        assert_eq!(store.connection(an).unwrap().color, None);
        assert_eq!(store.connection(nc).unwrap().color, None);
        assert_eq!(store.node(n).unwrap().color, None);
    }

    #[test]
    fn test_color_prefers_other_endpoint() {
        let (mut store, a, n, _, an, nc) = chain();
        store.set_node_color(a, Some(Color::from("#0000ff"))).unwrap();
        assert_eq!(store.connection(an).unwrap().color, Some(Color::from("#0000ff")));

        let mut selection = SelectionManager::new();
        selection.select_node(n, true);
        selection.set_color(&mut store, Color::from("#ff0000"));
        assert_eq!(store.connection(an).unwrap().color, Some(Color::from("#0000ff")));
        assert_eq!(store.connection(nc).unwrap().color, Some(Color::from("#ff0000")));

        selection.reset_color(&mut store);
        assert_eq!(store.connection(an).unwrap().color, Some(Color::from("#0000ff")));
        assert_eq!(store.connection(nc).unwrap().color, None);
    }

    #[test]
    fn test_select_modes() {
        let mut selection = SelectionManager::new();
        selection.select_node(NodeId(1), true);
        selection.select_node(NodeId(2), false);
        selection.select_connection(ConnectionId(1), false);
        assert!(selection.is_node_selected(NodeId(1)));
        assert!(selection.is_node_selected(NodeId(2)));
        assert!(selection.is_connection_selected(ConnectionId(1)));

        selection.select_connection(ConnectionId(2), true);
        assert_eq!(selection.selected_nodes().count(), 0);
        assert_eq!(
            selection.selected_connections().collect::<Vec<_>>(),
            vec![ConnectionId(2)]
        );

        selection.toggle_connection(ConnectionId(2));
        selection.toggle_connection(ConnectionId(3));
        assert!(!selection.is_connection_selected(ConnectionId(2)));
        assert!(selection.is_connection_selected(ConnectionId(3)));

        selection.clear();
        assert!(selection.is_empty());
    }

    #[test]
    fn test_notifies_only_on_change() {
        let mut selection = SelectionManager::new();
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        selection.subscribe(move |_| *sink.borrow_mut() += 1);

        selection.select_node(NodeId(1), true);
        selection.select_node(NodeId(1), true);
        selection.clear();
        selection.clear();
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn test_delete_selected_keeps_locked() {
        let (mut store, a, n, c, an, _) = chain();
        store.set_locked(c, true).unwrap();

        let mut selection = SelectionManager::new();
        selection.select_node(n, true);
        selection.select_node(c, false);
        selection.select_connection(an, false);

        assert_eq!(selection.delete_selected(&mut store), 2);
        assert!(!store.contains_node(n));
        assert!(store.contains_node(c));
        assert!(store.contains_node(a));
        assert_eq!(store.connection_count(), 0);
        assert_eq!(selection.selected_nodes().collect::<Vec<_>>(), vec![c]);
        assert_eq!(selection.selected_connections().count(), 0);
    }

    #[test]
    fn test_retain_existing() {
        let (mut store, a, n, _, an, nc) = chain();
        let mut selection = SelectionManager::new();
        selection.select_node(a, true);
        selection.select_node(n, false);
        selection.select_connection(nc, false);

        store.delete_node(n).unwrap();
        selection.retain_existing(&store);
        assert_eq!(selection.selected_nodes().collect::<Vec<_>>(), vec![a]);
        assert!(!selection.is_connection_selected(nc));
        assert!(!selection.is_connection_selected(an));
    }
}
