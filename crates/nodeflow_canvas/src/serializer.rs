// SPDX-License-Identifier: MIT OR Apache-2.0
//! Whole-graph export and import.
//!
//! The document is a plain data shape (camelCase in JSON). Import goes
//! through the same [`GraphStore`] operations as interactive editing, so
//! replacement and validation rules apply identically to loaded data.

use crate::catalog::NodeCatalog;
use crate::connection::{ConnectionId, Endpoint};
use crate::node::{Color, NodeId, PropertyValue};
use crate::port::PortRef;
use crate::store::GraphStore;
use crate::topology::{self, TopologicalOrder};
use egui::{Pos2, Vec2};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Serialized graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDocument {
    /// Nodes in creation order
    pub nodes: Vec<NodeRecord>,
    /// Connections in creation order
    pub connections: Vec<ConnectionRecord>,
    /// Execution order at export time. Recomputed on import.
    #[serde(default)]
    pub execution_order: Vec<NodeId>,
}

/// Serialized node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    /// Node ID at export time
    pub id: NodeId,
    /// Catalog type
    pub type_tag: String,
    /// Top-left corner in world units
    pub position: Pos2,
    /// Property values
    #[serde(default)]
    pub properties: IndexMap<String, PropertyValue>,
    /// Lock state
    #[serde(default)]
    pub locked: bool,
    /// Color override
    #[serde(default)]
    pub color: Option<Color>,
    /// Which output feeds each bound input. Derived from `connections`;
    /// ignored on import.
    #[serde(default)]
    pub input_bindings: IndexMap<String, InputBinding>,
}

/// Source of a bound input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputBinding {
    /// Upstream node
    pub from_node_id: NodeId,
    /// Upstream output port
    pub from_port: String,
}

/// Serialized connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    /// Connection ID at export time
    pub id: ConnectionId,
    /// Output end
    pub source: Endpoint,
    /// Input end
    pub target: Endpoint,
    /// Color
    #[serde(default)]
    pub color: Option<Color>,
}

impl GraphDocument {
    /// Pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse JSON
    pub fn from_json(source: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(source)?)
    }
}

/// Error reading or writing a document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Malformed JSON or wrong shape
    #[error("Invalid graph document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Snapshot the store
pub fn export_graph(store: &GraphStore) -> GraphDocument {
    let nodes = store
        .nodes()
        .map(|node| {
            let input_bindings = store
                .incoming(node.id)
                .into_iter()
                .map(|entry| {
                    (
                        entry.local_port,
                        InputBinding {
                            from_node_id: entry.remote_node,
                            from_port: entry.remote_port,
                        },
                    )
                })
                .collect();
            NodeRecord {
                id: node.id,
                type_tag: node.type_tag.clone(),
                position: node.position,
                properties: node.properties.clone(),
                locked: node.locked,
                color: node.color.clone(),
                input_bindings,
            }
        })
        .collect();

    let connections = store
        .connections()
        .map(|c| ConnectionRecord {
            id: c.id,
            source: c.source.clone(),
            target: c.target.clone(),
            color: c.color.clone(),
        })
        .collect();

    GraphDocument {
        nodes,
        connections,
        execution_order: topology::execution_order(store).order,
    }
}

/// What [`import_graph`] did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    /// Document node ID to new node ID
    pub id_map: IndexMap<NodeId, NodeId>,
    /// Document nodes whose type is not in the catalog
    pub skipped_nodes: Vec<NodeId>,
    /// Document connections that could not be re-created
    pub skipped_connections: Vec<ConnectionId>,
    /// Freshly computed execution order
    pub execution_order: TopologicalOrder,
}

/// Replace the store's contents with a document.
///
/// Nodes get fresh IDs. `default_size` stands in for the on-screen size
/// until the renderer reports one.
pub fn import_graph(
    store: &mut GraphStore,
    catalog: &NodeCatalog,
    document: &GraphDocument,
    default_size: Vec2,
) -> ImportReport {
    store.clear();
    let mut report = ImportReport::default();

    for record in &document.nodes {
        let Some(definition) = catalog.get(&record.type_tag) else {
            tracing::warn!(
                "Skipping node {}: unknown type '{}'",
                record.id,
                record.type_tag
            );
            report.skipped_nodes.push(record.id);
            continue;
        };

        let id = store.create_node(definition, record.position, default_size);
        for (key, value) in &record.properties {
            // Fresh node, cannot fail
            let _ = store.set_property(id, key.clone(), value.clone());
        }
        if record.color.is_some() {
            let _ = store.set_node_color(id, record.color.clone());
        }
        report.id_map.insert(record.id, id);
    }

    for record in &document.connections {
        let (Some(&source), Some(&target)) = (
            report.id_map.get(&record.source.node_id),
            report.id_map.get(&record.target.node_id),
        ) else {
            tracing::warn!("Skipping connection {}: endpoint not imported", record.id);
            report.skipped_connections.push(record.id);
            continue;
        };

        let connected = store.connect(
            PortRef::output(source, record.source.port_name.clone()),
            PortRef::input(target, record.target.port_name.clone()),
        );
        match connected {
            Ok(id) => {
                // No color in the record keeps the one inherited from the endpoints
                if let Some(color) = &record.color {
                    let _ = store.set_connection_color(id, Some(color.clone()));
                }
            }
            Err(err) => {
                tracing::warn!("Skipping connection {}: {err}", record.id);
                report.skipped_connections.push(record.id);
            }
        }
    }

    for record in document.nodes.iter().filter(|r| r.locked) {
        if let Some(&id) = report.id_map.get(&record.id) {
            let _ = store.set_locked(id, true);
        }
    }

    report.execution_order = topology::execution_order(store);
    tracing::info!(
        "Imported {} nodes, {} connections ({} nodes and {} connections skipped)",
        store.node_count(),
        store.connection_count(),
        report.skipped_nodes.len(),
        report.skipped_connections.len()
    );
    report
}
