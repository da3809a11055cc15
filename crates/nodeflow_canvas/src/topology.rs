// SPDX-License-Identifier: MIT OR Apache-2.0
//! Execution ordering and cycle detection.
//!
//! [`sort`] is Kahn's algorithm and never fails: a cycle shows up as a
//! short order plus a flag. [`find_cycle`] is a separate depth-first check
//! used as a second guard before execution.

use crate::connection::ConnectionId;
use crate::node::NodeId;
use crate::store::GraphStore;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet, VecDeque};

/// Result of a topological sort
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologicalOrder {
    /// Nodes in dependency order. Shorter than the node count when a cycle
    /// exists; nodes on or behind the cycle are left out.
    pub order: Vec<NodeId>,
    /// Whether some nodes could not be ordered
    pub cycle_detected: bool,
}

/// Kahn's algorithm over `nodes`, seeded in the given order.
///
/// Edges naming unknown nodes are ignored.
pub fn sort(nodes: &[NodeId], edges: &[(NodeId, NodeId)]) -> TopologicalOrder {
    let mut in_degree: IndexMap<NodeId, usize> = nodes.iter().map(|&id| (id, 0)).collect();
    let mut successors: HashMap<NodeId, Vec<NodeId>> = HashMap::new();

    for &(from, to) in edges {
        if !in_degree.contains_key(&from) {
            continue;
        }
        if let Some(degree) = in_degree.get_mut(&to) {
            *degree += 1;
            successors.entry(from).or_default().push(to);
        }
    }

    let mut queue: VecDeque<NodeId> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(&id, _)| id)
        .collect();
    let mut order = Vec::with_capacity(in_degree.len());

    while let Some(id) = queue.pop_front() {
        order.push(id);
        for next in successors.get(&id).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(next) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(*next);
                }
            }
        }
    }

    let cycle_detected = order.len() < in_degree.len();
    TopologicalOrder {
        order,
        cycle_detected,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Active,
    Done,
}

/// Depth-first cycle search with an explicit stack.
///
/// Returns the nodes of the first cycle found, in edge order.
pub fn find_cycle(nodes: &[NodeId], edges: &[(NodeId, NodeId)]) -> Option<Vec<NodeId>> {
    let mut successors: IndexMap<NodeId, Vec<NodeId>> =
        nodes.iter().map(|&id| (id, Vec::new())).collect();
    for &(from, to) in edges {
        if successors.contains_key(&to) {
            if let Some(list) = successors.get_mut(&from) {
                list.push(to);
            }
        }
    }

    let mut marks: HashMap<NodeId, Mark> = HashMap::with_capacity(nodes.len());

    for &start in nodes {
        if marks.contains_key(&start) {
            continue;
        }
        marks.insert(start, Mark::Active);
        // (node, index of the next successor to visit)
        let mut stack: Vec<(NodeId, usize)> = vec![(start, 0)];

        while let Some(&(node, next)) = stack.last() {
            let child = successors.get(&node).and_then(|list| list.get(next)).copied();
            let Some(child) = child else {
                marks.insert(node, Mark::Done);
                stack.pop();
                continue;
            };

            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }
            match marks.get(&child) {
                Some(Mark::Active) => {
                    let from = stack.iter().position(|&(id, _)| id == child).unwrap_or(0);
                    return Some(stack[from..].iter().map(|&(id, _)| id).collect());
                }
                Some(Mark::Done) => {}
                None => {
                    marks.insert(child, Mark::Active);
                    stack.push((child, 0));
                }
            }
        }
    }

    None
}

fn snapshot(store: &GraphStore) -> (Vec<NodeId>, Vec<(NodeId, NodeId)>) {
    let nodes = store.node_ids().collect();
    let edges = store
        .connections()
        .map(|c| (c.source.node_id, c.target.node_id))
        .collect();
    (nodes, edges)
}

/// Execution order of the store's nodes, seeded in creation order
pub fn execution_order(store: &GraphStore) -> TopologicalOrder {
    let (nodes, edges) = snapshot(store);
    sort(&nodes, &edges)
}

/// Whether the store's connections form a cycle
pub fn has_cycle(store: &GraphStore) -> bool {
    let (nodes, edges) = snapshot(store);
    find_cycle(&nodes, &edges).is_some()
}

/// Problem found while validating a graph for execution
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationIssue {
    /// Connections form a cycle
    #[error("Cycle detected involving {}", join(.nodes))]
    Cycle {
        /// Nodes that could not be ordered
        nodes: Vec<NodeId>,
    },

    /// A required input has no connection
    #[error("Missing required input '{port_name}' on {node_id}")]
    MissingInput {
        /// The node
        node_id: NodeId,
        /// The unbound input
        port_name: String,
    },

    /// Connected ports have different types
    #[error("{connection_id}: {message}")]
    TypeMismatch {
        /// The flagged connection
        connection_id: ConnectionId,
        /// Tooltip text
        message: String,
    },
}

fn join(ids: &[NodeId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Outcome of [`validate`]
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("Graph cannot be executed: {} error(s), {} warning(s)", .errors.len(), .warnings.len())]
pub struct ValidationReport {
    /// Execution order (partial when a cycle exists)
    pub order: Vec<NodeId>,
    /// Issues that block execution
    pub errors: Vec<ValidationIssue>,
    /// Issues worth showing that do not block execution
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Whether execution may proceed
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check the graph for cycles, unbound required inputs and type mismatches
pub fn validate(store: &GraphStore) -> ValidationReport {
    let (nodes, edges) = snapshot(store);
    let sorted = sort(&nodes, &edges);
    let cycle = find_cycle(&nodes, &edges);

    if sorted.cycle_detected != cycle.is_some() {
        tracing::warn!(
            kahn = sorted.cycle_detected,
            dfs = cycle.is_some(),
            "Cycle checks disagree"
        );
    }

    let mut report = ValidationReport::default();

    if sorted.cycle_detected || cycle.is_some() {
        let ordered: HashSet<NodeId> = sorted.order.iter().copied().collect();
        let unordered: Vec<NodeId> = nodes
            .iter()
            .copied()
            .filter(|id| !ordered.contains(id))
            .collect();
        let nodes = if unordered.is_empty() {
            cycle.unwrap_or_default()
        } else {
            unordered
        };
        report.errors.push(ValidationIssue::Cycle { nodes });
    }

    for node in store.nodes() {
        for port in node.input_ports.iter().filter(|p| !p.optional) {
            if store.input_binding(node.id, &port.name).is_none() {
                report.errors.push(ValidationIssue::MissingInput {
                    node_id: node.id,
                    port_name: port.name.clone(),
                });
            }
        }
    }

    for connection in store.connections() {
        if let Some(message) = &connection.mismatch {
            report.warnings.push(ValidationIssue::TypeMismatch {
                connection_id: connection.id,
                message: message.clone(),
            });
        }
    }

    report.order = sorted.order;
    report
}

/// Validate and return the execution order, or the report if execution
/// must not proceed
pub fn validate_for_execution(store: &GraphStore) -> Result<Vec<NodeId>, ValidationReport> {
    let report = validate(store);
    if report.is_ok() {
        Ok(report.order)
    } else {
        tracing::debug!("{report}");
        Err(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::PortRef;
    use crate::testing::{add_node, catalog};

    fn position(order: &[NodeId], id: NodeId) -> usize {
        order.iter().position(|&n| n == id).unwrap()
    }

    #[test]
    fn test_diamond_order() {
        let catalog = catalog();
        let mut store = GraphStore::new(100_000.0);
        let a = add_node(&mut store, &catalog, "source");
        let b = add_node(&mut store, &catalog, "relay");
        let c = add_node(&mut store, &catalog, "relay");
        let d = add_node(&mut store, &catalog, "merge");
        store.connect(PortRef::output(a, "out"), PortRef::input(b, "in")).unwrap();
        store.connect(PortRef::output(a, "out"), PortRef::input(c, "in")).unwrap();
        store.connect(PortRef::output(b, "out"), PortRef::input(d, "a")).unwrap();
        store.connect(PortRef::output(c, "out"), PortRef::input(d, "b")).unwrap();

        let result = execution_order(&store);
        assert!(!result.cycle_detected);
        assert_eq!(result.order.len(), 4);
        let order = &result.order;
        assert!(position(order, a) < position(order, b));
        assert!(position(order, a) < position(order, c));
        assert!(position(order, b) < position(order, d));
        assert!(position(order, c) < position(order, d));

        assert!(!has_cycle(&store));
        assert_eq!(validate_for_execution(&store), Ok(result.order));
    }

    #[test]
    fn test_cycle_is_flagged_and_rejected() {
        let catalog = catalog();
        let mut store = GraphStore::new(100_000.0);
        let a = add_node(&mut store, &catalog, "relay");
        let b = add_node(&mut store, &catalog, "relay");
        let c = add_node(&mut store, &catalog, "relay");
        store.connect(PortRef::output(a, "out"), PortRef::input(b, "in")).unwrap();
        store.connect(PortRef::output(b, "out"), PortRef::input(c, "in")).unwrap();
        store.connect(PortRef::output(c, "out"), PortRef::input(a, "in")).unwrap();

        let result = execution_order(&store);
        assert!(result.cycle_detected);
        assert!(result.order.len() < 3);
        assert!(has_cycle(&store));

        let report = validate_for_execution(&store).unwrap_err();
        assert_eq!(
            report.errors,
            vec![ValidationIssue::Cycle {
                nodes: vec![a, b, c]
            }]
        );
        assert_eq!(
            report.errors[0].to_string(),
            format!("Cycle detected involving {a}, {b}, {c}")
        );
    }

    #[test]
    fn test_checks_agree_on_raw_graphs() {
        let ids: Vec<NodeId> = (1..=5).map(NodeId).collect();
        let acyclic = [
            (ids[0], ids[1]),
            (ids[1], ids[2]),
            (ids[0], ids[3]),
            (ids[3], ids[2]),
            (ids[2], ids[4]),
        ];
        assert!(!sort(&ids, &acyclic).cycle_detected);
        assert_eq!(find_cycle(&ids, &acyclic), None);

        let cyclic = [(ids[0], ids[1]), (ids[1], ids[2]), (ids[2], ids[1]), (ids[3], ids[4])];
        let sorted = sort(&ids, &cyclic);
        assert!(sorted.cycle_detected);
        assert_eq!(sorted.order, vec![ids[0], ids[3], ids[4]]);
        assert_eq!(find_cycle(&ids, &cyclic), Some(vec![ids[1], ids[2]]));
    }

    #[test]
    fn test_unknown_edge_endpoints_ignored() {
        let ids = [NodeId(1), NodeId(2)];
        let edges = [(NodeId(1), NodeId(9)), (NodeId(9), NodeId(2))];
        let sorted = sort(&ids, &edges);
        assert_eq!(sorted.order, ids.to_vec());
        assert_eq!(find_cycle(&ids, &edges), None);
    }

    #[test]
    fn test_missing_input_blocks_mismatch_warns() {
        let catalog = catalog();
        let mut store = GraphStore::new(100_000.0);
        let source = add_node(&mut store, &catalog, "source");
        let text = add_node(&mut store, &catalog, "text");
        let relay = add_node(&mut store, &catalog, "relay");
        let flagged = store
            .connect(PortRef::output(source, "out"), PortRef::input(text, "in"))
            .unwrap();

        let report = validate(&store);
        assert_eq!(
            report.errors,
            vec![ValidationIssue::MissingInput {
                node_id: relay,
                port_name: "in".to_string(),
            }]
        );
        assert_eq!(report.warnings.len(), 1);
        assert!(matches!(
            &report.warnings[0],
            ValidationIssue::TypeMismatch { connection_id, .. } if *connection_id == flagged
        ));

        store.delete_node(relay).unwrap();
        assert_eq!(validate_for_execution(&store), Ok(vec![source, text]));
    }
}
