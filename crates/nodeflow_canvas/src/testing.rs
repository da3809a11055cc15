// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared fixtures for unit tests.

use crate::catalog::{NodeCatalog, NodeCategory, NodeDefinition, PropertyKind, PropertySpec};
use crate::events::{GraphEvent, SubscriptionId};
use crate::node::NodeId;
use crate::port::PortSpec;
use crate::store::GraphStore;
use egui::{pos2, vec2};
use std::cell::RefCell;
use std::rc::Rc;

pub(crate) type Recorded = Rc<RefCell<Vec<GraphEvent>>>;

/// `source` -> `relay` -> `merge`, plus `text` (string, optional input)
/// and `sink` (wildcard input)
pub(crate) fn catalog() -> NodeCatalog {
    [
        NodeDefinition::new("source", "Source", NodeCategory::Input)
            .with_output(PortSpec::new("out", "number"))
            .with_property("value", PropertySpec::new(PropertyKind::Float, 0.0)),
        NodeDefinition::new("relay", "Relay", NodeCategory::Transform)
            .with_input(PortSpec::new("in", "number"))
            .with_output(PortSpec::new("out", "number")),
        NodeDefinition::new("merge", "Merge", NodeCategory::Math)
            .with_input(PortSpec::new("a", "number"))
            .with_input(PortSpec::new("b", "number"))
            .with_output(PortSpec::new("out", "number")),
        NodeDefinition::new("text", "Text", NodeCategory::Transform)
            .with_input(PortSpec::new("in", "string").optional())
            .with_output(PortSpec::new("out", "string")),
        NodeDefinition::new("sink", "Sink", NodeCategory::Output)
            .with_input(PortSpec::new("in", "any")),
    ]
    .into_iter()
    .collect()
}

pub(crate) fn add_node(store: &mut GraphStore, catalog: &NodeCatalog, type_tag: &str) -> NodeId {
    let definition = catalog.get(type_tag).expect("fixture type");
    store.create_node(definition, pos2(100.0, 100.0), vec2(160.0, 80.0))
}

pub(crate) fn recorder(store: &mut GraphStore) -> (Recorded, SubscriptionId) {
    let seen: Recorded = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let id = store.subscribe_all(move |event| sink.borrow_mut().push(event.clone()));
    (seen, id)
}
