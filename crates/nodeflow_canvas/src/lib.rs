// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph/canvas engine for node editors.
//!
//! This crate models a directed graph of typed nodes placed in a large,
//! bounded 2D world and the pointer-driven editing of it. Rendering is left
//! to the host, which feeds resolved input events in and subscribes to
//! mutation notifications.
//!
//! ## Architecture
//!
//! - [`coords`]: world/viewport transform, anchor-stable zoom, clamping
//! - [`store`]: nodes, connections and the connection index
//! - [`validator`]: endpoint roles and port type compatibility
//! - [`topology`]: execution order and cycle detection
//! - [`selection`]: multi-select and color propagation
//! - [`interaction`]: drag/pan/connect state machine with edge auto-pan
//! - [`serializer`]: whole-graph export and import
//! - [`editor`]: facade owning all of the above

pub mod catalog;
pub mod config;
pub mod connection;
pub mod coords;
pub mod editor;
pub mod events;
pub mod index;
pub mod interaction;
pub mod node;
pub mod port;
pub mod selection;
pub mod serializer;
pub mod store;
pub mod topology;
pub mod validator;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::{NodeCatalog, NodeCategory, NodeDefinition};
pub use config::CanvasConfig;
pub use connection::{Connection, ConnectionId};
pub use coords::CoordinateSystem;
pub use editor::{CanvasEditor, EditorError};
pub use events::{EventKind, GraphEvent};
pub use interaction::{InputEvent, InteractionStateMachine, PointerTarget};
pub use node::{Node, NodeId};
pub use port::{PortDirection, PortRef, PortType};
pub use selection::SelectionManager;
pub use serializer::GraphDocument;
pub use store::{ConnectionError, GraphError, GraphStore};
pub use topology::{TopologicalOrder, ValidationReport};

pub use egui::{pos2, vec2, Pos2, Vec2};
