// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor facade tying the engine components together.

use crate::catalog::NodeCatalog;
use crate::config::CanvasConfig;
use crate::coords::{CoordinateSystem, ViewTransform};
use crate::events::{EventBus, EventKind, GraphEvent, SubscriptionId};
use crate::interaction::{CanvasContext, InputEvent, InteractionStateMachine};
use crate::node::{Color, NodeId};
use crate::selection::SelectionManager;
use crate::serializer::{self, GraphDocument, ImportReport};
use crate::store::GraphStore;
use crate::topology::{self, ValidationReport};
use egui::{pos2, Pos2, Vec2};

/// Error from an editor-level operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditorError {
    /// The catalog has no definition for the type tag
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),
}

/// A node canvas: graph, view, selection and input handling
#[derive(Debug)]
pub struct CanvasEditor {
    config: CanvasConfig,
    catalog: NodeCatalog,
    store: GraphStore,
    coords: CoordinateSystem,
    selection: SelectionManager,
    interaction: InteractionStateMachine,
    /// Coalesced [`GraphEvent::ViewportChanged`]
    viewport_events: EventBus,
}

impl CanvasEditor {
    /// Create an empty canvas centred on the middle of the world
    pub fn new(config: CanvasConfig, catalog: NodeCatalog, viewport_size: Vec2) -> Self {
        let mut coords = CoordinateSystem::from_config(&config);
        let half = config.world_size / 2.0;
        coords.center_on(pos2(half, half), viewport_size);

        Self {
            store: GraphStore::from_config(&config),
            coords,
            selection: SelectionManager::new(),
            interaction: InteractionStateMachine::new(&config, viewport_size),
            viewport_events: EventBus::new(),
            config,
            catalog,
        }
    }

    /// Configuration
    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// Node catalog
    pub fn catalog(&self) -> &NodeCatalog {
        &self.catalog
    }

    /// The graph
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// The graph, for direct mutation (property panel, renderer size reports)
    pub fn store_mut(&mut self) -> &mut GraphStore {
        &mut self.store
    }

    /// Pan/zoom
    pub fn coords(&self) -> &CoordinateSystem {
        &self.coords
    }

    /// Selection
    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    /// Selection, for direct mutation
    pub fn selection_mut(&mut self) -> &mut SelectionManager {
        &mut self.selection
    }

    /// Interaction state
    pub fn interaction(&self) -> &InteractionStateMachine {
        &self.interaction
    }

    /// Receive graph events of one kind
    pub fn subscribe(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&GraphEvent) + 'static,
    ) -> SubscriptionId {
        self.store.subscribe(kind, handler)
    }

    /// Receive selection changes
    pub fn subscribe_selection(
        &mut self,
        handler: impl FnMut(&GraphEvent) + 'static,
    ) -> SubscriptionId {
        self.selection.subscribe(handler)
    }

    /// Receive viewport changes, delivered by [`Self::flush_notifications`]
    pub fn subscribe_viewport(
        &mut self,
        handler: impl FnMut(&GraphEvent) + 'static,
    ) -> SubscriptionId {
        self.viewport_events.subscribe(EventKind::ViewportChanged, handler)
    }

    /// Remove a viewport subscription
    pub fn unsubscribe_viewport(&mut self, id: SubscriptionId) -> bool {
        self.viewport_events.unsubscribe(id)
    }

    /// Deliver the latest pending viewport change, if any
    pub fn flush_notifications(&mut self) -> usize {
        self.viewport_events.flush()
    }

    /// Feed one input event. Returns whether anything changed.
    pub fn handle_event(&mut self, event: InputEvent) -> bool {
        let before = self.coords.transform();
        let mut ctx = CanvasContext {
            store: &mut self.store,
            coords: &mut self.coords,
            selection: &mut self.selection,
        };
        let changed = self.interaction.handle(event, &mut ctx);
        self.after_input(before);
        changed
    }

    /// Run one auto-pan step
    pub fn tick(&mut self) -> bool {
        let before = self.coords.transform();
        let mut ctx = CanvasContext {
            store: &mut self.store,
            coords: &mut self.coords,
            selection: &mut self.selection,
        };
        let stepped = self.interaction.tick(&mut ctx);
        self.after_input(before);
        stepped
    }

    /// Whether the host should keep calling [`Self::tick`]
    pub fn wants_tick(&self) -> bool {
        self.interaction.wants_tick()
    }

    fn after_input(&mut self, before: ViewTransform) {
        let transform = self.coords.transform();
        if transform != before {
            self.viewport_events
                .emit_coalesced(GraphEvent::ViewportChanged { transform });
        }
        self.selection.retain_existing(&self.store);
    }

    /// Pan the view by a pixel delta
    pub fn pan(&mut self, delta: Vec2) {
        let before = self.coords.transform();
        self.coords.pan(delta);
        self.after_input(before);
    }

    /// Zoom keeping the world point under `anchor` fixed
    pub fn zoom_at(&mut self, anchor: Pos2, factor: f32) -> bool {
        let before = self.coords.transform();
        let changed = self.coords.zoom_at(anchor, factor);
        self.after_input(before);
        changed
    }

    /// Drop a node from the palette at a viewport position
    pub fn place_node(
        &mut self,
        type_tag: &str,
        viewport_pos: Pos2,
    ) -> Result<NodeId, EditorError> {
        let definition = self
            .catalog
            .get(type_tag)
            .ok_or_else(|| EditorError::UnknownNodeType(type_tag.to_string()))?;
        let position = self.coords.viewport_to_world(viewport_pos);
        Ok(self
            .store
            .create_node(definition, position, self.config.default_node_size))
    }

    /// Color the selected nodes
    pub fn set_selection_color(&mut self, color: Color) {
        self.selection.set_color(&mut self.store, color);
    }

    /// Clear the color of the selected nodes
    pub fn reset_selection_color(&mut self) {
        self.selection.reset_color(&mut self.store);
    }

    /// Snapshot the graph
    pub fn export(&self) -> GraphDocument {
        serializer::export_graph(&self.store)
    }

    /// Replace the graph with a document, abandoning any interaction
    pub fn import(&mut self, document: &GraphDocument) -> ImportReport {
        self.interaction =
            InteractionStateMachine::new(&self.config, self.interaction.viewport_size());
        self.selection.clear();
        serializer::import_graph(
            &mut self.store,
            &self.catalog,
            document,
            self.config.default_node_size,
        )
    }

    /// Execution order, or the reasons execution must not proceed
    pub fn validate_for_execution(&self) -> Result<Vec<NodeId>, ValidationReport> {
        topology::validate_for_execution(&self.store)
    }
}
