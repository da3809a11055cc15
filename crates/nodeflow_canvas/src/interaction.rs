// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pointer/keyboard interaction state machine.
//!
//! The renderer resolves what is under the pointer and feeds structured
//! [`InputEvent`]s in. The machine turns them into store, coordinate and
//! selection mutations. Exactly one [`InteractionState`] is active; new
//! drags only start from [`InteractionState::Idle`].
//!
//! Edge auto-pan belongs to the node-drag state. The host calls
//! [`InteractionStateMachine::tick`] once per frame while
//! [`InteractionStateMachine::wants_tick`] is true; ending the drag drops
//! the auto-pan with it.

use crate::config::{AutoPanConfig, CanvasConfig};
use crate::connection::ConnectionId;
use crate::coords::CoordinateSystem;
use crate::node::NodeId;
use crate::port::PortRef;
use crate::selection::SelectionManager;
use crate::store::GraphStore;
use egui::{Key, Modifiers, PointerButton, Pos2, Vec2};

/// What the pointer is over, as resolved by the renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerTarget {
    /// Empty canvas
    Canvas,
    /// A node body
    Node(NodeId),
    /// A port
    Port(PortRef),
    /// A connection curve
    Connection(ConnectionId),
}

/// Input event in viewport coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// A button was pressed
    PointerDown {
        /// Pointer position
        pos: Pos2,
        /// Which button
        button: PointerButton,
        /// What was hit
        target: PointerTarget,
        /// Held modifier keys
        modifiers: Modifiers,
    },
    /// The pointer moved
    PointerMove {
        /// Pointer position
        pos: Pos2,
    },
    /// A button was released
    PointerUp {
        /// Pointer position
        pos: Pos2,
        /// What the pointer was released over
        target: PointerTarget,
    },
    /// Scroll wheel
    Wheel {
        /// Pointer position (zoom anchor)
        pos: Pos2,
        /// Scroll amount, positive zooms in
        delta: f32,
    },
    /// A key was pressed
    Key {
        /// The key
        key: Key,
        /// Held modifier keys
        modifiers: Modifiers,
    },
    /// The viewport was resized
    ViewportResized {
        /// New size in pixels
        size: Vec2,
    },
}

/// Active edge auto-pan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoPan {
    /// Viewport translation per step, in pixels
    pub velocity: Vec2,
    /// Steps taken so far
    pub steps: u32,
}

/// Current interaction
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InteractionState {
    /// Nothing in progress
    #[default]
    Idle,
    /// Dragging a node
    DraggingNode {
        /// The node
        node_id: NodeId,
        /// Where the node was when the drag started, for cancel
        original_position: Pos2,
        /// World-space offset from the node's corner to the grab point
        pointer_offset: Vec2,
        /// Last pointer position
        pointer: Pos2,
        /// Set while the pointer is inside the edge margin
        auto_pan: Option<AutoPan>,
    },
    /// Panning the view
    PanningCanvas {
        /// Where the pan started
        origin: Pos2,
        /// Last pointer position
        last: Pos2,
    },
    /// Dragging a new connection out of a port
    DraggingConnection {
        /// The port the drag started on
        source: PortRef,
        /// Current pointer position, for the preview curve
        pointer: Pos2,
    },
}

/// Mutable collaborators for one event
#[derive(Debug)]
pub struct CanvasContext<'a> {
    /// The graph
    pub store: &'a mut GraphStore,
    /// Pan/zoom
    pub coords: &'a mut CoordinateSystem,
    /// Selection
    pub selection: &'a mut SelectionManager,
}

/// Per-axis auto-pan speed.
///
/// Zero at the margin boundary, `max_speed` at the viewport edge. Positive
/// near the low edge (content moves toward +axis), negative near the high
/// edge.
fn axis_speed(pointer: f32, extent: f32, config: &AutoPanConfig) -> f32 {
    let margin = config.edge_margin;
    if margin <= 0.0 {
        return 0.0;
    }
    if pointer < margin {
        let depth = ((margin - pointer) / margin).min(1.0);
        config.max_speed * depth
    } else if pointer > extent - margin {
        let depth = ((pointer - (extent - margin)) / margin).min(1.0);
        -config.max_speed * depth
    } else {
        0.0
    }
}

/// Auto-pan velocity for a pointer position, or zero outside the margin
pub fn edge_velocity(pointer: Pos2, viewport_size: Vec2, config: &AutoPanConfig) -> Vec2 {
    Vec2::new(
        axis_speed(pointer.x, viewport_size.x, config),
        axis_speed(pointer.y, viewport_size.y, config),
    )
}

/// Auto-pan for a pointer at `pos`, keeping the step count of `previous`
fn auto_pan_at(
    pos: Pos2,
    viewport_size: Vec2,
    config: &AutoPanConfig,
    previous: Option<AutoPan>,
) -> Option<AutoPan> {
    let velocity = edge_velocity(pos, viewport_size, config);
    if velocity == Vec2::ZERO {
        return None;
    }
    let steps = previous.map_or(0, |a| a.steps);
    Some(AutoPan { velocity, steps })
}

fn is_additive(modifiers: &Modifiers) -> bool {
    modifiers.shift || modifiers.ctrl || modifiers.command
}

/// Converts input events into graph and view mutations
#[derive(Debug, Clone)]
pub struct InteractionStateMachine {
    state: InteractionState,
    viewport_size: Vec2,
    auto_pan: AutoPanConfig,
    zoom_sensitivity: f32,
}

impl InteractionStateMachine {
    /// Create an idle machine
    pub fn new(config: &CanvasConfig, viewport_size: Vec2) -> Self {
        Self {
            state: InteractionState::Idle,
            viewport_size,
            auto_pan: config.auto_pan.clone(),
            zoom_sensitivity: config.zoom_sensitivity,
        }
    }

    /// Current state
    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    /// Whether nothing is in progress
    pub fn is_idle(&self) -> bool {
        self.state == InteractionState::Idle
    }

    /// Viewport size in pixels
    pub fn viewport_size(&self) -> Vec2 {
        self.viewport_size
    }

    /// Source port and pointer of an in-progress connection drag
    pub fn connection_preview(&self) -> Option<(&PortRef, Pos2)> {
        match &self.state {
            InteractionState::DraggingConnection { source, pointer } => Some((source, *pointer)),
            _ => None,
        }
    }

    /// Whether the host should keep calling [`Self::tick`]
    pub fn wants_tick(&self) -> bool {
        matches!(
            self.state,
            InteractionState::DraggingNode {
                auto_pan: Some(_),
                ..
            }
        )
    }

    /// Process one event. Returns whether anything changed.
    pub fn handle(&mut self, event: InputEvent, ctx: &mut CanvasContext<'_>) -> bool {
        match event {
            InputEvent::PointerDown {
                pos,
                button,
                target,
                modifiers,
            } => self.pointer_down(pos, button, target, &modifiers, ctx),
            InputEvent::PointerMove { pos } => self.pointer_move(pos, ctx),
            InputEvent::PointerUp { pos, target } => self.pointer_up(pos, target, ctx),
            InputEvent::Wheel { pos, delta } => {
                let factor = (1.0 + delta * self.zoom_sensitivity).max(0.1);
                ctx.coords.zoom_at(pos, factor)
            }
            InputEvent::Key { key, .. } => self.key(key, ctx),
            InputEvent::ViewportResized { size } => {
                self.viewport_size = size;
                false
            }
        }
    }

    fn pointer_down(
        &mut self,
        pos: Pos2,
        button: PointerButton,
        target: PointerTarget,
        modifiers: &Modifiers,
        ctx: &mut CanvasContext<'_>,
    ) -> bool {
        if !self.is_idle() {
            return false;
        }

        if button == PointerButton::Middle {
            self.state = InteractionState::PanningCanvas {
                origin: pos,
                last: pos,
            };
            return true;
        }
        if button != PointerButton::Primary {
            return false;
        }

        let additive = is_additive(modifiers);
        match target {
            PointerTarget::Node(node_id) => {
                let Some(node) = ctx.store.node(node_id) else {
                    tracing::debug!(node = %node_id, "Pointer down on unknown node");
                    return false;
                };
                if node.locked {
                    return false;
                }
                let original_position = node.position;
                let pointer_offset = ctx.coords.viewport_to_world(pos) - original_position;

                ctx.selection.select_node(node_id, !additive);
                self.state = InteractionState::DraggingNode {
                    node_id,
                    original_position,
                    pointer_offset,
                    pointer: pos,
                    auto_pan: auto_pan_at(pos, self.viewport_size, &self.auto_pan, None),
                };
            }
            PointerTarget::Canvas => {
                if !additive {
                    ctx.selection.clear();
                }
                self.state = InteractionState::PanningCanvas {
                    origin: pos,
                    last: pos,
                };
            }
            PointerTarget::Port(source) => {
                self.state = InteractionState::DraggingConnection {
                    source,
                    pointer: pos,
                };
            }
            PointerTarget::Connection(connection_id) => {
                if additive {
                    ctx.selection.toggle_connection(connection_id);
                } else {
                    ctx.selection.select_connection(connection_id, true);
                }
            }
        }
        true
    }

    fn pointer_move(&mut self, pos: Pos2, ctx: &mut CanvasContext<'_>) -> bool {
        match &mut self.state {
            InteractionState::Idle => false,
            InteractionState::DraggingNode {
                node_id,
                pointer_offset,
                pointer,
                auto_pan,
                ..
            } => {
                let target = ctx.coords.viewport_to_world(pos) - *pointer_offset;
                if let Err(err) = ctx.store.move_node(*node_id, target) {
                    tracing::debug!("Drag move ignored: {err}");
                }
                *pointer = pos;

                *auto_pan = auto_pan_at(pos, self.viewport_size, &self.auto_pan, *auto_pan);
                true
            }
            InteractionState::PanningCanvas { last, .. } => {
                ctx.coords.pan(pos - *last);
                *last = pos;
                true
            }
            InteractionState::DraggingConnection { pointer, .. } => {
                *pointer = pos;
                true
            }
        }
    }

    fn pointer_up(
        &mut self,
        pos: Pos2,
        target: PointerTarget,
        ctx: &mut CanvasContext<'_>,
    ) -> bool {
        match std::mem::take(&mut self.state) {
            InteractionState::Idle => false,
            InteractionState::DraggingNode {
                node_id,
                pointer_offset,
                ..
            } => {
                let target = ctx.coords.viewport_to_world(pos) - pointer_offset;
                if let Err(err) = ctx.store.move_node(node_id, target) {
                    tracing::debug!("Drag commit ignored: {err}");
                }
                ctx.store.refresh_geometry(node_id);
                true
            }
            InteractionState::PanningCanvas { last, .. } => {
                ctx.coords.pan(pos - last);
                true
            }
            InteractionState::DraggingConnection { source, .. } => {
                match target {
                    PointerTarget::Port(port) => match ctx.store.connect(source, port) {
                        Ok(id) => tracing::debug!(connection = %id, "Connection drag completed"),
                        Err(err) => tracing::debug!("Connection drag rejected: {err}"),
                    },
                    _ => tracing::debug!("Connection drag discarded"),
                }
                true
            }
        }
    }

    fn key(&mut self, key: Key, ctx: &mut CanvasContext<'_>) -> bool {
        match key {
            Key::Escape => self.cancel(ctx),
            Key::Delete | Key::Backspace if self.is_idle() => {
                ctx.selection.delete_selected(ctx.store) > 0
            }
            _ => false,
        }
    }

    /// Abort the active interaction.
    ///
    /// A node drag puts the node back where it started; a connection drag
    /// is discarded. Returns whether anything was active.
    pub fn cancel(&mut self, ctx: &mut CanvasContext<'_>) -> bool {
        match std::mem::take(&mut self.state) {
            InteractionState::Idle => false,
            InteractionState::DraggingNode {
                node_id,
                original_position,
                ..
            } => {
                if let Err(err) = ctx.store.move_node(node_id, original_position) {
                    tracing::debug!("Drag cancel ignored: {err}");
                }
                ctx.store.refresh_geometry(node_id);
                true
            }
            InteractionState::PanningCanvas { .. }
            | InteractionState::DraggingConnection { .. } => true,
        }
    }

    /// Run one auto-pan step.
    ///
    /// Pans the view and moves the dragged node by the opposite world-space
    /// delta so it stays under the pointer. Returns whether a step ran.
    pub fn tick(&mut self, ctx: &mut CanvasContext<'_>) -> bool {
        let InteractionState::DraggingNode {
            node_id,
            auto_pan: Some(auto_pan),
            ..
        } = &mut self.state
        else {
            return false;
        };
        let node_id = *node_id;
        let velocity = auto_pan.velocity;

        let Some(position) = ctx.store.node(node_id).map(|n| n.position) else {
            tracing::debug!(node = %node_id, "Dragged node vanished, ending drag");
            self.state = InteractionState::Idle;
            return false;
        };

        ctx.coords.pan(velocity);
        let world_delta = -ctx.coords.viewport_delta_to_world(velocity);
        if let Err(err) = ctx.store.move_node(node_id, position + world_delta) {
            tracing::debug!("Auto-pan move ignored: {err}");
        }
        auto_pan.steps += 1;
        true
    }
}
