// SPDX-License-Identifier: MIT OR Apache-2.0
//! Mutation notifications for renderers and property panels.
//!
//! Collaborators subscribe to an [`EventBus`] by event kind. Handlers run
//! synchronously inside the mutating call. Viewport changes can be
//! coalesced: only the latest pending event per kind is delivered on
//! [`EventBus::flush`].

use crate::connection::ConnectionId;
use crate::coords::ViewTransform;
use crate::node::{Color, NodeId};
use egui::Pos2;
use indexmap::IndexMap;
use std::fmt;

/// An entity a notification refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    /// A node
    Node(NodeId),
    /// A connection
    Connection(ConnectionId),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(id) => write!(f, "node {id}"),
            Self::Connection(id) => write!(f, "connection {id}"),
        }
    }
}

/// A change observed by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    /// A node was added
    NodeCreated {
        /// The new node
        node_id: NodeId,
    },
    /// A node was removed
    NodeDeleted {
        /// The removed node
        node_id: NodeId,
    },
    /// A node's position changed
    NodeMoved {
        /// The node
        node_id: NodeId,
        /// New (clamped) position
        position: Pos2,
    },
    /// A node's color override changed
    NodeRecolored {
        /// The node
        node_id: NodeId,
        /// New color
        color: Option<Color>,
    },
    /// A node was locked or unlocked
    NodeLockChanged {
        /// The node
        node_id: NodeId,
        /// New lock state
        locked: bool,
    },
    /// A node property changed
    PropertyChanged {
        /// The node
        node_id: NodeId,
        /// Property key
        key: String,
    },
    /// A connection was added
    ConnectionCreated {
        /// The new connection
        connection_id: ConnectionId,
    },
    /// A connection was removed
    ConnectionDeleted {
        /// The removed connection
        connection_id: ConnectionId,
    },
    /// A connection's color changed
    ConnectionRecolored {
        /// The connection
        connection_id: ConnectionId,
        /// New color
        color: Option<Color>,
    },
    /// Connection curves need to be recomputed
    ConnectionGeometryChanged {
        /// Affected connections
        connection_ids: Vec<ConnectionId>,
    },
    /// The selection changed
    SelectionChanged {
        /// Selected nodes
        nodes: Vec<NodeId>,
        /// Selected connections
        connections: Vec<ConnectionId>,
    },
    /// Pan or zoom changed
    ViewportChanged {
        /// New transform
        transform: ViewTransform,
    },
    /// Every node and connection was removed
    GraphCleared,
    /// An operation was refused because of a lock
    Blocked {
        /// The locked entity
        entity: EntityRef,
    },
}

/// Discriminant of [`GraphEvent`], used to subscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// [`GraphEvent::NodeCreated`]
    NodeCreated,
    /// [`GraphEvent::NodeDeleted`]
    NodeDeleted,
    /// [`GraphEvent::NodeMoved`]
    NodeMoved,
    /// [`GraphEvent::NodeRecolored`]
    NodeRecolored,
    /// [`GraphEvent::NodeLockChanged`]
    NodeLockChanged,
    /// [`GraphEvent::PropertyChanged`]
    PropertyChanged,
    /// [`GraphEvent::ConnectionCreated`]
    ConnectionCreated,
    /// [`GraphEvent::ConnectionDeleted`]
    ConnectionDeleted,
    /// [`GraphEvent::ConnectionRecolored`]
    ConnectionRecolored,
    /// [`GraphEvent::ConnectionGeometryChanged`]
    ConnectionGeometryChanged,
    /// [`GraphEvent::SelectionChanged`]
    SelectionChanged,
    /// [`GraphEvent::ViewportChanged`]
    ViewportChanged,
    /// [`GraphEvent::GraphCleared`]
    GraphCleared,
    /// [`GraphEvent::Blocked`]
    Blocked,
}

impl GraphEvent {
    /// The event's kind
    pub fn kind(&self) -> EventKind {
        match self {
            Self::NodeCreated { .. } => EventKind::NodeCreated,
            Self::NodeDeleted { .. } => EventKind::NodeDeleted,
            Self::NodeMoved { .. } => EventKind::NodeMoved,
            Self::NodeRecolored { .. } => EventKind::NodeRecolored,
            Self::NodeLockChanged { .. } => EventKind::NodeLockChanged,
            Self::PropertyChanged { .. } => EventKind::PropertyChanged,
            Self::ConnectionCreated { .. } => EventKind::ConnectionCreated,
            Self::ConnectionDeleted { .. } => EventKind::ConnectionDeleted,
            Self::ConnectionRecolored { .. } => EventKind::ConnectionRecolored,
            Self::ConnectionGeometryChanged { .. } => EventKind::ConnectionGeometryChanged,
            Self::SelectionChanged { .. } => EventKind::SelectionChanged,
            Self::ViewportChanged { .. } => EventKind::ViewportChanged,
            Self::GraphCleared => EventKind::GraphCleared,
            Self::Blocked { .. } => EventKind::Blocked,
        }
    }
}

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    /// `None` receives every kind
    kind: Option<EventKind>,
    handler: Box<dyn FnMut(&GraphEvent)>,
}

/// Fan-out of events to subscribed handlers
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscribers: Vec<Subscriber>,
    pending: IndexMap<EventKind, GraphEvent>,
}

impl EventBus {
    /// Create a bus with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive events of one kind
    pub fn subscribe(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&GraphEvent) + 'static,
    ) -> SubscriptionId {
        self.add(Some(kind), Box::new(handler))
    }

    /// Receive every event
    pub fn subscribe_all(&mut self, handler: impl FnMut(&GraphEvent) + 'static) -> SubscriptionId {
        self.add(None, Box::new(handler))
    }

    fn add(
        &mut self,
        kind: Option<EventKind>,
        handler: Box<dyn FnMut(&GraphEvent)>,
    ) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.push(Subscriber { id, kind, handler });
        id
    }

    /// Remove a subscription. Returns whether it existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    /// Deliver an event now
    pub fn emit(&mut self, event: GraphEvent) {
        let kind = event.kind();
        for subscriber in &mut self.subscribers {
            if subscriber.kind.map_or(true, |k| k == kind) {
                (subscriber.handler)(&event);
            }
        }
    }

    /// Queue an event, replacing any queued event of the same kind
    pub fn emit_coalesced(&mut self, event: GraphEvent) {
        self.pending.insert(event.kind(), event);
    }

    /// Whether coalesced events are waiting
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Deliver queued events. Returns how many were delivered.
    pub fn flush(&mut self) -> usize {
        let pending: Vec<GraphEvent> = self.pending.drain(..).map(|(_, event)| event).collect();
        let count = pending.len();
        for event in pending {
            self.emit(event);
        }
        count
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}
